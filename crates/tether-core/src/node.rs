//! Node identities.
//!
//! Every participant on a network is addressed by a short string id.
//! By convention clients are named `c<n>` and servers `n<n>`, but any
//! non-empty id without whitespace is accepted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An addressable participant on a [`Network`](crate::Network).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id from trusted input without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id of the `n`th client node (`c<n>`).
    pub fn client(n: u64) -> Self {
        Self(format!("c{n}"))
    }

    /// The id of the `n`th server node (`n<n>`).
    pub fn server(n: u64) -> Self {
        Self(format!("n{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this id follows the client naming convention.
    pub fn is_client(&self) -> bool {
        self.0
            .strip_prefix('c')
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for NodeId {
    type Err = NodeIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(NodeIdParseError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(NodeIdParseError::Whitespace(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for NodeId {
    type Error = NodeIdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Error parsing a node id string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeIdParseError {
    #[error("node id cannot be empty")]
    Empty,
    #[error("node id cannot contain whitespace, got: {0:?}")]
    Whitespace(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_client() {
        let id: NodeId = "c12".parse().unwrap();
        assert_eq!(id.as_str(), "c12");
        assert!(id.is_client());
        assert_eq!(id, NodeId::client(12));
    }

    #[test]
    fn server_is_not_client() {
        let id = NodeId::server(3);
        assert_eq!(id.to_string(), "n3");
        assert!(!id.is_client());
        assert!(!NodeId::new("c").is_client());
        assert!(!NodeId::new("cx1").is_client());
    }

    #[test]
    fn rejects_bad_ids() {
        assert_eq!("".parse::<NodeId>(), Err(NodeIdParseError::Empty));
        assert!(matches!(
            "n 1".parse::<NodeId>(),
            Err(NodeIdParseError::Whitespace(_))
        ));
    }

    #[test]
    fn serde_as_plain_string() {
        let id = NodeId::server(1);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"n1\"");
        let back: NodeId = serde_json::from_str("\"n1\"").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<NodeId>("\"\"").is_err());
    }
}
