//! Client error taxonomy.
//!
//! Protocol failures a caller may reasonably handle (timeouts, error replies)
//! are [`RpcError`]s. Misuse of a client is a [`UsageError`] and malformed
//! traffic is reported separately, so matching on `Error::Rpc` never swallows
//! a programming mistake.

use crate::guard::WaitState;
use crate::shape::{Shape, Violation};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt::Write as _;
use tether_core::errors::TIMEOUT;
use tether_core::{Body, ErrorSpec, NetError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Timeout or an `error` reply from the peer.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The client was used incorrectly.
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// This side built a message that does not fit its declared shape.
    #[error("malformed {} request: {}", .0.rpc, summarize(&.0.violations))]
    MalformedRequest(Box<MalformedRequest>),

    /// The peer replied with a body that does not fit its declared shape.
    #[error("malformed {} response: {}", .0.rpc, summarize(&.0.violations))]
    MalformedResponse(Box<MalformedResponse>),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error signals a bug (in this process or the peer)
    /// rather than a network condition.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Usage(_) | Error::MalformedRequest(_) | Error::MalformedResponse(_)
        )
    }

    pub fn as_rpc(&self) -> Option<&RpcError> {
        match self {
            Error::Rpc(e) => Some(e),
            _ => None,
        }
    }
}

/// A classified protocol failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{name} (code {code}){}", detail(.body))]
pub struct RpcError {
    pub code: i64,
    pub name: Cow<'static, str>,
    pub definite: bool,
    /// The error reply, absent for timeouts.
    pub body: Option<Body>,
}

impl RpcError {
    pub fn new(spec: ErrorSpec, body: Option<Body>) -> Self {
        Self {
            code: spec.code,
            name: spec.name,
            definite: spec.definite,
            body,
        }
    }

    /// No matching reply arrived before the deadline.
    pub fn timeout() -> Self {
        Self::new(TIMEOUT, None)
    }

    pub fn is_timeout(&self) -> bool {
        self.code == TIMEOUT.code
    }
}

/// Caller bugs. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("cannot send more than one message at a time (state: {state:?})")]
    ConcurrencyViolation { state: WaitState },
    #[error("two concurrent receives for message {msg_id}")]
    ConcurrentReceive { msg_id: u64 },
    #[error("not waiting for any response")]
    NotWaiting,
    #[error("client is closed")]
    Closed,
}

#[derive(Debug)]
pub struct MalformedRequest {
    pub rpc: String,
    pub shape: Shape,
    pub body: Value,
    pub violations: Vec<Violation>,
}

#[derive(Debug)]
pub struct MalformedResponse {
    pub rpc: String,
    pub shape: Shape,
    pub request: Value,
    pub response: Value,
    pub violations: Vec<Violation>,
}

/// Problems with a typed RPC declaration, found when it is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("rpc {0} has no request shape")]
    MissingRequest(String),
    #[error("rpc {0} has no response shape")]
    MissingResponse(String),
    #[error("rpc {0}: {1} shape must be an object")]
    NotAnObject(String, &'static str),
    #[error("rpc {0}: request shape must fix `type` to a literal string")]
    UntypedRequest(String),
}

/// Failure loading [`ClientOptions`](crate::ClientOptions).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid client config: {0}")]
    Parse(#[from] toml::de::Error),
}

fn detail(body: &Option<Body>) -> String {
    match body.as_ref().and_then(Body::text) {
        Some(text) => format!(": {text}"),
        None => String::new(),
    }
}

fn summarize(violations: &[Violation]) -> String {
    let mut out = String::new();
    for (i, v) in violations.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        let _ = write!(out, "{v}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::errors::TEMPORARILY_UNAVAILABLE;

    #[test]
    fn rpc_error_display() {
        assert_eq!(RpcError::timeout().to_string(), "timeout (code 0)");

        let err = RpcError::new(TEMPORARILY_UNAVAILABLE, Some(Body::error(11, "leader moved")));
        assert_eq!(
            err.to_string(),
            "temporarily-unavailable (code 11): leader moved"
        );
    }

    #[test]
    fn fatal_kinds() {
        assert!(!Error::from(RpcError::timeout()).is_fatal());
        assert!(Error::from(UsageError::NotWaiting).is_fatal());
        assert!(!Error::from(NetError::Transport("down".into())).is_fatal());
    }

    #[test]
    fn timeout_is_indefinite() {
        let err = RpcError::timeout();
        assert!(err.is_timeout());
        assert!(!err.definite);
        assert_eq!(err.name, "timeout");
    }
}
