//! Protocol messages.
//!
//! A message is an envelope (`src`, `dest`) around a JSON object body.
//! The body always carries a `type` tag; requests carry a `msg_id` and
//! replies carry the `in_reply_to` of the request they answer.

use crate::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body `type` used by error replies.
pub const ERROR_KIND: &str = "error";

/// An addressed message on the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub src: NodeId,
    pub dest: NodeId,
    pub body: Body,
}

impl Message {
    pub fn new(src: NodeId, dest: NodeId, body: Body) -> Self {
        Self { src, dest, body }
    }

    /// Build a reply to this message, addressed back to its sender.
    pub fn reply(&self, body: Body) -> Self {
        Self {
            src: self.dest.clone(),
            dest: self.src.clone(),
            body,
        }
    }
}

/// A message body: a JSON object with a few well-known fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Body(Map<String, Value>);

impl Body {
    /// An empty body of the given type.
    pub fn new(kind: impl Into<String>) -> Self {
        let mut body = Self::default();
        body.set_kind(kind);
        body
    }

    /// A reply skeleton answering `request`.
    pub fn reply_to(request: &Body, kind: impl Into<String>) -> Self {
        let mut body = Self::new(kind);
        if let Some(id) = request.msg_id() {
            body.set_in_reply_to(id);
        }
        body
    }

    /// An error body with the given code and human-readable text.
    pub fn error(code: i64, text: impl Into<String>) -> Self {
        let mut body = Self::new(ERROR_KIND);
        body.insert("code", code);
        body.insert("text", Value::String(text.into()));
        body
    }

    /// Wrap an arbitrary JSON value; `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn msg_id(&self) -> Option<u64> {
        self.0.get("msg_id").and_then(Value::as_u64)
    }

    pub fn in_reply_to(&self) -> Option<u64> {
        self.0.get("in_reply_to").and_then(Value::as_u64)
    }

    pub fn code(&self) -> Option<i64> {
        self.0.get("code").and_then(Value::as_i64)
    }

    pub fn text(&self) -> Option<&str> {
        self.0.get("text").and_then(Value::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.kind() == Some(ERROR_KIND)
    }

    pub fn set_kind(&mut self, kind: impl Into<String>) {
        self.0.insert("type".into(), Value::String(kind.into()));
    }

    pub fn set_msg_id(&mut self, id: u64) {
        self.0.insert("msg_id".into(), id.into());
    }

    pub fn set_in_reply_to(&mut self, id: u64) {
        self.0.insert("in_reply_to".into(), id.into());
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Body {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Body> for Value {
    fn from(body: Body) -> Self {
        body.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape() {
        let mut body = Body::new("echo");
        body.set_msg_id(4);
        body.insert("msg", "hi");
        let msg = Message::new(NodeId::client(1), NodeId::server(1), body);

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({"src": "c1", "dest": "n1", "body": {"type": "echo", "msg_id": 4, "msg": "hi"}})
        );
    }

    #[test]
    fn reply_correlates() {
        let mut req = Body::new("read");
        req.set_msg_id(9);
        let request = Message::new(NodeId::client(2), NodeId::server(1), req);

        let reply = request.reply(Body::reply_to(&request.body, "read_ok"));
        assert_eq!(reply.src, NodeId::server(1));
        assert_eq!(reply.dest, NodeId::client(2));
        assert_eq!(reply.body.in_reply_to(), Some(9));
        assert_eq!(reply.body.kind(), Some("read_ok"));
    }

    #[test]
    fn error_body() {
        let body = Body::error(11, "busy");
        assert!(body.is_error());
        assert_eq!(body.code(), Some(11));
        assert_eq!(body.text(), Some("busy"));
    }

    #[test]
    fn non_object_is_not_a_body() {
        assert!(Body::from_value(json!([1, 2])).is_none());
        assert!(Body::from_value(json!({"type": "x"})).is_some());
    }
}
