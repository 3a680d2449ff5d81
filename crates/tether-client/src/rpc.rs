//! Untyped request/reply with error classification.

use crate::client::Client;
use crate::error::{Result, RpcError};
use std::time::Duration;
use tether_core::errors::UNKNOWN;
use tether_core::{Body, ErrorSpec, Message, NodeId};

impl Client {
    /// Turn an `error` reply into a classified [`RpcError`]; pass any other
    /// message through untouched.
    ///
    /// Codes missing from this client's table are reported as `unknown` and
    /// indefinite.
    pub fn check_error(&self, message: Message) -> std::result::Result<Message, RpcError> {
        if !message.body.is_error() {
            return Ok(message);
        }
        let spec = match message.body.code() {
            Some(code) => self.errors.classify(code),
            None => {
                // Absent or not an integer; there is nothing to look up.
                if let Some(raw) = message.body.get("code") {
                    tracing::warn!(raw_code = %raw, src = %message.src, "non-integer error code");
                }
                ErrorSpec::unknown(-1)
            }
        };
        if spec.name == UNKNOWN {
            tracing::warn!(code = spec.code, src = %message.src, "unrecognized error code");
        }
        Err(RpcError::new(spec, Some(message.body)))
    }

    /// Send `body` to `dest` and return the reply body, using the client's
    /// default timeout.
    pub fn rpc(&self, dest: &NodeId, body: Body) -> Result<Body> {
        self.rpc_timeout(dest, body, self.default_timeout)
    }

    /// Send `body` to `dest` and return the reply body, failing with a
    /// timeout after `timeout`. Error replies become [`RpcError`]s.
    pub fn rpc_timeout(&self, dest: &NodeId, body: Body, timeout: Duration) -> Result<Body> {
        let reply = self.send_recv_timeout(dest, body, timeout)?;
        Ok(self.check_error(reply)?.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientOptions, Error};
    use std::sync::Arc;
    use tether_core::{MemNetwork, Network};

    fn client() -> Client {
        Client::open(Arc::new(MemNetwork::new()), ClientOptions::default()).unwrap()
    }

    fn error_reply(client: &Client, code: Option<i64>) -> Message {
        let mut body = Body::new("error");
        if let Some(code) = code {
            body.insert("code", code);
        }
        body.set_in_reply_to(1);
        Message::new(NodeId::server(1), client.node_id().clone(), body)
    }

    #[test]
    fn non_errors_pass_through() {
        let client = client();
        let mut body = Body::new("read_ok");
        body.insert("value", 3);
        let msg = Message::new(NodeId::server(1), client.node_id().clone(), body);
        assert_eq!(client.check_error(msg.clone()), Ok(msg));
    }

    #[test]
    fn known_code_is_classified() {
        let client = client();
        let err = client.check_error(error_reply(&client, Some(11))).unwrap_err();
        assert_eq!(err.code, 11);
        assert_eq!(err.name, "temporarily-unavailable");
        assert!(err.definite);
        assert_eq!(err.body.unwrap().code(), Some(11));
    }

    #[test]
    fn unknown_code_is_indefinite() {
        let client = client();
        let err = client.check_error(error_reply(&client, Some(99))).unwrap_err();
        assert_eq!(err.code, 99);
        assert_eq!(err.name, "unknown");
        assert!(!err.definite);
    }

    #[test]
    fn missing_code_is_unknown() {
        let client = client();
        let err = client.check_error(error_reply(&client, None)).unwrap_err();
        assert_eq!(err.name, "unknown");
        assert!(!err.definite);
    }

    #[test]
    fn non_integer_code_is_unknown() {
        let client = client();
        for raw in [serde_json::json!("11"), serde_json::json!(11.5)] {
            let mut msg = error_reply(&client, None);
            msg.body.insert("code", raw);
            let err = client.check_error(msg).unwrap_err();
            assert_eq!(err.code, -1);
            assert_eq!(err.name, "unknown");
            assert!(!err.definite);
        }
    }

    #[test]
    fn client_overrides_apply() {
        let net = Arc::new(MemNetwork::new());
        let client = Client::open(
            net,
            ClientOptions::default().with_error(ErrorSpec::new(99, "overloaded", true)),
        )
        .unwrap();
        let err = client.check_error(error_reply(&client, Some(99))).unwrap_err();
        assert_eq!(err.name, "overloaded");
        assert!(err.definite);
    }

    #[test]
    fn rpc_times_out_without_peer() {
        let net = Arc::new(MemNetwork::new());
        let server = NodeId::server(1);
        net.add_node(&server).unwrap();
        let client = Client::open(net, ClientOptions::default()).unwrap();

        let err = client
            .rpc_timeout(&server, Body::new("ping"), Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, Error::Rpc(ref e) if e.is_timeout()));
    }
}
