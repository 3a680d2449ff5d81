//! Typed RPCs: named call sites with validated request and response shapes.
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use tether_client::{Client, ClientOptions, Shape, TypedRpc};
//! use tether_core::{Body, MemNetwork, NodeId};
//!
//! let echo = TypedRpc::builder("echo")
//!     .doc("Returns the message it was sent.")
//!     .request(Shape::object().required("type", Shape::literal("echo")).required("msg", Shape::String))
//!     .response(Shape::object().required("type", Shape::literal("echo_ok")).required("msg", Shape::String))
//!     .build()?;
//!
//! let client = Client::open(Arc::new(MemNetwork::new()), ClientOptions::default())?;
//! let mut body = Body::default();
//! body.insert("msg", "hi");
//! let reply = echo.call(&client, &NodeId::server(1), body)?;
//! assert_eq!(reply.get("msg"), Some(&json!("hi")));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::client::Client;
use crate::error::{DefinitionError, Error, MalformedRequest, MalformedResponse, Result};
use crate::registry::{RpcDefinition, RpcRegistry};
use crate::shape::{ObjectShape, Shape, Validator, Violation};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tether_core::{Body, NodeId};

/// Declares a [`TypedRpc`].
#[derive(Debug)]
pub struct TypedRpcBuilder<'r> {
    name: String,
    doc: String,
    request: Option<Shape>,
    response: Option<Shape>,
    registry: Option<&'r RpcRegistry>,
}

impl<'r> TypedRpcBuilder<'r> {
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// The request body shape. Must fix `type` to a literal string.
    pub fn request(mut self, shape: impl Into<Shape>) -> Self {
        self.request = Some(shape.into());
        self
    }

    /// The reply body shape. `msg_id` and `in_reply_to` need not be declared.
    pub fn response(mut self, shape: impl Into<Shape>) -> Self {
        self.response = Some(shape.into());
        self
    }

    /// Record the definition here instead of [`RpcRegistry::global`].
    pub fn registry(mut self, registry: &'r RpcRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Do not record the definition anywhere.
    pub fn unregistered(mut self) -> Self {
        self.registry = None;
        self
    }

    /// Check the shapes, compile both validators and register the
    /// definition.
    pub fn build(self) -> std::result::Result<TypedRpc, DefinitionError> {
        let name = self.name;
        let request = self
            .request
            .ok_or_else(|| DefinitionError::MissingRequest(name.clone()))?;
        let response = self
            .response
            .ok_or_else(|| DefinitionError::MissingResponse(name.clone()))?;

        let request_object = request
            .as_object()
            .ok_or_else(|| DefinitionError::NotAnObject(name.clone(), "request"))?;
        let response_object = response
            .as_object()
            .ok_or_else(|| DefinitionError::NotAnObject(name.clone(), "response"))?;
        let kind = type_tag(request_object)
            .ok_or_else(|| DefinitionError::UntypedRequest(name.clone()))?
            .to_string();

        let outgoing = Validator::new(
            &request_object
                .clone()
                .required("msg_id", Shape::Int)
                .into(),
        );
        let incoming = Validator::new(
            &response_object
                .clone()
                .optional("msg_id", Shape::Int)
                .required("in_reply_to", Shape::Int)
                .into(),
        );

        let definition = RpcDefinition {
            name,
            doc: self.doc,
            kind,
            request,
            response,
        };
        let definition = match self.registry {
            Some(registry) => registry.register(definition),
            None => Arc::new(definition),
        };
        tracing::debug!(rpc = %definition.name, kind = %definition.kind, "defined rpc");

        Ok(TypedRpc {
            definition,
            outgoing,
            incoming,
        })
    }
}

fn type_tag(object: &ObjectShape) -> Option<&str> {
    let field = object.field("type").filter(|f| f.required)?;
    match &field.shape {
        Shape::Literal { value } => value.as_str(),
        _ => None,
    }
}

/// A reusable, validated call site for one RPC.
///
/// Cheap to share: validators are compiled once by the builder.
#[derive(Debug, Clone)]
pub struct TypedRpc {
    definition: Arc<RpcDefinition>,
    outgoing: Validator,
    incoming: Validator,
}

impl TypedRpc {
    pub fn builder<'r>(name: impl Into<String>) -> TypedRpcBuilder<'r> {
        TypedRpcBuilder {
            name: name.into(),
            doc: String::new(),
            request: None,
            response: None,
            registry: Some(RpcRegistry::global()),
        }
    }

    /// The name given to [`TypedRpc::builder`].
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// The `type` stamped on every request.
    pub fn kind(&self) -> &str {
        &self.definition.kind
    }

    /// The recorded definition, shared with the registry.
    pub fn definition(&self) -> &Arc<RpcDefinition> {
        &self.definition
    }

    /// Call with the client's default timeout.
    pub fn call(&self, client: &Client, dest: &NodeId, body: Body) -> Result<Body> {
        self.call_timeout(client, dest, body, client.default_timeout())
    }

    /// Stamp `type` and a fresh `msg_id` onto `body`, validate it, perform
    /// the RPC and validate the reply.
    pub fn call_timeout(
        &self,
        client: &Client,
        dest: &NodeId,
        mut body: Body,
        timeout: Duration,
    ) -> Result<Body> {
        body.set_kind(self.kind());
        body.set_msg_id(client.next_msg_id());

        let request = body.clone().into_value();
        let violations = self.outgoing.validate(&request);
        if !violations.is_empty() {
            return Err(Error::MalformedRequest(Box::new(MalformedRequest {
                rpc: self.definition.name.clone(),
                shape: self.definition.request.clone(),
                body: request,
                violations,
            })));
        }

        let reply = client.rpc_timeout(dest, body, timeout)?;

        let response = reply.clone().into_value();
        let violations = self.incoming.validate(&response);
        if !violations.is_empty() {
            return Err(Error::MalformedResponse(Box::new(MalformedResponse {
                rpc: self.definition.name.clone(),
                shape: self.definition.response.clone(),
                request,
                response,
                violations,
            })));
        }
        Ok(reply)
    }

    /// Call with serde types on both ends. The request must serialize to a
    /// JSON object; its `type` and `msg_id` are filled in.
    pub fn call_as<Req, Resp>(&self, client: &Client, dest: &NodeId, request: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let value = serde_json::to_value(request)?;
        let Some(body) = Body::from_value(value.clone()) else {
            return Err(Error::MalformedRequest(Box::new(MalformedRequest {
                rpc: self.definition.name.clone(),
                shape: self.definition.request.clone(),
                body: value,
                violations: vec![Violation {
                    path: "$".into(),
                    problem: "request must serialize to an object".into(),
                }],
            })));
        };
        let reply = self.call(client, dest, body)?;
        Ok(serde_json::from_value(reply.into_value())?)
    }
}
