//! Blocking RPC client for tether test harnesses.
//!
//! A [`Client`] impersonates a node on a shared [`Network`](tether_core::Network),
//! sends one request at a time and blocks for the correlated reply. On top of
//! that sit [`Client::rpc`], which classifies `error` replies, and
//! [`TypedRpc`], which validates both ends of a call against declared shapes.
//!
//! A client never retries. Timeouts and error replies come back as
//! [`Error::Rpc`]; misuse (overlapping requests, receiving with nothing
//! outstanding) comes back as [`Error::Usage`].

mod client;
mod error;
mod guard;
mod messenger;
mod options;
mod registry;
mod rpc;
mod shape;
mod typed;

pub use client::Client;
pub use error::{
    ConfigError, DefinitionError, Error, MalformedRequest, MalformedResponse, Result, RpcError,
    UsageError,
};
pub use guard::{InFlight, WaitState};
pub use options::{ClientOptions, DEFAULT_TIMEOUT};
pub use registry::{RpcDefinition, RpcRegistry};
pub use shape::{Field, ObjectShape, Shape, Validator, Violation};
pub use typed::{TypedRpc, TypedRpcBuilder};
