//! Core types and traits for tether.
//!
//! This crate provides the protocol primitives: node identities, the message
//! envelope, the error code table and the transport trait. The blocking
//! request/reply machinery lives in `tether-client`.

pub mod errors;
mod message;
mod net;
mod node;

pub use errors::{ErrorRegistry, ErrorSpec};
pub use message::{Body, ERROR_KIND, Message};
pub use net::{MemNetwork, NetError, Network};
pub use node::{NodeId, NodeIdParseError};
