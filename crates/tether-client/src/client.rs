//! Client lifecycle.

use crate::guard::{InFlight, WaitState};
use crate::options::ClientOptions;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tether_core::{ErrorRegistry, NetError, Network, NodeId};

/// A request-originating node on a shared [`Network`].
///
/// A client holds one conversation at a time: every [`send`](Client::send)
/// must be followed by a [`recv`](Client::recv) before the next send. The
/// client is `Sync` so that misuse from several threads is detected rather
/// than corrupting state.
pub struct Client {
    pub(crate) net: Arc<dyn Network>,
    pub(crate) node_id: NodeId,
    next_msg_id: AtomicU64,
    pub(crate) waiting_for: InFlight,
    pub(crate) errors: ErrorRegistry,
    pub(crate) default_timeout: Duration,
}

impl Client {
    /// Register a fresh client node on `net`.
    pub fn open(net: Arc<dyn Network>, options: ClientOptions) -> Result<Self, NetError> {
        let node_id = NodeId::new(format!("{}{}", options.id_prefix, net.next_node_index()));
        net.add_node(&node_id)?;
        tracing::debug!("opened client {}", node_id);

        Ok(Self {
            net,
            node_id,
            next_msg_id: AtomicU64::new(0),
            waiting_for: InFlight::new(),
            errors: ErrorRegistry::common().merged(options.errors),
            default_timeout: options.default_timeout,
        })
    }

    /// Close the client and deregister its node. Later sends and receives
    /// fail with [`UsageError::Closed`](crate::UsageError::Closed).
    pub fn close(&self) {
        if self.waiting_for.close() != WaitState::Closed {
            tracing::debug!("closing client {}", self.node_id);
        }
        self.net.remove_node(&self.node_id);
    }

    /// The id this client was registered under.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Whether a request is outstanding, and for which id.
    pub fn state(&self) -> WaitState {
        self.waiting_for.state()
    }

    /// The error table replies are classified against.
    pub fn errors(&self) -> &ErrorRegistry {
        &self.errors
    }

    /// Timeout used by [`recv`](Client::recv), [`rpc`](Client::rpc) and
    /// typed calls when none is given.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Allocate a fresh, strictly increasing message id.
    pub fn next_msg_id(&self) -> u64 {
        self.next_msg_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("node_id", &self.node_id)
            .field("state", &self.state())
            .field("next_msg_id", &self.next_msg_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::MemNetwork;
    use tether_core::errors::{ErrorSpec, TEMPORARILY_UNAVAILABLE};

    #[test]
    fn open_assigns_unique_ids() {
        let net = Arc::new(MemNetwork::new());
        let a = Client::open(net.clone(), ClientOptions::default()).unwrap();
        let b = Client::open(net.clone(), ClientOptions::default()).unwrap();

        assert_eq!(a.node_id().as_str(), "c1");
        assert_eq!(b.node_id().as_str(), "c2");
        assert!(net.is_registered(a.node_id()));
        assert_eq!(a.state(), WaitState::Idle);
    }

    #[test]
    fn close_deregisters() {
        let net = Arc::new(MemNetwork::new());
        let client = Client::open(net.clone(), ClientOptions::default()).unwrap();
        client.close();
        assert_eq!(client.state(), WaitState::Closed);
        assert!(!net.is_registered(client.node_id()));

        // A second close is harmless.
        client.close();
        assert_eq!(client.state(), WaitState::Closed);
    }

    #[test]
    fn msg_ids_increase() {
        let net = Arc::new(MemNetwork::new());
        let client = Client::open(net, ClientOptions::default()).unwrap();
        let ids: Vec<u64> = (0..5).map(|_| client.next_msg_id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn error_overrides_merge() {
        let net = Arc::new(MemNetwork::new());
        let custom = ErrorSpec::new(11, "shedding-load", false);
        let client = Client::open(
            net,
            ClientOptions::default().with_error(custom.clone()),
        )
        .unwrap();

        assert_eq!(client.errors().get(11), Some(&custom));
        assert_ne!(client.errors().get(11), Some(&TEMPORARILY_UNAVAILABLE));
        assert_eq!(client.errors().len(), 4);
    }

    #[test]
    fn custom_prefix() {
        let net = Arc::new(MemNetwork::new());
        let options = ClientOptions {
            id_prefix: "client-".into(),
            ..ClientOptions::default()
        };
        let client = Client::open(net, options).unwrap();
        assert_eq!(client.node_id().as_str(), "client-1");
    }
}
