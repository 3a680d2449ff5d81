//! Network transport.
//!
//! The client only needs four primitives from a transport: register and
//! deregister a node, enqueue a message, and wait (bounded) for the next
//! message addressed to a node. [`MemNetwork`] implements them in-process.

use crate::{Message, NodeId};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Transport failures. These propagate through the client unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("node already registered: {0}")]
    DuplicateNode(NodeId),
    #[error("transport error: {0}")]
    Transport(String),
}

/// A shared message transport.
pub trait Network: Send + Sync {
    /// Allocate the next value of the transport-wide node counter.
    fn next_node_index(&self) -> u64;

    /// Register an addressable node. Ids must be unique.
    fn add_node(&self, id: &NodeId) -> Result<(), NetError>;

    /// Deregister a node; later deliveries to it fail.
    fn remove_node(&self, id: &NodeId);

    /// Enqueue a fully addressed message for delivery.
    fn send(&self, message: Message) -> Result<(), NetError>;

    /// Wait up to `timeout` for the next message addressed to `id`.
    ///
    /// Returns `Ok(None)` if the timeout elapses first. Repeated calls with
    /// shrinking timeouts never lose buffered messages. A timeout too large
    /// to form a deadline, such as `Duration::MAX`, waits indefinitely.
    fn recv(&self, id: &NodeId, timeout: Duration) -> Result<Option<Message>, NetError>;
}

#[derive(Default)]
struct Inboxes {
    queues: HashMap<NodeId, VecDeque<Message>>,
    journal: Option<Vec<Message>>,
}

/// In-process transport with one FIFO inbox per node.
#[derive(Default)]
pub struct MemNetwork {
    next_index: AtomicU64,
    inner: Mutex<Inboxes>,
    arrived: Condvar,
}

impl MemNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// A network that also records every successfully sent message.
    pub fn with_journal() -> Self {
        let net = Self::default();
        net.inner.lock().journal = Some(Vec::new());
        net
    }

    /// Messages sent so far, in send order. Empty unless journaling.
    pub fn sent(&self) -> Vec<Message> {
        self.inner.lock().journal.clone().unwrap_or_default()
    }

    pub fn is_registered(&self, id: &NodeId) -> bool {
        self.inner.lock().queues.contains_key(id)
    }

    /// Number of messages waiting in a node's inbox.
    pub fn pending(&self, id: &NodeId) -> usize {
        self.inner.lock().queues.get(id).map_or(0, VecDeque::len)
    }
}

impl Network for MemNetwork {
    fn next_node_index(&self) -> u64 {
        self.next_index.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn add_node(&self, id: &NodeId) -> Result<(), NetError> {
        let mut inner = self.inner.lock();
        if inner.queues.contains_key(id) {
            return Err(NetError::DuplicateNode(id.clone()));
        }
        inner.queues.insert(id.clone(), VecDeque::new());
        tracing::debug!("node {} joined", id);
        Ok(())
    }

    fn remove_node(&self, id: &NodeId) {
        if self.inner.lock().queues.remove(id).is_some() {
            tracing::debug!("node {} left", id);
        }
        self.arrived.notify_all();
    }

    fn send(&self, message: Message) -> Result<(), NetError> {
        let mut inner = self.inner.lock();
        let Inboxes { queues, journal } = &mut *inner;
        let queue = queues
            .get_mut(&message.dest)
            .ok_or_else(|| NetError::UnknownNode(message.dest.clone()))?;
        if let Some(journal) = journal {
            journal.push(message.clone());
        }
        queue.push_back(message);
        drop(inner);
        self.arrived.notify_all();
        Ok(())
    }

    fn recv(&self, id: &NodeId, timeout: Duration) -> Result<Option<Message>, NetError> {
        // Too far out to represent means no deadline at all.
        let deadline = Instant::now().checked_add(timeout);
        let mut inner = self.inner.lock();
        loop {
            let queue = inner
                .queues
                .get_mut(id)
                .ok_or_else(|| NetError::UnknownNode(id.clone()))?;
            if let Some(message) = queue.pop_front() {
                return Ok(Some(message));
            }
            let Some(deadline) = deadline else {
                self.arrived.wait(&mut inner);
                continue;
            };
            if self.arrived.wait_until(&mut inner, deadline).timed_out() {
                // One last look: a send may have landed as the wait expired.
                return Ok(inner.queues.get_mut(id).and_then(VecDeque::pop_front));
            }
        }
    }
}
