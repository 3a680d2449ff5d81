//! Send, receive, and the deadline loop between them.

use crate::client::Client;
use crate::error::{Result, RpcError, UsageError};
use crate::guard::{InFlight, WaitState};
use std::time::{Duration, Instant};
use tether_core::{Body, Message, NodeId};

impl Client {
    /// Send `body` to `dest` and mark the client as waiting for its reply.
    ///
    /// An existing `msg_id` in the body is kept; otherwise a fresh one is
    /// allocated. Returns the id the reply must carry in `in_reply_to`.
    pub fn send(&self, dest: &NodeId, mut body: Body) -> Result<u64> {
        let msg_id = match body.msg_id() {
            Some(id) => id,
            None => self.next_msg_id(),
        };

        self.waiting_for
            .compare_and_set(WaitState::Idle, WaitState::Waiting(msg_id))
            .map_err(|state| match state {
                WaitState::Closed => UsageError::Closed,
                state => UsageError::ConcurrencyViolation { state },
            })?;

        body.set_msg_id(msg_id);
        let message = Message::new(self.node_id.clone(), dest.clone(), body);
        tracing::debug!(src = %self.node_id, dest = %dest, msg_id, "send");

        if let Err(e) = self.net.send(message) {
            // Nothing is in flight if the transport refused the message.
            let _ = self
                .waiting_for
                .compare_and_set(WaitState::Waiting(msg_id), WaitState::Idle);
            return Err(e.into());
        }
        Ok(msg_id)
    }

    /// [`recv_timeout`](Client::recv_timeout) with the client's default
    /// timeout.
    pub fn recv(&self) -> Result<Message> {
        self.recv_timeout(self.default_timeout)
    }

    /// Block until the reply to the outstanding request arrives, or fail
    /// with a timeout after `timeout`.
    ///
    /// Replies to earlier requests are discarded. The in-flight slot is
    /// released whatever the outcome.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Message> {
        let target = match self.waiting_for.state() {
            WaitState::Waiting(id) => id,
            WaitState::Idle => return Err(UsageError::NotWaiting.into()),
            WaitState::Closed => return Err(UsageError::Closed.into()),
        };

        let turn = Turn {
            guard: &self.waiting_for,
            target,
            released: false,
        };
        let reply = self.await_reply(target, timeout);
        turn.release()?;
        reply
    }

    /// [`send`](Client::send) followed by [`recv`](Client::recv).
    pub fn send_recv(&self, dest: &NodeId, body: Body) -> Result<Message> {
        self.send_recv_timeout(dest, body, self.default_timeout)
    }

    /// [`send`](Client::send) followed by
    /// [`recv_timeout`](Client::recv_timeout).
    pub fn send_recv_timeout(&self, dest: &NodeId, body: Body, timeout: Duration) -> Result<Message> {
        self.send(dest, body)?;
        self.recv_timeout(timeout)
    }

    fn await_reply(&self, target: u64, timeout: Duration) -> Result<Message> {
        // `None` when the timeout is too large to form a deadline; the
        // transport then waits without one.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let remaining = deadline.map_or(timeout, |d| d.saturating_duration_since(Instant::now()));
            let Some(message) = self.net.recv(&self.node_id, remaining)? else {
                tracing::debug!(node = %self.node_id, msg_id = target, "timed out");
                return Err(RpcError::timeout().into());
            };

            if message.body.in_reply_to() == Some(target) {
                tracing::debug!(node = %self.node_id, src = %message.src, msg_id = target, "recv");
                return Ok(message);
            }
            tracing::debug!(
                node = %self.node_id,
                in_reply_to = ?message.body.in_reply_to(),
                waiting_for = target,
                "discarding stale reply"
            );
        }
    }
}

/// Releases the in-flight slot for one receive, even when unwinding.
struct Turn<'a> {
    guard: &'a InFlight,
    target: u64,
    released: bool,
}

impl Turn<'_> {
    fn release(mut self) -> std::result::Result<(), UsageError> {
        self.released = true;
        match self
            .guard
            .compare_and_set(WaitState::Waiting(self.target), WaitState::Idle)
        {
            Ok(()) | Err(WaitState::Closed) => Ok(()),
            Err(_) => Err(UsageError::ConcurrentReceive {
                msg_id: self.target,
            }),
        }
    }
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        if !self.released {
            let _ = self
                .guard
                .compare_and_set(WaitState::Waiting(self.target), WaitState::Idle);
        }
    }
}
