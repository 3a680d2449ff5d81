//! The single-slot in-flight guard.
//!
//! A client may have at most one request outstanding. The slot is a single
//! mutex-protected cell updated only through compare-and-set, so two threads
//! racing on one client cannot both win a transition.

use parking_lot::Mutex;

/// Where a client is in its send/receive cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// Free to send.
    Idle,
    /// A request with this `msg_id` is awaiting its reply.
    Waiting(u64),
    /// Terminal.
    Closed,
}

/// The single in-flight slot a client's send and receive contend for.
#[derive(Debug)]
pub struct InFlight {
    state: Mutex<WaitState>,
}

impl InFlight {
    /// An idle slot.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(WaitState::Idle),
        }
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> WaitState {
        *self.state.lock()
    }

    /// Move from `expected` to `new`. On mismatch nothing changes and the
    /// observed state is returned.
    pub fn compare_and_set(&self, expected: WaitState, new: WaitState) -> Result<(), WaitState> {
        let mut state = self.state.lock();
        if *state != expected {
            return Err(*state);
        }
        *state = new;
        Ok(())
    }

    /// Unconditionally enter [`WaitState::Closed`], returning the prior state.
    pub fn close(&self) -> WaitState {
        std::mem::replace(&mut *self.state.lock(), WaitState::Closed)
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn send_receive_cycle() {
        let guard = InFlight::new();
        assert_eq!(guard.state(), WaitState::Idle);

        guard
            .compare_and_set(WaitState::Idle, WaitState::Waiting(1))
            .unwrap();
        assert_eq!(
            guard.compare_and_set(WaitState::Idle, WaitState::Waiting(2)),
            Err(WaitState::Waiting(1))
        );

        guard
            .compare_and_set(WaitState::Waiting(1), WaitState::Idle)
            .unwrap();
        assert_eq!(guard.state(), WaitState::Idle);
    }

    #[test]
    fn second_release_is_rejected() {
        let guard = InFlight::new();
        guard
            .compare_and_set(WaitState::Idle, WaitState::Waiting(3))
            .unwrap();
        guard
            .compare_and_set(WaitState::Waiting(3), WaitState::Idle)
            .unwrap();
        assert_eq!(
            guard.compare_and_set(WaitState::Waiting(3), WaitState::Idle),
            Err(WaitState::Idle)
        );
    }

    #[test]
    fn close_is_terminal() {
        let guard = InFlight::new();
        guard
            .compare_and_set(WaitState::Idle, WaitState::Waiting(5))
            .unwrap();
        assert_eq!(guard.close(), WaitState::Waiting(5));
        assert_eq!(
            guard.compare_and_set(WaitState::Waiting(5), WaitState::Idle),
            Err(WaitState::Closed)
        );
        assert_eq!(guard.close(), WaitState::Closed);
    }

    #[test]
    fn racing_acquires_have_one_winner() {
        let guard = Arc::new(InFlight::new());
        let wins = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let guard = guard.clone();
                let wins = wins.clone();
                thread::spawn(move || {
                    if guard
                        .compare_and_set(WaitState::Idle, WaitState::Waiting(i))
                        .is_ok()
                    {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert!(matches!(guard.state(), WaitState::Waiting(_)));
    }
}
