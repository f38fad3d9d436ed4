//! Connection state machine.

use std::sync::atomic::{AtomicU32, Ordering};

/// State of the publisher connection.
///
/// Idle → Connecting → Open → Closed, with Errored reachable from
/// Connecting or Open while a transport failure is being reported. Closed is
/// terminal until a fresh `connect()` restarts the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionState {
    /// Never connected.
    Idle,
    /// Handshake in progress.
    Connecting,
    /// Connected; frames flow.
    Open,
    /// Transport failure in flight; transitions to Closed.
    Errored,
    /// Closed.
    Closed,
}

/// Atomic cell holding a [`ConnectionState`].
#[derive(Debug)]
pub(crate) struct AtomicConnectionState(AtomicU32);

impl AtomicConnectionState {
    pub(crate) const fn new(state: ConnectionState) -> Self {
        Self(AtomicU32::new(state as u32))
    }

    pub(crate) fn load(&self) -> ConnectionState {
        match self.0.load(Ordering::SeqCst) {
            0 => ConnectionState::Idle,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Open,
            3 => ConnectionState::Errored,
            _ => ConnectionState::Closed,
        }
    }

    pub(crate) fn store(&self, state: ConnectionState) {
        self.0.store(state as u32, Ordering::SeqCst);
    }

    /// Claim the Connecting state, but only from Idle or Closed.
    ///
    /// Returns false while a connection instance is already active, which is
    /// what makes `connect()` idempotent: overlapping calls cannot spawn a
    /// second socket.
    pub(crate) fn try_begin_connect(&self) -> bool {
        for from in [ConnectionState::Idle, ConnectionState::Closed] {
            if self
                .0
                .compare_exchange(
                    from as u32,
                    ConnectionState::Connecting as u32,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok()
            {
                return true;
            }
        }
        false
    }
}
