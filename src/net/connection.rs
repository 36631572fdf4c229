//! Per-listener bookkeeping for raw stream connections.
//!
//! Every accepted stream holds a [`ConnectionGuard`] for its whole life. The
//! listener's [`ConnectionTracker`] sees the live count through a `watch`
//! channel, which lets shutdown wait for the count to reach zero.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use crate::net::transport::Transport;
use crate::observability::metrics;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Identifier attached to a connection's tracing span, e.g. `tls-42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    transport: Transport,
    sequence: u64,
}

impl ConnectionId {
    fn next(transport: Transport) -> Self {
        Self {
            transport,
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.transport, self.sequence)
    }
}

/// Live connection count of one raw listener.
#[derive(Debug)]
pub struct ConnectionTracker {
    transport: Transport,
    live: watch::Sender<usize>,
}

impl ConnectionTracker {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            live: watch::Sender::new(0),
        }
    }

    /// Register an accepted stream. The count drops when the guard does.
    pub fn track(&self) -> ConnectionGuard {
        self.live.send_modify(|n| *n += 1);
        metrics::connection_opened(self.transport);
        ConnectionGuard {
            id: ConnectionId::next(self.transport),
            live: self.live.clone(),
        }
    }

    pub fn active_count(&self) -> usize {
        *self.live.borrow()
    }

    /// Wait for every tracked stream to finish, at most `grace`.
    ///
    /// Returns how many were still open when the wait ended.
    pub async fn wait_idle(&self, grace: Duration) -> usize {
        let mut rx = self.live.subscribe();
        let _ = tokio::time::timeout(grace, rx.wait_for(|n| *n == 0)).await;
        self.active_count()
    }
}

/// Held by a connection task; releases its slot in the count on drop.
#[derive(Debug)]
pub struct ConnectionGuard {
    id: ConnectionId,
    live: watch::Sender<usize>,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.live.send_modify(|n| *n = n.saturating_sub(1));
        metrics::connection_closed(self.id.transport);
        tracing::trace!(connection = %self.id, "Connection released");
    }
}
