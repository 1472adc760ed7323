//! Which socket holds which seat.
//!
//! The registry lock is held across every operation that changes who owns a
//! seat (claim, kick, release on close) and across host edits, so a seat can
//! not change hands between a permission check and the edit it guards.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, MutexGuard, oneshot};
use uuid::Uuid;

/// Identifies one WebSocket connection
pub type ConnectionId = Uuid;

#[derive(Debug)]
struct SeatLease {
    connection: ConnectionId,
    kick: oneshot::Sender<()>,
}

/// Seat leases, keyed by slot index
#[derive(Debug, Default)]
pub struct SeatTable {
    leases: HashMap<usize, SeatLease>,
}

impl SeatTable {
    /// Record that `connection` now holds seat `index`.
    ///
    /// The returned receiver fires when the host kicks the connection.
    pub fn lease(&mut self, index: usize, connection: ConnectionId) -> oneshot::Receiver<()> {
        let (kick, kicked) = oneshot::channel();
        if let Some(stale) = self.leases.insert(index, SeatLease { connection, kick }) {
            log::warn!(
                "Seat {} was still leased to {}, replacing",
                index,
                stale.connection
            );
        }
        kicked
    }

    pub fn holds(&self, index: usize, connection: ConnectionId) -> bool {
        self.leases
            .get(&index)
            .is_some_and(|lease| lease.connection == connection)
    }

    /// Drop the lease if `connection` still holds it
    pub fn release(&mut self, index: usize, connection: ConnectionId) -> bool {
        if self.holds(index, connection) {
            self.leases.remove(&index);
            true
        } else {
            false
        }
    }

    /// Drop the lease on seat `index` and signal its connection.
    ///
    /// Returns the kicked connection, if any.
    pub fn kick(&mut self, index: usize) -> Option<ConnectionId> {
        let lease = self.leases.remove(&index)?;
        // The socket may already be closing
        let _ = lease.kick.send(());
        Some(lease.connection)
    }

    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}

/// Shared handle to the seat table
#[derive(Debug, Clone, Default)]
pub struct SeatRegistry {
    table: Arc<Mutex<SeatTable>>,
}

impl SeatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> MutexGuard<'_, SeatTable> {
        self.table.lock().await
    }

    /// Number of seats held by live sockets
    pub async fn connected(&self) -> usize {
        self.table.lock().await.len()
    }
}
