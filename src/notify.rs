//! Store change fan-out for dashboard push
//!
//! The relay announces every successful mutation on a broadcast channel; the
//! surrounding system forwards these to connected dashboard clients. Nothing
//! here is required for the relay's own correctness, and a notification that
//! nobody is listening for is simply discarded.

use tokio::sync::broadcast;

/// One store mutation that downstream clients may care about
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    CheckinRecorded {
        device_id: String,
        employee_id: String,
    },
    EmployeeEnrolled {
        employee_id: String,
    },
    EmployeeUpdated {
        employee_id: String,
    },
    EmployeeRemoved {
        employee_id: String,
    },
}

/// Broadcast sender for store changes
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<StoreChange>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.tx.subscribe()
    }

    /// Publish a change; no subscribers is not an error
    pub fn notify(&self, change: StoreChange) {
        let _ = self.tx.send(change);
    }
}
