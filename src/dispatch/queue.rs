//! Per-employee serial dispatch lanes
//!
//! Events are distributed over a fixed set of worker lanes by hashing the
//! employee id, so two events for the same employee always land on the same
//! lane and execute in arrival order. Events for different employees may
//! interleave freely. This closes the lookup-then-insert race that an
//! unserialized `add_employee` replay would otherwise hit.

use super::Dispatcher;
use crate::event::DeviceEvent;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

pub struct DispatchQueue {
    lanes: Vec<mpsc::Sender<DeviceEvent>>,
    workers: Vec<JoinHandle<()>>,
}

impl DispatchQueue {
    /// Spawn `lanes` worker tasks draining into the dispatcher
    pub fn new(dispatcher: Dispatcher, lanes: usize, capacity: usize) -> Self {
        let dispatcher = Arc::new(dispatcher);
        let lanes = lanes.max(1);

        let mut senders = Vec::with_capacity(lanes);
        let mut workers = Vec::with_capacity(lanes);

        for lane in 0..lanes {
            let (tx, mut rx) = mpsc::channel::<DeviceEvent>(capacity.max(1));
            let dispatcher = dispatcher.clone();

            workers.push(tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    dispatcher.dispatch(event).await;
                }
                debug!(lane, "dispatch lane drained");
            }));
            senders.push(tx);
        }

        Self {
            lanes: senders,
            workers,
        }
    }

    /// Queue one event onto the lane owning its employee id
    pub async fn enqueue(&self, event: DeviceEvent) {
        let lane = lane_for(event.employee_id(), self.lanes.len());
        if self.lanes[lane].send(event).await.is_err() {
            error!(lane, "dispatch lane closed, event dropped");
        }
    }

    /// Close all lanes and wait for queued events to finish
    pub async fn shutdown(self) {
        drop(self.lanes);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

fn lane_for(employee_id: &str, lanes: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    employee_id.hash(&mut hasher);
    (hasher.finish() % lanes as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CheckinEvent, EnrollEvent, RemoveEvent};
    use crate::notify::Notifier;
    use crate::store::{EmployeeStore, MemoryStore};

    fn queue_over(store: Arc<MemoryStore>, lanes: usize) -> DispatchQueue {
        let dispatcher = Dispatcher::new(store.clone(), store, Notifier::new(16));
        DispatchQueue::new(dispatcher, lanes, 64)
    }

    #[test]
    fn same_key_always_maps_to_same_lane() {
        for lanes in [1, 2, 4, 7] {
            let first = lane_for("E1", lanes);
            assert!(first < lanes);
            assert_eq!(first, lane_for("E1", lanes));
        }
    }

    #[tokio::test]
    async fn enroll_then_remove_ends_absent() {
        let store = Arc::new(MemoryStore::new());
        let queue = queue_over(store.clone(), 4);

        // Tight enroll/remove pairs for the same id must never leave a record
        for i in 0..50 {
            queue
                .enqueue(DeviceEvent::Enroll(EnrollEvent {
                    device_id: None,
                    employee_id: "E1".into(),
                    employee_name: format!("Alice {}", i),
                    timestamp: 1700000000 + i,
                    face_embedding: vec![0.1],
                    face_base64: None,
                }))
                .await;
            queue
                .enqueue(DeviceEvent::Remove(RemoveEvent { employee_id: "E1".into() }))
                .await;
        }
        queue.shutdown().await;

        assert!(store.find_employee("E1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn same_employee_checkins_keep_arrival_order() {
        let store = Arc::new(MemoryStore::new());
        let queue = queue_over(store.clone(), 4);

        for i in 0..20 {
            queue
                .enqueue(DeviceEvent::Checkin(CheckinEvent {
                    device_id: "D1".into(),
                    employee_id: "E1".into(),
                    employee_name: "Alice".into(),
                    timestamp: i,
                    face_base64: None,
                }))
                .await;
        }
        queue.shutdown().await;

        let timestamps: Vec<i64> = store.checkins().await.iter().map(|c| c.timestamp).collect();
        assert_eq!(timestamps, (0..20).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn single_lane_still_processes_everything() {
        let store = Arc::new(MemoryStore::new());
        let queue = queue_over(store.clone(), 1);

        for id in ["E1", "E2", "E3"] {
            queue
                .enqueue(DeviceEvent::Enroll(EnrollEvent {
                    device_id: None,
                    employee_id: id.into(),
                    employee_name: id.into(),
                    timestamp: 1700000000,
                    face_embedding: vec![],
                    face_base64: None,
                }))
                .await;
        }
        queue.shutdown().await;

        assert_eq!(store.employee_count().await, 3);
    }
}
