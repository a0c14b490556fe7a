//! Store traits the relay mutates through
//!
//! The employee and check-in stores are owned by the surrounding system; the
//! relay only needs the five operations below. Both traits are object-safe so
//! the binary can inject whichever backend it runs against (and tests can
//! inject doubles).

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status value stamped on every check-in written by this relay
pub const CHECKIN_STATUS: &str = "checkin";

/// A registered employee, keyed uniquely by `employee_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub employee_id: String,
    pub full_name: String,
    /// Feature vector used for face matching; opaque to the relay
    pub face_embedding: Vec<f64>,
    /// Reference image
    pub face_base64: Option<String>,
    /// Unix timestamp of first registration; never overwritten by updates
    pub registration_date: i64,
}

/// Fields an `add_employee` replay overwrites on an existing record
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeUpdate {
    pub full_name: String,
    pub face_embedding: Vec<f64>,
    pub face_base64: Option<String>,
}

/// One attendance event, append-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinRecord {
    pub device_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub timestamp: i64,
    pub face_base64: Option<String>,
    pub status: String,
}

/// Errors surfaced by store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate employee id {0:?}")]
    DuplicateId(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Employee record store
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn find_employee(&self, employee_id: &str)
        -> Result<Option<EmployeeRecord>, StoreError>;

    /// Insert a new record; an existing `employee_id` is an error
    async fn insert_employee(&self, record: EmployeeRecord) -> Result<(), StoreError>;

    /// Overwrite the updatable fields of an existing record.
    /// Returns whether a record matched.
    async fn update_employee(
        &self,
        employee_id: &str,
        update: EmployeeUpdate,
    ) -> Result<bool, StoreError>;

    /// Remove a record. Returns whether a record was actually removed.
    async fn delete_employee(&self, employee_id: &str) -> Result<bool, StoreError>;
}

/// Append-only check-in store
#[async_trait]
pub trait CheckinStore: Send + Sync {
    async fn insert_checkin(&self, record: CheckinRecord) -> Result<(), StoreError>;
}
