//! In-memory store backend

use super::{
    CheckinRecord, CheckinStore, EmployeeRecord, EmployeeStore, EmployeeUpdate, StoreError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Map-backed store used when the relay runs without an external database
/// and as the store double in tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    employees: RwLock<HashMap<String, EmployeeRecord>>,
    checkins: RwLock<Vec<CheckinRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all check-ins in insertion order
    pub async fn checkins(&self) -> Vec<CheckinRecord> {
        self.checkins.read().await.clone()
    }

    pub async fn employee_count(&self) -> usize {
        self.employees.read().await.len()
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn find_employee(
        &self,
        employee_id: &str,
    ) -> Result<Option<EmployeeRecord>, StoreError> {
        Ok(self.employees.read().await.get(employee_id).cloned())
    }

    async fn insert_employee(&self, record: EmployeeRecord) -> Result<(), StoreError> {
        let mut employees = self.employees.write().await;
        if employees.contains_key(&record.employee_id) {
            return Err(StoreError::DuplicateId(record.employee_id));
        }
        employees.insert(record.employee_id.clone(), record);
        Ok(())
    }

    async fn update_employee(
        &self,
        employee_id: &str,
        update: EmployeeUpdate,
    ) -> Result<bool, StoreError> {
        let mut employees = self.employees.write().await;
        match employees.get_mut(employee_id) {
            Some(record) => {
                record.full_name = update.full_name;
                record.face_embedding = update.face_embedding;
                record.face_base64 = update.face_base64;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_employee(&self, employee_id: &str) -> Result<bool, StoreError> {
        Ok(self.employees.write().await.remove(employee_id).is_some())
    }
}

#[async_trait]
impl CheckinStore for MemoryStore {
    async fn insert_checkin(&self, record: CheckinRecord) -> Result<(), StoreError> {
        self.checkins.write().await.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: &str, name: &str) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.into(),
            full_name: name.into(),
            face_embedding: vec![0.5, 0.5],
            face_base64: None,
            registration_date: 1700000000,
        }
    }

    #[tokio::test]
    async fn insert_and_find() {
        let store = MemoryStore::new();
        store.insert_employee(employee("E1", "Alice")).await.unwrap();

        let found = store.find_employee("E1").await.unwrap().unwrap();
        assert_eq!(found.full_name, "Alice");
        assert!(store.find_employee("E2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = MemoryStore::new();
        store.insert_employee(employee("E1", "Alice")).await.unwrap();

        let err = store.insert_employee(employee("E1", "Alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(id) if id == "E1"));
        assert_eq!(store.employee_count().await, 1);
    }

    #[tokio::test]
    async fn update_reports_whether_a_record_matched() {
        let store = MemoryStore::new();
        store.insert_employee(employee("E1", "Alice")).await.unwrap();

        let update = EmployeeUpdate {
            full_name: "Alicia".into(),
            face_embedding: vec![0.9],
            face_base64: Some("img".into()),
        };
        assert!(store.update_employee("E1", update.clone()).await.unwrap());
        assert!(!store.update_employee("E2", update).await.unwrap());

        let record = store.find_employee("E1").await.unwrap().unwrap();
        assert_eq!(record.full_name, "Alicia");
        // Registration date survives updates
        assert_eq!(record.registration_date, 1700000000);
    }

    #[tokio::test]
    async fn delete_is_reported_once() {
        let store = MemoryStore::new();
        store.insert_employee(employee("E1", "Alice")).await.unwrap();

        assert!(store.delete_employee("E1").await.unwrap());
        assert!(!store.delete_employee("E1").await.unwrap());
    }

    #[tokio::test]
    async fn checkins_append_in_order() {
        let store = MemoryStore::new();
        for i in 0..3 {
            store
                .insert_checkin(CheckinRecord {
                    device_id: "D1".into(),
                    employee_id: "E1".into(),
                    employee_name: "Alice".into(),
                    timestamp: 1700000000 + i,
                    face_base64: None,
                    status: crate::store::CHECKIN_STATUS.into(),
                })
                .await
                .unwrap();
        }

        let checkins = store.checkins().await;
        assert_eq!(checkins.len(), 3);
        assert!(checkins.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}
