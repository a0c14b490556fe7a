//! Handlers for the recognized commands

use super::HandlerContext;
use crate::event::{CheckinEvent, EnrollEvent, RemoveEvent};
use crate::notify::StoreChange;
use crate::store::{CheckinRecord, EmployeeRecord, EmployeeUpdate, StoreError, CHECKIN_STATUS};
use tracing::{debug, info, warn};

/// Handle `log` - append one check-in record
pub async fn handle_checkin(
    ctx: &HandlerContext<'_>,
    event: &CheckinEvent,
) -> Result<(), StoreError> {
    let record = CheckinRecord {
        device_id: event.device_id.clone(),
        employee_id: event.employee_id.clone(),
        employee_name: event.employee_name.clone(),
        timestamp: event.timestamp,
        face_base64: event.face_base64.clone(),
        status: CHECKIN_STATUS.into(),
    };

    ctx.checkins.insert_checkin(record).await?;

    info!(
        employee_id = %event.employee_id,
        device_id = %event.device_id,
        timestamp = event.timestamp,
        "check-in recorded"
    );
    ctx.notifier.notify(StoreChange::CheckinRecorded {
        device_id: event.device_id.clone(),
        employee_id: event.employee_id.clone(),
    });
    Ok(())
}

/// Handle `add_employee` - update a known employee in place, insert an
/// unseen one with the event timestamp as its registration date
pub async fn handle_enroll(
    ctx: &HandlerContext<'_>,
    event: &EnrollEvent,
) -> Result<(), StoreError> {
    let existing = ctx.employees.find_employee(&event.employee_id).await?;

    if existing.is_some() {
        let update = EmployeeUpdate {
            full_name: event.employee_name.clone(),
            face_embedding: event.face_embedding.clone(),
            face_base64: event.face_base64.clone(),
        };
        ctx.employees.update_employee(&event.employee_id, update).await?;

        info!(employee_id = %event.employee_id, "employee re-enrolled, record updated");
        ctx.notifier.notify(StoreChange::EmployeeUpdated {
            employee_id: event.employee_id.clone(),
        });
    } else {
        let record = EmployeeRecord {
            employee_id: event.employee_id.clone(),
            full_name: event.employee_name.clone(),
            face_embedding: event.face_embedding.clone(),
            face_base64: event.face_base64.clone(),
            registration_date: event.timestamp,
        };
        ctx.employees.insert_employee(record).await?;

        info!(employee_id = %event.employee_id, "employee enrolled");
        ctx.notifier.notify(StoreChange::EmployeeEnrolled {
            employee_id: event.employee_id.clone(),
        });
    }

    Ok(())
}

/// Handle `delete_employee` - remove the record if it exists.
///
/// Deletes from the bus are honored without checking the originating
/// device's identity (trusted-bus assumption), so each one is logged at warn.
pub async fn handle_remove(
    ctx: &HandlerContext<'_>,
    event: &RemoveEvent,
) -> Result<(), StoreError> {
    let removed = ctx.employees.delete_employee(&event.employee_id).await?;

    if removed {
        warn!(employee_id = %event.employee_id, "employee removed by device request");
        ctx.notifier.notify(StoreChange::EmployeeRemoved {
            employee_id: event.employee_id.clone(),
        });
    } else {
        debug!(employee_id = %event.employee_id, "delete for unknown employee ignored");
    }

    Ok(())
}
