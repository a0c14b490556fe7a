//! Command dispatch - routes one decoded event to exactly one handler

mod handlers;
mod queue;

pub use queue::DispatchQueue;

use crate::event::DeviceEvent;
use crate::notify::Notifier;
use crate::store::{CheckinStore, EmployeeStore};
use std::sync::Arc;
use tracing::error;

/// Stores and fan-out a handler works against
pub struct HandlerContext<'a> {
    pub employees: &'a dyn EmployeeStore,
    pub checkins: &'a dyn CheckinStore,
    pub notifier: &'a Notifier,
}

/// Routes decoded events to their handlers
pub struct Dispatcher {
    employees: Arc<dyn EmployeeStore>,
    checkins: Arc<dyn CheckinStore>,
    notifier: Notifier,
}

impl Dispatcher {
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        checkins: Arc<dyn CheckinStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            employees,
            checkins,
            notifier,
        }
    }

    /// Process one event. A store failure is terminal for this event only:
    /// it is logged and swallowed, never propagated to the relay loop.
    pub async fn dispatch(&self, event: DeviceEvent) {
        let ctx = HandlerContext {
            employees: self.employees.as_ref(),
            checkins: self.checkins.as_ref(),
            notifier: &self.notifier,
        };

        let outcome = match &event {
            DeviceEvent::Checkin(ev) => handlers::handle_checkin(&ctx, ev).await,
            DeviceEvent::Enroll(ev) => handlers::handle_enroll(&ctx, ev).await,
            DeviceEvent::Remove(ev) => handlers::handle_remove(&ctx, ev).await,
        };

        if let Err(e) = outcome {
            error!(
                cmd = event.cmd(),
                employee_id = %event.employee_id(),
                error = %e,
                "handler failed, event dropped"
            );
        }
    }
}
