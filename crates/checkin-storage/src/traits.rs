//! Collaborator contracts consumed by the check-in terminal.
//!
//! The terminal runs each verification on a spawned task, so the returned
//! futures must be `Send`. The methods are declared as `fn -> impl Future +
//! Send`; implementors still write them as plain `async fn`.

use crate::error::StorageResult;
use checkin_core::{AttendanceEvent, StaffId, StaffRecord};
use std::future::Future;
use std::sync::Arc;

/// Read-only source of the active staff roster.
pub trait RosterSource: Send + Sync {
    /// Current active staff, in collection order.
    ///
    /// Matching is done client-side against the full list, so the order is
    /// significant: the first record with a matching code wins.
    fn list_active_staff(&self) -> impl Future<Output = StorageResult<Vec<StaffRecord>>> + Send;
}

/// Durable store of attendance events.
pub trait AttendanceRecorder: Send + Sync {
    /// Persist one attendance event for `staff_id` and return it.
    ///
    /// Callers invoke this exactly once per successful match.
    fn record_attendance(
        &self,
        staff_id: &StaffId,
    ) -> impl Future<Output = StorageResult<AttendanceEvent>> + Send;
}

impl<T: RosterSource> RosterSource for Arc<T> {
    fn list_active_staff(&self) -> impl Future<Output = StorageResult<Vec<StaffRecord>>> + Send {
        self.as_ref().list_active_staff()
    }
}

impl<T: AttendanceRecorder> AttendanceRecorder for Arc<T> {
    fn record_attendance(
        &self,
        staff_id: &StaffId,
    ) -> impl Future<Output = StorageResult<AttendanceEvent>> + Send {
        self.as_ref().record_attendance(staff_id)
    }
}
