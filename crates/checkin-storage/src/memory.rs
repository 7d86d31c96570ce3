//! In-memory roster and attendance stores.
//!
//! Used by tests and by the operator console when no database is configured.
//! Both stores are cheap to clone; clones share state, so a test can keep
//! one copy for inspection and hand another to the terminal.
//!
//! Fault injection: every store can be told to fail with
//! [`StorageError::Unavailable`], to delay each call, and (attendance only)
//! to hold writes behind a semaphore until the test releases them.

use crate::error::{StorageError, StorageResult};
use crate::traits::{AttendanceRecorder, RosterSource};
use checkin_core::{AttendanceEvent, StaffId, StaffRecord};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

#[derive(Debug, Default)]
struct RosterState {
    staff: Vec<StaffRecord>,
    failure: Option<String>,
    latency: Option<Duration>,
    fetches: u64,
}

/// Roster held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoster {
    state: Arc<Mutex<RosterState>>,
}

impl InMemoryRoster {
    /// Create a roster with the given records, in collection order.
    ///
    /// Inactive records are kept and filtered out on every fetch.
    pub fn new(staff: Vec<StaffRecord>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RosterState {
                staff,
                ..RosterState::default()
            })),
        }
    }

    /// Delay every fetch by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().latency = Some(latency);
        self
    }

    /// Append a record at the end of the collection.
    pub fn push(&self, record: StaffRecord) {
        self.state.lock().staff.push(record);
    }

    /// Replace the whole collection.
    pub fn replace(&self, staff: Vec<StaffRecord>) {
        self.state.lock().staff = staff;
    }

    /// Make subsequent fetches fail (`Some`) or succeed again (`None`).
    pub fn set_failure(&self, message: Option<&str>) {
        self.state.lock().failure = message.map(str::to_string);
    }

    /// Number of fetches served or refused so far.
    pub fn fetch_count(&self) -> u64 {
        self.state.lock().fetches
    }
}

impl RosterSource for InMemoryRoster {
    async fn list_active_staff(&self) -> StorageResult<Vec<StaffRecord>> {
        let latency = {
            let mut state = self.state.lock();
            state.fetches += 1;
            state.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let state = self.state.lock();
        if let Some(message) = &state.failure {
            return Err(StorageError::Unavailable(message.clone()));
        }

        Ok(state.staff.iter().filter(|s| s.active).cloned().collect())
    }
}

#[derive(Debug, Default)]
struct AttendanceState {
    events: Vec<AttendanceEvent>,
    failure: Option<String>,
    latency: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
    attempts: u64,
}

/// Attendance log held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttendance {
    state: Arc<Mutex<AttendanceState>>,
}

impl InMemoryAttendance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every write by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().latency = Some(latency);
        self
    }

    /// Hold every write until a permit is available on `gate`.
    ///
    /// Each write consumes one permit; a closed semaphore fails the write.
    pub fn with_gate(self, gate: Arc<Semaphore>) -> Self {
        self.state.lock().gate = Some(gate);
        self
    }

    /// Make subsequent writes fail (`Some`) or succeed again (`None`).
    pub fn set_failure(&self, message: Option<&str>) {
        self.state.lock().failure = message.map(str::to_string);
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> Vec<AttendanceEvent> {
        self.state.lock().events.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of events recorded for one staff member.
    pub fn count_for(&self, staff_id: &StaffId) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|e| &e.staff_id == staff_id)
            .count()
    }

    /// Number of write calls, including failed ones.
    pub fn attempts(&self) -> u64 {
        self.state.lock().attempts
    }
}

impl AttendanceRecorder for InMemoryAttendance {
    async fn record_attendance(&self, staff_id: &StaffId) -> StorageResult<AttendanceEvent> {
        let (latency, gate) = {
            let mut state = self.state.lock();
            state.attempts += 1;
            (state.latency, state.gate.clone())
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(gate) = gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| StorageError::Unavailable("attendance gate closed".to_string()))?;
            permit.forget();
        }

        let mut state = self.state.lock();
        if let Some(message) = &state.failure {
            return Err(StorageError::Unavailable(message.clone()));
        }

        let event = AttendanceEvent::now(staff_id.clone());
        debug!("Recorded attendance {} for {}", event.id, staff_id);
        state.events.push(event.clone());
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkin_core::IdentityCode;

    fn staff(id: &str, code: &str) -> StaffRecord {
        StaffRecord::new(
            StaffId::new(id).unwrap(),
            IdentityCode::new(code).unwrap(),
            format!("Staff {}", id),
        )
    }

    #[tokio::test]
    async fn test_roster_filters_inactive() {
        let roster = InMemoryRoster::new(vec![
            staff("T1", "DED-123"),
            staff("T2", "DED-999").inactive(),
        ]);

        let active = roster.list_active_staff().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id.as_str(), "T1");
        assert_eq!(roster.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_roster_keeps_collection_order() {
        let roster = InMemoryRoster::default();
        roster.push(staff("B", "X"));
        roster.push(staff("A", "X"));

        let active = roster.list_active_staff().await.unwrap();
        let ids: Vec<_> = active.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn test_roster_failure_injection() {
        let roster = InMemoryRoster::new(vec![staff("T1", "DED-123")]);
        roster.set_failure(Some("network down"));

        let result = roster.list_active_staff().await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));

        roster.set_failure(None);
        assert!(roster.list_active_staff().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_roster_latency() {
        let roster = InMemoryRoster::default().with_latency(Duration::from_secs(3));
        let start = tokio::time::Instant::now();

        roster.list_active_staff().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_attendance_records_event() {
        let store = InMemoryAttendance::new();
        let id = StaffId::new("T1").unwrap();

        let event = store.record_attendance(&id).await.unwrap();

        assert_eq!(event.staff_id, id);
        assert_eq!(store.events(), vec![event]);
        assert_eq!(store.count_for(&id), 1);
    }

    #[tokio::test]
    async fn test_attendance_failure_records_nothing() {
        let store = InMemoryAttendance::new();
        store.set_failure(Some("write rejected"));

        let result = store.record_attendance(&StaffId::new("T1").unwrap()).await;

        assert!(result.is_err());
        assert!(store.is_empty());
        assert_eq!(store.attempts(), 1);
    }

    #[tokio::test]
    async fn test_attendance_gate_holds_writes() {
        let gate = Arc::new(Semaphore::new(0));
        let store = InMemoryAttendance::new().with_gate(Arc::clone(&gate));
        let writer = store.clone();

        let task = tokio::spawn(async move {
            writer
                .record_attendance(&StaffId::new("T1").unwrap())
                .await
        });

        tokio::task::yield_now().await;
        assert!(store.is_empty());

        gate.add_permits(1);
        task.await.unwrap().unwrap();
        assert_eq!(store.len(), 1);
    }
}
