#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::AttendanceRow;
use crate::traits::AttendanceRecorder;
use checkin_core::{AttendanceEvent, StaffId};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::info;

/// Repository trait for attendance event storage and reporting.
///
/// Events are write-once: there is no update or delete.
pub trait AttendanceRepository: Send + Sync {
    async fn insert(&self, event: &AttendanceEvent) -> StorageResult<()>;

    /// Events of one calendar day, in check-in order.
    async fn find_by_date(&self, date: NaiveDate) -> StorageResult<Vec<AttendanceEvent>>;

    /// Most recent events of one staff member.
    async fn find_by_staff(
        &self,
        staff_id: &StaffId,
        limit: i64,
    ) -> StorageResult<Vec<AttendanceEvent>>;

    async fn count_by_date(&self, date: NaiveDate) -> StorageResult<i64>;
}

/// SQLite implementation of [`AttendanceRepository`] and [`AttendanceRecorder`]
#[derive(Debug, Clone)]
pub struct SqliteAttendanceRepository {
    pool: SqlitePool,
}

impl SqliteAttendanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AttendanceRepository for SqliteAttendanceRepository {
    async fn insert(&self, event: &AttendanceEvent) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO attendance_events (id, staff_id, event_date, time_of_day, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(event.staff_id.as_str())
        .bind(event.date)
        .bind(&event.time_of_day)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_date(&self, date: NaiveDate) -> StorageResult<Vec<AttendanceEvent>> {
        sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, staff_id, event_date, time_of_day, created_at
            FROM attendance_events
            WHERE event_date = ?
            ORDER BY created_at, rowid
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(AttendanceEvent::try_from)
        .collect()
    }

    async fn find_by_staff(
        &self,
        staff_id: &StaffId,
        limit: i64,
    ) -> StorageResult<Vec<AttendanceEvent>> {
        sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, staff_id, event_date, time_of_day, created_at
            FROM attendance_events
            WHERE staff_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(staff_id.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(AttendanceEvent::try_from)
        .collect()
    }

    async fn count_by_date(&self, date: NaiveDate) -> StorageResult<i64> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM attendance_events WHERE event_date = ?")
                .bind(date)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }
}

impl AttendanceRecorder for SqliteAttendanceRepository {
    async fn record_attendance(&self, staff_id: &StaffId) -> StorageResult<AttendanceEvent> {
        let event = AttendanceEvent::now(staff_id.clone());
        self.insert(&event).await?;
        info!(
            "Stored attendance {} for {} on {} at {}",
            event.id, event.staff_id, event.date, event.time_of_day
        );
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use crate::error::StorageError;
    use crate::repositories::StaffRepository;
    use checkin_core::{IdentityCode, StaffRecord};
    use chrono::{Local, TimeZone};

    async fn setup_with_staff(ids: &[&str]) -> (Database, SqliteAttendanceRepository) {
        let db = Database::in_memory().await.unwrap();
        let staff = db.staff();
        for id in ids {
            let record = StaffRecord::new(
                StaffId::new(*id).unwrap(),
                IdentityCode::new(format!("CODE-{}", id)).unwrap(),
                format!("Staff {}", id),
            );
            staff.upsert(&record).await.unwrap();
        }
        let repo = db.attendance();
        (db, repo)
    }

    fn event_at(id: &str, day: u32, hour: u32) -> AttendanceEvent {
        let at = Local.with_ymd_and_hms(2026, 10, day, hour, 5, 0).unwrap();
        AttendanceEvent::at(StaffId::new(id).unwrap(), at)
    }

    #[tokio::test]
    async fn test_record_attendance() {
        let (_db, repo) = setup_with_staff(&["T1"]).await;
        let id = StaffId::new("T1").unwrap();

        let event = repo.record_attendance(&id).await.unwrap();

        let stored = repo.find_by_staff(&id, 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, event.id);
        assert_eq!(stored[0].time_of_day, event.time_of_day);
    }

    #[tokio::test]
    async fn test_record_for_unknown_staff_fails() {
        let (_db, repo) = setup_with_staff(&[]).await;
        let result = repo.record_attendance(&StaffId::new("ghost").unwrap()).await;
        assert!(matches!(result, Err(StorageError::Database(_))));
    }

    #[tokio::test]
    async fn test_find_and_count_by_date() {
        let (_db, repo) = setup_with_staff(&["T1", "T2"]).await;
        repo.insert(&event_at("T1", 15, 8)).await.unwrap();
        repo.insert(&event_at("T2", 16, 9)).await.unwrap();
        repo.insert(&event_at("T1", 16, 7)).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let events = repo.find_by_date(day).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].time_of_day, "07:05:00");
        assert_eq!(events[1].time_of_day, "09:05:00");
        assert_eq!(repo.count_by_date(day).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_by_staff_limit() {
        let (_db, repo) = setup_with_staff(&["T1"]).await;
        for day in 10..15 {
            repo.insert(&event_at("T1", day, 8)).await.unwrap();
        }

        let recent = repo
            .find_by_staff(&StaffId::new("T1").unwrap(), 2)
            .await
            .unwrap();

        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].date, NaiveDate::from_ymd_opt(2026, 10, 14).unwrap());
    }
}
