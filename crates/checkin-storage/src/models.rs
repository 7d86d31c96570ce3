//! Row types for the `staff` and `attendance_events` tables.
//!
//! Rows hold the raw column values; conversion into the domain types
//! re-validates identifiers so a corrupt row surfaces as
//! [`StorageError::Validation`] instead of reaching the matcher.

use crate::error::{StorageError, StorageResult};
use checkin_core::{AttendanceEvent, IdentityCode, StaffId, StaffRecord};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// One row of the `staff` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StaffRow {
    pub id: String,
    pub identity_code: String,
    pub display_name: String,
    pub active: bool,
    pub group_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<StaffRow> for StaffRecord {
    type Error = StorageError;

    fn try_from(row: StaffRow) -> StorageResult<Self> {
        Ok(StaffRecord {
            id: StaffId::new(row.id)?,
            identity_code: IdentityCode::new(row.identity_code)?,
            display_name: row.display_name,
            active: row.active,
            group: row.group_name,
        })
    }
}

/// One row of the `attendance_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: String,
    pub staff_id: String,
    pub event_date: NaiveDate,
    pub time_of_day: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AttendanceRow> for AttendanceEvent {
    type Error = StorageError;

    fn try_from(row: AttendanceRow) -> StorageResult<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| StorageError::Validation(format!("attendance id {}: {}", row.id, e)))?;

        Ok(AttendanceEvent {
            id,
            staff_id: StaffId::new(row.staff_id)?,
            date: row.event_date,
            time_of_day: row.time_of_day,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff_row(code: &str) -> StaffRow {
        StaffRow {
            id: "T1".to_string(),
            identity_code: code.to_string(),
            display_name: "Ana Souza".to_string(),
            active: true,
            group_name: Some("Primary".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_staff_row_conversion() {
        let record = StaffRecord::try_from(staff_row("DED-123")).unwrap();
        assert_eq!(record.id.as_str(), "T1");
        assert!(record.identity_code.matches("DED-123"));
        assert_eq!(record.group.as_deref(), Some("Primary"));
    }

    #[test]
    fn test_staff_row_with_empty_code_is_rejected() {
        let result = StaffRecord::try_from(staff_row(""));
        assert!(matches!(result, Err(StorageError::Validation(_))));
    }

    #[test]
    fn test_attendance_row_with_bad_uuid_is_rejected() {
        let row = AttendanceRow {
            id: "not-a-uuid".to_string(),
            staff_id: "T1".to_string(),
            event_date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            time_of_day: "08:15:00".to_string(),
            created_at: Utc::now(),
        };
        assert!(matches!(
            AttendanceEvent::try_from(row),
            Err(StorageError::Validation(_))
        ));
    }
}
