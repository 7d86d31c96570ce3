//! Integration tests for the SQLite roster and attendance stores.
//!
//! Run with: cargo test --package checkin-storage --test integration_database

use checkin_core::{IdentityCode, StaffId, StaffRecord};
use checkin_storage::{
    AttendanceRecorder, AttendanceRepository, Database, DatabaseConfig, RosterSource,
    StaffRepository,
};
use chrono::Local;
use rstest::rstest;
use tokio::task::JoinSet;

fn staff(id: &str, code: &str) -> StaffRecord {
    StaffRecord::new(
        StaffId::new(id).unwrap(),
        IdentityCode::new(code).unwrap(),
        format!("Staff {}", id),
    )
}

#[tokio::test]
async fn test_in_memory_database() {
    let db = Database::in_memory().await.unwrap();
    db.health_check().await.unwrap();
    db.close().await;
}

#[rstest]
#[case("staff")]
#[case("attendance_events")]
#[tokio::test]
async fn test_migration_idempotency(#[case] table: &str) {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?")
            .bind(table)
            .fetch_one(db.pool())
            .await
            .unwrap();

    assert_eq!(result.0, 1);
    db.close().await;
}

#[tokio::test]
async fn test_first_match_follows_insertion_order() {
    let db = Database::in_memory().await.unwrap();
    let roster = db.staff();

    roster.upsert(&staff("Z9", "SHARED")).await.unwrap();
    roster.upsert(&staff("A1", "SHARED")).await.unwrap();

    let active = roster.list_active_staff().await.unwrap();
    let first = active
        .iter()
        .find(|s| s.identity_code.matches("SHARED"))
        .unwrap();

    assert_eq!(first.id.as_str(), "Z9");
}

#[tokio::test]
async fn test_concurrent_check_ins_are_all_recorded() {
    let db = Database::in_memory().await.unwrap();
    let roster = db.staff();

    const STAFF_COUNT: usize = 8;
    for i in 0..STAFF_COUNT {
        roster
            .upsert(&staff(&format!("T{}", i), &format!("CODE-{}", i)))
            .await
            .unwrap();
    }

    let mut tasks = JoinSet::new();
    for i in 0..STAFF_COUNT {
        let recorder = db.attendance();
        tasks.spawn(async move {
            recorder
                .record_attendance(&StaffId::new(format!("T{}", i)).unwrap())
                .await
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let today = Local::now().date_naive();
    let count = db.attendance().count_by_date(today).await.unwrap();
    assert_eq!(count, STAFF_COUNT as i64);

    db.close().await;
}

#[tokio::test]
async fn test_file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kiosk.db");
    let config = DatabaseConfig::new(path.to_string_lossy()).min_connections(0);

    {
        let db = Database::new(config.clone()).await.unwrap();
        db.staff().upsert(&staff("T1", "DED-123")).await.unwrap();
        db.attendance()
            .record_attendance(&StaffId::new("T1").unwrap())
            .await
            .unwrap();
        db.close().await;
    }

    let db = Database::new(config).await.unwrap();
    let staff = db.staff().list_all().await.unwrap();
    assert_eq!(staff.len(), 1);

    let events = db
        .attendance()
        .find_by_staff(&StaffId::new("T1").unwrap(), 10)
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    db.close().await;
}
