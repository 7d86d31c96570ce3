#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::StaffRow;
use crate::traits::RosterSource;
use checkin_core::{StaffId, StaffRecord};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;

/// Repository trait for staff roster maintenance.
///
/// The terminal itself only needs [`RosterSource`]; the write side is used
/// by the operator console to set up and retire badges.
pub trait StaffRepository: Send + Sync {
    /// Insert a staff member, or update every field of an existing one.
    ///
    /// Updating keeps the record's position in collection order.
    async fn upsert(&self, record: &StaffRecord) -> StorageResult<()>;

    async fn find_by_id(&self, id: &StaffId) -> StorageResult<Option<StaffRecord>>;

    /// Every staff member, active or not, in collection order.
    async fn list_all(&self) -> StorageResult<Vec<StaffRecord>>;

    /// Mark a staff member inactive so their badge stops matching.
    async fn deactivate(&self, id: &StaffId) -> StorageResult<()>;
}

/// SQLite implementation of [`StaffRepository`] and [`RosterSource`]
#[derive(Debug, Clone)]
pub struct SqliteStaffRepository {
    pool: SqlitePool,
}

impl SqliteStaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_rows(&self, active_only: bool) -> StorageResult<Vec<StaffRow>> {
        let rows = sqlx::query_as::<_, StaffRow>(
            r#"
            SELECT id, identity_code, display_name, active, group_name, created_at
            FROM staff
            WHERE active = 1 OR ? = 0
            ORDER BY rowid
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

impl StaffRepository for SqliteStaffRepository {
    async fn upsert(&self, record: &StaffRecord) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO staff (id, identity_code, display_name, active, group_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                identity_code = excluded.identity_code,
                display_name = excluded.display_name,
                active = excluded.active,
                group_name = excluded.group_name
            "#,
        )
        .bind(record.id.as_str())
        .bind(record.identity_code.as_str())
        .bind(&record.display_name)
        .bind(record.active)
        .bind(&record.group)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &StaffId) -> StorageResult<Option<StaffRecord>> {
        let row = sqlx::query_as::<_, StaffRow>(
            r#"
            SELECT id, identity_code, display_name, active, group_name, created_at
            FROM staff
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(StaffRecord::try_from).transpose()
    }

    async fn list_all(&self) -> StorageResult<Vec<StaffRecord>> {
        self.fetch_rows(false)
            .await?
            .into_iter()
            .map(StaffRecord::try_from)
            .collect()
    }

    async fn deactivate(&self, id: &StaffId) -> StorageResult<()> {
        let result = sqlx::query("UPDATE staff SET active = 0 WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::staff_not_found(id.as_str()));
        }
        Ok(())
    }
}

impl RosterSource for SqliteStaffRepository {
    async fn list_active_staff(&self) -> StorageResult<Vec<StaffRecord>> {
        let rows = self.fetch_rows(true).await?;

        // One corrupt row must not take the whole kiosk down.
        let mut staff = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match StaffRecord::try_from(row) {
                Ok(record) => staff.push(record),
                Err(e) => warn!("Skipping unreadable staff row {}: {}", id, e),
            }
        }
        Ok(staff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use checkin_core::IdentityCode;

    fn record(id: &str, code: &str) -> StaffRecord {
        StaffRecord::new(
            StaffId::new(id).unwrap(),
            IdentityCode::new(code).unwrap(),
            format!("Staff {}", id),
        )
    }

    async fn setup() -> (Database, SqliteStaffRepository) {
        let db = Database::in_memory().await.unwrap();
        let repo = db.staff();
        (db, repo)
    }

    #[tokio::test]
    async fn test_upsert_and_find() {
        let (_db, repo) = setup().await;
        repo.upsert(&record("T1", "DED-123").with_group("Nursery"))
            .await
            .unwrap();

        let found = repo
            .find_by_id(&StaffId::new("T1").unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.display_name, "Staff T1");
        assert_eq!(found.group.as_deref(), Some("Nursery"));
        assert!(found.active);
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let (_db, repo) = setup().await;
        let found = repo.find_by_id(&StaffId::new("nobody").unwrap()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_upsert_updates_in_place() {
        let (_db, repo) = setup().await;
        repo.upsert(&record("T1", "OLD")).await.unwrap();
        repo.upsert(&record("T2", "OTHER")).await.unwrap();
        repo.upsert(&record("T1", "NEW")).await.unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id.as_str(), "T1");
        assert!(all[0].identity_code.matches("NEW"));
    }

    #[tokio::test]
    async fn test_list_active_excludes_inactive() {
        let (_db, repo) = setup().await;
        repo.upsert(&record("T1", "DED-123")).await.unwrap();
        repo.upsert(&record("T2", "DED-999").inactive()).await.unwrap();

        let active = repo.list_active_staff().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id.as_str(), "T1");

        assert_eq!(repo.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deactivate() {
        let (_db, repo) = setup().await;
        let id = StaffId::new("T1").unwrap();
        repo.upsert(&record("T1", "DED-123")).await.unwrap();

        repo.deactivate(&id).await.unwrap();

        assert!(repo.list_active_staff().await.unwrap().is_empty());
        assert!(!repo.find_by_id(&id).await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn test_deactivate_unknown_staff() {
        let (_db, repo) = setup().await;
        let result = repo.deactivate(&StaffId::new("ghost").unwrap()).await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_corrupt_row_is_skipped_by_roster() {
        let (db, repo) = setup().await;
        repo.upsert(&record("T1", "DED-123")).await.unwrap();
        sqlx::query(
            "INSERT INTO staff (id, identity_code, display_name, active, created_at) VALUES ('BAD', '', 'Broken', 1, ?)",
        )
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

        let active = repo.list_active_staff().await.unwrap();
        assert_eq!(active.len(), 1);
        assert!(repo.list_all().await.is_err());
    }
}
