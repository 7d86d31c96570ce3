//! Roster matching.
//!
//! Matching is a linear scan over the active roster: exact, case-sensitive
//! equality of the scanned text with an identity code, first match in
//! collection order wins. Inactive records never match, even when a roster
//! source hands them over.

use std::time::Duration;

use checkin_core::StaffRecord;
use checkin_storage::{RosterSource, StorageResult};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// First active record whose identity code equals `scanned`.
pub fn match_staff<'a>(roster: &'a [StaffRecord], scanned: &str) -> Option<&'a StaffRecord> {
    roster
        .iter()
        .find(|staff| staff.active && staff.identity_code.matches(scanned))
}

/// Roster snapshot with a time-to-live.
///
/// With a zero ttl every lookup fetches a fresh roster. With a non-zero ttl
/// the snapshot is reused until it expires, and a miss against a cached
/// snapshot triggers exactly one refetch before the code is rejected, so a
/// badge added since the last fetch is still recognized.
#[derive(Debug)]
pub struct RosterCache<R> {
    source: R,
    ttl: Duration,
    snapshot: Mutex<Option<Snapshot>>,
}

#[derive(Debug)]
struct Snapshot {
    staff: Vec<StaffRecord>,
    fetched_at: Instant,
}

impl<R: RosterSource> RosterCache<R> {
    pub fn new(source: R, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            snapshot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    /// Look up `scanned` against the roster.
    ///
    /// # Errors
    ///
    /// Returns the roster source error; a failed fetch leaves any previous
    /// snapshot in place.
    pub async fn lookup(&self, scanned: &str) -> StorageResult<Option<StaffRecord>> {
        if self.ttl.is_zero() {
            let staff = self.source.list_active_staff().await?;
            return Ok(match_staff(&staff, scanned).cloned());
        }

        let mut snapshot = self.snapshot.lock().await;

        if let Some(cached) = snapshot.as_ref().filter(|s| s.fetched_at.elapsed() < self.ttl) {
            if let Some(found) = match_staff(&cached.staff, scanned) {
                return Ok(Some(found.clone()));
            }
            debug!("Cached roster miss, refetching once");
        }

        let staff = self.source.list_active_staff().await?;
        let found = match_staff(&staff, scanned).cloned();
        *snapshot = Some(Snapshot {
            staff,
            fetched_at: Instant::now(),
        });
        Ok(found)
    }

    /// Drop the cached snapshot so the next lookup fetches.
    pub async fn invalidate(&self) {
        *self.snapshot.lock().await = None;
    }
}
