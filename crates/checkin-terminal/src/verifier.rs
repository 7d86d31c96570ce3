//! One verification: roster lookup, then attendance recording.
//!
//! The terminal runs [`Verifier::verify`] on a spawned task. The whole
//! sequence is bounded by the verification timeout; a lookup that finds
//! nothing is an ordinary outcome, while storage failures and timeouts are
//! backend errors.

use std::sync::Arc;
use std::time::Duration;

use checkin_core::{AttendanceEvent, Error, IdentityCode, Result, StaffRecord};
use checkin_storage::{AttendanceRecorder, RosterSource};
use tracing::{debug, error, info};

use crate::matcher::RosterCache;

/// Result of a verification that reached the backend (or needed not to).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// An active staff member matched and the check-in was recorded.
    Verified {
        staff: StaffRecord,
        event: AttendanceEvent,
    },

    /// Nothing matched. No store was written.
    NoMatch { code: String },
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// Matches scanned text against the roster and records attendance.
#[derive(Debug)]
pub struct Verifier<R, W> {
    roster: RosterCache<R>,
    recorder: W,
    timeout: Duration,
}

impl<R, W> Verifier<R, W>
where
    R: RosterSource,
    W: AttendanceRecorder,
{
    pub fn new(roster: RosterCache<R>, recorder: W, timeout: Duration) -> Self {
        Self {
            roster,
            recorder,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn roster(&self) -> &RosterCache<R> {
        &self.roster
    }

    /// Verify `scanned` and record attendance on a match.
    ///
    /// Recording happens at most once per call.
    ///
    /// # Errors
    ///
    /// `Error::Backend` when the roster or the recorder fails,
    /// `Error::VerificationTimeout` when the sequence exceeds the timeout.
    pub async fn verify(&self, scanned: &str) -> Result<VerificationOutcome> {
        match tokio::time::timeout(self.timeout, self.lookup_and_record(scanned)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                error!("Verification of scanned badge timed out after {}ms", timeout_ms);
                Err(Error::VerificationTimeout { timeout_ms })
            }
        }
    }

    async fn lookup_and_record(&self, scanned: &str) -> Result<VerificationOutcome> {
        let code = match IdentityCode::new(scanned) {
            Ok(code) => code,
            Err(e) => {
                debug!("Unreadable badge treated as no match: {}", e);
                return Ok(VerificationOutcome::NoMatch {
                    code: scanned.to_string(),
                });
            }
        };

        let staff = self.roster.lookup(code.as_str()).await.map_err(|e| {
            error!("Roster lookup failed: {}", e);
            Error::Backend(e.to_string())
        })?;

        let Some(staff) = staff else {
            info!("No active staff for scanned badge");
            return Ok(VerificationOutcome::NoMatch {
                code: scanned.to_string(),
            });
        };

        let event = self
            .recorder
            .record_attendance(&staff.id)
            .await
            .map_err(|e| {
                error!("Recording attendance for {} failed: {}", staff.id, e);
                Error::Backend(e.to_string())
            })?;

        info!(
            "Checked in {} ({}) at {}",
            staff.display_name, staff.id, event.time_of_day
        );
        Ok(VerificationOutcome::Verified { staff, event })
    }
}

/// Shared verifier handed to verification tasks.
pub type SharedVerifier<R, W> = Arc<Verifier<R, W>>;
