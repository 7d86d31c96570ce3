//! Roster and attendance storage for the chapel check-in terminal.
//!
//! The terminal depends on two collaborator traits only:
//!
//! - [`RosterSource`] - the current list of active staff
//! - [`AttendanceRecorder`] - the durable attendance log
//!
//! Two adapter families implement them:
//!
//! - [`memory`] - in-memory stores with fault, latency and write-gate
//!   injection, for tests and demo runs
//! - [`repositories`] - SQLite repositories on a [`Database`] pool, with
//!   embedded migrations
//!
//! # Examples
//!
//! ```no_run
//! use checkin_storage::{AttendanceRecorder, Database, RosterSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::in_memory().await?;
//! let roster = db.staff();
//! let attendance = db.attendance();
//!
//! for staff in roster.list_active_staff().await? {
//!     if staff.identity_code.matches("DED-123") {
//!         let event = attendance.record_attendance(&staff.id).await?;
//!         println!("{} checked in at {}", staff.display_name, event.time_of_day);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Ordering
//!
//! Staff listings are returned in insertion (rowid) order. Matching takes
//! the first record with an equal code, so that order is part of the
//! contract.

pub mod connection;
pub mod error;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod traits;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use memory::{InMemoryAttendance, InMemoryRoster};
pub use repositories::{
    AttendanceRepository, SqliteAttendanceRepository, SqliteStaffRepository, StaffRepository,
};
pub use traits::{AttendanceRecorder, RosterSource};
