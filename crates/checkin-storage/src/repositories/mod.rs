pub mod attendance;
pub mod staff;

pub use attendance::{AttendanceRepository, SqliteAttendanceRepository};
pub use staff::{SqliteStaffRepository, StaffRepository};
