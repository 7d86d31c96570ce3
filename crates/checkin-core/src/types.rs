use crate::{
    Result,
    constants::{MAX_IDENTITY_CODE_LENGTH, TIME_OF_DAY_FORMAT},
    error::Error,
};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Staff member identifier as assigned by the roster store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(String);

impl StaffId {
    /// Create a staff id.
    ///
    /// # Errors
    /// Returns `Error::InvalidStaffId` if the id is empty or only whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidStaffId("staff id must not be empty".to_string()));
        }
        Ok(StaffId(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for StaffId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        StaffId::new(s)
    }
}

/// Opaque identity code printed on a staff badge.
///
/// Codes are compared exactly: no trimming, no case folding. A scanned
/// `ded-123` does not match a badge issued as `DED-123`.
///
/// # Security
/// Equality is constant-time so the comparison loop does not leak how much
/// of a guessed code matched.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityCode(String);

impl IdentityCode {
    /// Create an identity code with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentityCode` if the code is empty or longer
    /// than `MAX_IDENTITY_CODE_LENGTH` characters.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();

        if code.is_empty() {
            return Err(Error::InvalidIdentityCode("code is empty".to_string()));
        }

        let len = code.chars().count();
        if len > MAX_IDENTITY_CODE_LENGTH {
            return Err(Error::InvalidIdentityCode(format!(
                "code must be at most {MAX_IDENTITY_CODE_LENGTH} chars, got {len}"
            )));
        }

        Ok(IdentityCode(code))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against raw scanned text.
    #[must_use]
    pub fn matches(&self, scanned: &str) -> bool {
        self.0.as_bytes().ct_eq(scanned.as_bytes()).into()
    }
}

impl PartialEq for IdentityCode {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other.as_str())
    }
}

impl std::hash::Hash for IdentityCode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for IdentityCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for IdentityCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        IdentityCode::new(value)
    }
}

impl From<IdentityCode> for String {
    fn from(code: IdentityCode) -> Self {
        code.0
    }
}

impl std::str::FromStr for IdentityCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        IdentityCode::new(s)
    }
}

/// A staff member as seen by the terminal.
///
/// Owned by the roster store; the terminal only reads it for the duration
/// of one verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffRecord {
    pub id: StaffId,
    pub identity_code: IdentityCode,
    pub display_name: String,
    pub active: bool,
    /// Class or ministry group the staff member is assigned to.
    pub group: Option<String>,
}

impl StaffRecord {
    pub fn new(id: StaffId, identity_code: IdentityCode, display_name: impl Into<String>) -> Self {
        Self {
            id,
            identity_code,
            display_name: display_name.into(),
            active: true,
            group: None,
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// One recorded check-in.
///
/// Created exactly once per successful match and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    pub id: Uuid,
    pub staff_id: StaffId,
    /// Calendar date of the check-in in terminal local time.
    pub date: NaiveDate,
    /// Time of day in terminal local time, `HH:MM:SS`.
    pub time_of_day: String,
    pub created_at: DateTime<Utc>,
}

impl AttendanceEvent {
    /// Build an event for a check-in happening at `at`.
    pub fn at(staff_id: StaffId, at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            staff_id,
            date: at.date_naive(),
            time_of_day: at.format(TIME_OF_DAY_FORMAT).to_string(),
            created_at: at.with_timezone(&Utc),
        }
    }

    /// Build an event for a check-in happening now.
    pub fn now(staff_id: StaffId) -> Self {
        Self::at(staff_id, Local::now())
    }
}

/// Identifier of one camera session (one open→close lifetime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(id: u64) -> Self {
        SessionId(id)
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The id following this one.
    #[must_use]
    pub fn next(&self) -> Self {
        SessionId(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Text decoded from one camera frame.
///
/// Ephemeral: produced by the capture loop, consumed once by the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub text: String,
    pub session: SessionId,
    pub captured_at: Instant,
}

impl ScanEvent {
    pub fn new(session: SessionId, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session,
            captured_at: Instant::now(),
        }
    }

    /// Parse the decoded text as an identity code.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentityCode` for text that cannot be a badge.
    pub fn identity_code(&self) -> Result<IdentityCode> {
        IdentityCode::new(self.text.clone())
    }
}
