use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Scan validation errors
    #[error("Invalid identity code: {0}")]
    InvalidIdentityCode(String),

    #[error("Invalid staff id: {0}")]
    InvalidStaffId(String),

    // State machine errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Backend errors
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Verification timed out after {timeout_ms}ms")]
    VerificationTimeout { timeout_ms: u64 },

    // Device errors
    #[error("Camera error: {0}")]
    Camera(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error represents a backend (roster/recorder) failure.
    ///
    /// Backend failures stop scanning and wait for an operator retry.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::VerificationTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transition_message() {
        let error = Error::InvalidStateTransition {
            from: "Idle".to_string(),
            to: "Success".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid state transition from Idle to Success"
        );
    }

    #[test]
    fn test_backend_classification() {
        assert!(Error::Backend("roster unavailable".into()).is_backend());
        assert!(Error::VerificationTimeout { timeout_ms: 10_000 }.is_backend());
        assert!(!Error::Camera("permission denied".into()).is_backend());
        assert!(!Error::InvalidIdentityCode(String::new()).is_backend());
    }

    #[test]
    fn test_timeout_message() {
        let error = Error::VerificationTimeout { timeout_ms: 2500 };
        assert_eq!(error.to_string(), "Verification timed out after 2500ms");
    }
}
