use thiserror::Error;

/// Storage-specific error types for the check-in terminal.
///
/// These errors represent failures of the roster and attendance backends.
/// The terminal treats every variant as a system error: scanning stops and
/// the operator has to retry.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Entity not found in database
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// Stored or supplied data failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend is unreachable or refused the request
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Create a not-found error for a staff member.
    pub fn staff_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "staff".to_string(),
            field: "id".to_string(),
            value: id.into(),
        }
    }
}

impl From<checkin_core::Error> for StorageError {
    fn from(err: checkin_core::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StorageError::staff_not_found("T9");
        assert_eq!(err.to_string(), "Entity not found: staff with id=T9");
    }

    #[test]
    fn test_core_error_becomes_validation() {
        let core = checkin_core::StaffId::new("").unwrap_err();
        let err = StorageError::from(core);
        assert!(matches!(err, StorageError::Validation(_)));
    }
}
