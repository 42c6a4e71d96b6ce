//! Error types and result handling for storage and domain operations.
//!
//! Every backend translates its native failures into `CoreError` so callers
//! can tell "not there" and "already there" apart from infrastructure
//! failures without knowing which store is configured.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for domain and storage operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Constraint violation, typically a duplicate conversation id.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The hosted store answered with an error or could not be reached.
    #[error("Upstream store error ({}): {message}", display_status(.status))]
    Upstream {
        /// HTTP status returned by the store, if a response arrived
        status: Option<u16>,
        /// Error detail reported by the store or the client
        message: String,
    },
}

fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "no response".to_string(), |s| s.to_string())
}

impl CoreError {
    /// Returns true when the failure was caused by an existing record.
    pub const fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_))
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("requested entity not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::ConstraintViolation(format!("unique constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                Self::ConstraintViolation(format!("check constraint violation: {db_err}"))
            },
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream { status: err.status().map(|s| s.as_u16()), message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = CoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn upstream_error_display_includes_status() {
        let err = CoreError::Upstream { status: Some(503), message: "unavailable".to_string() };
        assert_eq!(err.to_string(), "Upstream store error (503): unavailable");

        let err = CoreError::Upstream { status: None, message: "connect refused".to_string() };
        assert_eq!(err.to_string(), "Upstream store error (no response): connect refused");
    }

    #[test]
    fn constraint_violation_is_identified() {
        assert!(CoreError::ConstraintViolation("dup".to_string()).is_constraint_violation());
        assert!(!CoreError::Database("down".to_string()).is_constraint_violation());
    }
}
