//! Error types for the repositories.
//! Defines specific errors that can occur during database operations.
use thiserror::Error;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Represents errors that can occur within the repositories.
///
/// Unique-constraint violations are split out of generic database errors so
/// callers can treat them as conflicts (or as the signal that a concurrent
/// insert won a race) instead of as internal failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Unique violation on {constraint}: {detail}")]
    UniqueViolation { constraint: String, detail: String },

    #[error("Invalid vote type: {0}")]
    InvalidVoteType(i16),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid record status: {0}")]
    InvalidStatus(String),
}

impl RepositoryError {
    /// Returns `true` if the error is a unique violation on `constraint`.
    pub fn is_unique_violation_on(&self, constraint: &str) -> bool {
        matches!(self, RepositoryError::UniqueViolation { constraint: c, .. } if c == constraint)
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        let violation = error.as_database_error().and_then(|db_error| {
            if db_error.code().as_deref() != Some(UNIQUE_VIOLATION) {
                return None;
            }
            let constraint = db_error.constraint().unwrap_or_default().to_string();
            let detail = db_error
                .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                .and_then(|pg_error| pg_error.detail())
                .unwrap_or_else(|| db_error.message())
                .to_string();
            Some((constraint, detail))
        });

        match violation {
            Some((constraint, detail)) => RepositoryError::UniqueViolation { constraint, detail },
            None => RepositoryError::DatabaseError(error),
        }
    }
}
