use idea_board_repository::RepositoryError;
use thiserror::Error;

/// Errors returned by the idea board services.
///
/// Internal failures carry no detail; the cause is logged where it happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Gone")]
    Gone,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error")]
    Internal,
}

impl ServiceError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an unauthorized error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a bad request error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Log `error` with `context` and return an opaque internal error.
    pub fn internal(context: &str, error: impl std::fmt::Display) -> Self {
        tracing::error!(error = %error, "{context}");
        Self::Internal
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::UniqueViolation { detail, .. } => {
                ServiceError::Conflict(clean_unique_violation(&detail))
            }
            other => ServiceError::internal("Repository operation failed", other),
        }
    }
}

/// Turns a Postgres unique-violation detail into a message fit for clients.
///
/// `Key (normalized_email)=(a@b.c) already exists.` becomes
/// `email 'a@b.c' already exists.`. Details in any other shape are returned
/// unchanged.
pub(crate) fn clean_unique_violation(detail: &str) -> String {
    let parsed = detail.strip_prefix("Key (").and_then(|rest| {
        let (columns, rest) = rest.split_once(")=(")?;
        let (values, tail) = rest.split_once(')')?;
        Some((columns, values, tail))
    });

    match parsed {
        Some((columns, values, tail)) => {
            let columns = columns
                .split(", ")
                .map(|column| column.strip_prefix("normalized_").unwrap_or(column))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{columns} '{values}'{tail}")
        }
        None => detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_unique_violation() {
        assert_eq!(
            clean_unique_violation("Key (normalized_email)=(a@b.c) already exists."),
            "email 'a@b.c' already exists."
        );
        assert_eq!(
            clean_unique_violation("Key (name)=(example.com) already exists."),
            "name 'example.com' already exists."
        );
        assert_eq!(
            clean_unique_violation("Key (user_id, idea_id)=(1, 2) already exists."),
            "user_id, idea_id '1, 2' already exists."
        );
    }

    #[test]
    fn test_clean_unique_violation_passes_unknown_shapes_through() {
        assert_eq!(clean_unique_violation("duplicate key"), "duplicate key");
    }

    #[test]
    fn test_unique_violation_becomes_conflict() {
        let error = ServiceError::from(RepositoryError::UniqueViolation {
            constraint: "users_normalized_username_active_key".to_string(),
            detail: "Key (normalized_username)=(alice) already exists.".to_string(),
        });
        assert_eq!(
            error,
            ServiceError::Conflict("username 'alice' already exists.".to_string())
        );
    }

    #[test]
    fn test_other_repository_errors_are_internal() {
        let error = ServiceError::from(RepositoryError::InvalidVoteType(9));
        assert_eq!(error, ServiceError::Internal);
    }
}
