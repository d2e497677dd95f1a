use idea_board_shared::types::{EmailToken, NewEmailToken};

use crate::errors::RepositoryError;

/// Trait for interacting with stored email tokens.
#[async_trait::async_trait]
pub trait EmailTokenRepository: Send + Sync {
    async fn insert(&self, token: &NewEmailToken) -> Result<EmailToken, RepositoryError>;

    async fn find(&self, code: &str) -> Result<Option<EmailToken>, RepositoryError>;

    /// Deletes the token. Returns `true` only if this call removed the row,
    /// so concurrent callers can tell which of them consumed it.
    async fn delete(&self, code: &str) -> Result<bool, RepositoryError>;
}
