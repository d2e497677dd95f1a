use idea_board_shared::types::{NewUser, User, UserId, Visibility};

use crate::errors::RepositoryError;

/// Trait for interacting with stored user accounts.
///
/// Lookups by normalized username or email only consider active users, which
/// matches the partial unique indexes on those columns.
#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: UserId,
        visibility: Visibility,
    ) -> Result<Option<User>, RepositoryError>;

    async fn find_by_normalized_username(
        &self,
        normalized_username: &str,
    ) -> Result<Option<User>, RepositoryError>;

    async fn find_by_normalized_email(
        &self,
        normalized_email: &str,
    ) -> Result<Option<User>, RepositoryError>;

    async fn list(&self, visibility: Visibility) -> Result<Vec<User>, RepositoryError>;

    /// Inserts a user and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::UniqueViolation` if the normalized username
    /// or email is already taken by an active user.
    async fn insert(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Persists the mutable fields of `user` and returns the stored row.
    async fn update(&self, user: &User) -> Result<User, RepositoryError>;

    /// Marks the user deleted. Returns the number of affected rows.
    async fn soft_delete(&self, id: UserId) -> Result<u64, RepositoryError>;
}
