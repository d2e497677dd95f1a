use idea_board_shared::types::{Domain, DomainId, NewDomain, UserId, Visibility};

use crate::errors::RepositoryError;

/// Trait for interacting with stored domains.
#[async_trait::async_trait]
pub trait DomainRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: DomainId,
        visibility: Visibility,
    ) -> Result<Option<Domain>, RepositoryError>;

    /// Finds an active domain by its normalized name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Domain>, RepositoryError>;

    async fn list(&self, visibility: Visibility) -> Result<Vec<Domain>, RepositoryError>;

    /// Lists the active domains owned by `user_id`.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Domain>, RepositoryError>;

    async fn insert(&self, domain: &NewDomain) -> Result<Domain, RepositoryError>;

    async fn update(&self, domain: &Domain) -> Result<Domain, RepositoryError>;

    async fn soft_delete(&self, id: DomainId) -> Result<u64, RepositoryError>;
}
