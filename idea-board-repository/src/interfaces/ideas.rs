use idea_board_shared::types::{Idea, IdeaId, NewIdea, Visibility};

use crate::errors::RepositoryError;

/// Trait for interacting with stored ideas.
#[async_trait::async_trait]
pub trait IdeaRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: IdeaId,
        visibility: Visibility,
    ) -> Result<Option<Idea>, RepositoryError>;

    async fn list(&self, visibility: Visibility) -> Result<Vec<Idea>, RepositoryError>;

    async fn insert(&self, idea: &NewIdea) -> Result<Idea, RepositoryError>;

    async fn update(&self, idea: &Idea) -> Result<Idea, RepositoryError>;

    async fn soft_delete(&self, id: IdeaId) -> Result<u64, RepositoryError>;
}
