//! This module defines the `VoteRepository` trait, the store interface used by
//! the vote aggregator for per-user votes and for the ranking query.
use idea_board_shared::types::{
    DomainId, IdeaId, NewVote, RankedIdea, UserId, Vote, VoteId, Visibility,
};

use crate::errors::RepositoryError;

/// Name of the partial unique index guarding one active vote per user and idea.
pub const ACTIVE_VOTE_CONSTRAINT: &str = "votes_user_idea_active_key";

/// A trait that defines the interface for interacting with stored votes.
#[async_trait::async_trait]
pub trait VoteRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: VoteId,
        visibility: Visibility,
    ) -> Result<Option<Vote>, RepositoryError>;

    /// Finds the active vote `user_id` holds on `idea_id`, if any.
    async fn find_active(
        &self,
        user_id: UserId,
        idea_id: IdeaId,
    ) -> Result<Option<Vote>, RepositoryError>;

    async fn list(&self, visibility: Visibility) -> Result<Vec<Vote>, RepositoryError>;

    /// Lists the active votes cast by `user_id`.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Vote>, RepositoryError>;

    /// Lists the active votes on `idea_id`.
    async fn list_by_idea(&self, idea_id: IdeaId) -> Result<Vec<Vote>, RepositoryError>;

    /// Inserts a vote and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::UniqueViolation` on [`ACTIVE_VOTE_CONSTRAINT`]
    /// if the user already holds an active vote on the idea.
    async fn insert(&self, vote: &NewVote) -> Result<Vote, RepositoryError>;

    /// Persists the vote type of `vote` and returns the stored row.
    ///
    /// Returns `None` if the vote is no longer active.
    async fn update(&self, vote: &Vote) -> Result<Option<Vote>, RepositoryError>;

    async fn soft_delete(&self, id: VoteId) -> Result<u64, RepositoryError>;

    /// Ranks the active ideas of a domain by the summed weight of their active votes.
    ///
    /// Ideas without votes are included with a score of zero. Ties are broken
    /// by ascending idea id.
    async fn rank_ideas_for_domain(
        &self,
        domain_id: DomainId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RankedIdea>, RepositoryError>;
}
