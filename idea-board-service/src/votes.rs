//! Vote aggregator.
//!
//! Each user holds at most one active vote per idea. Voting in the direction
//! already stored retracts the vote (its type becomes `Removed`); voting in
//! any other direction replaces it. Idea scores are never stored: they are
//! computed by [`VoteService::rank_ideas_for_domain`] from the active votes.
use std::sync::Arc;

use idea_board_repository::{ACTIVE_VOTE_CONSTRAINT, IdeaRepository, VoteRepository};
use idea_board_shared::types::{
    BoardEvent, DomainId, IdeaId, NewVote, RankedIdea, User, UserId, Visibility, Vote, VoteId,
    VoteValue,
};

use crate::authorization::ensure_owner_or_admin;
use crate::errors::ServiceError;
use crate::events::EventBus;

pub const DEFAULT_RANK_LIMIT: i64 = 20;
pub const MAX_RANK_LIMIT: i64 = 100;

pub struct VoteService {
    votes: Arc<dyn VoteRepository>,
    ideas: Arc<dyn IdeaRepository>,
    events: Arc<EventBus>,
}

impl VoteService {
    pub fn new(
        votes: Arc<dyn VoteRepository>,
        ideas: Arc<dyn IdeaRepository>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            votes,
            ideas,
            events,
        }
    }

    /// Records `direction` from `actor` on `idea_id` and returns the resulting vote.
    ///
    /// The first vote creates a row and publishes `VoteCreated`. Later votes
    /// mutate that row in place following the toggle rules and publish nothing.
    ///
    /// # Errors
    ///
    /// * `ServiceError::BadRequest` - `direction` is `Removed`
    /// * `ServiceError::NotFound` - the idea does not exist or was deleted
    /// * `ServiceError::Internal` - the store failed
    pub async fn submit_vote(
        &self,
        actor: &User,
        idea_id: IdeaId,
        direction: VoteValue,
    ) -> Result<Vote, ServiceError> {
        if direction == VoteValue::Removed {
            return Err(ServiceError::bad_request("Vote type must be UP or DOWN"));
        }

        self.ideas
            .find_by_id(idea_id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| ServiceError::not_found("Idea not found"))?;

        if let Some(existing) = self.votes.find_active(actor.id, idea_id).await? {
            return self.toggle(existing, direction).await;
        }

        let new_vote = NewVote {
            user_id: actor.id,
            idea_id,
            vote_type: direction,
        };
        match self.votes.insert(&new_vote).await {
            Ok(vote) => {
                tracing::info!(vote_id = vote.id, user_id = actor.id, idea_id, "Vote created");
                self.events.publish(BoardEvent::VoteCreated(vote.clone()));
                Ok(vote)
            }
            Err(e) if e.is_unique_violation_on(ACTIVE_VOTE_CONSTRAINT) => {
                // A concurrent request created the vote first; vote against it.
                tracing::warn!(user_id = actor.id, idea_id, "Concurrent vote insert detected");
                let existing = self
                    .votes
                    .find_active(actor.id, idea_id)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::internal("Vote vanished after unique violation", e)
                    })?;
                self.toggle(existing, direction).await
            }
            Err(e) => Err(ServiceError::internal("Failed to insert vote", e)),
        }
    }

    async fn toggle(&self, mut vote: Vote, direction: VoteValue) -> Result<Vote, ServiceError> {
        let previous = vote.vote_type;
        vote.vote_type = previous.toggle(direction);
        let vote = self
            .votes
            .update(&vote)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vote not found"))?;
        tracing::info!(
            vote_id = vote.id,
            from = ?previous,
            to = ?vote.vote_type,
            "Vote updated"
        );
        Ok(vote)
    }

    /// Sets the type of an existing vote directly, bypassing the toggle rules.
    pub async fn update_vote(
        &self,
        actor: &User,
        vote_id: VoteId,
        vote_type: VoteValue,
    ) -> Result<Vote, ServiceError> {
        let mut vote = self.active_vote(vote_id).await?;
        ensure_owner_or_admin(actor, vote.user_id, "update this vote")?;

        vote.vote_type = vote_type;
        self.votes
            .update(&vote)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vote not found"))
    }

    pub async fn delete_vote(&self, actor: &User, vote_id: VoteId) -> Result<(), ServiceError> {
        let vote = self.active_vote(vote_id).await?;
        ensure_owner_or_admin(actor, vote.user_id, "delete this vote")?;

        let affected = self.votes.soft_delete(vote.id).await?;
        if affected != 1 {
            return Err(ServiceError::internal(
                "Unexpected affected row count deleting vote",
                affected,
            ));
        }
        tracing::info!(vote_id, actor_id = actor.id, "Vote deleted");
        Ok(())
    }

    pub async fn find_vote(&self, vote_id: VoteId) -> Result<Vote, ServiceError> {
        self.active_vote(vote_id).await
    }

    pub async fn votes_of_user(&self, user_id: UserId) -> Result<Vec<Vote>, ServiceError> {
        Ok(self.votes.list_by_user(user_id).await?)
    }

    pub async fn votes_of_idea(&self, idea_id: IdeaId) -> Result<Vec<Vote>, ServiceError> {
        Ok(self.votes.list_by_idea(idea_id).await?)
    }

    pub async fn list_votes(&self, visibility: Visibility) -> Result<Vec<Vote>, ServiceError> {
        Ok(self.votes.list(visibility).await?)
    }

    /// Ranks the active ideas of `domain_id` by score, highest first.
    ///
    /// `limit` defaults to 20 and is clamped to `1..=100`; a negative
    /// `offset` is treated as zero. An unknown domain yields an empty list.
    pub async fn rank_ideas_for_domain(
        &self,
        domain_id: DomainId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<RankedIdea>, ServiceError> {
        let limit = limit
            .unwrap_or(DEFAULT_RANK_LIMIT)
            .clamp(1, MAX_RANK_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        Ok(self
            .votes
            .rank_ideas_for_domain(domain_id, limit, offset)
            .await?)
    }

    async fn active_vote(&self, vote_id: VoteId) -> Result<Vote, ServiceError> {
        self.votes
            .find_by_id(vote_id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vote not found"))
    }
}
