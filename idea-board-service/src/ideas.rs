use std::sync::Arc;

use idea_board_repository::{DomainRepository, IdeaRepository};
use idea_board_shared::types::{BoardEvent, DomainId, Idea, IdeaId, NewIdea, User, Visibility};
use serde::Deserialize;

use crate::authorization::ensure_owner_or_admin;
use crate::errors::ServiceError;
use crate::events::EventBus;
use crate::validation::validate_headline;

#[derive(Debug, Clone, Deserialize)]
pub struct IdeaDraft {
    pub domain_id: DomainId,
    pub headline: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdeaChanges {
    pub headline: Option<String>,
    pub description: Option<String>,
}

pub struct IdeaService {
    ideas: Arc<dyn IdeaRepository>,
    domains: Arc<dyn DomainRepository>,
    events: Arc<EventBus>,
}

impl IdeaService {
    pub fn new(
        ideas: Arc<dyn IdeaRepository>,
        domains: Arc<dyn DomainRepository>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            ideas,
            domains,
            events,
        }
    }

    /// Posts a new idea on an active domain.
    pub async fn create(&self, actor: &User, draft: IdeaDraft) -> Result<Idea, ServiceError> {
        validate_headline(&draft.headline)?;
        self.domains
            .find_by_id(draft.domain_id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| ServiceError::not_found("Domain not found"))?;

        let idea = self
            .ideas
            .insert(&NewIdea {
                headline: draft.headline.trim().to_string(),
                description: draft.description,
                user_id: actor.id,
                domain_id: draft.domain_id,
            })
            .await?;
        tracing::info!(
            idea_id = idea.id,
            domain_id = idea.domain_id,
            user_id = actor.id,
            "Idea created"
        );

        self.events.publish(BoardEvent::IdeaCreated(idea.clone()));
        Ok(idea)
    }

    pub async fn find_by_id(&self, id: IdeaId) -> Result<Idea, ServiceError> {
        self.ideas
            .find_by_id(id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| ServiceError::not_found("Idea not found"))
    }

    pub async fn list_ideas(&self, visibility: Visibility) -> Result<Vec<Idea>, ServiceError> {
        Ok(self.ideas.list(visibility).await?)
    }

    pub async fn update(
        &self,
        actor: &User,
        id: IdeaId,
        changes: IdeaChanges,
    ) -> Result<Idea, ServiceError> {
        let mut idea = self.find_by_id(id).await?;
        ensure_owner_or_admin(actor, idea.user_id, "update this idea")?;

        if let Some(headline) = changes.headline {
            validate_headline(&headline)?;
            idea.headline = headline.trim().to_string();
        }
        if let Some(description) = changes.description {
            idea.description = Some(description);
        }

        Ok(self.ideas.update(&idea).await?)
    }

    pub async fn delete(&self, actor: &User, id: IdeaId) -> Result<(), ServiceError> {
        let idea = self.find_by_id(id).await?;
        ensure_owner_or_admin(actor, idea.user_id, "delete this idea")?;

        let affected = self.ideas.soft_delete(idea.id).await?;
        if affected != 1 {
            return Err(ServiceError::internal(
                "Unexpected affected row count deleting idea",
                affected,
            ));
        }
        tracing::info!(idea_id = id, actor_id = actor.id, "Idea deleted");
        Ok(())
    }
}
