//! Analytics fan-out.
//!
//! The [`AnalyticsConsumer`] drains an [`EventBus`](crate::events::EventBus)
//! subscription and forwards every event to an [`AnalyticsSink`]. Sink
//! failures are logged and never stop the consumer.
use std::sync::Arc;

use async_trait::async_trait;
use idea_board_shared::types::{BoardEvent, User, UserId};
use serde_json::{Value, json};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::errors::{AnalyticsError, rejection_reason};

const SEGMENT_API_URL: &str = "https://api.segment.io/v1";

#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Associates the user's traits with their id.
    async fn identify(&self, user: &User) -> Result<(), AnalyticsError>;

    /// Records that `user_id` performed `event`.
    async fn track(
        &self,
        user_id: UserId,
        event: &str,
        properties: Value,
    ) -> Result<(), AnalyticsError>;
}

/// Sends events to the Segment tracking API.
pub struct SegmentSink {
    client: reqwest::Client,
    write_key: String,
    base_url: String,
}

impl SegmentSink {
    pub fn new(write_key: impl Into<String>) -> Self {
        Self::with_base_url(write_key, SEGMENT_API_URL)
    }

    pub fn with_base_url(write_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            write_key: write_key.into(),
            base_url: base_url.into(),
        }
    }

    async fn post(&self, path: &str, body: Value) -> Result<(), AnalyticsError> {
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .basic_auth(&self.write_key, None::<&str>)
            .json(&body)
            .send()
            .await?;
        if let Some(reason) = rejection_reason(response).await {
            tracing::error!(path, reason = %reason, "Segment rejected event");
            return Err(AnalyticsError::Rejected(reason));
        }
        Ok(())
    }
}

#[async_trait]
impl AnalyticsSink for SegmentSink {
    async fn identify(&self, user: &User) -> Result<(), AnalyticsError> {
        let body = json!({
            "userId": user.id.to_string(),
            "traits": {
                "username": user.username,
                "email": user.email,
                "createdAt": user.created_at,
            },
        });
        self.post("identify", body).await
    }

    async fn track(
        &self,
        user_id: UserId,
        event: &str,
        properties: Value,
    ) -> Result<(), AnalyticsError> {
        let body = json!({
            "userId": user_id.to_string(),
            "event": event,
            "properties": properties,
        });
        self.post("track", body).await
    }
}

/// Writes analytics events to the log only.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl AnalyticsSink for LogSink {
    async fn identify(&self, user: &User) -> Result<(), AnalyticsError> {
        tracing::info!(user_id = user.id, username = %user.username, "analytics identify");
        Ok(())
    }

    async fn track(
        &self,
        user_id: UserId,
        event: &str,
        properties: Value,
    ) -> Result<(), AnalyticsError> {
        tracing::info!(user_id, event, properties = %properties, "analytics track");
        Ok(())
    }
}

/// Tracking properties sent along with `event`.
pub fn event_properties(event: &BoardEvent) -> Value {
    match event {
        BoardEvent::UserCreated(user) => json!({ "username": user.username }),
        BoardEvent::DomainCreated(domain) => json!({ "domain": domain.name }),
        BoardEvent::IdeaCreated(idea) => json!({
            "idea_id": idea.id,
            "domain_id": idea.domain_id,
            "headline": idea.headline,
        }),
        BoardEvent::VoteCreated(vote) => json!({
            "idea_id": vote.idea_id,
            "type": vote.vote_type,
        }),
    }
}

pub struct AnalyticsConsumer {
    receiver: UnboundedReceiver<BoardEvent>,
    sink: Arc<dyn AnalyticsSink>,
}

impl AnalyticsConsumer {
    pub fn new(receiver: UnboundedReceiver<BoardEvent>, sink: Arc<dyn AnalyticsSink>) -> Self {
        Self { receiver, sink }
    }

    /// Runs until every sender of the subscription is gone.
    pub async fn run(mut self) {
        tracing::info!("Analytics consumer started");
        while let Some(event) = self.receiver.recv().await {
            self.handle(&event).await;
        }
        tracing::info!("Analytics consumer stopped");
    }

    async fn handle(&self, event: &BoardEvent) {
        if let BoardEvent::UserCreated(user) = event {
            if let Err(e) = self.sink.identify(user).await {
                tracing::warn!(error = %e, user_id = user.id, "Failed to identify user");
            }
        }

        if let Err(e) = self
            .sink
            .track(event.actor_id(), event.name(), event_properties(event))
            .await
        {
            tracing::warn!(error = %e, event = event.name(), "Failed to track event");
        }
    }
}
