use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DomainId, RecordStatus, UserId};

pub type IdeaId = i64;

/// An idea posted against a domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Idea {
    pub id: IdeaId,
    pub headline: String,
    pub description: Option<String>,
    pub user_id: UserId,
    pub domain_id: DomainId,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields required to insert an idea.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdea {
    pub headline: String,
    pub description: Option<String>,
    pub user_id: UserId,
    pub domain_id: DomainId,
}

/// An idea together with its derived vote score.
///
/// The score is never stored; it is computed by the ranking query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankedIdea {
    #[serde(flatten)]
    pub idea: Idea,
    pub score: i64,
}
