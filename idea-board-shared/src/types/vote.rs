use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{IdeaId, RecordStatus, UserId};

pub type VoteId = i64;

/// Represents the type of vote cast by a user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteValue {
    /// Indicates an upvote or positive endorsement.
    Up,
    /// Indicates a downvote or negative endorsement.
    Down,
    /// Indicates the retraction of a previous vote.
    Removed,
}

impl VoteValue {
    /// Contribution of a vote of this type to an idea's score.
    pub fn weight(&self) -> i64 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
            VoteValue::Removed => 0,
        }
    }

    /// Returns the value a stored vote takes when its owner votes `requested`.
    ///
    /// Repeating the stored direction retracts the vote; any other request
    /// replaces it.
    pub fn toggle(&self, requested: VoteValue) -> VoteValue {
        if *self == requested {
            VoteValue::Removed
        } else {
            requested
        }
    }
}

/// A user's vote on an idea.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    pub id: VoteId,
    pub user_id: UserId,
    pub idea_id: IdeaId,
    #[serde(rename = "type")]
    pub vote_type: VoteValue,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields required to insert a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    pub user_id: UserId,
    pub idea_id: IdeaId,
    pub vote_type: VoteValue,
}
