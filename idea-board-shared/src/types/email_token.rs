use chrono::{DateTime, Duration, Utc};

use crate::types::UserId;

/// A single-use code mailed to a user for email verification or password reset.
///
/// Consumption and expiry both delete the row; there is no "used" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailToken {
    pub code: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl EmailToken {
    /// A token is valid strictly before `created_at + ttl`.
    pub fn is_valid_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at < ttl
    }
}

/// Fields required to insert an email token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmailToken {
    pub code: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}
