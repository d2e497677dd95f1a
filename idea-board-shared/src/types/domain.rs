use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{RecordStatus, UserId};

pub type DomainId = i64;

/// A second-level domain registered by a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Domain {
    pub id: DomainId,
    pub name: String,
    pub user_id: UserId,
    pub has_verified_dns: bool,
    pub last_verified_dns: Option<DateTime<Utc>>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields required to insert a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDomain {
    pub name: String,
    pub user_id: UserId,
    pub has_verified_dns: bool,
    pub last_verified_dns: Option<DateTime<Utc>>,
}
