use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RecordStatus;

pub type UserId = i64;

/// Role granted to a user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Root,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Root => "root",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "root" => Some(Role::Root),
            _ => None,
        }
    }
}

/// A registered account.
///
/// `password_hash` is never serialized; accounts without a password cannot
/// sign in with credentials.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub normalized_username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub normalized_email: String,
    pub has_verified_email: bool,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub roles: Vec<Role>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Admins and roots may act on records they do not own.
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin) || self.roles.contains(&Role::Root)
    }
}

/// Fields required to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub normalized_username: String,
    pub email: String,
    pub normalized_email: String,
    pub password_hash: Option<String>,
    pub roles: Vec<Role>,
}
