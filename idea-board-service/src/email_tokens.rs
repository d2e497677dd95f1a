//! Single-use, time-limited email tokens.
//!
//! A token is issued for a user and mailed as part of a link. Redeeming it
//! before the validity window closes consumes it and marks the user's email
//! as verified. Looking it up after the window closes deletes it and reports
//! `Gone`. Either way the row is gone afterwards, so a code works at most once.
use std::sync::Arc;

use chrono::Duration;
use idea_board_repository::{EmailTokenRepository, UserRepository};
use idea_board_shared::types::{NewEmailToken, User, UserId, Visibility};
use uuid::Uuid;

use crate::clock::Clock;
use crate::errors::ServiceError;

/// Default validity window of an email token.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Produces opaque token codes.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Generates random UUID v4 codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidCodeGenerator;

impl CodeGenerator for UuidCodeGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

pub struct EmailTokenService {
    tokens: Arc<dyn EmailTokenRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeGenerator>,
    ttl: Duration,
}

impl EmailTokenService {
    pub fn new(
        tokens: Arc<dyn EmailTokenRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        codes: Arc<dyn CodeGenerator>,
        ttl: Duration,
    ) -> Self {
        Self {
            tokens,
            users,
            clock,
            codes,
            ttl,
        }
    }

    /// Issues a new token for `user_id` and returns its code.
    pub async fn issue(&self, user_id: UserId) -> Result<String, ServiceError> {
        let token = NewEmailToken {
            code: self.codes.generate(),
            user_id,
            created_at: self.clock.now(),
        };
        let stored = self.tokens.insert(&token).await?;
        tracing::debug!(user_id, "Issued email token");
        Ok(stored.code)
    }

    /// Consumes the token `code` and returns its owner with a verified email.
    ///
    /// # Errors
    ///
    /// * `ServiceError::NotFound` - no such token, it was already consumed
    ///   (including by a concurrent call), or its owner no longer exists
    /// * `ServiceError::Gone` - the token expired; it is deleted as well
    pub async fn redeem(&self, code: &str) -> Result<User, ServiceError> {
        let token = self
            .tokens
            .find(code)
            .await?
            .ok_or_else(|| ServiceError::not_found("Token not found"))?;

        if !token.is_valid_at(self.clock.now(), self.ttl) {
            self.tokens.delete(code).await?;
            tracing::info!(user_id = token.user_id, "Email token expired");
            return Err(ServiceError::Gone);
        }

        if !self.tokens.delete(code).await? {
            tracing::info!(user_id = token.user_id, "Email token already consumed");
            return Err(ServiceError::not_found("Token not found"));
        }

        let mut user = self
            .users
            .find_by_id(token.user_id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        if !user.has_verified_email {
            user.has_verified_email = true;
            user = self.users.update(&user).await?;
            tracing::info!(user_id = user.id, "Email verified");
        }
        Ok(user)
    }
}
