//! Password hashing, sign-in and session tokens.
//!
//! Sessions are stateless HS256 JWTs whose `sub` claim is the user id. A
//! token only authenticates while its user is still active.
use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use chrono::Duration;
use idea_board_repository::UserRepository;
use idea_board_shared::types::{User, Visibility};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::errors::{PasswordHashError, ServiceError};
use crate::validation::normalize_username;

/// Default lifetime of a session token: 30 days.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 30 * 24 * 60 * 60;

pub trait PasswordHasher: Send + Sync {
    /// Hashes `password` into a self-describing hash string.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Returns `Ok(false)` on mismatch and an error if `hash` is malformed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}

/// Argon2id hasher producing PHC strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| PasswordHashError::Hash(e.to_string()))?;

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordHashError::Hash(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| PasswordHashError::Hash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Encodes and validates HS256 session tokens.
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl JwtCodec {
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, ServiceError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| ServiceError::internal("Failed to encode session token", e))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected session token");
                ServiceError::unauthorized("Invalid or expired session")
            })
    }
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    jwt: JwtCodec,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        jwt: JwtCodec,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            jwt,
            clock,
        }
    }

    /// Checks `password` against the active user named `username`.
    ///
    /// Unknown users, users without a password and wrong passwords all fail
    /// the same way.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let rejected = || ServiceError::unauthorized("Incorrect username or password");

        let user = self
            .users
            .find_by_normalized_username(&normalize_username(username))
            .await?
            .ok_or_else(rejected)?;
        let hash = user.password_hash.as_deref().ok_or_else(rejected)?;

        let matches = self
            .hasher
            .verify(password, hash)
            .map_err(|e| ServiceError::internal("Stored password hash is unreadable", e))?;
        if !matches {
            tracing::info!(user_id = user.id, "Sign-in rejected");
            return Err(rejected());
        }

        tracing::info!(user_id = user.id, "User signed in");
        Ok(user)
    }

    /// Issues a session token for `user`.
    pub fn issue_token(&self, user: &User) -> Result<String, ServiceError> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.jwt.lifetime())
            .ok_or_else(|| {
                ServiceError::internal("Session expiry out of range", self.jwt.lifetime())
            })?;
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        self.jwt.encode(&claims)
    }

    /// Resolves a session token to its active user.
    pub async fn authenticate(&self, token: &str) -> Result<User, ServiceError> {
        let claims = self.jwt.decode(token)?;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| ServiceError::unauthorized("Invalid or expired session"))?;

        self.users
            .find_by_id(user_id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("Invalid or expired session"))
    }

    pub fn token_lifetime(&self) -> Duration {
        self.jwt.lifetime()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::test_support::{ManualClock, MockUserRepository, PlainHasher};

    const SECRET: &[u8] = b"test-secret";

    fn service(users: Arc<MockUserRepository>, clock: Arc<dyn Clock>) -> AuthService {
        AuthService::new(
            users,
            Arc::new(PlainHasher),
            JwtCodec::new(SECRET, Duration::days(30)),
            clock,
        )
    }

    #[test]
    fn test_argon2_hash_and_verify() {
        let hasher = Argon2Hasher;
        let hash = hasher.hash("Passw0rd!").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify("Passw0rd!", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
        assert!(hasher.verify("Passw0rd!", "not-a-hash").is_err());
    }

    #[test]
    fn test_argon2_salts_differ() {
        let hasher = Argon2Hasher;
        assert_ne!(hasher.hash("Passw0rd!").unwrap(), hasher.hash("Passw0rd!").unwrap());
    }

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let users = Arc::new(MockUserRepository::default());
        let user = users.seed_with_password("alice", "Passw0rd!").await;
        let auth = service(users, Arc::new(SystemClock));

        assert_eq!(auth.sign_in("Alice", "Passw0rd!").await.unwrap().id, user.id);
        assert!(matches!(
            auth.sign_in("alice", "wrong").await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
        assert!(matches!(
            auth.sign_in("nobody", "Passw0rd!").await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
    }

    #[tokio::test]
    async fn test_user_without_password_cannot_sign_in() {
        let users = Arc::new(MockUserRepository::default());
        users.seed("alice").await;
        let auth = service(users, Arc::new(SystemClock));

        assert!(matches!(
            auth.sign_in("alice", "anything").await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
    }

    #[tokio::test]
    async fn test_issued_token_authenticates_user() {
        let users = Arc::new(MockUserRepository::default());
        let user = users.seed("alice").await;
        let auth = service(users, Arc::new(SystemClock));

        let token = auth.issue_token(&user).unwrap();
        let claims = JwtCodec::new(SECRET, Duration::days(30)).decode(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, Duration::days(30).num_seconds());

        assert_eq!(auth.authenticate(&token).await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_unrepresentable_expiry_is_internal() {
        let users = Arc::new(MockUserRepository::default());
        let user = users.seed("alice").await;
        let auth = AuthService::new(
            users,
            Arc::new(PlainHasher),
            JwtCodec::new(SECRET, Duration::MAX),
            Arc::new(SystemClock),
        );

        assert_eq!(auth.issue_token(&user).unwrap_err(), ServiceError::Internal);
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized() {
        let users = Arc::new(MockUserRepository::default());
        let user = users.seed("alice").await;
        let clock = Arc::new(ManualClock::new());
        clock.advance(-Duration::days(31));
        let auth = service(users, clock);

        let token = auth.issue_token(&user).unwrap();
        assert!(matches!(
            auth.authenticate(&token).await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_unauthorized() {
        let users = Arc::new(MockUserRepository::default());
        let user = users.seed("alice").await;
        let auth = service(users, Arc::new(SystemClock));
        let forged = AuthService::new(
            Arc::new(MockUserRepository::default()),
            Arc::new(PlainHasher),
            JwtCodec::new(b"other-secret", Duration::days(30)),
            Arc::new(SystemClock),
        )
        .issue_token(&user)
        .unwrap();

        assert!(matches!(
            auth.authenticate(&forged).await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
        assert!(matches!(
            auth.authenticate("garbage").await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
    }

    #[tokio::test]
    async fn test_token_of_deleted_user_is_unauthorized() {
        let users = Arc::new(MockUserRepository::default());
        let user = users.seed("alice").await;
        let auth = service(users.clone(), Arc::new(SystemClock));
        let token = auth.issue_token(&user).unwrap();

        users.mark_deleted(user.id).await;

        assert!(matches!(
            auth.authenticate(&token).await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
    }
}
