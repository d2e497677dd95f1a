//! In-memory collaborators for service tests.
//!
//! The mock repositories mirror the behaviour of the PostgreSQL ones that
//! services rely on: soft deletes with affected-row counts, unique
//! constraints among active rows reported as `UniqueViolation`, and the
//! ranking order.
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use idea_board_repository::{
    ACTIVE_VOTE_CONSTRAINT, DomainRepository, EmailTokenRepository, IdeaRepository,
    RepositoryError, UserRepository, VoteRepository,
};
use idea_board_shared::types::{
    Domain, DomainId, EmailToken, Idea, IdeaId, NewDomain, NewEmailToken, NewIdea, NewUser,
    NewVote, RankedIdea, RecordStatus, Role, User, UserId, Visibility, Vote, VoteId, VoteValue,
};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::analytics::AnalyticsSink;
use crate::auth::PasswordHasher;
use crate::clock::Clock;
use crate::domains::{DnsVerifier, RouteRegistry};
use crate::email_tokens::CodeGenerator;
use crate::errors::{AnalyticsError, MailerError, PasswordHashError, RouteRegistryError};
use crate::mailer::{EmailMessage, Mailer};

/// An active user named `name` with email `{name}@example.com` and no password.
pub fn sample_user(id: UserId, name: &str) -> User {
    let now = Utc::now();
    User {
        id,
        username: name.to_string(),
        normalized_username: name.to_lowercase(),
        email: format!("{name}@example.com"),
        normalized_email: format!("{}@example.com", name.to_lowercase()),
        has_verified_email: false,
        password_hash: None,
        roles: vec![Role::User],
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

fn unique_violation(constraint: &str, column: &str, value: &str) -> RepositoryError {
    RepositoryError::UniqueViolation {
        constraint: constraint.to_string(),
        detail: format!("Key ({column})=({value}) already exists."),
    }
}

fn store_failure() -> RepositoryError {
    RepositoryError::DatabaseError(sqlx::Error::PoolTimedOut)
}

fn next(counter: &AtomicI64) -> i64 {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

/// Marks a record deleted; shared by every mock's `soft_delete`.
macro_rules! soft_delete_in {
    ($records:expr, $id:expr) => {{
        let mut affected = 0;
        for record in $records.iter_mut() {
            if record.id == $id && record.status == RecordStatus::Active {
                record.status = RecordStatus::Deleted;
                record.deleted_at = Some(Utc::now());
                affected += 1;
            }
        }
        affected
    }};
}

// ============================================================================
// Repositories
// ============================================================================

#[derive(Default)]
pub struct MockUserRepository {
    users: Mutex<Vec<User>>,
    ids: AtomicI64,
}

impl MockUserRepository {
    pub async fn seed(&self, name: &str) -> User {
        let user = sample_user(0, name);
        self.insert(&NewUser {
            username: user.username,
            normalized_username: user.normalized_username,
            email: user.email,
            normalized_email: user.normalized_email,
            password_hash: None,
            roles: user.roles,
        })
        .await
        .unwrap()
    }

    /// Seeds a user whose password hash matches [`PlainHasher`].
    pub async fn seed_with_password(&self, name: &str, password: &str) -> User {
        let mut user = self.seed(name).await;
        user.password_hash = Some(format!("plain:{password}"));
        self.replace(user.clone()).await;
        user
    }

    pub async fn get(&self, id: UserId) -> Option<User> {
        self.users.lock().await.iter().find(|u| u.id == id).cloned()
    }

    pub async fn all(&self) -> Vec<User> {
        self.users.lock().await.clone()
    }

    pub async fn replace(&self, user: User) {
        let mut users = self.users.lock().await;
        if let Some(stored) = users.iter_mut().find(|u| u.id == user.id) {
            *stored = user;
        }
    }

    pub async fn mark_deleted(&self, id: UserId) {
        let mut users = self.users.lock().await;
        soft_delete_in!(users, id);
    }

    fn check_unique(
        users: &[User],
        id: Option<UserId>,
        normalized_username: &str,
        normalized_email: &str,
    ) -> Result<(), RepositoryError> {
        let others = || {
            users
                .iter()
                .filter(move |u| u.status == RecordStatus::Active && Some(u.id) != id)
        };
        if others().any(|u| u.normalized_username == normalized_username) {
            return Err(unique_violation(
                "users_normalized_username_active_key",
                "normalized_username",
                normalized_username,
            ));
        }
        if others().any(|u| u.normalized_email == normalized_email) {
            return Err(unique_violation(
                "users_normalized_email_active_key",
                "normalized_email",
                normalized_email,
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(
        &self,
        id: UserId,
        visibility: Visibility,
    ) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().await;
        Ok(users
            .iter()
            .find(|u| u.id == id && visibility.admits(u.status))
            .cloned())
    }

    async fn find_by_normalized_username(
        &self,
        normalized_username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().await;
        Ok(users
            .iter()
            .find(|u| u.status == RecordStatus::Active && u.normalized_username == normalized_username)
            .cloned())
    }

    async fn find_by_normalized_email(
        &self,
        normalized_email: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().await;
        Ok(users
            .iter()
            .find(|u| u.status == RecordStatus::Active && u.normalized_email == normalized_email)
            .cloned())
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.lock().await;
        Ok(users
            .iter()
            .filter(|u| visibility.admits(u.status))
            .cloned()
            .collect())
    }

    async fn insert(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().await;
        Self::check_unique(&users, None, &user.normalized_username, &user.normalized_email)?;

        let now = Utc::now();
        let stored = User {
            id: next(&self.ids),
            username: user.username.clone(),
            normalized_username: user.normalized_username.clone(),
            email: user.email.clone(),
            normalized_email: user.normalized_email.clone(),
            has_verified_email: false,
            password_hash: user.password_hash.clone(),
            roles: user.roles.clone(),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        users.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().await;
        Self::check_unique(
            &users,
            Some(user.id),
            &user.normalized_username,
            &user.normalized_email,
        )?;

        let stored = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepositoryError::DatabaseError(sqlx::Error::RowNotFound))?;
        *stored = User {
            updated_at: Utc::now(),
            ..user.clone()
        };
        Ok(stored.clone())
    }

    async fn soft_delete(&self, id: UserId) -> Result<u64, RepositoryError> {
        let mut users = self.users.lock().await;
        Ok(soft_delete_in!(users, id))
    }
}

#[derive(Default)]
pub struct MockDomainRepository {
    domains: Mutex<Vec<Domain>>,
    ids: AtomicI64,
}

impl MockDomainRepository {
    pub async fn seed(&self, user_id: UserId, name: &str) -> Domain {
        self.insert(&NewDomain {
            name: name.to_string(),
            user_id,
            has_verified_dns: true,
            last_verified_dns: Some(Utc::now()),
        })
        .await
        .unwrap()
    }

    pub async fn mark_deleted(&self, id: DomainId) {
        let mut domains = self.domains.lock().await;
        soft_delete_in!(domains, id);
    }

    fn check_unique(domains: &[Domain], id: Option<DomainId>, name: &str) -> Result<(), RepositoryError> {
        let taken = domains
            .iter()
            .any(|d| d.status == RecordStatus::Active && Some(d.id) != id && d.name == name);
        if taken {
            return Err(unique_violation("domains_name_active_key", "name", name));
        }
        Ok(())
    }
}

#[async_trait]
impl DomainRepository for MockDomainRepository {
    async fn find_by_id(
        &self,
        id: DomainId,
        visibility: Visibility,
    ) -> Result<Option<Domain>, RepositoryError> {
        let domains = self.domains.lock().await;
        Ok(domains
            .iter()
            .find(|d| d.id == id && visibility.admits(d.status))
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Domain>, RepositoryError> {
        let domains = self.domains.lock().await;
        Ok(domains
            .iter()
            .find(|d| d.status == RecordStatus::Active && d.name == name)
            .cloned())
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<Domain>, RepositoryError> {
        let domains = self.domains.lock().await;
        Ok(domains
            .iter()
            .filter(|d| visibility.admits(d.status))
            .cloned()
            .collect())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Domain>, RepositoryError> {
        let domains = self.domains.lock().await;
        Ok(domains
            .iter()
            .filter(|d| d.status == RecordStatus::Active && d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, domain: &NewDomain) -> Result<Domain, RepositoryError> {
        let mut domains = self.domains.lock().await;
        Self::check_unique(&domains, None, &domain.name)?;

        let now = Utc::now();
        let stored = Domain {
            id: next(&self.ids),
            name: domain.name.clone(),
            user_id: domain.user_id,
            has_verified_dns: domain.has_verified_dns,
            last_verified_dns: domain.last_verified_dns,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        domains.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, domain: &Domain) -> Result<Domain, RepositoryError> {
        let mut domains = self.domains.lock().await;
        Self::check_unique(&domains, Some(domain.id), &domain.name)?;

        let stored = domains
            .iter_mut()
            .find(|d| d.id == domain.id)
            .ok_or(RepositoryError::DatabaseError(sqlx::Error::RowNotFound))?;
        *stored = Domain {
            updated_at: Utc::now(),
            ..domain.clone()
        };
        Ok(stored.clone())
    }

    async fn soft_delete(&self, id: DomainId) -> Result<u64, RepositoryError> {
        let mut domains = self.domains.lock().await;
        Ok(soft_delete_in!(domains, id))
    }
}

#[derive(Default)]
pub struct MockIdeaRepository {
    ideas: Mutex<Vec<Idea>>,
    ids: AtomicI64,
}

impl MockIdeaRepository {
    pub async fn seed(&self, user_id: UserId, domain_id: DomainId, headline: &str) -> Idea {
        self.insert(&NewIdea {
            headline: headline.to_string(),
            description: None,
            user_id,
            domain_id,
        })
        .await
        .unwrap()
    }

    pub async fn mark_deleted(&self, id: IdeaId) {
        let mut ideas = self.ideas.lock().await;
        soft_delete_in!(ideas, id);
    }
}

#[async_trait]
impl IdeaRepository for MockIdeaRepository {
    async fn find_by_id(
        &self,
        id: IdeaId,
        visibility: Visibility,
    ) -> Result<Option<Idea>, RepositoryError> {
        let ideas = self.ideas.lock().await;
        Ok(ideas
            .iter()
            .find(|i| i.id == id && visibility.admits(i.status))
            .cloned())
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<Idea>, RepositoryError> {
        let ideas = self.ideas.lock().await;
        Ok(ideas
            .iter()
            .filter(|i| visibility.admits(i.status))
            .cloned()
            .collect())
    }

    async fn insert(&self, idea: &NewIdea) -> Result<Idea, RepositoryError> {
        let now = Utc::now();
        let stored = Idea {
            id: next(&self.ids),
            headline: idea.headline.clone(),
            description: idea.description.clone(),
            user_id: idea.user_id,
            domain_id: idea.domain_id,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.ideas.lock().await.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, idea: &Idea) -> Result<Idea, RepositoryError> {
        let mut ideas = self.ideas.lock().await;
        let stored = ideas
            .iter_mut()
            .find(|i| i.id == idea.id)
            .ok_or(RepositoryError::DatabaseError(sqlx::Error::RowNotFound))?;
        *stored = Idea {
            updated_at: Utc::now(),
            ..idea.clone()
        };
        Ok(stored.clone())
    }

    async fn soft_delete(&self, id: IdeaId) -> Result<u64, RepositoryError> {
        let mut ideas = self.ideas.lock().await;
        Ok(soft_delete_in!(ideas, id))
    }
}

/// Vote store that ranks against the ideas held by a [`MockIdeaRepository`].
pub struct MockVoteRepository {
    votes: Mutex<Vec<Vote>>,
    ideas: Arc<MockIdeaRepository>,
    ids: AtomicI64,
    racing_insert: Mutex<Option<VoteValue>>,
    racing_delete: Mutex<bool>,
    failing: Mutex<bool>,
    rank_page: Mutex<Option<(i64, i64)>>,
}

impl MockVoteRepository {
    pub fn new(ideas: Arc<MockIdeaRepository>) -> Self {
        Self {
            votes: Mutex::new(Vec::new()),
            ideas,
            ids: AtomicI64::new(0),
            racing_insert: Mutex::new(None),
            racing_delete: Mutex::new(false),
            failing: Mutex::new(false),
            rank_page: Mutex::new(None),
        }
    }

    pub async fn all(&self) -> Vec<Vote> {
        self.votes.lock().await.clone()
    }

    /// Makes the next insert lose a race against a concurrent insert of
    /// `winner` for the same user and idea.
    pub async fn race_next_insert(&self, winner: VoteValue) {
        *self.racing_insert.lock().await = Some(winner);
    }

    /// Makes the next update find its vote already soft-deleted by a
    /// concurrent request.
    pub async fn race_next_update_with_delete(&self) {
        *self.racing_delete.lock().await = true;
    }

    /// Makes every later write fail with a database error.
    pub async fn fail_writes(&self) {
        *self.failing.lock().await = true;
    }

    /// The `(limit, offset)` of the last ranking query.
    pub async fn last_rank_page(&self) -> Option<(i64, i64)> {
        *self.rank_page.lock().await
    }

    fn store(&self, votes: &mut Vec<Vote>, vote: &NewVote, vote_type: VoteValue) -> Vote {
        let now = Utc::now();
        let stored = Vote {
            id: next(&self.ids),
            user_id: vote.user_id,
            idea_id: vote.idea_id,
            vote_type,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        votes.push(stored.clone());
        stored
    }

    async fn check_writable(&self) -> Result<(), RepositoryError> {
        if *self.failing.lock().await {
            return Err(store_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl VoteRepository for MockVoteRepository {
    async fn find_by_id(
        &self,
        id: VoteId,
        visibility: Visibility,
    ) -> Result<Option<Vote>, RepositoryError> {
        let votes = self.votes.lock().await;
        Ok(votes
            .iter()
            .find(|v| v.id == id && visibility.admits(v.status))
            .cloned())
    }

    async fn find_active(
        &self,
        user_id: UserId,
        idea_id: IdeaId,
    ) -> Result<Option<Vote>, RepositoryError> {
        let votes = self.votes.lock().await;
        Ok(votes
            .iter()
            .find(|v| v.status == RecordStatus::Active && v.user_id == user_id && v.idea_id == idea_id)
            .cloned())
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<Vote>, RepositoryError> {
        let votes = self.votes.lock().await;
        Ok(votes
            .iter()
            .filter(|v| visibility.admits(v.status))
            .cloned()
            .collect())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Vote>, RepositoryError> {
        let votes = self.votes.lock().await;
        Ok(votes
            .iter()
            .filter(|v| v.status == RecordStatus::Active && v.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_by_idea(&self, idea_id: IdeaId) -> Result<Vec<Vote>, RepositoryError> {
        let votes = self.votes.lock().await;
        Ok(votes
            .iter()
            .filter(|v| v.status == RecordStatus::Active && v.idea_id == idea_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, vote: &NewVote) -> Result<Vote, RepositoryError> {
        self.check_writable().await?;
        let mut votes = self.votes.lock().await;

        if let Some(winner) = self.racing_insert.lock().await.take() {
            self.store(&mut votes, vote, winner);
        }

        let duplicate = votes.iter().any(|v| {
            v.status == RecordStatus::Active && v.user_id == vote.user_id && v.idea_id == vote.idea_id
        });
        if duplicate {
            return Err(unique_violation(
                ACTIVE_VOTE_CONSTRAINT,
                "user_id, idea_id",
                &format!("{}, {}", vote.user_id, vote.idea_id),
            ));
        }
        Ok(self.store(&mut votes, vote, vote.vote_type))
    }

    async fn update(&self, vote: &Vote) -> Result<Option<Vote>, RepositoryError> {
        self.check_writable().await?;
        let mut votes = self.votes.lock().await;
        if std::mem::take(&mut *self.racing_delete.lock().await) {
            soft_delete_in!(votes, vote.id);
        }
        Ok(votes
            .iter_mut()
            .find(|v| v.id == vote.id && v.status == RecordStatus::Active)
            .map(|stored| {
                stored.vote_type = vote.vote_type;
                stored.updated_at = Utc::now();
                stored.clone()
            }))
    }

    async fn soft_delete(&self, id: VoteId) -> Result<u64, RepositoryError> {
        self.check_writable().await?;
        let mut votes = self.votes.lock().await;
        Ok(soft_delete_in!(votes, id))
    }

    async fn rank_ideas_for_domain(
        &self,
        domain_id: DomainId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RankedIdea>, RepositoryError> {
        *self.rank_page.lock().await = Some((limit, offset));

        let votes = self.votes.lock().await;
        let mut ranked: Vec<RankedIdea> = self
            .ideas
            .list(Visibility::ActiveOnly)
            .await?
            .into_iter()
            .filter(|idea| idea.domain_id == domain_id)
            .map(|idea| {
                let score = votes
                    .iter()
                    .filter(|v| v.status == RecordStatus::Active && v.idea_id == idea.id)
                    .map(|v| v.vote_type.weight())
                    .sum();
                RankedIdea { idea, score }
            })
            .collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.idea.id.cmp(&b.idea.id)));

        Ok(ranked
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[derive(Default)]
pub struct MockEmailTokenRepository {
    tokens: Mutex<Vec<EmailToken>>,
    steal_next_delete: Mutex<bool>,
}

impl MockEmailTokenRepository {
    /// Simulates a concurrent redemption removing the token just before
    /// the next delete runs.
    pub async fn consume_before_next_delete(&self) {
        *self.steal_next_delete.lock().await = true;
    }
}

#[async_trait]
impl EmailTokenRepository for MockEmailTokenRepository {
    async fn insert(&self, token: &NewEmailToken) -> Result<EmailToken, RepositoryError> {
        let stored = EmailToken {
            code: token.code.clone(),
            user_id: token.user_id,
            created_at: token.created_at,
        };
        self.tokens.lock().await.push(stored.clone());
        Ok(stored)
    }

    async fn find(&self, code: &str) -> Result<Option<EmailToken>, RepositoryError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens.iter().find(|t| t.code == code).cloned())
    }

    async fn delete(&self, code: &str) -> Result<bool, RepositoryError> {
        let mut tokens = self.tokens.lock().await;
        let mut steal = self.steal_next_delete.lock().await;
        if *steal {
            *steal = false;
            tokens.retain(|t| t.code != code);
        }

        let before = tokens.len();
        tokens.retain(|t| t.code != code);
        Ok(tokens.len() < before)
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// A clock that only moves when told to. Starts at the current time.
pub struct ManualClock {
    now: StdMutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: StdMutex::new(Utc::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Produces `code-1`, `code-2`, ...
#[derive(Default)]
pub struct SequenceCodeGenerator {
    issued: AtomicI64,
}

impl CodeGenerator for SequenceCodeGenerator {
    fn generate(&self) -> String {
        format!("code-{}", next(&self.issued))
    }
}

/// Stores passwords as `plain:{password}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        hash.strip_prefix("plain:")
            .map(|stored| stored == password)
            .ok_or_else(|| PasswordHashError::Hash("not a plain hash".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    failing: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        if self.failing {
            return Err(MailerError::Rejected("mailbox unavailable".to_string()));
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

/// Records every call; a failing sink records and then errors.
#[derive(Default)]
pub struct RecordingSink {
    pub identified: Mutex<Vec<UserId>>,
    pub tracked: Mutex<Vec<(UserId, String, Value)>>,
    failing: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn outcome(&self) -> Result<(), AnalyticsError> {
        if self.failing {
            return Err(AnalyticsError::Rejected("sink unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AnalyticsSink for RecordingSink {
    async fn identify(&self, user: &User) -> Result<(), AnalyticsError> {
        self.identified.lock().await.push(user.id);
        self.outcome()
    }

    async fn track(
        &self,
        user_id: UserId,
        event: &str,
        properties: Value,
    ) -> Result<(), AnalyticsError> {
        self.tracked
            .lock()
            .await
            .push((user_id, event.to_string(), properties));
        self.outcome()
    }
}

/// DNS verifier that accepts only the names it was told about.
#[derive(Default)]
pub struct StaticDnsVerifier {
    configured: Mutex<HashSet<String>>,
}

impl StaticDnsVerifier {
    pub async fn allow(&self, name: &str) {
        self.configured.lock().await.insert(name.to_string());
    }
}

#[async_trait]
impl DnsVerifier for StaticDnsVerifier {
    async fn is_configured(&self, name: &str) -> bool {
        self.configured.lock().await.contains(name)
    }
}

#[derive(Default)]
pub struct RecordingRouteRegistry {
    pub registered: Mutex<Vec<String>>,
    failing: bool,
}

impl RecordingRouteRegistry {
    pub fn failing() -> Self {
        Self {
            registered: Mutex::new(Vec::new()),
            failing: true,
        }
    }
}

#[async_trait]
impl RouteRegistry for RecordingRouteRegistry {
    async fn register(&self, domain: &str) -> Result<(), RouteRegistryError> {
        if self.failing {
            return Err(RouteRegistryError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "redis down",
            ))));
        }
        self.registered.lock().await.push(domain.to_string());
        Ok(())
    }
}
