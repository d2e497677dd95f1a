//! Account flows: sign-up, email verification, password reset and
//! self-service profile changes.
use std::sync::Arc;

use idea_board_repository::UserRepository;
use idea_board_shared::types::{BoardEvent, NewUser, Role, User, UserId, Visibility};
use serde::Deserialize;

use crate::auth::PasswordHasher;
use crate::email_tokens::EmailTokenService;
use crate::errors::ServiceError;
use crate::events::EventBus;
use crate::mailer::{EmailMessage, Mailer};
use crate::validation::{
    normalize_email, normalize_username, validate_email, validate_password, validate_username,
};

/// Frontend locations that emailed links point to.
///
/// Links are built as `{base_url}/{route}{code}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountLinks {
    pub base_url: String,
    pub verify_email_route: String,
    pub reset_password_route: String,
}

impl AccountLinks {
    pub fn verify_email(&self, code: &str) -> String {
        self.link(&self.verify_email_route, code)
    }

    pub fn reset_password(&self, code: &str) -> String {
        self.link(&self.reset_password_route, code)
    }

    fn link(&self, route: &str, code: &str) -> String {
        format!(
            "{}/{}{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/'),
            code
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUp {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Changes a user may make to their own account. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub old_password: Option<String>,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<EmailTokenService>,
    mailer: Arc<dyn Mailer>,
    hasher: Arc<dyn PasswordHasher>,
    events: Arc<EventBus>,
    links: AccountLinks,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<EmailTokenService>,
        mailer: Arc<dyn Mailer>,
        hasher: Arc<dyn PasswordHasher>,
        events: Arc<EventBus>,
        links: AccountLinks,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            hasher,
            events,
            links,
        }
    }

    /// Creates an account and mails a verification link.
    ///
    /// # Errors
    ///
    /// * `ServiceError::BadRequest` - invalid username, email or password
    /// * `ServiceError::Conflict` - the username or email is taken
    /// * `ServiceError::Internal` - the verification email could not be sent;
    ///   the account is kept and `UserCreated` is not published
    pub async fn sign_up(&self, request: SignUp) -> Result<User, ServiceError> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_string();
        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(&request.password)?;

        let new_user = NewUser {
            normalized_username: normalize_username(&username),
            normalized_email: normalize_email(&email),
            username,
            email,
            password_hash: Some(self.hash_password(&request.password)?),
            roles: vec![Role::User],
        };
        let user = self.users.insert(&new_user).await?;
        tracing::info!(user_id = user.id, username = %user.username, "User signed up");

        self.send_email_verification(&user).await?;
        self.events.publish(BoardEvent::UserCreated(user.clone()));
        Ok(user)
    }

    /// Issues a verification token for `user` and mails the link.
    pub async fn send_email_verification(&self, user: &User) -> Result<(), ServiceError> {
        let code = self.tokens.issue(user.id).await?;
        let message = EmailMessage {
            to: user.email.clone(),
            subject: "Verify your email address".to_string(),
            text: format!(
                "Hi {},\n\nPlease verify your email address by opening this link:\n{}\n",
                user.username,
                self.links.verify_email(&code)
            ),
        };
        self.mailer
            .send(&message)
            .await
            .map_err(|e| ServiceError::internal("Failed to send verification email", e))
    }

    /// Sends a new verification link to the active user owning `email`.
    ///
    /// Succeeds silently when no such user exists.
    pub async fn resend_email_verification(&self, email: &str) -> Result<(), ServiceError> {
        match self
            .users
            .find_by_normalized_email(&normalize_email(email))
            .await?
        {
            Some(user) => self.send_email_verification(&user).await,
            None => {
                tracing::debug!("Verification resend requested for unknown email");
                Ok(())
            }
        }
    }

    pub async fn verify_email(&self, code: &str) -> Result<User, ServiceError> {
        self.tokens.redeem(code).await
    }

    /// Mails a password reset link to the user identified by `identifier`,
    /// which is either a username or an email address.
    ///
    /// Succeeds silently when no such user exists.
    pub async fn send_reset_password_email(&self, identifier: &str) -> Result<(), ServiceError> {
        let user = if identifier.contains('@') {
            self.users
                .find_by_normalized_email(&normalize_email(identifier))
                .await?
        } else {
            self.users
                .find_by_normalized_username(&normalize_username(identifier))
                .await?
        };
        let Some(user) = user else {
            tracing::debug!("Password reset requested for unknown user");
            return Ok(());
        };

        let code = self.tokens.issue(user.id).await?;
        let message = EmailMessage {
            to: user.email.clone(),
            subject: "Reset your password".to_string(),
            text: format!(
                "Hi {},\n\nYou can choose a new password by opening this link:\n{}\n\n\
                 If you did not ask for this, you can ignore this email.\n",
                user.username,
                self.links.reset_password(&code)
            ),
        };
        self.mailer
            .send(&message)
            .await
            .map_err(|e| ServiceError::internal("Failed to send password reset email", e))
    }

    /// Consumes the reset token `code` and sets a new password for its owner.
    pub async fn reset_password(&self, code: &str, password: &str) -> Result<User, ServiceError> {
        validate_password(password)?;
        let mut user = self.tokens.redeem(code).await?;

        user.password_hash = Some(self.hash_password(password)?);
        let user = self.users.update(&user).await?;
        tracing::info!(user_id = user.id, "Password reset");
        Ok(user)
    }

    /// Applies `changes` to the actor's own account.
    ///
    /// Changing the password requires the current one. Changing the email
    /// clears the verified flag and sends a new verification link.
    pub async fn update_me(
        &self,
        actor: &User,
        changes: AccountChanges,
    ) -> Result<User, ServiceError> {
        let mut user = self.find_by_id(actor.id).await?;
        let mut email_changed = false;

        if let Some(username) = changes.username {
            let username = username.trim().to_string();
            validate_username(&username)?;
            user.normalized_username = normalize_username(&username);
            user.username = username;
        }

        if let Some(email) = changes.email {
            let email = email.trim().to_string();
            validate_email(&email)?;
            let normalized = normalize_email(&email);
            if normalized != user.normalized_email {
                user.has_verified_email = false;
                email_changed = true;
            }
            user.normalized_email = normalized;
            user.email = email;
        }

        if let Some(password) = changes.password {
            self.check_existing_password(&user, changes.old_password.as_deref())?;
            validate_password(&password)?;
            user.password_hash = Some(self.hash_password(&password)?);
        }

        let user = self.users.update(&user).await?;
        tracing::info!(user_id = user.id, "Account updated");

        if email_changed {
            self.send_email_verification(&user).await?;
        }
        Ok(user)
    }

    pub async fn delete_me(&self, actor: &User) -> Result<(), ServiceError> {
        let affected = self.users.soft_delete(actor.id).await?;
        if affected != 1 {
            return Err(ServiceError::internal(
                "Unexpected affected row count deleting user",
                affected,
            ));
        }
        tracing::info!(user_id = actor.id, "Account deleted");
        Ok(())
    }

    pub async fn find_by_id(&self, id: UserId) -> Result<User, ServiceError> {
        self.users
            .find_by_id(id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User, ServiceError> {
        self.users
            .find_by_normalized_username(&normalize_username(username))
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User, ServiceError> {
        self.users
            .find_by_normalized_email(&normalize_email(email))
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    pub async fn list_users(&self, visibility: Visibility) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.list(visibility).await?)
    }

    fn check_existing_password(
        &self,
        user: &User,
        old_password: Option<&str>,
    ) -> Result<(), ServiceError> {
        let incorrect = || ServiceError::unauthorized("Incorrect existing password.");
        let (Some(old_password), Some(hash)) = (old_password, user.password_hash.as_deref()) else {
            return Err(incorrect());
        };
        let matches = self
            .hasher
            .verify(old_password, hash)
            .map_err(|e| ServiceError::internal("Stored password hash is unreadable", e))?;
        if matches { Ok(()) } else { Err(incorrect()) }
    }

    fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        self.hasher
            .hash(password)
            .map_err(|e| ServiceError::internal("Failed to hash password", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email_tokens::EmailTokenService;
    use crate::test_support::{
        ManualClock, MockEmailTokenRepository, MockUserRepository, PlainHasher, RecordingMailer,
        SequenceCodeGenerator,
    };
    use chrono::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        service: UserService,
        users: Arc<MockUserRepository>,
        mailer: Arc<RecordingMailer>,
        events: UnboundedReceiver<BoardEvent>,
    }

    fn links() -> AccountLinks {
        AccountLinks {
            base_url: "http://localhost:3000/".to_string(),
            verify_email_route: "verify-email/".to_string(),
            reset_password_route: "auth/reset-password/".to_string(),
        }
    }

    fn fixture_with_mailer(mailer: RecordingMailer) -> Fixture {
        let users = Arc::new(MockUserRepository::default());
        let tokens = Arc::new(EmailTokenService::new(
            Arc::new(MockEmailTokenRepository::default()),
            users.clone(),
            Arc::new(ManualClock::new()),
            Arc::new(SequenceCodeGenerator::default()),
            Duration::hours(24),
        ));
        let mailer = Arc::new(mailer);
        let bus = Arc::new(EventBus::new());
        let events = bus.subscribe();
        let service = UserService::new(
            users.clone(),
            tokens,
            mailer.clone(),
            Arc::new(PlainHasher),
            bus,
            links(),
        );
        Fixture {
            service,
            users,
            mailer,
            events,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_mailer(RecordingMailer::default())
    }

    fn sign_up_request(username: &str, email: &str) -> SignUp {
        SignUp {
            username: username.to_string(),
            email: email.to_string(),
            password: "Passw0rd!".to_string(),
        }
    }

    #[test]
    fn test_links() {
        let links = links();
        assert_eq!(links.verify_email("abc"), "http://localhost:3000/verify-email/abc");
        assert_eq!(
            links.reset_password("abc"),
            "http://localhost:3000/auth/reset-password/abc"
        );
    }

    #[tokio::test]
    async fn test_sign_up_creates_user_mails_link_and_publishes() {
        let mut f = fixture();

        let user = f
            .service
            .sign_up(sign_up_request("Alice", "A.lice+x@gmail.com"))
            .await
            .unwrap();

        assert_eq!(user.username, "Alice");
        assert_eq!(user.normalized_username, "alice");
        assert_eq!(user.normalized_email, "alice@gmail.com");
        assert_eq!(user.password_hash.as_deref(), Some("plain:Passw0rd!"));
        assert!(!user.has_verified_email);

        let sent = f.mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "A.lice+x@gmail.com");
        assert!(sent[0].text.contains("http://localhost:3000/verify-email/code-1"));

        assert!(matches!(
            f.events.try_recv(),
            Ok(BoardEvent::UserCreated(created)) if created.id == user.id
        ));
    }

    #[tokio::test]
    async fn test_sign_up_validates_input() {
        let f = fixture();

        for request in [
            sign_up_request("abc", "alice@example.com"),
            sign_up_request("alice", "not-an-email"),
            SignUp {
                password: "weak".to_string(),
                ..sign_up_request("alice", "alice@example.com")
            },
        ] {
            let err = f.service.sign_up(request).await.unwrap_err();
            assert!(matches!(err, ServiceError::BadRequest(_)));
        }
        assert!(f.users.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email_is_cleaned_conflict() {
        let f = fixture();
        f.service
            .sign_up(sign_up_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = f
            .service
            .sign_up(sign_up_request("bobby", "Alice+2@example.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Conflict("email 'alice@example.com' already exists.".to_string())
        );
    }

    #[tokio::test]
    async fn test_sign_up_mail_failure_is_internal() {
        let mut f = fixture_with_mailer(RecordingMailer::failing());

        let err = f
            .service
            .sign_up(sign_up_request("alice", "alice@example.com"))
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::Internal);
        assert_eq!(f.users.all().await.len(), 1);
        assert!(f.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_email_verification_mail_failure_is_internal() {
        let f = fixture_with_mailer(RecordingMailer::failing());
        let user = f.users.seed("alice").await;

        assert_eq!(
            f.service.send_email_verification(&user).await.unwrap_err(),
            ServiceError::Internal
        );
    }

    #[tokio::test]
    async fn test_verify_email_with_mailed_code() {
        let f = fixture();
        let user = f
            .service
            .sign_up(sign_up_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let verified = f.service.verify_email("code-1").await.unwrap();
        assert_eq!(verified.id, user.id);
        assert!(verified.has_verified_email);

        assert!(matches!(
            f.service.verify_email("code-1").await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_resend_verification_is_silent_for_unknown_email() {
        let f = fixture();
        f.service
            .resend_email_verification("nobody@example.com")
            .await
            .unwrap();
        assert!(f.mailer.sent.lock().await.is_empty());

        f.users.seed("alice").await;
        f.service
            .resend_email_verification("ALICE@example.com")
            .await
            .unwrap();
        assert_eq!(f.mailer.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let f = fixture();
        f.users.seed_with_password("alice", "Passw0rd!").await;

        f.service.send_reset_password_email("nobody").await.unwrap();
        assert!(f.mailer.sent.lock().await.is_empty());

        f.service.send_reset_password_email("Alice").await.unwrap();
        {
            let sent = f.mailer.sent.lock().await;
            assert_eq!(sent.len(), 1);
            assert!(
                sent[0]
                    .text
                    .contains("http://localhost:3000/auth/reset-password/code-1")
            );
        }

        let err = f.service.reset_password("code-1", "weak").await.unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        let user = f.service.reset_password("code-1", "N3wPassword").await.unwrap();
        assert_eq!(user.password_hash.as_deref(), Some("plain:N3wPassword"));

        assert!(matches!(
            f.service.reset_password("code-1", "N3wPassword").await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_reset_password_email_by_address() {
        let f = fixture();
        f.users.seed("alice").await;

        f.service
            .send_reset_password_email("alice@example.com")
            .await
            .unwrap();
        assert_eq!(f.mailer.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_me_password_requires_existing_password() {
        let f = fixture();
        let user = f.users.seed_with_password("alice", "Passw0rd!").await;

        let wrong = AccountChanges {
            password: Some("N3wPassword".to_string()),
            old_password: Some("nope".to_string()),
            ..Default::default()
        };
        assert_eq!(
            f.service.update_me(&user, wrong).await.unwrap_err(),
            ServiceError::Unauthorized("Incorrect existing password.".to_string())
        );

        let missing = AccountChanges {
            password: Some("N3wPassword".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            f.service.update_me(&user, missing).await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));

        let right = AccountChanges {
            password: Some("N3wPassword".to_string()),
            old_password: Some("Passw0rd!".to_string()),
            ..Default::default()
        };
        let updated = f.service.update_me(&user, right).await.unwrap();
        assert_eq!(updated.password_hash.as_deref(), Some("plain:N3wPassword"));
    }

    #[tokio::test]
    async fn test_update_me_email_resets_verification() {
        let f = fixture();
        let mut user = f.users.seed("alice").await;
        user.has_verified_email = true;
        f.users.replace(user.clone()).await;

        let changes = AccountChanges {
            email: Some("New@Example.com".to_string()),
            ..Default::default()
        };
        let updated = f.service.update_me(&user, changes).await.unwrap();

        assert_eq!(updated.email, "New@Example.com");
        assert_eq!(updated.normalized_email, "new@example.com");
        assert!(!updated.has_verified_email);
        assert_eq!(f.mailer.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_me_email_mail_failure_is_internal() {
        let f = fixture_with_mailer(RecordingMailer::failing());
        let user = f.users.seed("alice").await;

        let changes = AccountChanges {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        };

        assert_eq!(
            f.service.update_me(&user, changes).await.unwrap_err(),
            ServiceError::Internal
        );
    }

    #[tokio::test]
    async fn test_update_me_username_conflict() {
        let f = fixture();
        f.users.seed("bobby").await;
        let alice = f.users.seed("alice").await;

        let changes = AccountChanges {
            username: Some("Bobby".to_string()),
            ..Default::default()
        };
        assert_eq!(
            f.service.update_me(&alice, changes).await.unwrap_err(),
            ServiceError::Conflict("username 'bobby' already exists.".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_me_and_lookups() {
        let f = fixture();
        let user = f.users.seed("alice").await;

        assert_eq!(f.service.find_by_username("ALICE").await.unwrap().id, user.id);
        assert_eq!(
            f.service.find_by_email("alice@example.com").await.unwrap().id,
            user.id
        );

        f.service.delete_me(&user).await.unwrap();

        assert!(matches!(
            f.service.find_by_id(user.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert_eq!(
            f.service.delete_me(&user).await.unwrap_err(),
            ServiceError::Internal
        );
        assert_eq!(f.service.list_users(Visibility::ActiveOnly).await.unwrap().len(), 0);
        assert_eq!(f.service.list_users(Visibility::IncludeDeleted).await.unwrap().len(), 1);
    }
}
