//! # Idea Board Service
//! Business logic of the idea board: the vote aggregator, the email token
//! lifecycle, account, auth, domain and idea services, and the event bus
//! with its analytics consumer. Services talk to storage only through the
//! repository traits of `idea-board-repository`.
pub mod analytics;
pub mod auth;
pub mod authorization;
pub mod clock;
pub mod domains;
pub mod email_tokens;
pub mod errors;
pub mod events;
pub mod ideas;
pub mod mailer;
pub mod users;
pub mod validation;
pub mod votes;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use analytics::{AnalyticsConsumer, AnalyticsSink, LogSink, SegmentSink};
pub use auth::{Argon2Hasher, AuthService, Claims, JwtCodec, PasswordHasher};
pub use clock::{Clock, SystemClock};
pub use domains::{
    DisabledRouteRegistry, DnsVerifier, DomainChanges, DomainService, RedisRouteRegistry,
    ResolverDnsVerifier, RouteRegistry,
};
pub use email_tokens::{CodeGenerator, EmailTokenService, UuidCodeGenerator};
pub use errors::ServiceError;
pub use events::EventBus;
pub use ideas::{IdeaChanges, IdeaDraft, IdeaService};
pub use mailer::{EmailMessage, LogMailer, Mailer, SendGridMailer};
pub use users::{AccountChanges, AccountLinks, SignUp, UserService};
pub use votes::VoteService;
