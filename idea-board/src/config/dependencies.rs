use std::sync::Arc;

use idea_board_repository::{
    MIGRATOR, PostgresDomainRepository, PostgresEmailTokenRepository, PostgresIdeaRepository,
    PostgresUserRepository, PostgresVoteRepository,
};
use idea_board_service::{
    AnalyticsConsumer, AnalyticsSink, Argon2Hasher, AuthService, Clock, DisabledRouteRegistry,
    DomainService, EmailTokenService, EventBus, IdeaService, JwtCodec, LogMailer, LogSink, Mailer,
    PasswordHasher, RedisRouteRegistry, ResolverDnsVerifier, RouteRegistry, SegmentSink,
    SendGridMailer, SystemClock, UserService, UuidCodeGenerator, VoteService,
};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::server::cookies::SessionCookie;
use crate::server::state::AppState;

const MAX_DB_CONNECTIONS: u32 = 10;

/// `Dependencies` holds everything the server needs once started.
///
/// `state` is handed to the router; `analytics` must be spawned so that
/// board events reach the analytics sink.
pub struct Dependencies {
    pub state: AppState,
    pub analytics: AnalyticsConsumer,
}

impl Dependencies {
    /// Connects to Postgres, applies pending migrations and wires the
    /// repositories, outbound collaborators and services.
    ///
    /// # Errors
    ///
    /// * `AppError::Database` - the database is unreachable
    /// * `AppError::Migration` - a migration failed to apply
    /// * `AppError::RouteRegistry` - `REDIS_URL` is set but Redis is unreachable
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_DB_CONNECTIONS)
            .connect(&config.database_url)
            .await?;
        MIGRATOR.run(&pool).await?;
        info!("Database migrations applied");

        let users = Arc::new(PostgresUserRepository::new(pool.clone()));
        let domains = Arc::new(PostgresDomainRepository::new(pool.clone()));
        let ideas = Arc::new(PostgresIdeaRepository::new(pool.clone()));
        let votes = Arc::new(PostgresVoteRepository::new(pool.clone()));
        let email_tokens = Arc::new(PostgresEmailTokenRepository::new(pool));

        let events = Arc::new(EventBus::new());
        let analytics = AnalyticsConsumer::new(events.subscribe(), analytics_sink(config));

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher);
        let jwt = JwtCodec::new(config.jwt_secret.as_bytes(), config.jwt_expires_in);

        let tokens = Arc::new(EmailTokenService::new(
            email_tokens,
            users.clone(),
            clock.clone(),
            Arc::new(UuidCodeGenerator),
            config.email_token_ttl,
        ));
        let user_service = UserService::new(
            users.clone(),
            tokens,
            mailer(config),
            hasher.clone(),
            events.clone(),
            config.links.clone(),
        );
        let auth = AuthService::new(users, hasher, jwt, clock.clone());
        let domain_service = DomainService::new(
            domains.clone(),
            Arc::new(ResolverDnsVerifier::new(config.traefik_ip)),
            route_registry(config).await?,
            clock,
            events.clone(),
        );
        let idea_service = IdeaService::new(ideas.clone(), domains, events.clone());
        let vote_service = VoteService::new(votes, ideas, events);

        let state = AppState {
            users: Arc::new(user_service),
            auth: Arc::new(auth),
            domains: Arc::new(domain_service),
            ideas: Arc::new(idea_service),
            votes: Arc::new(vote_service),
            session: SessionCookie {
                domain: config.cookie_domain.clone(),
                secure: config.cookie_secure,
                max_age: config.jwt_expires_in,
            },
        };

        Ok(Dependencies { state, analytics })
    }
}

fn mailer(config: &Config) -> Arc<dyn Mailer> {
    match &config.sendgrid_api_key {
        Some(api_key) => Arc::new(SendGridMailer::new(api_key.clone(), &config.sendgrid_domain)),
        None => {
            warn!("SENDGRID_API_KEY not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    }
}

fn analytics_sink(config: &Config) -> Arc<dyn AnalyticsSink> {
    match &config.segment_write_key {
        Some(write_key) => Arc::new(SegmentSink::new(write_key.clone())),
        None => {
            info!("SEGMENT_WRITE_KEY not set, analytics events will only be logged");
            Arc::new(LogSink)
        }
    }
}

async fn route_registry(config: &Config) -> Result<Arc<dyn RouteRegistry>, AppError> {
    match &config.redis_url {
        Some(redis_url) => {
            let registry = RedisRouteRegistry::connect(redis_url, config.traefik_service.clone())
                .await?;
            info!(service = %config.traefik_service, "Traefik route registration enabled");
            Ok(Arc::new(registry))
        }
        None => {
            warn!("REDIS_URL not set, Traefik route registration disabled");
            Ok(Arc::new(DisabledRouteRegistry))
        }
    }
}
