//! Domain registration.
//!
//! A domain can only be added once its DNS points at this deployment. On
//! success the reverse proxy is told to route the domain (and its `www.`
//! alias) to the idea board service.
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use idea_board_repository::DomainRepository;
use idea_board_shared::types::{BoardEvent, Domain, DomainId, NewDomain, User, UserId, Visibility};
use redis::aio::ConnectionManager;
use serde::Deserialize;

use crate::authorization::ensure_owner_or_admin;
use crate::clock::Clock;
use crate::errors::{RouteRegistryError, ServiceError};
use crate::events::EventBus;
use crate::validation::{is_second_level, normalize_hostname};

/// Checks whether a domain's DNS is set up for this deployment.
#[async_trait]
pub trait DnsVerifier: Send + Sync {
    async fn is_configured(&self, name: &str) -> bool;
}

/// Resolves a name with the system resolver and expects one of its
/// addresses to be `expected_ip`.
pub struct ResolverDnsVerifier {
    expected_ip: IpAddr,
}

impl ResolverDnsVerifier {
    pub fn new(expected_ip: IpAddr) -> Self {
        Self { expected_ip }
    }
}

#[async_trait]
impl DnsVerifier for ResolverDnsVerifier {
    async fn is_configured(&self, name: &str) -> bool {
        match tokio::net::lookup_host((name, 80)).await {
            Ok(mut addrs) => addrs.any(|addr| addr.ip() == self.expected_ip),
            Err(e) => {
                tracing::debug!(domain = name, error = %e, "DNS lookup failed");
                false
            }
        }
    }
}

/// Registers reverse-proxy routes for domains.
#[async_trait]
pub trait RouteRegistry: Send + Sync {
    async fn register(&self, domain: &str) -> Result<(), RouteRegistryError>;
}

/// Writes Traefik router configuration to its Redis key-value provider.
pub struct RedisRouteRegistry {
    connection: ConnectionManager,
    service: String,
}

impl RedisRouteRegistry {
    pub async fn connect(
        redis_url: &str,
        service: impl Into<String>,
    ) -> Result<Self, RouteRegistryError> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self {
            connection,
            service: service.into(),
        })
    }
}

/// Traefik key-value pairs routing `domain` and `www.{domain}` to `service`.
pub fn traefik_router_entries(domain: &str, service: &str) -> Vec<(String, String)> {
    let prefix = format!("traefik/http/routers/{domain}");
    vec![
        (
            format!("{prefix}/rule"),
            format!("Host(`{domain}`) || Host(`www.{domain}`)"),
        ),
        (format!("{prefix}/tls"), "true".to_string()),
        (format!("{prefix}/tls/certResolver"), "letsencrypt".to_string()),
        (format!("{prefix}/service"), service.to_string()),
    ]
}

#[async_trait]
impl RouteRegistry for RedisRouteRegistry {
    async fn register(&self, domain: &str) -> Result<(), RouteRegistryError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in traefik_router_entries(domain, &self.service) {
            pipe.set(key, value).ignore();
        }

        let mut connection = self.connection.clone();
        pipe.query_async::<()>(&mut connection).await?;
        tracing::info!(domain, service = %self.service, "Registered Traefik router");
        Ok(())
    }
}

/// Used when no Redis is configured; routes must then be set up by hand.
#[derive(Debug, Default)]
pub struct DisabledRouteRegistry;

#[async_trait]
impl RouteRegistry for DisabledRouteRegistry {
    async fn register(&self, domain: &str) -> Result<(), RouteRegistryError> {
        tracing::warn!(domain, "Route registry disabled, Traefik router not registered");
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainChanges {
    pub name: Option<String>,
}

pub struct DomainService {
    domains: Arc<dyn DomainRepository>,
    dns: Arc<dyn DnsVerifier>,
    routes: Arc<dyn RouteRegistry>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
}

impl DomainService {
    pub fn new(
        domains: Arc<dyn DomainRepository>,
        dns: Arc<dyn DnsVerifier>,
        routes: Arc<dyn RouteRegistry>,
        clock: Arc<dyn Clock>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            domains,
            dns,
            routes,
            clock,
            events,
        }
    }

    /// Registers `name` for `actor`.
    ///
    /// # Errors
    ///
    /// * `ServiceError::BadRequest` - invalid hostname, not a second level
    ///   domain, or DNS not pointing at this deployment
    /// * `ServiceError::Conflict` - the domain is already registered
    /// * `ServiceError::Internal` - the Traefik router could not be
    ///   registered; the domain row is kept and `DomainCreated` is not published
    pub async fn create(&self, actor: &User, name: &str) -> Result<Domain, ServiceError> {
        let name = self.verified_name(name).await?;

        let domain = self
            .domains
            .insert(&NewDomain {
                name,
                user_id: actor.id,
                has_verified_dns: true,
                last_verified_dns: Some(self.clock.now()),
            })
            .await?;
        tracing::info!(
            domain_id = domain.id,
            name = %domain.name,
            user_id = actor.id,
            "Domain created"
        );

        self.register_route(&domain.name).await?;
        self.events.publish(BoardEvent::DomainCreated(domain.clone()));
        Ok(domain)
    }

    /// Finds an active domain by name. A `www.` prefix is ignored; any other
    /// subdomain is not found.
    pub async fn find_by_name(&self, name: &str) -> Result<Domain, ServiceError> {
        let not_found = || ServiceError::not_found("Domain not found");
        let name = normalize_hostname(name).map_err(|_| not_found())?;
        let name = name.strip_prefix("www.").unwrap_or(&name);
        if !is_second_level(name) {
            return Err(not_found());
        }

        self.domains.find_by_name(name).await?.ok_or_else(not_found)
    }

    pub async fn find_by_id(&self, id: DomainId) -> Result<Domain, ServiceError> {
        self.domains
            .find_by_id(id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| ServiceError::not_found("Domain not found"))
    }

    pub async fn domains_of_user(&self, user_id: UserId) -> Result<Vec<Domain>, ServiceError> {
        Ok(self.domains.list_by_user(user_id).await?)
    }

    pub async fn list_domains(&self, visibility: Visibility) -> Result<Vec<Domain>, ServiceError> {
        Ok(self.domains.list(visibility).await?)
    }

    /// Renames a domain. The new name goes through the same checks as
    /// [`DomainService::create`].
    pub async fn update(
        &self,
        actor: &User,
        id: DomainId,
        changes: DomainChanges,
    ) -> Result<Domain, ServiceError> {
        let mut domain = self.find_by_id(id).await?;
        ensure_owner_or_admin(actor, domain.user_id, "update this domain")?;

        let Some(name) = changes.name else {
            return Ok(domain);
        };
        let name = self.verified_name(&name).await?;
        if name == domain.name {
            return Ok(domain);
        }

        domain.name = name;
        domain.has_verified_dns = true;
        domain.last_verified_dns = Some(self.clock.now());
        let domain = self.domains.update(&domain).await?;
        tracing::info!(domain_id = domain.id, name = %domain.name, "Domain renamed");

        self.register_route(&domain.name).await?;
        Ok(domain)
    }

    /// Soft-deletes a domain. A missing domain is reported as unauthorized.
    pub async fn delete(&self, actor: &User, id: DomainId) -> Result<(), ServiceError> {
        let domain = self
            .domains
            .find_by_id(id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("Not authorized to delete this domain"))?;
        ensure_owner_or_admin(actor, domain.user_id, "delete this domain")?;

        let affected = self.domains.soft_delete(domain.id).await?;
        if affected != 1 {
            return Err(ServiceError::internal(
                "Unexpected affected row count deleting domain",
                affected,
            ));
        }
        tracing::info!(domain_id = id, actor_id = actor.id, "Domain deleted");
        Ok(())
    }

    async fn verified_name(&self, name: &str) -> Result<String, ServiceError> {
        let name = normalize_hostname(name)?;
        if !is_second_level(&name) {
            return Err(ServiceError::bad_request("Not a second level domain"));
        }
        if !self.dns.is_configured(&name).await {
            tracing::info!(domain = %name, "DNS not configured");
            return Err(ServiceError::bad_request("DNS not configured"));
        }
        Ok(name)
    }

    async fn register_route(&self, name: &str) -> Result<(), ServiceError> {
        self.routes
            .register(name)
            .await
            .map_err(|e| ServiceError::internal("Failed to register Traefik route", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        ManualClock, MockDomainRepository, RecordingRouteRegistry, StaticDnsVerifier, sample_user,
    };
    use idea_board_shared::types::Role;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        service: DomainService,
        dns: Arc<StaticDnsVerifier>,
        routes: Arc<RecordingRouteRegistry>,
        events: UnboundedReceiver<BoardEvent>,
    }

    fn fixture_with_routes(routes: RecordingRouteRegistry) -> Fixture {
        let dns = Arc::new(StaticDnsVerifier::default());
        let routes = Arc::new(routes);
        let bus = Arc::new(EventBus::new());
        let events = bus.subscribe();
        let service = DomainService::new(
            Arc::new(MockDomainRepository::default()),
            dns.clone(),
            routes.clone(),
            Arc::new(ManualClock::new()),
            bus,
        );
        Fixture {
            service,
            dns,
            routes,
            events,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_routes(RecordingRouteRegistry::default())
    }

    #[test]
    fn test_traefik_router_entries() {
        let entries = traefik_router_entries("example.com", "idea-board@docker");
        assert_eq!(
            entries,
            vec![
                (
                    "traefik/http/routers/example.com/rule".to_string(),
                    "Host(`example.com`) || Host(`www.example.com`)".to_string()
                ),
                ("traefik/http/routers/example.com/tls".to_string(), "true".to_string()),
                (
                    "traefik/http/routers/example.com/tls/certResolver".to_string(),
                    "letsencrypt".to_string()
                ),
                (
                    "traefik/http/routers/example.com/service".to_string(),
                    "idea-board@docker".to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_normalizes_registers_and_publishes() {
        let mut f = fixture();
        f.dns.allow("example.com").await;
        let actor = sample_user(1, "alice");

        let domain = f.service.create(&actor, "Example.COM.").await.unwrap();

        assert_eq!(domain.name, "example.com");
        assert_eq!(domain.user_id, actor.id);
        assert!(domain.has_verified_dns);
        assert!(domain.last_verified_dns.is_some());
        assert_eq!(*f.routes.registered.lock().await, vec!["example.com".to_string()]);
        assert!(matches!(
            f.events.try_recv(),
            Ok(BoardEvent::DomainCreated(d)) if d.id == domain.id
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_subdomains_and_unconfigured_dns() {
        let f = fixture();
        f.dns.allow("app.example.com").await;
        let actor = sample_user(1, "alice");

        assert_eq!(
            f.service.create(&actor, "app.example.com").await.unwrap_err(),
            ServiceError::BadRequest("Not a second level domain".to_string())
        );
        assert_eq!(
            f.service.create(&actor, "example.org").await.unwrap_err(),
            ServiceError::BadRequest("DNS not configured".to_string())
        );
        assert!(matches!(
            f.service.create(&actor, "not a domain").await.unwrap_err(),
            ServiceError::BadRequest(_)
        ));
        assert!(f.routes.registered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_duplicate_is_conflict() {
        let f = fixture();
        f.dns.allow("example.com").await;
        f.service.create(&sample_user(1, "alice"), "example.com").await.unwrap();

        let err = f
            .service
            .create(&sample_user(2, "bobby"), "example.com")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Conflict("name 'example.com' already exists.".to_string())
        );
    }

    #[tokio::test]
    async fn test_route_registration_failure_is_internal() {
        let mut f = fixture_with_routes(RecordingRouteRegistry::failing());
        f.dns.allow("example.com").await;

        let err = f
            .service
            .create(&sample_user(1, "alice"), "example.com")
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::Internal);
        assert!(f.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_find_by_name_accepts_www_only() {
        let f = fixture();
        f.dns.allow("example.com").await;
        let domain = f.service.create(&sample_user(1, "alice"), "example.com").await.unwrap();

        assert_eq!(f.service.find_by_name("example.com").await.unwrap().id, domain.id);
        assert_eq!(f.service.find_by_name("WWW.example.com").await.unwrap().id, domain.id);
        assert!(matches!(
            f.service.find_by_name("app.example.com").await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            f.service.find_by_name("other.com").await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_domains_of_user() {
        let f = fixture();
        f.dns.allow("example.com").await;
        f.dns.allow("example.org").await;
        f.service.create(&sample_user(1, "alice"), "example.com").await.unwrap();
        f.service.create(&sample_user(2, "bobby"), "example.org").await.unwrap();

        let domains = f.service.domains_of_user(1).await.unwrap();
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].name, "example.com");
        assert_eq!(f.service.list_domains(Visibility::ActiveOnly).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_requires_owner_and_reverifies() {
        let f = fixture();
        f.dns.allow("example.com").await;
        let owner = sample_user(1, "alice");
        let domain = f.service.create(&owner, "example.com").await.unwrap();

        let rename = DomainChanges {
            name: Some("example.net".to_string()),
        };
        assert!(matches!(
            f.service
                .update(&sample_user(2, "bobby"), domain.id, rename.clone())
                .await
                .unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
        assert_eq!(
            f.service.update(&owner, domain.id, rename.clone()).await.unwrap_err(),
            ServiceError::BadRequest("DNS not configured".to_string())
        );

        f.dns.allow("example.net").await;
        let renamed = f.service.update(&owner, domain.id, rename).await.unwrap();
        assert_eq!(renamed.name, "example.net");
        assert_eq!(f.routes.registered.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_domain_is_unauthorized() {
        let f = fixture();
        assert!(matches!(
            f.service.delete(&sample_user(1, "alice"), 42).await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
    }

    #[tokio::test]
    async fn test_admin_can_delete_any_domain() {
        let f = fixture();
        f.dns.allow("example.com").await;
        let domain = f.service.create(&sample_user(1, "alice"), "example.com").await.unwrap();

        assert!(matches!(
            f.service.delete(&sample_user(2, "bobby"), domain.id).await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));

        let mut admin = sample_user(3, "carol");
        admin.roles = vec![Role::Root];
        f.service.delete(&admin, domain.id).await.unwrap();
        assert!(matches!(
            f.service.find_by_id(domain.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }
}
