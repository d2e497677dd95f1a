use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use chrono::Duration;
use http_body_util::BodyExt;
use idea_board::server::cookies::SessionCookie;
use idea_board::server::create_app;
use idea_board::server::state::AppState;
use idea_board_service::test_support::{
    ManualClock, MockDomainRepository, MockEmailTokenRepository, MockIdeaRepository,
    MockUserRepository, MockVoteRepository, PlainHasher, RecordingMailer, RecordingRouteRegistry,
    SequenceCodeGenerator, StaticDnsVerifier,
};
use idea_board_service::{
    AccountLinks, AuthService, DomainService, EmailTokenService, EventBus, IdeaService, JwtCodec,
    UserService, VoteService,
};
use serde_json::{Value, json};
use tower::ServiceExt;

const PASSWORD: &str = "Passw0rd!";

struct TestApp {
    router: Router,
    domains: Arc<MockDomainRepository>,
    ideas: Arc<MockIdeaRepository>,
    dns: Arc<StaticDnsVerifier>,
    routes: Arc<RecordingRouteRegistry>,
    mailer: Arc<RecordingMailer>,
    clock: Arc<ManualClock>,
}

struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

fn test_app() -> TestApp {
    let users = Arc::new(MockUserRepository::default());
    let domains = Arc::new(MockDomainRepository::default());
    let ideas = Arc::new(MockIdeaRepository::default());
    let votes = Arc::new(MockVoteRepository::new(ideas.clone()));
    let dns = Arc::new(StaticDnsVerifier::default());
    let routes = Arc::new(RecordingRouteRegistry::default());
    let mailer = Arc::new(RecordingMailer::default());
    let clock = Arc::new(ManualClock::new());
    let events = Arc::new(EventBus::new());

    let tokens = Arc::new(EmailTokenService::new(
        Arc::new(MockEmailTokenRepository::default()),
        users.clone(),
        clock.clone(),
        Arc::new(SequenceCodeGenerator::default()),
        Duration::hours(24),
    ));
    let links = AccountLinks {
        base_url: "http://localhost:3000".to_string(),
        verify_email_route: "verify-email/".to_string(),
        reset_password_route: "auth/reset-password/".to_string(),
    };
    let jwt = JwtCodec::new(b"test-secret", Duration::days(30));

    let state = AppState {
        users: Arc::new(UserService::new(
            users.clone(),
            tokens,
            mailer.clone(),
            Arc::new(PlainHasher),
            events.clone(),
            links,
        )),
        auth: Arc::new(AuthService::new(
            users,
            Arc::new(PlainHasher),
            jwt,
            clock.clone(),
        )),
        domains: Arc::new(DomainService::new(
            domains.clone(),
            dns.clone(),
            routes.clone(),
            clock.clone(),
            events.clone(),
        )),
        ideas: Arc::new(IdeaService::new(
            ideas.clone(),
            domains.clone(),
            events.clone(),
        )),
        votes: Arc::new(VoteService::new(votes, ideas.clone(), events)),
        session: SessionCookie {
            domain: None,
            secure: false,
            max_age: Duration::days(30),
        },
    };

    TestApp {
        router: create_app(state, &["http://localhost:3000".to_string()]),
        domains,
        ideas,
        dns,
        routes,
        mailer,
        clock,
    }
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Response {
            status,
            headers,
            body,
        }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        self.send(request(method, uri, token, body)).await
    }

    /// Signs `username` up and returns `(user id, session token)`.
    async fn sign_up(&self, username: &str) -> (i64, String) {
        let response = self
            .call(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        (
            response.body["user"]["id"].as_i64().unwrap(),
            response.body["token"].as_str().unwrap().to_string(),
        )
    }
}

fn assert_error(response: &Response, status: StatusCode, message: &str) {
    assert_eq!(response.status, status);
    assert_eq!(
        response.body,
        json!({ "status": "error", "message": message })
    );
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let response = app.call(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_sign_up_sets_cookie_and_mails_verification_link() {
    let app = test_app();

    let response = app
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": PASSWORD
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.headers[SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("sess="));
    assert!(cookie.contains("HttpOnly"));
    assert_eq!(response.body["user"]["username"], "alice");
    assert_eq!(response.body["user"]["has_verified_email"], false);
    assert!(response.body["user"].get("password_hash").is_none());

    let sent = app.mailer.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.com");
    assert!(sent[0].text.contains("http://localhost:3000/verify-email/code-1"));
}

#[tokio::test]
async fn test_sign_up_duplicate_email_is_conflict() {
    let app = test_app();
    app.sign_up("alice").await;

    let response = app
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({
                "username": "alice2",
                "email": "alice@example.com",
                "password": PASSWORD
            })),
        )
        .await;

    assert_error(
        &response,
        StatusCode::CONFLICT,
        "email 'alice@example.com' already exists.",
    );
}

#[tokio::test]
async fn test_sign_in() {
    let app = test_app();
    app.sign_up("alice").await;

    let wrong = app
        .call(
            Method::POST,
            "/auth/signin",
            None,
            Some(json!({ "username": "alice", "password": "Wrong-pass1" })),
        )
        .await;
    assert_error(&wrong, StatusCode::UNAUTHORIZED, "Incorrect username or password");

    let right = app
        .call(
            Method::POST,
            "/auth/signin",
            None,
            Some(json!({ "username": "ALICE", "password": PASSWORD })),
        )
        .await;
    assert_eq!(right.status, StatusCode::OK);
    assert_eq!(right.body["user"]["username"], "alice");
    assert!(right.headers.contains_key(SET_COOKIE));
}

#[tokio::test]
async fn test_me_requires_session() {
    let app = test_app();
    let (_, token) = app.sign_up("alice").await;

    let anonymous = app.call(Method::GET, "/me", None, None).await;
    assert_error(&anonymous, StatusCode::UNAUTHORIZED, "Not signed in");

    let forged = app.call(Method::GET, "/me", Some("not-a-jwt"), None).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    let bearer = app.call(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(bearer.status, StatusCode::OK);
    assert_eq!(bearer.body["username"], "alice");

    let with_cookie = app
        .send(
            Request::builder()
                .uri("/me")
                .header(COOKIE, format!("theme=dark; sess={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(with_cookie.status, StatusCode::OK);
    assert_eq!(with_cookie.body["username"], "alice");
}

#[tokio::test]
async fn test_update_me_and_delete_me() {
    let app = test_app();
    let (_, token) = app.sign_up("alice").await;

    let updated = app
        .call(
            Method::PATCH,
            "/me",
            Some(&token),
            Some(json!({ "username": "alicia" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["username"], "alicia");

    let deleted = app.call(Method::DELETE, "/me", Some(&token), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert!(
        deleted.headers[SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0")
    );

    let after = app.call(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_out_clears_cookie() {
    let app = test_app();

    let response = app.call(Method::POST, "/auth/signout", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.headers[SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("sess=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_verify_email_redeems_token_once() {
    let app = test_app();
    app.sign_up("alice").await;

    let first = app
        .call(Method::GET, "/verify-email/code-1", None, None)
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["has_verified_email"], true);

    let second = app
        .call(Method::GET, "/verify-email/code-1", None, None)
        .await;
    assert_error(&second, StatusCode::NOT_FOUND, "Token not found");
}

#[tokio::test]
async fn test_verify_email_expired_token_is_gone() {
    let app = test_app();
    app.sign_up("alice").await;
    app.clock.advance(Duration::hours(25));

    let response = app
        .call(Method::GET, "/verify-email/code-1", None, None)
        .await;

    assert_error(&response, StatusCode::GONE, "Token expired");
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = test_app();
    app.sign_up("alice").await;

    let forgot = app
        .call(
            Method::POST,
            "/auth/forgot-password",
            None,
            Some(json!({ "email": "alice@example.com" })),
        )
        .await;
    assert_eq!(forgot.status, StatusCode::OK);
    {
        let sent = app.mailer.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert!(
            sent[1]
                .text
                .contains("http://localhost:3000/auth/reset-password/code-2")
        );
    }

    let reset = app
        .call(
            Method::POST,
            "/auth/reset-password",
            None,
            Some(json!({ "code": "code-2", "password": "N3w-Password" })),
        )
        .await;
    assert_eq!(reset.status, StatusCode::OK);

    let sign_in = app
        .call(
            Method::POST,
            "/auth/signin",
            None,
            Some(json!({ "username": "alice", "password": "N3w-Password" })),
        )
        .await;
    assert_eq!(sign_in.status, StatusCode::OK);
}

#[tokio::test]
async fn test_forgot_password_for_unknown_user_succeeds_quietly() {
    let app = test_app();

    let response = app
        .call(
            Method::POST,
            "/auth/forgot-password",
            None,
            Some(json!({ "username": "nobody" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(app.mailer.sent.lock().await.is_empty());
}

#[tokio::test]
async fn test_create_and_read_domain() {
    let app = test_app();
    let (user_id, token) = app.sign_up("alice").await;
    app.dns.allow("example.com").await;

    let created = app
        .call(
            Method::POST,
            "/domain",
            Some(&token),
            Some(json!({ "name": "Example.COM." })),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    assert_eq!(created.body["name"], "example.com");
    assert_eq!(
        app.routes.registered.lock().await.as_slice(),
        ["example.com".to_string()]
    );

    let by_name = app
        .call(Method::GET, "/domain/example.com", None, None)
        .await;
    assert_eq!(by_name.status, StatusCode::OK);
    assert_eq!(by_name.body["id"], created.body["id"]);

    let of_user = app
        .call(Method::GET, &format!("/domain/user/{user_id}"), None, None)
        .await;
    assert_eq!(of_user.status, StatusCode::OK);
    assert_eq!(of_user.body.as_array().unwrap().len(), 1);

    let duplicate = app
        .call(
            Method::POST,
            "/domain",
            Some(&token),
            Some(json!({ "name": "example.com" })),
        )
        .await;
    assert_error(
        &duplicate,
        StatusCode::CONFLICT,
        "name 'example.com' already exists.",
    );
}

#[tokio::test]
async fn test_create_domain_rejects_unconfigured_dns() {
    let app = test_app();
    let (_, token) = app.sign_up("alice").await;

    let response = app
        .call(
            Method::POST,
            "/domain",
            Some(&token),
            Some(json!({ "name": "example.com" })),
        )
        .await;

    assert_error(&response, StatusCode::BAD_REQUEST, "DNS not configured");
}

#[tokio::test]
async fn test_domain_writes_need_numeric_id_and_ownership() {
    let app = test_app();
    let (_, token) = app.sign_up("alice").await;

    let bad_id = app
        .call(
            Method::PATCH,
            "/domain/example.com",
            Some(&token),
            Some(json!({ "name": "other.com" })),
        )
        .await;
    assert_error(
        &bad_id,
        StatusCode::BAD_REQUEST,
        "Invalid domain id 'example.com'",
    );

    let missing = app
        .call(Method::DELETE, "/domain/999", Some(&token), None)
        .await;
    assert_error(
        &missing,
        StatusCode::UNAUTHORIZED,
        "Not authorized to delete this domain",
    );
}

#[tokio::test]
async fn test_idea_ownership() {
    let app = test_app();
    let (alice_id, alice) = app.sign_up("alice").await;
    let (_, bob) = app.sign_up("bobby").await;
    let domain = app.domains.seed(alice_id, "example.com").await;

    let created = app
        .call(
            Method::POST,
            "/idea",
            Some(&alice),
            Some(json!({ "domain_id": domain.id, "headline": "Dark mode" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    let idea_id = created.body["id"].as_i64().unwrap();

    let stolen = app
        .call(Method::DELETE, &format!("/idea/{idea_id}"), Some(&bob), None)
        .await;
    assert_error(
        &stolen,
        StatusCode::UNAUTHORIZED,
        "Not authorized to delete this idea",
    );

    let deleted = app
        .call(Method::DELETE, &format!("/idea/{idea_id}"), Some(&alice), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = app
        .call(Method::GET, &format!("/idea/{idea_id}"), None, None)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_vote_toggle_and_ranking() {
    let app = test_app();
    let (alice_id, alice) = app.sign_up("alice").await;
    let (_, bob) = app.sign_up("bobby").await;
    let domain = app.domains.seed(alice_id, "example.com").await;
    let first = app.ideas.seed(alice_id, domain.id, "Dark mode").await;
    let second = app.ideas.seed(alice_id, domain.id, "Offline sync").await;

    let up = app
        .call(
            Method::POST,
            "/vote",
            Some(&alice),
            Some(json!({ "idea_id": first.id, "type": "UP" })),
        )
        .await;
    assert_eq!(up.status, StatusCode::OK, "{}", up.body);
    assert_eq!(up.body["type"], "UP");

    let switched = app
        .call(
            Method::POST,
            "/vote",
            Some(&alice),
            Some(json!({ "idea_id": first.id, "type": "DOWN" })),
        )
        .await;
    assert_eq!(switched.body["id"], up.body["id"]);
    assert_eq!(switched.body["type"], "DOWN");

    app.call(
        Method::POST,
        "/vote",
        Some(&bob),
        Some(json!({ "idea_id": second.id, "type": "UP" })),
    )
    .await;

    let ranked = app
        .call(
            Method::GET,
            &format!("/domain/{}/ideas?limit=10", domain.id),
            None,
            None,
        )
        .await;
    assert_eq!(ranked.status, StatusCode::OK);
    let ranked = ranked.body.as_array().unwrap().clone();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["id"], second.id);
    assert_eq!(ranked[0]["score"], 1);
    assert_eq!(ranked[1]["id"], first.id);
    assert_eq!(ranked[1]["score"], -1);

    let of_idea = app
        .call(Method::GET, &format!("/vote/idea/{}", first.id), None, None)
        .await;
    assert_eq!(of_idea.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_vote_errors() {
    let app = test_app();
    let (alice_id, alice) = app.sign_up("alice").await;
    let (_, bob) = app.sign_up("bobby").await;
    let domain = app.domains.seed(alice_id, "example.com").await;
    let idea = app.ideas.seed(alice_id, domain.id, "Dark mode").await;

    let anonymous = app
        .call(
            Method::POST,
            "/vote",
            None,
            Some(json!({ "idea_id": idea.id, "type": "UP" })),
        )
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let missing = app
        .call(
            Method::POST,
            "/vote",
            Some(&alice),
            Some(json!({ "idea_id": 999, "type": "UP" })),
        )
        .await;
    assert_error(&missing, StatusCode::NOT_FOUND, "Idea not found");

    let removed = app
        .call(
            Method::POST,
            "/vote",
            Some(&alice),
            Some(json!({ "idea_id": idea.id, "type": "REMOVED" })),
        )
        .await;
    assert_error(
        &removed,
        StatusCode::BAD_REQUEST,
        "Vote type must be UP or DOWN",
    );

    let cast = app
        .call(
            Method::POST,
            "/vote",
            Some(&alice),
            Some(json!({ "idea_id": idea.id, "type": "UP" })),
        )
        .await;
    let vote_id = cast.body["id"].as_i64().unwrap();

    let foreign = app
        .call(Method::DELETE, &format!("/vote/{vote_id}"), Some(&bob), None)
        .await;
    assert_error(
        &foreign,
        StatusCode::UNAUTHORIZED,
        "Not authorized to delete this vote",
    );

    let own = app
        .call(Method::DELETE, &format!("/vote/{vote_id}"), Some(&alice), None)
        .await;
    assert_eq!(own.status, StatusCode::OK);

    let read = app
        .call(Method::GET, &format!("/vote/{vote_id}"), None, None)
        .await;
    assert_eq!(read.status, StatusCode::NOT_FOUND);
}
