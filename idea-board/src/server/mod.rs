// Server module - HTTP server setup and routing
pub mod cookies;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

use std::net::SocketAddr;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use self::state::AppState;

/// Create the Axum application router with all routes and middleware
pub fn create_app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth/signup", post(handlers::auth::sign_up))
        .route("/auth/signin", post(handlers::auth::sign_in))
        .route("/auth/signout", post(handlers::auth::sign_out))
        .route("/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        .route(
            "/me",
            get(handlers::me::get_me)
                .patch(handlers::me::update_me)
                .delete(handlers::me::delete_me),
        )
        .route("/verify-email/:code", get(handlers::auth::verify_email))
        .route("/resend-verify-email", post(handlers::auth::resend_verify_email))
        .route("/domain", post(handlers::domains::create_domain))
        .route(
            "/domain/:key",
            get(handlers::domains::get_domain)
                .patch(handlers::domains::update_domain)
                .delete(handlers::domains::delete_domain),
        )
        .route("/domain/user/:id", get(handlers::domains::domains_of_user))
        .route("/domain/:key/ideas", get(handlers::domains::ranked_ideas))
        .route("/idea", post(handlers::ideas::create_idea))
        .route(
            "/idea/:id",
            get(handlers::ideas::get_idea)
                .patch(handlers::ideas::update_idea)
                .delete(handlers::ideas::delete_idea),
        )
        .route("/vote", post(handlers::votes::submit_vote))
        .route(
            "/vote/:id",
            get(handlers::votes::get_vote)
                .patch(handlers::votes::update_vote)
                .delete(handlers::votes::delete_vote),
        )
        .route("/vote/user/:id", get(handlers::votes::votes_of_user))
        .route("/vote/idea/:id", get(handlers::votes::votes_of_idea))
        .layer(create_cors_layer(cors_origins))
        .with_state(state)
}

/// CORS for the frontend origins; credentials are allowed so the session
/// cookie travels with cross-origin requests.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let origins = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

/// Run the server on the specified address until Ctrl+C or SIGTERM.
pub async fn run_server(app: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
