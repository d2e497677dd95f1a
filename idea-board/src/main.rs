//! Idea Board Main Entry Point
//!
//! Loads configuration, wires the services and serves the HTTP API.

use dotenv::dotenv;
use idea_board::config::LogFormat;
use idea_board::server::{create_app, run_server};
use idea_board::{AppError, Config, Dependencies};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("idea_board=info,idea_board_service=info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
                .init();
        }
    }

    info!(
        service_name = "idea-board",
        service_version = env!("CARGO_PKG_VERSION"),
        format = ?format,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing(LogFormat::from_env());

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e);
        }
    };

    let deps = match Dependencies::new(&config).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    tokio::spawn(deps.analytics.run());

    let app = create_app(deps.state, &config.cors_origins);
    if let Err(e) = run_server(app, config.server_addr).await {
        error!(error = %e, "Server failed");
        return Err(e.into());
    }
    Ok(())
}
