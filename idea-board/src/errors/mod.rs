use idea_board_service::errors::RouteRegistryError;
use thiserror::Error;

/// Errors that stop the server from starting or keep it from serving.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Route registry error: {0}")]
    RouteRegistry(#[from] RouteRegistryError),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
