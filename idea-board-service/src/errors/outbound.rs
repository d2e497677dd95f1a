use thiserror::Error;

/// Errors raised while delivering an email.
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail rejected: {0}")]
    Rejected(String),
}

/// Errors raised while forwarding an event to an analytics sink.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Event rejected: {0}")]
    Rejected(String),
}

/// Errors raised while registering a reverse-proxy route.
#[derive(Debug, Error)]
pub enum RouteRegistryError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Errors raised by a password hasher.
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hash error: {0}")]
    Hash(String),
}

/// Describes a non-2xx response as `status <code>: <body>`.
///
/// Returns `None` if the response succeeded.
pub(crate) async fn rejection_reason(response: reqwest::Response) -> Option<String> {
    let status = response.status();
    if status.is_success() {
        return None;
    }
    let body = response.text().await.unwrap_or_default();
    Some(format!("status {status}: {body}"))
}
