//! Runtime configuration read from the environment.
mod dependencies;

pub use dependencies::Dependencies;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use chrono::Duration;
use idea_board_service::AccountLinks;

use crate::errors::AppError;

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_JWT_EXPIRES_IN_SECS: i64 = 30 * 24 * 60 * 60;
pub const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_VERIFY_EMAIL_ROUTE: &str = "verify-email/";
pub const DEFAULT_RESET_PASSWORD_ROUTE: &str = "auth/reset-password/";
pub const DEFAULT_EMAIL_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;
/// Upper bound for configured lifetimes: ten years.
pub const MAX_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;
pub const DEFAULT_SENDGRID_DOMAIN: &str = "localhost";
pub const DEFAULT_TRAEFIK_SERVICE: &str = "idea-board@docker";
pub const DEFAULT_TRAEFIK_IP: &str = "127.0.0.1";
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON lines; anything else is pretty output.
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: SocketAddr,
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub links: AccountLinks,
    pub email_token_ttl: Duration,
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_domain: String,
    pub segment_write_key: Option<String>,
    pub redis_url: Option<String>,
    pub traefik_service: String,
    pub traefik_ip: IpAddr,
    pub cors_origins: Vec<String>,
    pub log_format: LogFormat,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// * `AppError::Config` - a required variable is missing or a value
    ///   does not parse
    pub fn from_env() -> Result<Self, AppError> {
        let host: IpAddr = parse_var("SERVER_HOST", DEFAULT_SERVER_HOST)?;
        let port: u16 = parse_var("SERVER_PORT", &DEFAULT_SERVER_PORT.to_string())?;
        let jwt_expires_in = lifetime_var("JWT_EXPIRES_IN_SECS", DEFAULT_JWT_EXPIRES_IN_SECS)?;
        let email_token_ttl = lifetime_var("EMAIL_TOKEN_TTL_SECS", DEFAULT_EMAIL_TOKEN_TTL_SECS)?;

        Ok(Self {
            database_url: required_var("DATABASE_URL")?,
            server_addr: SocketAddr::new(host, port),
            jwt_secret: required_var("JWT_SECRET")?,
            jwt_expires_in,
            cookie_domain: optional_var("COOKIE_DOMAIN"),
            cookie_secure: parse_var("COOKIE_SECURE", "false")?,
            links: AccountLinks {
                base_url: var_or("FRONTEND_BASE_URL", DEFAULT_FRONTEND_BASE_URL),
                verify_email_route: with_trailing_slash(var_or(
                    "FRONTEND_VERIFY_EMAIL_ROUTE",
                    DEFAULT_VERIFY_EMAIL_ROUTE,
                )),
                reset_password_route: with_trailing_slash(var_or(
                    "FRONTEND_RESET_PASSWORD_ROUTE",
                    DEFAULT_RESET_PASSWORD_ROUTE,
                )),
            },
            email_token_ttl,
            sendgrid_api_key: optional_var("SENDGRID_API_KEY"),
            sendgrid_domain: var_or("SENDGRID_DOMAIN", DEFAULT_SENDGRID_DOMAIN),
            segment_write_key: optional_var("SEGMENT_WRITE_KEY"),
            redis_url: optional_var("REDIS_URL"),
            traefik_service: var_or("TRAEFIK_SERVICE", DEFAULT_TRAEFIK_SERVICE),
            traefik_ip: parse_var("TRAEFIK_IP", DEFAULT_TRAEFIK_IP)?,
            cors_origins: var_or("CORS_ORIGINS", DEFAULT_CORS_ORIGINS)
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            log_format: LogFormat::from_env(),
        })
    }
}

fn required_var(name: &str) -> Result<String, AppError> {
    optional_var(name).ok_or_else(|| AppError::config(format!("{name} must be set")))
}

/// Unset and blank variables both read as `None`.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    optional_var(name).unwrap_or_else(|| default.to_string())
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = var_or(name, default);
    raw.parse::<T>()
        .map_err(|e| AppError::config(format!("{name} has invalid value '{raw}': {e}")))
}

/// Reads a lifetime in seconds, which must lie in `1..=MAX_LIFETIME_SECS`.
fn lifetime_var(name: &str, default: i64) -> Result<Duration, AppError> {
    let secs: i64 = parse_var(name, &default.to_string())?;
    if !(1..=MAX_LIFETIME_SECS).contains(&secs) {
        return Err(AppError::config(format!(
            "{name} must be between 1 and {MAX_LIFETIME_SECS} seconds, got {secs}"
        )));
    }
    Duration::try_seconds(secs)
        .ok_or_else(|| AppError::config(format!("{name} is out of range")))
}

fn with_trailing_slash(route: String) -> String {
    if route.ends_with('/') {
        route
    } else {
        format!("{route}/")
    }
}
