//! Error types for the idea board services.
//!
//! `ServiceError` is what every service operation returns. The outbound
//! collaborators (mailer, analytics sink, route registry, password hasher)
//! each have their own error type; services log those and surface them as
//! `ServiceError::Internal`.
mod outbound;
mod service;

pub(crate) use outbound::rejection_reason;
pub use outbound::{AnalyticsError, MailerError, PasswordHashError, RouteRegistryError};
pub use service::ServiceError;
