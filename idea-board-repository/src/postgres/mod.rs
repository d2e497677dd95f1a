//! PostgreSQL implementation of the idea board repositories.
//!
//! Every repository wraps a shared `sqlx::PgPool`. Soft-deletable tables carry
//! an explicit `status` column; list queries take a [`Visibility`] and turn it
//! into an explicit filter instead of relying on an implicit one.
//!
//! ## Database Tables
//!
//! - `users`: accounts, unique normalized username/email among active rows
//! - `domains`: registered second-level domains
//! - `ideas`: ideas posted against a domain
//! - `votes`: one active vote per (user, idea), see `votes_user_idea_active_key`
//! - `email_tokens`: single-use codes, deleted on use or expiry
use idea_board_shared::types::{RecordStatus, Visibility};
use sqlx::migrate::Migrator;

use crate::errors::RepositoryError;

mod domains;
mod email_tokens;
mod ideas;
mod users;
mod votes;

pub use domains::PostgresDomainRepository;
pub use email_tokens::PostgresEmailTokenRepository;
pub use ideas::PostgresIdeaRepository;
pub use users::PostgresUserRepository;
pub use votes::PostgresVoteRepository;

/// Embedded schema migrations, run at startup and by the integration tests.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQL predicate selecting the rows admitted by `visibility`.
pub(crate) fn visibility_filter(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::ActiveOnly => "status = 'active'",
        Visibility::IncludeDeleted => "TRUE",
        Visibility::DeletedOnly => "status = 'deleted'",
    }
}

pub(crate) fn parse_status(value: &str) -> Result<RecordStatus, RepositoryError> {
    RecordStatus::parse(value).ok_or_else(|| RepositoryError::InvalidStatus(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_filter() {
        assert_eq!(visibility_filter(Visibility::ActiveOnly), "status = 'active'");
        assert_eq!(visibility_filter(Visibility::IncludeDeleted), "TRUE");
        assert_eq!(visibility_filter(Visibility::DeletedOnly), "status = 'deleted'");
    }

    #[test]
    fn test_parse_status_rejects_unknown_values() {
        assert_eq!(parse_status("active").unwrap(), RecordStatus::Active);
        assert!(matches!(
            parse_status("archived"),
            Err(RepositoryError::InvalidStatus(value)) if value == "archived"
        ));
    }
}
