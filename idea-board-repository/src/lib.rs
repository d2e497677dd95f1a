//! # Idea Board Repository
//! This crate provides traits and implementations for interacting with the
//! idea board's record store. It includes definitions for errors, interfaces,
//! and concrete implementations for PostgreSQL.
pub mod errors;
pub mod interfaces;
pub mod postgres;

pub use errors::RepositoryError;
pub use interfaces::{
    ACTIVE_VOTE_CONSTRAINT, DomainRepository, EmailTokenRepository, IdeaRepository,
    UserRepository, VoteRepository,
};
pub use postgres::{
    MIGRATOR, PostgresDomainRepository, PostgresEmailTokenRepository, PostgresIdeaRepository,
    PostgresUserRepository, PostgresVoteRepository,
};
