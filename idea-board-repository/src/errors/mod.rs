//! Error types for the idea board repository.
//! Consolidates and re-exports error types related to record store operations.
mod repository;

pub use repository::RepositoryError;
