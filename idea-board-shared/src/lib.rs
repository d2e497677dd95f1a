//! # Idea Board Shared
//! This crate defines shared data structures and types used across the idea board services.
//! It includes common definitions for users, domains, ideas, votes, email tokens and board events.
pub mod types;
