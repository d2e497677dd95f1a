//! # Idea Board
//! HTTP backend for idea boards. Users register domains, post ideas on them
//! and vote; ideas are ranked per domain by score.
pub mod config;
pub mod errors;
pub mod server;

pub use config::{Config, Dependencies};
pub use errors::AppError;
