//! This module defines and re-exports the interfaces for the record store.
//! It serves as a central point for accessing traits related to data interaction.
mod domains;
mod email_tokens;
mod ideas;
mod users;
mod votes;

pub use domains::DomainRepository;
pub use email_tokens::EmailTokenRepository;
pub use ideas::IdeaRepository;
pub use users::UserRepository;
pub use votes::{ACTIVE_VOTE_CONSTRAINT, VoteRepository};
