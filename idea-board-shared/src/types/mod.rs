mod domain;
mod email_token;
mod event;
mod idea;
mod record_status;
mod user;
mod vote;

pub use domain::{Domain, DomainId, NewDomain};
pub use email_token::{EmailToken, NewEmailToken};
pub use event::BoardEvent;
pub use idea::{Idea, IdeaId, NewIdea, RankedIdea};
pub use record_status::{RecordStatus, Visibility};
pub use user::{NewUser, Role, User, UserId};
pub use vote::{NewVote, Vote, VoteId, VoteValue};
