use crate::types::{Domain, Idea, User, Vote};

/// A notification published after a record has been persisted.
///
/// Consumers (analytics and the like) receive these over their own queue and
/// cannot affect the request that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    UserCreated(User),
    DomainCreated(Domain),
    IdeaCreated(Idea),
    VoteCreated(Vote),
}

impl BoardEvent {
    /// Name of the event as reported to analytics.
    pub fn name(&self) -> &'static str {
        match self {
            BoardEvent::UserCreated(_) => "Signed Up",
            BoardEvent::DomainCreated(_) => "Added Domain",
            BoardEvent::IdeaCreated(_) => "Added Idea",
            BoardEvent::VoteCreated(_) => "Added Vote",
        }
    }

    /// Id of the user the event is attributed to.
    pub fn actor_id(&self) -> i64 {
        match self {
            BoardEvent::UserCreated(user) => user.id,
            BoardEvent::DomainCreated(domain) => domain.user_id,
            BoardEvent::IdeaCreated(idea) => idea.user_id,
            BoardEvent::VoteCreated(vote) => vote.user_id,
        }
    }
}
