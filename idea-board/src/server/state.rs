// App state for the Axum server
use std::sync::Arc;

use idea_board_service::{AuthService, DomainService, IdeaService, UserService, VoteService};

use crate::server::cookies::SessionCookie;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub auth: Arc<AuthService>,
    pub domains: Arc<DomainService>,
    pub ideas: Arc<IdeaService>,
    pub votes: Arc<VoteService>,
    pub session: SessionCookie,
}
