use idea_board_shared::types::{User, UserId};

use crate::errors::ServiceError;

/// Allows the action if `actor` owns the record or is an admin.
///
/// Ownership is decided by comparing user ids.
pub fn ensure_owner_or_admin(
    actor: &User,
    owner_id: UserId,
    action: &str,
) -> Result<(), ServiceError> {
    if actor.id == owner_id || actor.is_admin() {
        return Ok(());
    }
    tracing::warn!(actor_id = actor.id, owner_id, action, "Rejected action by non-owner");
    Err(ServiceError::unauthorized(format!("Not authorized to {action}")))
}
