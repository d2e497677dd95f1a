use axum::Json;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use idea_board_service::AccountChanges;
use idea_board_shared::types::User;

use super::success;
use crate::server::error::ApiError;
use crate::server::extract::CurrentUser;
use crate::server::state::AppState;

pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(changes): Json<AccountChanges>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.update_me(&user, changes).await?))
}

/// Deletes the caller's account and ends the session.
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    state.users.delete_me(&user).await?;
    Ok(([(SET_COOKIE, state.session.clear())], success()))
}
