use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use idea_board_service::{IdeaChanges, IdeaDraft};
use idea_board_shared::types::{Idea, IdeaId};

use super::success;
use crate::server::error::ApiError;
use crate::server::extract::CurrentUser;
use crate::server::state::AppState;

pub async fn create_idea(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<IdeaDraft>,
) -> Result<Json<Idea>, ApiError> {
    Ok(Json(state.ideas.create(&user, draft).await?))
}

pub async fn get_idea(
    State(state): State<AppState>,
    Path(id): Path<IdeaId>,
) -> Result<Json<Idea>, ApiError> {
    Ok(Json(state.ideas.find_by_id(id).await?))
}

pub async fn update_idea(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<IdeaId>,
    Json(changes): Json<IdeaChanges>,
) -> Result<Json<Idea>, ApiError> {
    Ok(Json(state.ideas.update(&user, id, changes).await?))
}

pub async fn delete_idea(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<IdeaId>,
) -> Result<impl IntoResponse, ApiError> {
    state.ideas.delete(&user, id).await?;
    Ok(success())
}
