use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use idea_board_shared::types::{IdeaId, UserId, Vote, VoteId, VoteValue};
use serde::Deserialize;

use super::success;
use crate::server::error::ApiError;
use crate::server::extract::CurrentUser;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitVoteRequest {
    pub idea_id: IdeaId,
    #[serde(rename = "type")]
    pub vote_type: VoteValue,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVoteRequest {
    #[serde(rename = "type")]
    pub vote_type: VoteValue,
}

/// Casts, switches or retracts the caller's vote on an idea.
pub async fn submit_vote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SubmitVoteRequest>,
) -> Result<Json<Vote>, ApiError> {
    Ok(Json(
        state
            .votes
            .submit_vote(&user, payload.idea_id, payload.vote_type)
            .await?,
    ))
}

pub async fn update_vote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<VoteId>,
    Json(payload): Json<UpdateVoteRequest>,
) -> Result<Json<Vote>, ApiError> {
    Ok(Json(
        state
            .votes
            .update_vote(&user, id, payload.vote_type)
            .await?,
    ))
}

pub async fn delete_vote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<VoteId>,
) -> Result<impl IntoResponse, ApiError> {
    state.votes.delete_vote(&user, id).await?;
    Ok(success())
}

pub async fn get_vote(
    State(state): State<AppState>,
    Path(id): Path<VoteId>,
) -> Result<Json<Vote>, ApiError> {
    Ok(Json(state.votes.find_vote(id).await?))
}

pub async fn votes_of_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Vote>>, ApiError> {
    Ok(Json(state.votes.votes_of_user(user_id).await?))
}

pub async fn votes_of_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<IdeaId>,
) -> Result<Json<Vec<Vote>>, ApiError> {
    Ok(Json(state.votes.votes_of_idea(idea_id).await?))
}
