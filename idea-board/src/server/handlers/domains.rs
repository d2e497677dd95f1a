use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use idea_board_service::DomainChanges;
use idea_board_shared::types::{Domain, DomainId, RankedIdea, UserId};
use serde::Deserialize;

use super::success;
use crate::server::error::ApiError;
use crate::server::extract::CurrentUser;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateDomainRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn create_domain(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateDomainRequest>,
) -> Result<Json<Domain>, ApiError> {
    Ok(Json(state.domains.create(&user, &payload.name).await?))
}

/// `GET /domain/{name}`
pub async fn get_domain(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Domain>, ApiError> {
    Ok(Json(state.domains.find_by_name(&name).await?))
}

pub async fn domains_of_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Domain>>, ApiError> {
    Ok(Json(state.domains.domains_of_user(user_id).await?))
}

pub async fn update_domain(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(key): Path<String>,
    Json(changes): Json<DomainChanges>,
) -> Result<Json<Domain>, ApiError> {
    let id = domain_id(&key)?;
    Ok(Json(state.domains.update(&user, id, changes).await?))
}

pub async fn delete_domain(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = domain_id(&key)?;
    state.domains.delete(&user, id).await?;
    Ok(success())
}

/// Ideas of a domain ranked by score.
pub async fn ranked_ideas(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(page): Query<RankQuery>,
) -> Result<Json<Vec<RankedIdea>>, ApiError> {
    let id = domain_id(&key)?;
    Ok(Json(
        state
            .votes
            .rank_ideas_for_domain(id, page.limit, page.offset)
            .await?,
    ))
}

// `/domain/{name}` and `/domain/{id}` share a path segment, so ids arrive as text.
fn domain_id(key: &str) -> Result<DomainId, ApiError> {
    key.parse::<DomainId>()
        .map_err(|_| ApiError::bad_request(format!("Invalid domain id '{key}'")))
}
