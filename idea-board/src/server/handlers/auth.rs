//! Sign-up, sign-in and the emailed-link flows.
use axum::Json;
use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use idea_board_service::SignUp;
use idea_board_shared::types::User;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::success;
use crate::server::error::ApiError;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

/// Username or email of the account whose password was forgotten.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(alias = "username", alias = "email")]
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub code: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendVerifyEmailRequest {
    pub email: String,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUp>,
) -> Result<Response, ApiError> {
    let user = state.users.sign_up(payload).await?;
    session_response(&state, user)
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Response, ApiError> {
    let user = state
        .auth
        .sign_in(&payload.username, &payload.password)
        .await?;
    session_response(&state, user)
}

pub async fn sign_out(State(state): State<AppState>) -> impl IntoResponse {
    debug!("Session cookie cleared");
    ([(SET_COOKIE, state.session.clear())], success())
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .users
        .send_reset_password_email(payload.identifier.trim())
        .await?;
    Ok(success())
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Response, ApiError> {
    let user = state
        .users
        .reset_password(&payload.code, &payload.password)
        .await?;
    session_response(&state, user)
}

pub async fn verify_email(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.verify_email(&code).await?))
}

pub async fn resend_verify_email(
    State(state): State<AppState>,
    Json(payload): Json<ResendVerifyEmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .users
        .resend_email_verification(payload.email.trim())
        .await?;
    Ok(success())
}

/// Responds with `user` and a fresh session, both as cookie and in the body.
fn session_response(state: &AppState, user: User) -> Result<Response, ApiError> {
    let token = state.auth.issue_token(&user)?;
    Ok((
        [(SET_COOKIE, state.session.issue(&token))],
        Json(json!({
            "user": user,
            "token": token
        })),
    )
        .into_response())
}
