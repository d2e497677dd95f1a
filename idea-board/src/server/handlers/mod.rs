// HTTP request handlers
pub mod auth;
pub mod domains;
pub mod ideas;
pub mod me;
pub mod votes;

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

fn success() -> Json<serde_json::Value> {
    Json(json!({ "status": "success" }))
}
