use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use idea_board_service::ServiceError;
use serde_json::json;

/// A service error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(ServiceError::bad_request(msg))
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self(ServiceError::unauthorized(msg))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Gone => StatusCode::GONE,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match &self.0 {
            ServiceError::NotFound(msg)
            | ServiceError::Unauthorized(msg)
            | ServiceError::Conflict(msg)
            | ServiceError::BadRequest(msg) => msg.clone(),
            ServiceError::Gone => "Token expired".to_string(),
            ServiceError::Internal => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(json!({
                "status": "error",
                "message": self.message()
            })),
        )
            .into_response()
    }
}
