//! HTTP mapping of core errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use eldercare_core::CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// An error on its way out as an HTTP response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store call never produced a result, e.g. it panicked.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Core(CoreError::BadRequest(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        let core = match self {
            ApiError::Core(core) => core,
            ApiError::Internal(_) => return StatusCode::INTERNAL_SERVER_ERROR,
        };
        match core {
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CoreError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CoreError::Conflict(_) | CoreError::InvalidState(_) => StatusCode::CONFLICT,
            CoreError::Database(_) | CoreError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eldercare_core::db::DbError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::NotFound("x".into()), 404),
            (CoreError::Forbidden("x".into()), 403),
            (CoreError::Unauthorized("x".into()), 401),
            (CoreError::BadRequest("x".into()), 400),
            (CoreError::Conflict("x".into()), 409),
            (CoreError::InvalidState("x".into()), 409),
            (CoreError::Database(DbError::NotFound("x".into())), 500),
            (CoreError::PasswordHash("x".into()), 500),
        ];
        for (error, code) in cases {
            assert_eq!(ApiError::from(error).status().as_u16(), code);
        }
        assert_eq!(ApiError::Internal("x".into()).status().as_u16(), 500);
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        for error in [
            ApiError::from(CoreError::Database(DbError::NotFound("secret table".into()))),
            ApiError::Internal("task panicked in secret table".into()),
        ] {
            let response = error.into_response();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(body["message"], "Internal server error");
        }
    }
}
