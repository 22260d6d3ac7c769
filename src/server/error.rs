use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures of the JSON API. Rendered as `{ success: false, message, error? }`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Internal {
        message: String,
        cause: anyhow::Error,
    },
}

impl ApiError {
    pub fn internal(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal {
            message: message.into(),
            cause: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Internal { message, cause } => {
                error!("{message}, caused by: {cause:#}");
                json!({ "success": false, "message": message, "error": format!("{cause:#}") })
            }
            ApiError::BadRequest(message) | ApiError::NotFound(message) => {
                json!({ "success": false, "message": message })
            }
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
