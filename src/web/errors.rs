//! # Web API Error Types
//!
//! Maps domain errors onto HTTP responses. Every error body has the shape
//! `{"error": {"code", "message"}}`, with a `details` array of field-level
//! violations for validation failures.

use crate::error::{CoreError, Violation};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    BadRequest {
        message: String,
        details: Option<Vec<Violation>>,
    },

    #[error("{message}")]
    Conflict {
        code: &'static str,
        message: String,
    },

    #[error("{message}")]
    ServiceUnavailable { message: String },

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation { violations } => Self::BadRequest {
                message: "parameter validation failed".to_string(),
                details: Some(violations),
            },
            CoreError::InvalidSchema { violations } => Self::BadRequest {
                message: "invalid schema".to_string(),
                details: Some(violations),
            },
            CoreError::InvalidInput(message) => Self::bad_request(message),
            CoreError::InvalidProgress { .. } => Self::bad_request(error.to_string()),
            CoreError::NotFound { .. } => Self::not_found(error.to_string()),
            CoreError::NotClaimedByCaller { .. } => Self::Conflict {
                code: "NOT_CLAIMED_BY_CALLER",
                message: error.to_string(),
            },
            CoreError::StaleClaim { .. } => Self::Conflict {
                code: "STALE_CLAIM",
                message: error.to_string(),
            },
            CoreError::InvalidTransition { .. } => Self::Conflict {
                code: "INVALID_TRANSITION",
                message: error.to_string(),
            },
            CoreError::StoreUnavailable(message) => Self::ServiceUnavailable { message },
            CoreError::Configuration(_) => Self::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_code, message, details) = match self {
            ApiError::NotFound { message } => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", message, None)
            }
            ApiError::BadRequest { message, details } => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message, details)
            }
            ApiError::Conflict { code, message } => {
                (StatusCode::CONFLICT, code, message, None)
            }
            ApiError::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                message,
                None,
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "internal server error".to_string(),
                None,
            ),
        };

        let mut error_body = json!({
            "code": error_code,
            "message": message
        });
        if let Some(details) = details {
            error_body["details"] = json!(details);
        }

        (status_code, Json(json!({ "error": error_body }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
