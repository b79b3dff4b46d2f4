//! Public API types

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::ai::chat::{RelayError, SessionError};

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

// Errors

pub enum ApiError {
    InvalidRequest,
    NotFound(String),
    Unavailable(String),
    Internal(anyhow::Error),
}

/// Convert `ApiError` into an Axum compatible response. The body is
/// always a JSON object with an `error` field.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::InvalidRequest => (
                StatusCode::BAD_REQUEST,
                String::from("Invalid request body"),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(err) => {
                // Only internal errors are logged, the detail stays
                // server side
                tracing::error!("Error in request: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("Internal Server Error"),
                )
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::InvalidRequest(msg) => {
                tracing::debug!("Rejected chat input: {}", msg);
                ApiError::InvalidRequest
            }
            RelayError::Provider(err) => ApiError::Internal(err.context("Provider call failed")),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidId => {
                tracing::debug!("Rejected chat session: {}", err);
                ApiError::InvalidRequest
            }
            SessionError::LimitReached(_) => ApiError::Unavailable(err.to_string()),
        }
    }
}

// Re-export public types from each route

pub mod chat {
    pub use crate::api::routes::chat::public::*;
}
