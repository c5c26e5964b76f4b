use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::response::{self, Envelope};

/// Appended to every unprocessable-image message so clients know the fix is
/// on their side.
pub const RETRY_HINT: &str = "Please try again with a different image.";

/// Domain error taxonomy. Handlers only ever catch to translate into one of
/// these; the `IntoResponse` impl renders the uniform envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(resource: &str, id: &str) -> Self {
        Self::NotFound(format!("{resource} with ID {id} not found."))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                response::fail(StatusCode::NOT_FOUND, message).into_response()
            }
            ApiError::Validation(message) => {
                warn!(%message, "request rejected");
                response::fail(StatusCode::BAD_REQUEST, message).into_response()
            }
            ApiError::Auth(message) => {
                warn!(%message, "unauthorized request");
                response::fail(StatusCode::UNAUTHORIZED, message).into_response()
            }
            ApiError::InvalidInput(message) => {
                warn!(%message, "unprocessable image");
                response::fail(StatusCode::BAD_REQUEST, format!("{message} {RETRY_HINT}"))
                    .into_response()
            }
            ApiError::Internal(err) => {
                error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(Envelope::error(err.to_string())),
                )
                    .into_response()
            }
        }
    }
}
