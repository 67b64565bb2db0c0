//! HTTP error handling
//!
//! Every failed request answers with a `{message, code}` JSON body; the
//! status is derived from the code.

use answerdesk_core::services::{AnswerServiceError, SwapError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
}

impl HttpError {
    /// Create a new HTTP error
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NODE_NOT_FOUND" => StatusCode::NOT_FOUND,
            "KIND_MISMATCH" | "DUPLICATE_KEY" | "INVALID_PARENT" | "INVALID_INPUT" => {
                StatusCode::BAD_REQUEST
            }
            "SWAP_CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
        }

        (status, Json(self)).into_response()
    }
}

impl From<SwapError> for HttpError {
    fn from(err: SwapError) -> Self {
        let code = match &err {
            SwapError::NotFound { .. } => "NODE_NOT_FOUND",
            SwapError::KindMismatch { .. } => "KIND_MISMATCH",
            SwapError::Conflict(_) => "SWAP_CONFLICT",
            SwapError::Internal(_) | SwapError::InvalidConfig(_) => "INTERNAL_ERROR",
        };

        HttpError::new(err.to_string(), code)
    }
}

impl From<AnswerServiceError> for HttpError {
    fn from(err: AnswerServiceError) -> Self {
        match err {
            AnswerServiceError::Swap(swap_err) => swap_err.into(),
            AnswerServiceError::NodeNotFound { .. } => {
                HttpError::new(err.to_string(), "NODE_NOT_FOUND")
            }
            AnswerServiceError::DuplicateKey { .. } => {
                HttpError::new(err.to_string(), "DUPLICATE_KEY")
            }
            AnswerServiceError::InvalidParent { .. } => {
                HttpError::new(err.to_string(), "INVALID_PARENT")
            }
            AnswerServiceError::ValidationFailed(_) => {
                HttpError::new(err.to_string(), "INVALID_INPUT")
            }
            AnswerServiceError::DatabaseError(_) => {
                HttpError::new(err.to_string(), "DATABASE_ERROR")
            }
        }
    }
}
