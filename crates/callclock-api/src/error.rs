//! API error taxonomy and its HTTP mapping.
//!
//! Every failure is terminal for the request that caused it. Each variant
//! maps to exactly one status code and a `{"error": "<message>"}` body;
//! store internals are logged by the handler and never echoed to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the webhook endpoints.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP method other than GET or POST.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Missing, malformed or mismatching HMAC signature.
    #[error("Invalid signature")]
    InvalidSignature,

    /// A required query or body parameter was absent or empty.
    #[error("Missing {0}")]
    MissingParameter(&'static str),

    /// A query parameter was present but could not be read, such as a
    /// repeated key.
    #[error("Invalid {0}")]
    InvalidParameter(&'static str),

    /// Signed body was not a usable JSON object.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// No start time recorded for the conversation.
    #[error("Conversation not found")]
    RecordNotFound,

    /// The store rejected or failed the insert.
    #[error("Store insert failed")]
    StoreWriteFailure,

    /// The store lookup failed.
    #[error("Store lookup failed")]
    StoreReadFailure,
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::MissingParameter(_) | Self::InvalidParameter(_) | Self::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            },
            Self::RecordNotFound => StatusCode::NOT_FOUND,
            Self::StoreWriteFailure | Self::StoreReadFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error description
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
