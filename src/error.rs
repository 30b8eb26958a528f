//! Failure taxonomy of the chat façade and its HTTP mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Agent identity missing; the caller must fix configuration.
    #[error("Agentcore agent not configured. Set AGENTCORE_AGENT_ID environment variable.")]
    Unavailable,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Internal(String),

    /// Body could not be read as a chat request; keeps the extractor's status.
    #[error("{}", .0.body_text())]
    MalformedBody(#[from] JsonRejection),
}

impl ChatError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
            ChatError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ChatError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ChatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ChatError::MalformedBody(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
