use futures::stream::BoxStream;
use serde_json::Value;
use thiserror::Error;

pub const INVOKE_AGENT: &str = "InvokeAgent";
pub const GET_AGENT: &str = "GetAgent";

/// One call to the remote agent runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeAgentRequest {
    pub agent_id: String,
    pub agent_alias_id: String,
    pub session_id: String,
    pub input_text: String,
    pub enable_trace: bool,
}

/// A single unit of the streamed agent response.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Raw bytes of response text.
    Chunk(Vec<u8>),
    /// Diagnostic record, passed through untouched.
    Trace(Value),
    /// Any other event type; carries the event name.
    Other(String),
}

/// Lazy, single-pass sequence of response units from one invocation.
pub type AgentEventStream = BoxStream<'static, Result<AgentEvent, RemoteError>>;

/// Display metadata of a deployed agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSummary {
    pub agent_id: String,
    pub agent_name: String,
    pub agent_status: String,
    pub foundation_model: Option<String>,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote service rejected the call with an error code.
    #[error("An error occurred ({code}) when calling the {operation} operation: {message}")]
    Service {
        operation: &'static str,
        code: String,
        message: String,
    },

    #[error("request to {operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed event stream: {0}")]
    Protocol(String),
}

/// Remote conditions the façade distinguishes; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    ResourceNotFound,
    AccessDenied,
    Other,
}

impl RemoteErrorKind {
    /// Accepts both `ResourceNotFoundException` (HTTP errors) and
    /// `resourceNotFoundException` (in-stream exceptions).
    pub fn from_code(code: &str) -> Self {
        let lower = code.to_ascii_lowercase();
        match lower.strip_suffix("exception").unwrap_or(&lower) {
            "resourcenotfound" => RemoteErrorKind::ResourceNotFound,
            "accessdenied" => RemoteErrorKind::AccessDenied,
            _ => RemoteErrorKind::Other,
        }
    }
}

impl RemoteError {
    pub fn service(operation: &'static str, code: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteError::Service {
            operation,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            RemoteError::Service { code, .. } => RemoteErrorKind::from_code(code),
            _ => RemoteErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_from_code() {
        assert_eq!(
            RemoteErrorKind::from_code("ResourceNotFoundException"),
            RemoteErrorKind::ResourceNotFound
        );
        assert_eq!(
            RemoteErrorKind::from_code("resourceNotFoundException"),
            RemoteErrorKind::ResourceNotFound
        );
        assert_eq!(
            RemoteErrorKind::from_code("AccessDeniedException"),
            RemoteErrorKind::AccessDenied
        );
        assert_eq!(RemoteErrorKind::from_code("ThrottlingException"), RemoteErrorKind::Other);
        assert_eq!(RemoteErrorKind::from_code(""), RemoteErrorKind::Other);
    }

    #[test]
    fn test_non_service_errors_are_other() {
        assert_eq!(RemoteError::Protocol("truncated".into()).kind(), RemoteErrorKind::Other);
    }

    #[test]
    fn test_service_error_display() {
        let err = RemoteError::service(INVOKE_AGENT, "ValidationException", "bad session");
        assert_eq!(
            err.to_string(),
            "An error occurred (ValidationException) when calling the InvokeAgent operation: bad session"
        );
    }
}
