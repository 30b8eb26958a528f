use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::agentcore::AgentInvoker;
use crate::error::ChatError;

/// Backend tag reported in responses and service descriptors.
pub const AGENT_TYPE: &str = "agentcore";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// The session used for the invocation; resend it to continue the conversation.
    pub session_id: String,
    pub agent_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<Value>>,
}

/// Use the caller's session id, or start a new session when absent or empty.
pub fn resolve_session_id(session_id: Option<String>) -> String {
    session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Handle one chat turn end to end. Stateless across calls.
pub async fn chat(invoker: &AgentInvoker, request: ChatRequest) -> Result<ChatResponse, ChatError> {
    if !invoker.settings().identity.is_configured() {
        return Err(ChatError::Unavailable);
    }
    if request.message.is_empty() {
        return Err(ChatError::InvalidRequest("message must not be empty".to_string()));
    }

    let session_id = resolve_session_id(request.session_id);
    let invocation = invoker.invoke(&request.message, &session_id).await?;

    Ok(ChatResponse {
        response: invocation.text,
        session_id,
        agent_type: AGENT_TYPE.to_string(),
        trace: invocation.trace,
    })
}
