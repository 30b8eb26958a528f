use std::sync::Arc;

use futures::{Stream, TryStreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::client::AgentBackend;
use super::types::{AgentEvent, InvokeAgentRequest, RemoteError, RemoteErrorKind};
use crate::config::AgentSettings;
use crate::error::ChatError;

/// Result of draining one agent response.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub text: String,
    /// `Some` (possibly empty) only when tracing is enabled.
    pub trace: Option<Vec<Value>>,
}

/// Issues one remote call per chat turn and folds the streamed response.
#[derive(Clone)]
pub struct AgentInvoker {
    backend: Arc<dyn AgentBackend>,
    settings: Arc<AgentSettings>,
}

impl AgentInvoker {
    pub fn new(backend: Arc<dyn AgentBackend>, settings: Arc<AgentSettings>) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Invoke the configured agent. No retries: the first failure is returned.
    pub async fn invoke(&self, message: &str, session_id: &str) -> Result<Invocation, ChatError> {
        let agent_id = self
            .settings
            .identity
            .agent_id
            .as_deref()
            .ok_or(ChatError::Unavailable)?;
        let enable_trace = self.settings.enable_trace;

        let request = InvokeAgentRequest {
            agent_id: agent_id.to_string(),
            agent_alias_id: self.settings.identity.alias_id.clone(),
            session_id: session_id.to_string(),
            input_text: message.to_string(),
            enable_trace,
        };

        info!("Invoking agent {} for session {}", agent_id, session_id);

        let stream = self
            .backend
            .invoke_agent(request)
            .await
            .map_err(|e| map_remote_error(agent_id, e))?;
        let (bytes, trace) = collect_response(stream, enable_trace)
            .await
            .map_err(|e| map_remote_error(agent_id, e))?;

        let text = String::from_utf8(bytes)
            .map_err(|e| ChatError::Internal(format!("agent response is not valid UTF-8: {}", e)))?;

        debug!(
            "Agent response for session {}: {} chars, {} trace records",
            session_id,
            text.len(),
            trace.len()
        );

        Ok(Invocation {
            text,
            trace: enable_trace.then_some(trace),
        })
    }
}

/// Fold the stream: text bytes in arrival order, plus trace records when
/// `collect_trace` is set.
async fn collect_response<S>(stream: S, collect_trace: bool) -> Result<(Vec<u8>, Vec<Value>), RemoteError>
where
    S: Stream<Item = Result<AgentEvent, RemoteError>>,
{
    stream
        .try_fold((Vec::new(), Vec::new()), |(mut text, mut trace), event| async move {
            match event {
                AgentEvent::Chunk(bytes) => text.extend_from_slice(&bytes),
                AgentEvent::Trace(record) => {
                    if collect_trace {
                        trace.push(record);
                    }
                }
                AgentEvent::Other(_) => {}
            }
            Ok::<_, RemoteError>((text, trace))
        })
        .await
}

fn map_remote_error(agent_id: &str, err: RemoteError) -> ChatError {
    warn!("Agent invocation failed: {}", err);
    match (&err, err.kind()) {
        (_, RemoteErrorKind::ResourceNotFound) => ChatError::NotFound(format!(
            "Agentcore agent not found. Please deploy the agent first. Agent ID: {}",
            agent_id
        )),
        (_, RemoteErrorKind::AccessDenied) => ChatError::PermissionDenied(
            "Access denied to Bedrock Agentcore. Check IAM permissions.".to_string(),
        ),
        (RemoteError::Service { .. }, RemoteErrorKind::Other) => {
            ChatError::Internal(format!("Agentcore error: {}", err))
        }
        _ => ChatError::Internal(err.to_string()),
    }
}
