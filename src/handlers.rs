use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use crate::chat::{self, ChatRequest, ChatResponse, AGENT_TYPE};
use crate::error::ChatError;
use crate::state::AppState;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let agent_id = state
        .config
        .agent
        .identity
        .agent_id
        .as_deref()
        .unwrap_or("NOT_CONFIGURED");

    Json(json!({
        "message": "AI Digital Twin API (Powered by AWS Bedrock Agentcore)",
        "version": AGENT_TYPE,
        "agent_id": agent_id,
        "memory": "Built-in Agentcore Memory Service",
        "features": [
            "Multi-agent orchestration",
            "Automatic conversation memory",
            "Agent collaboration",
            "Built-in tracing"
        ]
    }))
}

/// Liveness only: never contacts the remote service.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "backend": AGENT_TYPE,
        "agent_configured": state.config.agent.identity.is_configured(),
        "trace_enabled": state.config.agent.enable_trace
    }))
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let result = match payload {
        Ok(Json(request)) => chat::chat(&state.invoker, request).await,
        Err(rejection) => Err(ChatError::from(rejection)),
    };
    match result {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            warn!("Chat request failed ({}): {}", e.status_code(), e);
            Err(e)
        }
    }
}

/// Remote agent metadata. Fetch failures are reported in the body with 200.
pub async fn agent_info(State(state): State<AppState>) -> Json<Value> {
    let Some(agent_id) = state.config.agent.identity.agent_id.as_deref() else {
        return Json(json!({
            "configured": false,
            "message": "Agent not configured. Deploy using Terraform first."
        }));
    };

    match state.backend.get_agent(agent_id).await {
        Ok(agent) => Json(json!({
            "configured": true,
            "agent_id": agent_id,
            "agent_name": agent.agent_name,
            "agent_status": agent.agent_status,
            "foundation_model": agent.foundation_model.as_deref().unwrap_or("N/A")
        })),
        Err(e) => {
            warn!("Failed to fetch agent {}: {}", agent_id, e);
            Json(json!({
                "configured": true,
                "agent_id": agent_id,
                "error": e.to_string()
            }))
        }
    }
}
