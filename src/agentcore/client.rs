use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::event_stream::decode_event_stream;
use super::types::{
    AgentEventStream, AgentSummary, InvokeAgentRequest, RemoteError, GET_AGENT, INVOKE_AGENT,
};
use crate::config::AgentSettings;

const EVENT_STREAM_CONTENT_TYPE: &str = "application/vnd.amazon.eventstream";

/// Remote agent service: the runtime that answers chat turns and the
/// control plane that describes deployed agents.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Open one invocation. Errors that arrive after the response headers
    /// surface as items of the returned stream.
    async fn invoke_agent(&self, request: InvokeAgentRequest) -> Result<AgentEventStream, RemoteError>;

    async fn get_agent(&self, agent_id: &str) -> Result<AgentSummary, RemoteError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeAgentBody<'a> {
    input_text: &'a str,
    enable_trace: bool,
}

#[derive(Deserialize)]
struct GetAgentResponse {
    agent: AgentDetail,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentDetail {
    agent_name: String,
    agent_status: String,
    #[serde(default)]
    foundation_model: Option<String>,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

/// Bedrock Agents client over plain HTTPS.
///
/// Authenticates with an optional Bedrock API key sent as a Bearer token.
/// The key is only exposed when building request headers; this type does
/// not implement `Debug`.
pub struct BedrockAgentClient {
    client: Client,
    runtime_endpoint: Url,
    control_endpoint: Url,
    bearer_token: Option<SecretString>,
}

impl BedrockAgentClient {
    pub fn new(settings: &AgentSettings) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::new(),
            runtime_endpoint: Url::parse(&settings.runtime_endpoint)?,
            control_endpoint: Url::parse(&settings.control_endpoint)?,
            bearer_token: settings.bearer_token.clone(),
        })
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }
}

/// Append percent-encoded path segments to an endpoint.
fn endpoint_url(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Extract the error code: `x-amzn-ErrorType` header first, then the body's
/// `__type`, then a guess from the status.
fn error_code(headers: &HeaderMap, body: &ErrorBody, status: StatusCode) -> String {
    let from_header = headers
        .get("x-amzn-errortype")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(':').next())
        .filter(|v| !v.is_empty());
    let from_body = body
        .error_type
        .as_deref()
        .and_then(|t| t.rsplit('#').next())
        .filter(|t| !t.is_empty());

    match from_header.or(from_body) {
        Some(code) => code.to_string(),
        None => match status {
            StatusCode::NOT_FOUND => "ResourceNotFoundException".to_string(),
            StatusCode::FORBIDDEN => "AccessDeniedException".to_string(),
            other => format!("Http{}", other.as_u16()),
        },
    }
}

async fn check_status(response: Response, operation: &'static str) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let headers = response.headers().clone();
    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

    let code = error_code(&headers, &body, status);
    let message = body.message.unwrap_or_else(|| {
        if text.is_empty() {
            status.to_string()
        } else {
            text.clone()
        }
    });

    warn!("{} failed with HTTP {} ({}): {}", operation, status, code, message);
    Err(RemoteError::Service {
        operation,
        code,
        message,
    })
}

#[async_trait]
impl AgentBackend for BedrockAgentClient {
    async fn invoke_agent(&self, request: InvokeAgentRequest) -> Result<AgentEventStream, RemoteError> {
        let url = endpoint_url(
            &self.runtime_endpoint,
            &[
                "agents",
                request.agent_id.as_str(),
                "agentAliases",
                request.agent_alias_id.as_str(),
                "sessions",
                request.session_id.as_str(),
                "text",
            ],
        );
        debug!("POST {}", url);

        let body = InvokeAgentBody {
            input_text: &request.input_text,
            enable_trace: request.enable_trace,
        };
        let response = self
            .authorize(self.client.post(url))
            .header(ACCEPT, EVENT_STREAM_CONTENT_TYPE)
            .json(&body)
            .send()
            .await
            .map_err(|source| RemoteError::Transport {
                operation: INVOKE_AGENT,
                source,
            })?;
        let response = check_status(response, INVOKE_AGENT).await?;

        let body = response.bytes_stream().map_err(|source| RemoteError::Transport {
            operation: INVOKE_AGENT,
            source,
        });
        Ok(decode_event_stream(body))
    }

    async fn get_agent(&self, agent_id: &str) -> Result<AgentSummary, RemoteError> {
        let url = endpoint_url(&self.control_endpoint, &["agents", agent_id, ""]);
        debug!("GET {}", url);

        let transport = |source| RemoteError::Transport {
            operation: GET_AGENT,
            source,
        };
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response, GET_AGENT).await?;
        let details: GetAgentResponse = response.json().await.map_err(transport)?;

        Ok(AgentSummary {
            agent_id: agent_id.to_string(),
            agent_name: details.agent.agent_name,
            agent_status: details.agent.agent_status,
            foundation_model: details.agent.foundation_model,
        })
    }
}
