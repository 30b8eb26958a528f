use std::path::Path;

use anyhow::Result;
use config::builder::DefaultState;
use config::ConfigBuilder;
use secrecy::SecretString;
use serde::Deserialize;

/// Process-wide configuration, read once at startup and shared immutably.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub agent: AgentSettings,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// The pair identifying which remote agent configuration to invoke.
#[derive(Debug, Clone)]
pub struct AgentIdentity {
    /// `None` when the agent id was unset or empty.
    pub agent_id: Option<String>,
    pub alias_id: String,
}

impl AgentIdentity {
    pub fn is_configured(&self) -> bool {
        self.agent_id.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub identity: AgentIdentity,
    pub region: String,
    pub enable_trace: bool,
    pub runtime_endpoint: String,
    pub control_endpoint: String,
    pub bearer_token: Option<SecretString>,
}

/// Flat key layout shared by config files and environment variables.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default = "default_host")]
    host: String,

    #[serde(default = "default_port")]
    port: u16,

    #[serde(default = "default_cors_origins")]
    cors_origins: String,

    #[serde(default = "default_region")]
    default_aws_region: String,

    #[serde(default)]
    agentcore_agent_id: String,

    #[serde(default = "default_alias_id")]
    agentcore_agent_alias_id: String,

    #[serde(default = "default_enable_trace")]
    agentcore_enable_trace: String,

    #[serde(default)]
    aws_bearer_token_bedrock: Option<String>,

    #[serde(default)]
    agentcore_runtime_endpoint: Option<String>,

    #[serde(default)]
    agentcore_control_endpoint: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_cors_origins() -> String {
    "http://localhost:3000".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_alias_id() -> String {
    "TSTALIASID".to_string()
}

fn default_enable_trace() -> String {
    "true".to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from an optional file, overlaid by environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::default());
        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let raw: RawSettings = builder.build()?.try_deserialize()?;
        Ok(raw.into())
    }
}

impl From<RawSettings> for Config {
    fn from(raw: RawSettings) -> Self {
        let region = raw.default_aws_region.trim().to_string();

        let cors_origins = raw
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let runtime_endpoint = non_empty(raw.agentcore_runtime_endpoint)
            .unwrap_or_else(|| format!("https://bedrock-agent-runtime.{}.amazonaws.com", region));
        let control_endpoint = non_empty(raw.agentcore_control_endpoint)
            .unwrap_or_else(|| format!("https://bedrock-agent.{}.amazonaws.com", region));

        Self {
            server: ServerConfig {
                host: raw.host,
                port: raw.port,
                cors_origins,
            },
            agent: AgentSettings {
                identity: AgentIdentity {
                    agent_id: non_empty(Some(raw.agentcore_agent_id)),
                    alias_id: raw.agentcore_agent_alias_id,
                },
                region,
                enable_trace: raw.agentcore_enable_trace.trim().eq_ignore_ascii_case("true"),
                runtime_endpoint,
                control_endpoint,
                bearer_token: non_empty(raw.aws_bearer_token_bedrock).map(SecretString::from),
            },
        }
    }
}
