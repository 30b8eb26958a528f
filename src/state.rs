use std::sync::Arc;

use crate::agentcore::{AgentBackend, AgentInvoker, BedrockAgentClient};
use crate::config::Config;

/// Shared per-process state. Everything here is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: Arc<dyn AgentBackend>,
    pub invoker: AgentInvoker,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let backend = Arc::new(BedrockAgentClient::new(&config.agent)?);
        Ok(Self::with_backend(config, backend))
    }

    pub fn with_backend(config: Config, backend: Arc<dyn AgentBackend>) -> Self {
        let invoker = AgentInvoker::new(backend.clone(), Arc::new(config.agent.clone()));
        Self {
            config: Arc::new(config),
            backend,
            invoker,
        }
    }
}
