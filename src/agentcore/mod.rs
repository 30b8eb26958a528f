//! Bedrock Agents ("Agentcore") integration: the remote backend seam, its
//! HTTP implementation, and the invoker that drains streamed responses.

pub mod client;
pub mod event_stream;
pub mod invoker;
pub mod types;

pub use client::{AgentBackend, BedrockAgentClient};
pub use invoker::{AgentInvoker, Invocation};
pub use types::*;
