pub mod agentcore;
pub mod chat;
pub mod config;
pub mod error;
pub mod handlers;
pub mod instructions;
pub mod profile;
pub mod routes;
pub mod state;
