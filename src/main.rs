use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use twin_agentcore::config::Config;
use twin_agentcore::instructions::agent_definitions;
use twin_agentcore::profile::ProfileData;
use twin_agentcore::routes;
use twin_agentcore::state::AppState;

#[derive(Parser)]
#[command(name = "twin-agentcore", about = "Digital twin chat API backed by Bedrock Agents")]
struct Cli {
    /// Optional config file; environment variables override its values
    #[arg(long, env = "CONFIG_PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print the supervisor and digital-twin agent definitions as JSON
    AgentConfig {
        #[arg(long, default_value = "data")]
        profile_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {}", e);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("twin_agentcore=debug,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.config).await,
        Command::AgentConfig { profile_dir } => print_agent_config(&profile_dir),
    }
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path.as_deref()).context("failed to load configuration")?;

    match config.agent.identity.agent_id.as_deref() {
        Some(agent_id) => info!(
            "Agent {} (alias {}) in {}, trace {}",
            agent_id,
            config.agent.identity.alias_id,
            config.agent.region,
            if config.agent.enable_trace { "on" } else { "off" }
        ),
        None => warn!("AGENTCORE_AGENT_ID is not set; /chat will answer 503"),
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid listen address")?;

    let app_state = AppState::new(config)?;
    let app = routes::create_routes(app_state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_agent_config(profile_dir: &std::path::Path) -> Result<()> {
    let profile = ProfileData::load(profile_dir)?;
    let definitions = agent_definitions(&profile, chrono::Local::now().naive_local());
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}
