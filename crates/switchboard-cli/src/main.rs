//! agent-switchboard
//!
//! Redis streams and pub/sub as MCP tools for coordinating agents.
//!
//! ```bash
//! # MCP server on stdio (default)
//! REDIS_URL=redis://localhost:6379 agent-switchboard
//!
//! # REST bridge for services that cannot speak MCP
//! agent-switchboard bridge --listen 0.0.0.0:8080
//!
//! # No Redis at all
//! agent-switchboard --broker memory
//! ```

mod bridge;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rmcp::{transport::stdio, ServiceExt};
use switchboard_core::{
    connect_broker, ConfigOverrides, ConfigSource, EnvConfigSource, FileConfigSource, Logger,
    MemoryConfigSource, StreamFacade, SwitchboardConfig, SwitchboardServer, TracingLogger,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "agent_switchboard=info,switchboard_core=info";

#[derive(Parser, Debug)]
#[command(name = "agent-switchboard", author, version, about, long_about = None)]
struct Cli {
    /// YAML config file (default: ~/.config/agent-switchboard/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Broker address (overrides REDIS_URL)
    #[arg(long, global = true)]
    redis_url: Option<String>,

    /// Default stream (overrides AGENT_EVENTS_STREAM)
    #[arg(long, global = true)]
    stream: Option<String>,

    /// Default consumer group (overrides AGENT_CONSUMER_GROUP)
    #[arg(long, global = true)]
    group: Option<String>,

    /// Default consumer name (overrides AGENT_CONSUMER_NAME)
    #[arg(long, global = true)]
    consumer: Option<String>,

    /// Broker implementation: redis or memory
    #[arg(long, global = true)]
    broker: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve MCP tools over stdio
    Serve,
    /// Serve the REST bridge over HTTP
    Bridge {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: SocketAddr,
    },
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            redis_url: self.redis_url.clone(),
            broker: self.broker.clone(),
            stream: self.stream.clone(),
            session_stream: None,
            group: self.group.clone(),
            consumer: self.consumer.clone(),
        }
    }

    /// Defaults < config file < environment < flags
    fn resolve_config(&self) -> Result<SwitchboardConfig> {
        let file = match &self.config {
            Some(path) => {
                anyhow::ensure!(path.exists(), "config file not found: {}", path.display());
                FileConfigSource::new(path)
            }
            None => FileConfigSource::user(),
        };
        let env = EnvConfigSource::new();
        let flags = MemoryConfigSource::new(self.overrides());

        let sources: [&dyn ConfigSource; 3] = [&file, &env, &flags];
        SwitchboardConfig::resolve(&sources).context("invalid configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the MCP session
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = cli.resolve_config()?;
    tracing::info!(
        redis_url = %config.redis_url,
        broker = %config.broker,
        stream = %config.defaults.stream,
        group = %config.defaults.group,
        consumer = %config.defaults.consumer,
        "Starting agent-switchboard"
    );

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new());
    let broker = connect_broker(&config.broker, &config.redis_url, logger.clone())
        .await
        .with_context(|| format!("failed to connect {} broker", config.broker))?;
    let facade = Arc::new(StreamFacade::new(broker, config.defaults, logger.clone()));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!("Serving MCP tools on stdio");
            let service = SwitchboardServer::new(facade, logger)
                .serve(stdio())
                .await
                .context("MCP initialization failed")?;
            service.waiting().await?;
        }
        Command::Bridge { listen } => bridge::serve(facade, listen).await?,
    }

    Ok(())
}
