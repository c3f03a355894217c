//! TaskBridge - Main Entry Point
//!
//! Boots the agent directory, the task and pipeline routers, and the HTTP
//! API, then serves until SIGINT/SIGTERM.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use taskbridge::api::ApiServer;
use taskbridge::config::BridgeConfig;
use taskbridge::observability::{init_default_logging, metrics};
use taskbridge::registry::{seed_directory, ActivityLog, AgentDirectory, AgentPersistence};
use taskbridge::routing::{
    HttpTaskInvoker, PipelineOrchestrator, PipelineStore, TaskDispatcher, TaskInvoker, TaskStore,
};
use tokio::signal;
use tracing::{error, info, warn};

/// Agent-to-agent registry and capability-based task router
#[derive(Parser)]
#[command(name = "taskbridge")]
#[command(about = "Agent registry and capability-based task router")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "TASKBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge server
    Serve,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose >= 2 {
        std::env::set_var("LOG_LEVEL", "TRACE");
    } else if cli.verbose == 1 {
        std::env::set_var("LOG_LEVEL", "DEBUG");
    }
    init_default_logging();

    info!("Starting TaskBridge v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => run_server(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Application shutdown complete");
}

fn load_configuration(config_path: &Option<PathBuf>) -> Result<BridgeConfig, Box<dyn std::error::Error>> {
    match BridgeConfig::resolve_path(config_path.as_deref()) {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(BridgeConfig::load_from_file(&path)?)
        }
        None => {
            info!("No configuration file found, using defaults");
            Ok(BridgeConfig::default())
        }
    }
}

async fn run_server(config: BridgeConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the process-wide metrics collector
    metrics();

    let directory = AgentDirectory::new();
    let activity = ActivityLog::new();

    let persistence = if config.registry.persist {
        Some(AgentPersistence::new(&config.registry.data_dir))
    } else {
        None
    };

    if let Some(persistence) = &persistence {
        match persistence.load() {
            Ok(agents) => directory.load_agents(agents),
            Err(e) => warn!(error = %e, "Failed to load persisted agents, starting empty"),
        }
    }

    if config.registry.seed_demo_agents {
        seed_directory(&directory);
    }

    let invoker: Arc<dyn TaskInvoker> = Arc::new(HttpTaskInvoker::new(config.invoke_timeout())?);

    let dispatcher = TaskDispatcher::new(
        directory.clone(),
        activity.clone(),
        TaskStore::new(),
        Arc::clone(&invoker),
    );
    let orchestrator = PipelineOrchestrator::new(
        directory.clone(),
        activity.clone(),
        PipelineStore::new(),
        invoker,
    );

    let server = ApiServer::new(
        dispatcher,
        orchestrator.clone(),
        directory,
        activity,
        persistence,
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(
        agents = config.registry.seed_demo_agents,
        address = %addr,
        "Bridge starting"
    );

    server
        .run_with_shutdown(addr, shutdown_signal(orchestrator))
        .await;

    info!("Bridge shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM, cancelling in-flight pipelines first
async fn shutdown_signal(orchestrator: PipelineOrchestrator) {
    let mut sigint = match signal::unix::signal(signal::unix::SignalKind::interrupt()) {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to install SIGINT handler: {}", e);
            return;
        }
    };
    let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            return;
        }
    };

    tokio::select! {
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    orchestrator.cancel();
}

fn handle_config_command(config: BridgeConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current bridge configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
