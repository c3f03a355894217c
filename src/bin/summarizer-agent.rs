//! Summarizer worker agent
//!
//! Serves `summarize_text` tasks and keeps itself registered with the
//! bridge.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use taskbridge::config::BridgeConfig;
use taskbridge::observability::init_default_logging;
use taskbridge::workers::{SummarizerSkill, WorkerAgent};
use tracing::error;

/// Summarizer worker agent
#[derive(Parser)]
#[command(name = "summarizer-agent")]
#[command(about = "Worker agent answering summarize_text tasks")]
#[command(version)]
struct Cli {
    /// Port for the task endpoint
    #[arg(short, long, default_value_t = 4001)]
    port: u16,

    /// Bridge base URL to register with (overrides config)
    #[arg(long)]
    bridge_url: Option<String>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "TASKBRIDGE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_default_logging();

    let mut config = match BridgeConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };
    if let Some(bridge_url) = cli.bridge_url {
        config.worker.bridge_url = bridge_url;
    }

    let worker = match WorkerAgent::new(Arc::new(SummarizerSkill), cli.port, &config.worker) {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to initialize worker: {}", e);
            process::exit(1);
        }
    };

    worker.run().await;
}
