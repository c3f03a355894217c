//! Showcase seed agents
//!
//! Simulated agents registered at startup so a fresh directory is never
//! empty. Their `.local` endpoints mark them as simulated: they appear in
//! listings and search but never receive dispatched tasks, and they are not
//! persisted.

use crate::registry::directory::{AgentDirectory, AgentRecord};
use tracing::info;

/// Build the simulated showcase agents
pub fn showcase_agents() -> Vec<AgentRecord> {
    vec![
        AgentRecord::new(
            "Nebula-1",
            "Data Miner",
            "Extracts structure and patterns from unorganized data streams",
            vec!["data-mining".to_string(), "pattern-recognition".to_string()],
            "http://nebula-1.local/a2a",
        )
        .with_labels("LangChain", "OpenAI"),
        AgentRecord::new(
            "Stellar-Gate",
            "Router",
            "Routes messages between agent networks and translates protocols",
            vec!["routing".to_string(), "translation".to_string()],
            "http://stellar-gate.local/a2a",
        )
        .with_labels("CrewAI", "Anthropic"),
        AgentRecord::new(
            "Void-Watcher",
            "Security",
            "Monitors agent traffic for anomalies and policy violations",
            vec!["security".to_string(), "anomaly-detection".to_string()],
            "http://void-watcher.local/a2a",
        )
        .with_labels("AutoGPT", "Google"),
    ]
}

/// Register showcase agents that are not already in the directory
pub fn seed_directory(directory: &AgentDirectory) {
    let mut seeded = 0;
    for agent in showcase_agents() {
        if directory.find_agent_by_name(&agent.name).is_none() {
            directory.register(agent);
            seeded += 1;
        }
    }
    if seeded > 0 {
        info!(count = seeded, "Seeded showcase agents");
    }
}
