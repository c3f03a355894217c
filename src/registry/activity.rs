//! Per-agent activity log
//!
//! Keeps a short, bounded history of what each agent has been asked to do and
//! how it answered. Entries are capped per agent so the log never grows
//! without bound.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Maximum retained entries per agent, oldest dropped first
pub const MAX_ENTRIES_PER_AGENT: usize = 20;

/// What kind of event an activity entry records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// The agent registered or re-registered
    Register,
    /// The agent sent a heartbeat
    Heartbeat,
    /// The agent was removed from the directory
    Delete,
    /// A task was forwarded to the agent
    TaskRequest,
    /// The agent answered a task
    TaskResponse,
    /// Forwarding a task to the agent failed
    TaskError,
}

/// One logged event for an agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    /// Entry id
    pub id: Uuid,
    /// Agent the entry belongs to
    pub agent_name: String,
    /// Event kind
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    /// Human-readable event description
    pub message: String,
    /// Structured event payload (capability, result excerpt, error text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// When the event happened
    pub timestamp: DateTime<Utc>,
}

/// Bounded per-agent activity history
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Arc<RwLock<HashMap<String, VecDeque<ActivityEntry>>>>,
}

impl ActivityLog {
    /// Create a new empty activity log
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Record an event for an agent, evicting the oldest entry when the
    /// per-agent cap is reached
    pub fn record<S: Into<String>>(
        &self,
        agent_name: &str,
        kind: ActivityKind,
        message: S,
        data: Option<serde_json::Value>,
    ) {
        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            agent_name: agent_name.to_string(),
            kind,
            message: message.into(),
            data,
            timestamp: Utc::now(),
        };

        let mut entries = self.entries.write().unwrap();
        let log = entries.entry(agent_name.to_string()).or_default();
        if log.len() >= MAX_ENTRIES_PER_AGENT {
            log.pop_front();
        }
        log.push_back(entry);
        debug!(agent_name = %agent_name, entries = log.len(), "Recorded agent activity");
    }

    /// Entries for an agent, oldest first. Unknown agents get an empty list.
    pub fn entries_for(&self, agent_name: &str) -> Vec<ActivityEntry> {
        let entries = self.entries.read().unwrap();
        entries
            .get(agent_name)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop all history for an agent (after directory removal)
    pub fn forget(&self, agent_name: &str) {
        let mut entries = self.entries.write().unwrap();
        entries.remove(agent_name);
    }

    /// Remove all entries (for testing)
    #[cfg(test)]
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap();
        entries.clear();
    }
}
