//! Agent directory
//!
//! Thread-safe, insertion-ordered store of registered agents. Directory order
//! is selection order: dispatch picks the first eligible agent, so the store
//! preserves first-registration positions across re-registrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Endpoint substrings that mark an agent as simulated showcase data
const SIMULATED_ENDPOINT_MARKERS: [&str; 2] = [".local", "example.com"];

/// Agent availability status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
    Busy,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Active => write!(f, "active"),
            AgentStatus::Inactive => write!(f, "inactive"),
            AgentStatus::Busy => write!(f, "busy"),
        }
    }
}

/// A registered agent's card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    /// Unique agent name (directory key)
    pub name: String,
    /// Human-readable role
    pub role: String,
    /// Description of what this agent does
    pub description: String,
    /// Capability names used for routing
    pub capabilities: Vec<String>,
    /// Base URL tasks are forwarded to
    pub endpoint: String,
    /// Availability status
    pub status: AgentStatus,
    /// Last heartbeat or registration time
    pub last_heartbeat: DateTime<Utc>,
    /// Optional agent framework label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    /// Optional model/provider label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Optional version label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl AgentRecord {
    /// Create a new active agent record with a fresh heartbeat
    pub fn new<S: Into<String>>(
        name: S,
        role: S,
        description: S,
        capabilities: Vec<String>,
        endpoint: S,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            description: description.into(),
            capabilities,
            endpoint: endpoint.into(),
            status: AgentStatus::Active,
            last_heartbeat: Utc::now(),
            framework: None,
            provider: None,
            version: None,
        }
    }

    /// Builder method to set status for fluent construction
    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder method to set framework/provider labels
    pub fn with_labels<S: Into<String>>(mut self, framework: S, provider: S) -> Self {
        self.framework = Some(framework.into());
        self.provider = Some(provider.into());
        self
    }

    /// Check if the agent advertises a capability (exact match)
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Check if the endpoint is simulated showcase data
    pub fn is_simulated(&self) -> bool {
        is_simulated_endpoint(&self.endpoint)
    }

    /// Check if the agent may receive dispatched tasks
    pub fn is_eligible(&self) -> bool {
        self.status == AgentStatus::Active && !self.is_simulated()
    }

    /// Update heartbeat timestamp to current time
    pub fn refresh_heartbeat(&mut self) {
        self.last_heartbeat = Utc::now();
    }
}

/// Check whether an endpoint belongs to a simulated showcase agent
pub fn is_simulated_endpoint(endpoint: &str) -> bool {
    SIMULATED_ENDPOINT_MARKERS
        .iter()
        .any(|marker| endpoint.contains(marker))
}

/// Thread-safe, insertion-ordered agent directory
#[derive(Debug, Clone, Default)]
pub struct AgentDirectory {
    /// Agents in first-registration order, unique by name
    agents: Arc<RwLock<Vec<AgentRecord>>>,
}

impl AgentDirectory {
    /// Create a new empty directory
    pub fn new() -> Self {
        Self {
            agents: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register or update an agent, stamping its heartbeat.
    ///
    /// Re-registration updates the record in place and keeps its original
    /// directory position. Returns the stored record.
    pub fn register(&self, mut record: AgentRecord) -> AgentRecord {
        record.refresh_heartbeat();
        let name = record.name.clone();

        let mut agents = self.agents.write().unwrap();
        if let Some(existing) = agents.iter_mut().find(|a| a.name == name) {
            *existing = record.clone();
            debug!(agent_name = %name, "Updated agent registration");
        } else {
            agents.push(record.clone());
            info!(agent_name = %name, endpoint = %record.endpoint, "Registered new agent");
        }
        record
    }

    /// Get an agent by name
    pub fn find_agent_by_name(&self, name: &str) -> Option<AgentRecord> {
        let agents = self.agents.read().unwrap();
        agents.iter().find(|a| a.name == name).cloned()
    }

    /// Find dispatchable agents for a capability, in directory order.
    ///
    /// Eligibility means `status == active` and a non-simulated endpoint.
    /// There is no load-balancing or health scoring: callers take the first
    /// entry, which is a deliberate simplification of this system.
    pub fn find_capable_agents(&self, capability: &str) -> Vec<AgentRecord> {
        let agents = self.agents.read().unwrap();
        agents
            .iter()
            .filter(|a| a.is_eligible() && a.has_capability(capability))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over capability names.
    ///
    /// Search is a browsing surface, so simulated and inactive agents are
    /// included.
    pub fn search_by_capability(&self, fragment: &str) -> Vec<AgentRecord> {
        let fragment_lower = fragment.to_lowercase();
        let agents = self.agents.read().unwrap();
        agents
            .iter()
            .filter(|a| {
                a.capabilities
                    .iter()
                    .any(|c| c.to_lowercase().contains(&fragment_lower))
            })
            .cloned()
            .collect()
    }

    /// All agents in first-registration order
    pub fn list_agents(&self) -> Vec<AgentRecord> {
        let agents = self.agents.read().unwrap();
        agents.clone()
    }

    /// Refresh an agent's heartbeat and optionally update its status.
    ///
    /// Returns the new heartbeat timestamp, or None for unknown agents.
    pub fn heartbeat(&self, name: &str, status: Option<AgentStatus>) -> Option<DateTime<Utc>> {
        let mut agents = self.agents.write().unwrap();
        let agent = agents.iter_mut().find(|a| a.name == name)?;
        agent.refresh_heartbeat();
        if let Some(status) = status {
            agent.status = status;
        }
        debug!(agent_name = %name, status = %agent.status, "Heartbeat received");
        Some(agent.last_heartbeat)
    }

    /// Remove an agent by name, returning the removed record
    pub fn remove(&self, name: &str) -> Option<AgentRecord> {
        let mut agents = self.agents.write().unwrap();
        let index = agents.iter().position(|a| a.name == name)?;
        let removed = agents.remove(index);
        info!(agent_name = %name, "Removed agent from directory");
        Some(removed)
    }

    /// Bulk-insert agents preserving the given order (startup load/seed)
    pub fn load_agents(&self, records: Vec<AgentRecord>) {
        let mut agents = self.agents.write().unwrap();
        for record in records {
            if let Some(existing) = agents.iter_mut().find(|a| a.name == record.name) {
                *existing = record;
            } else {
                agents.push(record);
            }
        }
    }

    /// Count of registered agents
    pub fn agent_count(&self) -> usize {
        let agents = self.agents.read().unwrap();
        agents.len()
    }

    /// Remove all agents (for testing)
    #[cfg(test)]
    pub fn clear(&self) {
        let mut agents = self.agents.write().unwrap();
        agents.clear();
    }
}
