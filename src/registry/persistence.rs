//! Agent directory persistence
//!
//! Saves registered agents to a JSON file so the directory survives restarts.
//! Simulated showcase agents are re-seeded at startup and never written to
//! disk. Persistence failures are logged by callers, never fatal.

use crate::error::BridgeResult;
use crate::registry::directory::AgentRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name for the persisted directory inside the data directory
const AGENTS_FILE: &str = "agents.json";

/// Loads and saves the agent directory under a data directory
#[derive(Debug, Clone)]
pub struct AgentPersistence {
    data_dir: PathBuf,
}

impl AgentPersistence {
    /// Create a persistence handle rooted at `data_dir`
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the agents file
    pub fn agents_path(&self) -> PathBuf {
        self.data_dir.join(AGENTS_FILE)
    }

    /// Load persisted agents. A missing file is an empty directory, not an
    /// error.
    pub fn load(&self) -> BridgeResult<Vec<AgentRecord>> {
        let path = self.agents_path();
        if !path.exists() {
            info!(path = %path.display(), "No persisted agents file, starting empty");
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path)?;
        let agents: Vec<AgentRecord> = serde_json::from_str(&contents)?;
        info!(path = %path.display(), count = agents.len(), "Loaded persisted agents");
        Ok(agents)
    }

    /// Save agents to disk, skipping simulated showcase entries. Creates the
    /// data directory on first save.
    pub fn save(&self, agents: &[AgentRecord]) -> BridgeResult<()> {
        let persistable: Vec<&AgentRecord> = agents.iter().filter(|a| !a.is_simulated()).collect();

        fs::create_dir_all(&self.data_dir)?;
        let path = self.agents_path();
        let contents = serde_json::to_string_pretty(&persistable)?;
        fs::write(&path, contents)?;
        debug!(path = %path.display(), count = persistable.len(), "Persisted agent directory");
        Ok(())
    }
}
