//! Configuration system for the bridge and its worker agents
//!
//! Every field has a serde default so the server can boot with no config
//! file at all; a TOML file and the `TASKBRIDGE_CONFIG` environment variable
//! override per section.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file locations searched in order
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["taskbridge.toml", "config/taskbridge.toml"];

/// Main bridge configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub registry: RegistrySection,
    #[serde(default)]
    pub invoker: InvokerSection,
    #[serde(default)]
    pub worker: WorkerSection,
}

/// HTTP server binding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    /// Bind address for the bridge API
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port for the bridge API
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Agent directory storage and seeding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrySection {
    /// Directory holding agents.json
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Persist real (non-simulated) agents to disk after mutations
    #[serde(default = "default_true")]
    pub persist: bool,
    /// Seed the directory with the simulated showcase agents at startup
    #[serde(default = "default_true")]
    pub seed_demo_agents: bool,
}

/// Outbound agent invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvokerSection {
    /// Per-call timeout for remote agent invocations in seconds
    #[serde(default = "default_invoke_timeout")]
    pub timeout_secs: u64,
}

/// Settings shared by the worker-agent binaries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerSection {
    /// Base URL of the bridge the workers register against
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    /// Hostname workers advertise in their endpoint URL
    #[serde(default = "default_worker_host")]
    pub advertise_host: String,
    /// Heartbeat interval in seconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_true() -> bool {
    true
}

fn default_invoke_timeout() -> u64 {
    30
}

fn default_bridge_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_worker_host() -> String {
    "localhost".to_string()
}

fn default_heartbeat_interval() -> u64 {
    5
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            persist: true,
            seed_demo_agents: true,
        }
    }
}

impl Default for InvokerSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_invoke_timeout(),
        }
    }
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            advertise_host: default_worker_host(),
            heartbeat_interval_secs: default_heartbeat_interval(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BridgeConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config file to use: an explicit path wins, otherwise the
    /// first default location that exists
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Load the resolved config file, falling back to built-in defaults when
    /// no file exists
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match Self::resolve_path(explicit) {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Validate cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.invoker.timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "invoker.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.worker.heartbeat_interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "worker.heartbeat_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.registry.data_dir.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "registry.data_dir must not be empty".to_string(),
            ));
        }
        url::Url::parse(&self.worker.bridge_url).map_err(|e| {
            ConfigError::InvalidConfig(format!(
                "worker.bridge_url '{}' is not a valid URL: {e}",
                self.worker.bridge_url
            ))
        })?;
        Ok(())
    }

    /// Per-call invocation timeout as a Duration
    pub fn invoke_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.invoker.timeout_secs)
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 3001

[registry]
data_dir = "data"
persist = false
seed_demo_agents = false

[invoker]
timeout_secs = 5
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parses() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8080

[registry]
data_dir = "/var/lib/taskbridge"
persist = true
seed_demo_agents = false

[invoker]
timeout_secs = 10

[worker]
bridge_url = "http://bridge.internal:3001"
advertise_host = "worker-1"
heartbeat_interval_secs = 15
"#;

        let config: BridgeConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.registry.data_dir, "/var/lib/taskbridge");
        assert!(!config.registry.seed_demo_agents);
        assert_eq!(config.invoker.timeout_secs, 10);
        assert_eq!(config.worker.bridge_url, "http://bridge.internal:3001");
        assert_eq!(config.worker.heartbeat_interval_secs, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: BridgeConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.registry.data_dir, "data");
        assert!(config.registry.persist);
        assert!(config.registry.seed_demo_agents);
        assert_eq!(config.invoker.timeout_secs, 30);
        assert_eq!(config.worker.bridge_url, "http://localhost:3001");
        assert_eq!(config.worker.heartbeat_interval_secs, 5);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let toml_content = r#"
[server]
port = 4000
"#;
        let config: BridgeConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.invoker.timeout_secs, 30);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let toml_content = r#"
[invoker]
timeout_secs = 0
"#;
        let config: BridgeConfig = toml::from_str(toml_content).unwrap();
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_bridge_url_rejected() {
        let toml_content = r#"
[worker]
bridge_url = "not a url"
"#;
        let config: BridgeConfig = toml::from_str(toml_content).unwrap();
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_invoke_timeout_duration() {
        let config = BridgeConfig::test_config();
        assert_eq!(config.invoke_timeout(), std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_explicit_path_wins_resolution() {
        let explicit = Path::new("/tmp/does-not-matter.toml");
        assert_eq!(
            BridgeConfig::resolve_path(Some(explicit)),
            Some(explicit.to_path_buf())
        );
    }

    #[test]
    fn test_load_or_default_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, "[server]\nport = 4500\n").unwrap();

        let config = BridgeConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.server.port, 4500);
        assert_eq!(config.registry.data_dir, "data");
    }

    #[test]
    fn test_load_or_default_missing_explicit_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let result = BridgeConfig::load_or_default(Some(&path));
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }
}
