//! Agent registry
//!
//! The directory of registered agents plus the services around it: per-agent
//! activity history, disk persistence, and showcase seed data.

pub mod activity;
pub mod directory;
pub mod persistence;
pub mod seed;

pub use activity::{ActivityEntry, ActivityKind, ActivityLog, MAX_ENTRIES_PER_AGENT};
pub use directory::{is_simulated_endpoint, AgentDirectory, AgentRecord, AgentStatus};
pub use persistence::AgentPersistence;
pub use seed::{seed_directory, showcase_agents};
