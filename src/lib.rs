//! TaskBridge - Agent-to-Agent Task Routing
//!
//! A registry and capability-based task router for interoperable worker
//! agents, including:
//! - Agent directory with heartbeat liveness and JSON persistence
//! - Capability-based task dispatch over HTTP
//! - Sequential multi-step pipelines with result threading
//! - Per-agent activity logs and a process-wide metrics collector
//! - A shared harness for the bundled worker-agent binaries
//!
//! # Quick Start
//!
//! ```rust
//! use taskbridge::registry::{AgentDirectory, AgentRecord};
//!
//! let directory = AgentDirectory::new();
//! directory.register(AgentRecord::new(
//!     "SummarizerAgent",
//!     "Text Summarizer",
//!     "Condenses long strings into short, digestible summaries.",
//!     vec!["summarize_text".to_string()],
//!     "http://localhost:4001/a2a",
//! ));
//!
//! let capable = directory.find_capable_agents("summarize_text");
//! assert_eq!(capable.len(), 1);
//! assert_eq!(capable[0].name, "SummarizerAgent");
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod observability;
pub mod registry;
pub mod routing;
pub mod testing;
pub mod workers;

pub use api::ApiServer;
pub use config::*;
pub use error::{BridgeError, BridgeResult};
pub use registry::{
    ActivityEntry, ActivityKind, ActivityLog, AgentDirectory, AgentPersistence, AgentRecord,
    AgentStatus,
};
pub use routing::{
    HttpTaskInvoker, PipelineOrchestrator, PipelineRecord, Task, TaskDispatcher, TaskInvoker,
};
pub use workers::{AgentSkill, WorkerAgent};
