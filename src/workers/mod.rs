//! Worker agents
//!
//! Toy skill agents that register with the bridge and serve its invocation
//! protocol. A shared harness owns the HTTP surface and the
//! register-then-heartbeat lifecycle; each skill is a pure function from
//! task payload to result.

pub mod harness;
pub mod sentiment;
pub mod summarize;
pub mod translate;

pub use harness::{AgentSkill, SkillError, WorkerAgent};
pub use sentiment::SentimentSkill;
pub use summarize::SummarizerSkill;
pub use translate::TranslatorSkill;
