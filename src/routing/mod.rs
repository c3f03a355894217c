//! Task routing
//!
//! This module contains the three layers of the request path:
//!
//! ## Remote invocation (invoker.rs)
//!
//! The [`TaskInvoker`] trait and its HTTP implementation forward a single
//! task to an agent endpoint. Everything above it is transport-agnostic.
//!
//! ## Single-task dispatch (dispatcher.rs)
//!
//! Capability lookup, task records, and background completion for one-shot
//! tasks.
//!
//! ## Pipelines (pipeline.rs)
//!
//! Sequential multi-step execution threading each agent's output into the
//! next agent's input.

pub mod dispatcher;
pub mod invoker;
pub mod pipeline;

pub use dispatcher::{Task, TaskDispatcher, TaskStatus, TaskStore};
pub use invoker::{HttpTaskInvoker, InvocationError, TaskInvoker};
pub use pipeline::{
    PipelineOrchestrator, PipelineRecord, PipelineStatus, PipelineStep, PipelineStepResult,
    PipelineStore, StepStatus,
};
