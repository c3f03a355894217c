//! Observability system for the bridge
//!
//! Structured logging and metrics collection; the HTTP surface for both
//! (`/health`, `/metrics`) lives in the API layer.

pub mod logging;
pub mod metrics;

// Re-export for convenience
pub use logging::{init_default_logging, init_logging, LogFormat};
pub use metrics::{metrics, BridgeMetrics, MetricsSnapshot};

// Span macros for structured logging
pub use logging::{pipeline_span, task_span, worker_span};
