//! Thread-safe metrics collection system
//!
//! Provides atomic counters and a mutex-protected timing window for tracking
//! operational statistics across task dispatch, pipeline execution, remote
//! invocations, and registry traffic. Exposed as JSON on `GET /metrics`.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Global metrics collector instance
pub static METRICS: Lazy<BridgeMetrics> = Lazy::new(BridgeMetrics::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static BridgeMetrics {
    &METRICS
}

/// Thread-safe metrics collector using atomics and a capped timing window
pub struct BridgeMetrics {
    // Task dispatch metrics
    tasks_dispatched: AtomicU64,
    tasks_in_flight: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_rejected: AtomicU64,

    // Pipeline metrics
    pipelines_started: AtomicU64,
    pipelines_completed: AtomicU64,
    pipelines_failed: AtomicU64,
    pipeline_steps_executed: AtomicU64,

    // Remote invocation metrics
    invocations_attempted: AtomicU64,
    invocation_failures: AtomicU64,
    invocation_times: Mutex<Vec<u64>>, // in milliseconds

    // Registry traffic metrics
    agents_registered: AtomicU64,
    heartbeats_received: AtomicU64,
    agents_deleted: AtomicU64,

    uptime_start: AtomicU64,
}

impl BridgeMetrics {
    pub fn new() -> Self {
        Self {
            tasks_dispatched: AtomicU64::new(0),
            tasks_in_flight: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            tasks_rejected: AtomicU64::new(0),
            pipelines_started: AtomicU64::new(0),
            pipelines_completed: AtomicU64::new(0),
            pipelines_failed: AtomicU64::new(0),
            pipeline_steps_executed: AtomicU64::new(0),
            invocations_attempted: AtomicU64::new(0),
            invocation_failures: AtomicU64::new(0),
            invocation_times: Mutex::new(Vec::new()),
            agents_registered: AtomicU64::new(0),
            heartbeats_received: AtomicU64::new(0),
            agents_deleted: AtomicU64::new(0),
            uptime_start: AtomicU64::new(current_timestamp()),
        }
    }

    // Task dispatch metrics
    pub fn task_dispatched(&self) {
        self.tasks_dispatched.fetch_add(1, Ordering::Relaxed);
        self.tasks_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        self.tasks_in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn task_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        self.tasks_in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn task_rejected(&self) {
        self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Pipeline metrics
    pub fn pipeline_started(&self) {
        self.pipelines_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pipeline_completed(&self) {
        self.pipelines_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pipeline_failed(&self) {
        self.pipelines_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pipeline_step_executed(&self) {
        self.pipeline_steps_executed.fetch_add(1, Ordering::Relaxed);
    }

    // Remote invocation metrics
    pub fn invocation_attempted(&self) {
        self.invocations_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn invocation_succeeded(&self, duration: Duration) {
        self.record_invocation_time(duration);
    }

    pub fn invocation_failed(&self, duration: Duration) {
        self.invocation_failures.fetch_add(1, Ordering::Relaxed);
        self.record_invocation_time(duration);
    }

    fn record_invocation_time(&self, duration: Duration) {
        if let Ok(mut times) = self.invocation_times.lock() {
            times.push(duration.as_millis() as u64);

            // Limit to last 1000 measurements to prevent unbounded growth
            if times.len() > 1000 {
                times.remove(0);
            }
        }
    }

    // Registry traffic metrics
    pub fn agent_registered(&self) {
        self.agents_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn heartbeat_received(&self) {
        self.heartbeats_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn agent_deleted(&self) {
        self.agents_deleted.fetch_add(1, Ordering::Relaxed);
    }

    // Reset all metrics (useful for testing)
    pub fn reset(&self) {
        self.tasks_dispatched.store(0, Ordering::Relaxed);
        self.tasks_in_flight.store(0, Ordering::Relaxed);
        self.tasks_completed.store(0, Ordering::Relaxed);
        self.tasks_failed.store(0, Ordering::Relaxed);
        self.tasks_rejected.store(0, Ordering::Relaxed);
        self.pipelines_started.store(0, Ordering::Relaxed);
        self.pipelines_completed.store(0, Ordering::Relaxed);
        self.pipelines_failed.store(0, Ordering::Relaxed);
        self.pipeline_steps_executed.store(0, Ordering::Relaxed);
        self.invocations_attempted.store(0, Ordering::Relaxed);
        self.invocation_failures.store(0, Ordering::Relaxed);
        self.agents_registered.store(0, Ordering::Relaxed);
        self.heartbeats_received.store(0, Ordering::Relaxed);
        self.agents_deleted.store(0, Ordering::Relaxed);
        self.uptime_start
            .store(current_timestamp(), Ordering::Relaxed);
        if let Ok(mut times) = self.invocation_times.lock() {
            times.clear();
        }
    }

    /// Calculate invocation time statistics (avg, p50, p95, p99)
    fn calculate_invocation_statistics(&self) -> (f64, f64, f64, f64) {
        if let Ok(times) = self.invocation_times.lock() {
            if times.is_empty() {
                (0.0, 0.0, 0.0, 0.0)
            } else {
                let mut sorted_times = times.clone();
                sorted_times.sort_unstable();

                let avg = sorted_times.iter().sum::<u64>() as f64 / sorted_times.len() as f64;
                let p50 = percentile(&sorted_times, 50.0);
                let p95 = percentile(&sorted_times, 95.0);
                let p99 = percentile(&sorted_times, 99.0);

                (avg, p50, p95, p99)
            }
        } else {
            (0.0, 0.0, 0.0, 0.0)
        }
    }

    /// Get complete metrics snapshot
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let now = current_timestamp();
        let (avg, p50, p95, p99) = self.calculate_invocation_statistics();

        MetricsSnapshot {
            tasks: TaskMetrics {
                dispatched: self.tasks_dispatched.load(Ordering::Relaxed),
                in_flight: self.tasks_in_flight.load(Ordering::Relaxed),
                completed: self.tasks_completed.load(Ordering::Relaxed),
                failed: self.tasks_failed.load(Ordering::Relaxed),
                rejected: self.tasks_rejected.load(Ordering::Relaxed),
            },
            pipelines: PipelineMetrics {
                started: self.pipelines_started.load(Ordering::Relaxed),
                completed: self.pipelines_completed.load(Ordering::Relaxed),
                failed: self.pipelines_failed.load(Ordering::Relaxed),
                steps_executed: self.pipeline_steps_executed.load(Ordering::Relaxed),
            },
            invocations: InvocationMetrics {
                attempted: self.invocations_attempted.load(Ordering::Relaxed),
                failures: self.invocation_failures.load(Ordering::Relaxed),
                avg_time_ms: avg,
                time_p50_ms: p50,
                time_p95_ms: p95,
                time_p99_ms: p99,
            },
            registry: RegistryMetrics {
                registrations: self.agents_registered.load(Ordering::Relaxed),
                heartbeats: self.heartbeats_received.load(Ordering::Relaxed),
                deletions: self.agents_deleted.load(Ordering::Relaxed),
            },
            uptime_seconds: now - self.uptime_start.load(Ordering::Relaxed),
            timestamp: now,
        }
    }
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// Public metrics structures
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub tasks: TaskMetrics,
    pub pipelines: PipelineMetrics,
    pub invocations: InvocationMetrics,
    pub registry: RegistryMetrics,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct TaskMetrics {
    pub dispatched: u64,
    pub in_flight: u64,
    pub completed: u64,
    pub failed: u64,
    pub rejected: u64,
}

#[derive(Debug, Serialize)]
pub struct PipelineMetrics {
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    pub steps_executed: u64,
}

#[derive(Debug, Serialize)]
pub struct InvocationMetrics {
    pub attempted: u64,
    pub failures: u64,
    pub avg_time_ms: f64,
    pub time_p50_ms: f64,
    pub time_p95_ms: f64,
    pub time_p99_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct RegistryMetrics {
    pub registrations: u64,
    pub heartbeats: u64,
    pub deletions: u64,
}

/// Calculate percentile from sorted data
fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower] as f64
    } else {
        let weight = index - lower as f64;
        sorted_data[lower] as f64 * (1.0 - weight) + sorted_data[upper] as f64 * weight
    }
}

/// Get current Unix timestamp in seconds
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
