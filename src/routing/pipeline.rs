//! Sequential pipeline orchestration
//!
//! Chains capabilities so one agent's output feeds the next agent's input.
//! Steps run strictly in order inside one background unit per pipeline; the
//! first failed step fails the pipeline permanently.

use crate::error::{BridgeError, BridgeResult};
use crate::observability::metrics;
use crate::registry::{ActivityKind, ActivityLog, AgentDirectory};
use crate::routing::invoker::TaskInvoker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// One declared pipeline step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStep {
    /// Capability to resolve when the step runs
    pub capability: String,
    /// Step parameters shallow-merged over the running input (params win)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// Outcome of a single executed step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Failed,
}

/// Record of one executed pipeline step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStepResult {
    /// Capability the step ran
    pub capability: String,
    /// Agent that served the step, absent when resolution failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    /// Agent result, absent on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Step outcome
    pub status: StepStatus,
    /// Wall-clock invocation time
    pub duration_ms: u64,
    /// Failure message, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lifecycle of a pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Running,
    Completed,
    Failed,
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStatus::Running => write!(f, "running"),
            PipelineStatus::Completed => write!(f, "completed"),
            PipelineStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A pipeline and its execution history.
///
/// `results` grows one entry per executed step; its length is the current
/// step index. `finalResult` is set only when every step completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRecord {
    /// Pipeline id
    pub id: Uuid,
    /// Current status
    pub status: PipelineStatus,
    /// Declared steps, fixed at creation
    pub steps: Vec<PipelineStep>,
    /// Executed step results, in order
    pub results: Vec<PipelineStepResult>,
    /// Initial input
    pub input: serde_json::Value,
    /// Last step's result, present only on full success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_result: Option<serde_json::Value>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}

/// Thread-safe store of pipelines
#[derive(Debug, Clone, Default)]
pub struct PipelineStore {
    pipelines: Arc<RwLock<HashMap<Uuid, PipelineRecord>>>,
}

impl PipelineStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            pipelines: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a pipeline
    pub fn insert(&self, pipeline: PipelineRecord) {
        let mut pipelines = self.pipelines.write().unwrap();
        pipelines.insert(pipeline.id, pipeline);
    }

    /// Get a pipeline by id
    pub fn get(&self, id: &Uuid) -> Option<PipelineRecord> {
        let pipelines = self.pipelines.read().unwrap();
        pipelines.get(id).cloned()
    }

    /// Apply a mutation to a stored pipeline. Returns false for unknown ids.
    pub fn update<F: FnOnce(&mut PipelineRecord)>(&self, id: &Uuid, f: F) -> bool {
        let mut pipelines = self.pipelines.write().unwrap();
        match pipelines.get_mut(id) {
            Some(pipeline) => {
                f(pipeline);
                true
            }
            None => false,
        }
    }

    /// All pipelines, newest first by creation time
    pub fn list(&self) -> Vec<PipelineRecord> {
        let pipelines = self.pipelines.read().unwrap();
        let mut all: Vec<PipelineRecord> = pipelines.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Count of stored pipelines
    pub fn pipeline_count(&self) -> usize {
        let pipelines = self.pipelines.read().unwrap();
        pipelines.len()
    }

    /// Remove all pipelines (for testing)
    #[cfg(test)]
    pub fn clear(&self) {
        let mut pipelines = self.pipelines.write().unwrap();
        pipelines.clear();
    }
}

/// Drives multi-step pipelines over the agent directory
#[derive(Clone)]
pub struct PipelineOrchestrator {
    directory: AgentDirectory,
    activity: ActivityLog,
    store: PipelineStore,
    invoker: Arc<dyn TaskInvoker>,
    cancel_token: CancellationToken,
}

impl PipelineOrchestrator {
    /// Create an orchestrator over the given directory, activity log, and
    /// pipeline store
    pub fn new(
        directory: AgentDirectory,
        activity: ActivityLog,
        store: PipelineStore,
        invoker: Arc<dyn TaskInvoker>,
    ) -> Self {
        Self {
            directory,
            activity,
            store,
            invoker,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Replace the orchestrator's cancel token with an external one so a
    /// caller-held token can stop running pipelines
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Stop all running pipelines at their next cancellation check
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Start a pipeline.
    ///
    /// Every declared capability must have at least one eligible agent right
    /// now; otherwise no record is created and the first unsatisfiable
    /// capability is reported. The returned snapshot is `running`; steps
    /// execute in a background task.
    pub fn start(
        &self,
        steps: Vec<PipelineStep>,
        input: serde_json::Value,
    ) -> BridgeResult<PipelineRecord> {
        if steps.is_empty() {
            return Err(BridgeError::validation("steps must be a non-empty array"));
        }

        for step in &steps {
            if self.directory.find_capable_agents(&step.capability).is_empty() {
                warn!(capability = %step.capability, "Pipeline step has no eligible agent");
                return Err(BridgeError::no_agent_available(&step.capability));
            }
        }

        let now = Utc::now();
        let pipeline = PipelineRecord {
            id: Uuid::new_v4(),
            status: PipelineStatus::Running,
            steps: steps.clone(),
            results: Vec::new(),
            input: input.clone(),
            final_result: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(pipeline.clone());
        metrics().pipeline_started();
        info!(pipeline_id = %pipeline.id, steps = steps.len(), "Started pipeline");

        let directory = self.directory.clone();
        let activity = self.activity.clone();
        let store = self.store.clone();
        let invoker = Arc::clone(&self.invoker);
        let cancel_token = self.cancel_token.clone();
        let pipeline_id = pipeline.id;
        tokio::spawn(async move {
            Self::run_pipeline(
                directory,
                activity,
                store,
                invoker,
                cancel_token,
                pipeline_id,
                steps,
                input,
            )
            .await;
        });

        Ok(pipeline)
    }

    /// Get a pipeline by id
    pub fn get_pipeline(&self, id: &Uuid) -> BridgeResult<PipelineRecord> {
        self.store
            .get(id)
            .ok_or_else(|| BridgeError::not_found("Pipeline"))
    }

    /// All pipelines, newest first
    pub fn list_pipelines(&self) -> Vec<PipelineRecord> {
        self.store.list()
    }

    /// Execute the step loop for one pipeline
    #[allow(clippy::too_many_arguments)]
    async fn run_pipeline(
        directory: AgentDirectory,
        activity: ActivityLog,
        store: PipelineStore,
        invoker: Arc<dyn TaskInvoker>,
        cancel_token: CancellationToken,
        pipeline_id: Uuid,
        steps: Vec<PipelineStep>,
        initial_input: serde_json::Value,
    ) {
        let mut running_input = initial_input;
        let mut last_result = serde_json::Value::Null;

        for step in steps {
            if cancel_token.is_cancelled() {
                Self::fail_pipeline(
                    &store,
                    &pipeline_id,
                    failed_step(&step.capability, None, 0, "Pipeline cancelled"),
                );
                info!(pipeline_id = %pipeline_id, "Pipeline cancelled");
                return;
            }

            // Agents can vanish between pre-validation and this step
            let agent = match directory
                .find_capable_agents(&step.capability)
                .into_iter()
                .next()
            {
                Some(agent) => agent,
                None => {
                    Self::fail_pipeline(
                        &store,
                        &pipeline_id,
                        failed_step(
                            &step.capability,
                            None,
                            0,
                            format!("No agent available for {}", step.capability),
                        ),
                    );
                    warn!(pipeline_id = %pipeline_id, capability = %step.capability, "Pipeline step lost its agent");
                    return;
                }
            };

            let request_input = merge_step_params(&running_input, step.params.as_ref());
            activity.record(
                &agent.name,
                ActivityKind::TaskRequest,
                format!("Received pipeline step for capability {}", step.capability),
                Some(json!({"pipelineId": pipeline_id, "capability": step.capability})),
            );

            let start = Instant::now();
            let outcome = tokio::select! {
                _ = cancel_token.cancelled() => None,
                outcome = invoker.invoke(&agent, &step.capability, request_input.clone()) => Some(outcome),
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            match outcome {
                Some(Ok(result)) => {
                    metrics().pipeline_step_executed();
                    activity.record(
                        &agent.name,
                        ActivityKind::TaskResponse,
                        format!("Completed pipeline step for capability {}", step.capability),
                        Some(json!({"pipelineId": pipeline_id})),
                    );
                    store.update(&pipeline_id, |pipeline| {
                        pipeline.results.push(PipelineStepResult {
                            capability: step.capability.clone(),
                            agent_name: Some(agent.name.clone()),
                            result: Some(result.clone()),
                            status: StepStatus::Completed,
                            duration_ms,
                            error: None,
                        });
                        pipeline.updated_at = Utc::now();
                    });
                    info!(pipeline_id = %pipeline_id, capability = %step.capability, agent_name = %agent.name, duration_ms, "Pipeline step completed");
                    running_input = thread_result(&result, &running_input);
                    last_result = result;
                }
                Some(Err(e)) => {
                    let message = e.to_string();
                    activity.record(
                        &agent.name,
                        ActivityKind::TaskError,
                        format!("Failed pipeline step for capability {}", step.capability),
                        Some(json!({"pipelineId": pipeline_id, "error": message})),
                    );
                    Self::fail_pipeline(
                        &store,
                        &pipeline_id,
                        failed_step(
                            &step.capability,
                            Some(agent.name.clone()),
                            duration_ms,
                            message.clone(),
                        ),
                    );
                    warn!(pipeline_id = %pipeline_id, capability = %step.capability, error = %message, "Pipeline step failed");
                    return;
                }
                None => {
                    Self::fail_pipeline(
                        &store,
                        &pipeline_id,
                        failed_step(
                            &step.capability,
                            Some(agent.name.clone()),
                            duration_ms,
                            "Pipeline cancelled",
                        ),
                    );
                    info!(pipeline_id = %pipeline_id, "Pipeline cancelled mid-invocation");
                    return;
                }
            }
        }

        store.update(&pipeline_id, |pipeline| {
            pipeline.status = PipelineStatus::Completed;
            pipeline.final_result = Some(last_result.clone());
            pipeline.updated_at = Utc::now();
        });
        metrics().pipeline_completed();
        info!(pipeline_id = %pipeline_id, "Pipeline completed");
    }

    /// Append a terminal failed step and mark the pipeline failed
    fn fail_pipeline(store: &PipelineStore, pipeline_id: &Uuid, step_result: PipelineStepResult) {
        store.update(pipeline_id, |pipeline| {
            pipeline.results.push(step_result);
            pipeline.status = PipelineStatus::Failed;
            pipeline.updated_at = Utc::now();
        });
        metrics().pipeline_failed();
    }
}

/// Build the input for one step: running input with step params merged on
/// top, params keys winning. Non-object inputs contribute nothing.
fn merge_step_params(input: &serde_json::Value, params: Option<&serde_json::Value>) -> serde_json::Value {
    let mut merged = match input.as_object() {
        Some(map) => map.clone(),
        None => serde_json::Map::new(),
    };
    if let Some(params) = params.and_then(|p| p.as_object()) {
        for (key, value) in params {
            merged.insert(key.clone(), value.clone());
        }
    }
    serde_json::Value::Object(merged)
}

/// Thread a step result into the next step's input. Object results replace
/// the input wholesale; scalar results become `text` on top of the previous
/// input, displacing any previous `text`.
fn thread_result(result: &serde_json::Value, previous_input: &serde_json::Value) -> serde_json::Value {
    match result {
        serde_json::Value::Object(_) => result.clone(),
        scalar => {
            let mut next = match previous_input.as_object() {
                Some(map) => map.clone(),
                None => serde_json::Map::new(),
            };
            let text = match scalar {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            next.insert("text".to_string(), serde_json::Value::String(text));
            serde_json::Value::Object(next)
        }
    }
}

/// Build a failed step result
fn failed_step<S: Into<String>>(
    capability: &str,
    agent_name: Option<String>,
    duration_ms: u64,
    error: S,
) -> PipelineStepResult {
    PipelineStepResult {
        capability: capability.to_string(),
        agent_name,
        result: None,
        status: StepStatus::Failed,
        duration_ms,
        error: Some(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AgentRecord;
    use crate::testing::MockInvoker;
    use proptest::prelude::*;
    use std::time::Duration;

    fn step(capability: &str) -> PipelineStep {
        PipelineStep {
            capability: capability.to_string(),
            params: None,
        }
    }

    fn step_with_params(capability: &str, params: serde_json::Value) -> PipelineStep {
        PipelineStep {
            capability: capability.to_string(),
            params: Some(params),
        }
    }

    fn directory_with(agents: &[(&str, &[&str])]) -> AgentDirectory {
        let directory = AgentDirectory::new();
        for (i, (name, capabilities)) in agents.iter().enumerate() {
            directory.register(AgentRecord::new(
                name.to_string(),
                "Worker".to_string(),
                "A live worker".to_string(),
                capabilities.iter().map(|c| c.to_string()).collect(),
                format!("http://localhost:{}/a2a", 4001 + i),
            ));
        }
        directory
    }

    fn orchestrator_with(directory: AgentDirectory, invoker: MockInvoker) -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            directory,
            ActivityLog::new(),
            PipelineStore::new(),
            Arc::new(invoker),
        )
    }

    async fn wait_for_terminal(
        orchestrator: &PipelineOrchestrator,
        id: &Uuid,
    ) -> PipelineRecord {
        for _ in 0..300 {
            let pipeline = orchestrator.get_pipeline(id).unwrap();
            if pipeline.status != PipelineStatus::Running {
                return pipeline;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("pipeline {id} never reached a terminal status");
    }

    // ========== Pure helper behavior ==========

    #[test]
    fn test_merge_params_win_over_input() {
        let input = json!({"text": "original", "lang": "en"});
        let params = json!({"lang": "fr"});

        let merged = merge_step_params(&input, Some(&params));
        assert_eq!(merged["text"], "original");
        assert_eq!(merged["lang"], "fr");
    }

    #[test]
    fn test_merge_without_params_is_input() {
        let input = json!({"text": "original"});
        assert_eq!(merge_step_params(&input, None), input);
    }

    #[test]
    fn test_merge_non_object_input_contributes_nothing() {
        let merged = merge_step_params(&json!("scalar"), Some(&json!({"lang": "fr"})));
        assert_eq!(merged, json!({"lang": "fr"}));
    }

    #[test]
    fn test_thread_object_result_replaces_input() {
        let result = json!({"summary": "short"});
        let next = thread_result(&result, &json!({"text": "long", "lang": "en"}));
        assert_eq!(next, result);
    }

    #[test]
    fn test_thread_scalar_result_wraps_with_fresh_text() {
        let next = thread_result(&json!("short version"), &json!({"text": "long", "lang": "en"}));
        assert_eq!(next["text"], "short version");
        assert_eq!(next["lang"], "en");
    }

    #[test]
    fn test_thread_number_result_is_stringified() {
        let next = thread_result(&json!(42), &json!({}));
        assert_eq!(next["text"], "42");
    }

    // ========== Start validation ==========

    #[tokio::test]
    async fn test_start_requires_steps() {
        let orchestrator = orchestrator_with(AgentDirectory::new(), MockInvoker::new());
        let result = orchestrator.start(Vec::new(), json!({}));
        match result {
            Err(BridgeError::Validation { message }) => {
                assert_eq!(message, "steps must be a non-empty array");
            }
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_names_first_unsatisfiable_capability() {
        let directory = directory_with(&[("worker", &["summarize_text"])]);
        let orchestrator = orchestrator_with(directory, MockInvoker::new());

        let result = orchestrator.start(
            vec![step("summarize_text"), step("missing_one"), step("missing_two")],
            json!({}),
        );
        match result {
            Err(BridgeError::NoAgentAvailable { capability }) => {
                assert_eq!(capability, "missing_one");
            }
            other => panic!("Expected NoAgentAvailable, got {other:?}"),
        }
        assert_eq!(orchestrator.list_pipelines().len(), 0);
    }

    // ========== Execution ==========

    #[tokio::test]
    async fn test_two_step_pipeline_completes() {
        let directory = directory_with(&[
            ("summarizer", &["summarize_text"]),
            ("analyzer", &["analyze_sentiment"]),
        ]);
        let invoker = MockInvoker::new()
            .with_response("summarize_text", json!({"summary": "all good..."}))
            .with_response("analyze_sentiment", json!({"sentiment": "positive"}));
        let log = invoker.invocation_log();
        let store = PipelineStore::new();
        let orchestrator = PipelineOrchestrator::new(
            directory,
            ActivityLog::new(),
            store.clone(),
            Arc::new(invoker),
        );

        let pipeline = orchestrator
            .start(
                vec![step("summarize_text"), step("analyze_sentiment")],
                json!({"text": "a long happy text"}),
            )
            .unwrap();
        assert_eq!(pipeline.status, PipelineStatus::Running);
        assert!(pipeline.results.is_empty());
        assert_eq!(store.pipeline_count(), 1);

        let done = wait_for_terminal(&orchestrator, &pipeline.id).await;
        assert_eq!(done.status, PipelineStatus::Completed);
        assert_eq!(done.results.len(), 2);
        assert!(done
            .results
            .iter()
            .all(|r| r.status == StepStatus::Completed));
        assert_eq!(done.results[0].agent_name.as_deref(), Some("summarizer"));
        assert_eq!(done.final_result.unwrap()["sentiment"], "positive");

        // Step 1 saw the initial input; step 2 saw step 1's object result
        let calls = log.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].payload["text"], "a long happy text");
        assert_eq!(calls[1].payload["summary"], "all good...");
    }

    #[tokio::test]
    async fn test_scalar_result_threads_as_text() {
        let directory = directory_with(&[("worker", &["first", "second"])]);
        let invoker = MockInvoker::new()
            .with_response("first", json!("just a string"))
            .with_response("second", json!({"ok": true}));
        let log = invoker.invocation_log();
        let orchestrator = orchestrator_with(directory, invoker);

        let pipeline = orchestrator
            .start(
                vec![step("first"), step("second")],
                json!({"text": "original", "lang": "nl"}),
            )
            .unwrap();
        let done = wait_for_terminal(&orchestrator, &pipeline.id).await;
        assert_eq!(done.status, PipelineStatus::Completed);

        let calls = log.lock().unwrap().clone();
        // The fresh scalar displaces the original text; other keys survive
        assert_eq!(calls[1].payload["text"], "just a string");
        assert_eq!(calls[1].payload["lang"], "nl");
    }

    #[tokio::test]
    async fn test_step_params_merge_into_request() {
        let directory = directory_with(&[("worker", &["translate_text"])]);
        let invoker =
            MockInvoker::new().with_response("translate_text", json!({"translation": "bonjour"}));
        let log = invoker.invocation_log();
        let orchestrator = orchestrator_with(directory, invoker);

        let pipeline = orchestrator
            .start(
                vec![step_with_params(
                    "translate_text",
                    json!({"targetLanguage": "fr"}),
                )],
                json!({"text": "hello"}),
            )
            .unwrap();
        wait_for_terminal(&orchestrator, &pipeline.id).await;

        let calls = log.lock().unwrap().clone();
        assert_eq!(calls[0].payload["text"], "hello");
        assert_eq!(calls[0].payload["targetLanguage"], "fr");
    }

    #[tokio::test]
    async fn test_failed_step_stops_pipeline() {
        let directory = directory_with(&[("worker", &["first", "second"])]);
        let invoker = MockInvoker::new()
            .with_error("first", "connection refused")
            .with_response("second", json!({"ok": true}));
        let log = invoker.invocation_log();
        let orchestrator = orchestrator_with(directory, invoker);

        let pipeline = orchestrator
            .start(vec![step("first"), step("second")], json!({}))
            .unwrap();
        let done = wait_for_terminal(&orchestrator, &pipeline.id).await;

        assert_eq!(done.status, PipelineStatus::Failed);
        assert_eq!(done.results.len(), 1);
        assert_eq!(done.results[0].status, StepStatus::Failed);
        assert!(done.results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("connection refused"));
        assert!(done.final_result.is_none());
        // The second step never ran
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_agent_lost_mid_run_fails_pipeline() {
        let directory = directory_with(&[("worker", &["first", "second"])]);
        let invoker = MockInvoker::new()
            .with_delay(Duration::from_millis(100))
            .with_response("first", json!({"ok": true}))
            .with_response("second", json!({"ok": true}));
        let orchestrator = orchestrator_with(directory.clone(), invoker);

        let pipeline = orchestrator
            .start(vec![step("first"), step("second")], json!({}))
            .unwrap();

        // Remove the only worker while step one is still in flight
        tokio::time::sleep(Duration::from_millis(20)).await;
        directory.remove("worker");

        let done = wait_for_terminal(&orchestrator, &pipeline.id).await;
        assert_eq!(done.status, PipelineStatus::Failed);
        assert_eq!(done.results.len(), 2);
        assert_eq!(done.results[0].status, StepStatus::Completed);
        assert_eq!(done.results[1].status, StepStatus::Failed);
        assert_eq!(
            done.results[1].error.as_deref(),
            Some("No agent available for second")
        );
        assert!(done.results[1].agent_name.is_none());
    }

    #[tokio::test]
    async fn test_cancel_stops_running_pipeline() {
        let directory = directory_with(&[("worker", &["slow"])]);
        let invoker = MockInvoker::new()
            .with_delay(Duration::from_millis(500))
            .with_response("slow", json!({"ok": true}));
        let orchestrator = orchestrator_with(directory, invoker);

        let pipeline = orchestrator.start(vec![step("slow")], json!({})).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        orchestrator.cancel();

        let done = wait_for_terminal(&orchestrator, &pipeline.id).await;
        assert_eq!(done.status, PipelineStatus::Failed);
        assert_eq!(
            done.results.last().unwrap().error.as_deref(),
            Some("Pipeline cancelled")
        );
    }

    #[tokio::test]
    async fn test_get_unknown_pipeline_is_not_found() {
        let orchestrator = orchestrator_with(AgentDirectory::new(), MockInvoker::new());
        let result = orchestrator.get_pipeline(&Uuid::new_v4());
        match result {
            Err(BridgeError::NotFound { resource }) => assert_eq!(resource, "Pipeline"),
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let now = Utc::now();
        let record = PipelineRecord {
            id: Uuid::new_v4(),
            status: PipelineStatus::Running,
            steps: vec![step("cap")],
            results: Vec::new(),
            input: json!({}),
            final_result: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "running");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("finalResult").is_none());
    }

    // ========== Merge and threading laws ==========

    proptest! {
        #[test]
        fn prop_params_always_win(
            input in proptest::collection::hash_map("[a-z]{1,4}", 0i64..100, 0..6),
            params in proptest::collection::hash_map("[a-z]{1,4}", 0i64..100, 0..6),
        ) {
            let input_value = serde_json::to_value(&input).unwrap();
            let params_value = serde_json::to_value(&params).unwrap();

            let merged = merge_step_params(&input_value, Some(&params_value));
            for (key, value) in &params {
                prop_assert_eq!(merged[key].as_i64().unwrap(), *value);
            }
            for (key, value) in &input {
                if !params.contains_key(key) {
                    prop_assert_eq!(merged[key].as_i64().unwrap(), *value);
                }
            }
        }

        #[test]
        fn prop_scalar_threading_always_yields_text_object(
            text in "[a-zA-Z0-9 ]{0,30}",
            previous in proptest::collection::hash_map("[a-z]{1,4}", 0i64..100, 0..6),
        ) {
            let previous_value = serde_json::to_value(&previous).unwrap();
            let next = thread_result(&json!(text), &previous_value);

            prop_assert!(next.is_object());
            prop_assert_eq!(next["text"].as_str().unwrap(), text.as_str());
            for (key, value) in &previous {
                if key != "text" {
                    prop_assert_eq!(next[key].as_i64().unwrap(), *value);
                }
            }
        }
    }
}
