//! Capability-based task dispatch
//!
//! Resolves a capability to an eligible agent, records the task, and forwards
//! it in the background. HTTP callers get the `processing` snapshot back
//! immediately and poll for the outcome.

use crate::error::{BridgeError, BridgeResult};
use crate::observability::metrics;
use crate::registry::{ActivityKind, ActivityLog, AgentDirectory, AgentRecord};
use crate::routing::invoker::TaskInvoker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Lifecycle of a dispatched task
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A dispatched task and its outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task id
    pub id: Uuid,
    /// Requested capability
    pub capability: String,
    /// Name of the agent the task was assigned to
    pub assigned_agent: String,
    /// Request payload forwarded to the agent
    pub payload: serde_json::Value,
    /// Current status
    pub status: TaskStatus,
    /// Agent result on success, `{error, details}` on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}

/// Thread-safe store of dispatched tasks
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

impl TaskStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a task
    pub fn insert(&self, task: Task) {
        let mut tasks = self.tasks.write().unwrap();
        tasks.insert(task.id, task);
    }

    /// Get a task by id
    pub fn get(&self, id: &Uuid) -> Option<Task> {
        let tasks = self.tasks.read().unwrap();
        tasks.get(id).cloned()
    }

    /// Apply a mutation to a stored task. Returns false for unknown ids.
    pub fn update<F: FnOnce(&mut Task)>(&self, id: &Uuid, f: F) -> bool {
        let mut tasks = self.tasks.write().unwrap();
        match tasks.get_mut(id) {
            Some(task) => {
                f(task);
                true
            }
            None => false,
        }
    }

    /// All tasks, newest first by creation time
    pub fn list(&self) -> Vec<Task> {
        let tasks = self.tasks.read().unwrap();
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Count of stored tasks
    pub fn task_count(&self) -> usize {
        let tasks = self.tasks.read().unwrap();
        tasks.len()
    }

    /// Remove all tasks (for testing)
    #[cfg(test)]
    pub fn clear(&self) {
        let mut tasks = self.tasks.write().unwrap();
        tasks.clear();
    }
}

/// Routes tasks to agents by capability and tracks their outcomes
#[derive(Clone)]
pub struct TaskDispatcher {
    directory: AgentDirectory,
    activity: ActivityLog,
    store: TaskStore,
    invoker: Arc<dyn TaskInvoker>,
}

impl TaskDispatcher {
    /// Create a dispatcher over the given directory, activity log, and
    /// task store
    pub fn new(
        directory: AgentDirectory,
        activity: ActivityLog,
        store: TaskStore,
        invoker: Arc<dyn TaskInvoker>,
    ) -> Self {
        Self {
            directory,
            activity,
            store,
            invoker,
        }
    }

    /// Dispatch a task for a capability.
    ///
    /// With `target_agent`, the named agent is selected only if it is among
    /// the eligible agents for the capability; otherwise the first eligible
    /// agent wins. The returned snapshot is in `processing`; completion
    /// happens in a background task.
    pub fn dispatch(
        &self,
        capability: &str,
        payload: serde_json::Value,
        target_agent: Option<&str>,
    ) -> BridgeResult<Task> {
        if capability.trim().is_empty() {
            metrics().task_rejected();
            return Err(BridgeError::validation("Capability is required"));
        }

        let eligible = self.directory.find_capable_agents(capability);
        let agent = match target_agent {
            Some(name) => eligible.into_iter().find(|a| a.name == name),
            None => eligible.into_iter().next(),
        };
        let agent = match agent {
            Some(agent) => agent,
            None => {
                metrics().task_rejected();
                warn!(capability = %capability, "No eligible agent for capability");
                return Err(BridgeError::no_agent_available(capability));
            }
        };

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            capability: capability.to_string(),
            assigned_agent: agent.name.clone(),
            payload: payload.clone(),
            status: TaskStatus::Processing,
            result: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(task.clone());
        metrics().task_dispatched();
        self.activity.record(
            &agent.name,
            ActivityKind::TaskRequest,
            format!("Received task for capability {capability}"),
            Some(json!({"taskId": task.id, "capability": capability})),
        );
        info!(task_id = %task.id, agent_name = %agent.name, capability = %capability, "Dispatched task");

        let store = self.store.clone();
        let activity = self.activity.clone();
        let invoker = Arc::clone(&self.invoker);
        let task_id = task.id;
        let capability = capability.to_string();
        tokio::spawn(async move {
            Self::complete_task(store, activity, invoker, agent, task_id, capability, payload).await;
        });

        Ok(task)
    }

    /// Get a task by id
    pub fn get_task(&self, id: &Uuid) -> BridgeResult<Task> {
        self.store.get(id).ok_or_else(|| BridgeError::not_found("Task"))
    }

    /// All tasks, newest first
    pub fn list_tasks(&self) -> Vec<Task> {
        self.store.list()
    }

    /// Forward the task and record exactly one terminal outcome
    async fn complete_task(
        store: TaskStore,
        activity: ActivityLog,
        invoker: Arc<dyn TaskInvoker>,
        agent: AgentRecord,
        task_id: Uuid,
        capability: String,
        payload: serde_json::Value,
    ) {
        match invoker.invoke(&agent, &capability, payload).await {
            Ok(result) => {
                store.update(&task_id, |task| {
                    task.status = TaskStatus::Completed;
                    task.result = Some(result.clone());
                    task.updated_at = Utc::now();
                });
                metrics().task_completed();
                activity.record(
                    &agent.name,
                    ActivityKind::TaskResponse,
                    format!("Completed task for capability {capability}"),
                    Some(json!({"taskId": task_id})),
                );
                info!(task_id = %task_id, agent_name = %agent.name, "Task completed");
            }
            Err(e) => {
                let message = e.to_string();
                store.update(&task_id, |task| {
                    task.status = TaskStatus::Failed;
                    task.result = Some(json!({
                        "error": format!("Failed to reach agent {}", agent.name),
                        "details": message,
                    }));
                    task.updated_at = Utc::now();
                });
                metrics().task_failed();
                activity.record(
                    &agent.name,
                    ActivityKind::TaskError,
                    format!("Failed task for capability {capability}"),
                    Some(json!({"taskId": task_id, "error": message})),
                );
                warn!(task_id = %task_id, agent_name = %agent.name, error = %message, "Task failed");
            }
        }
    }
}
