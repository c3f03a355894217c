//! HTTP task invocation
//!
//! This module forwards tasks to agent endpoints over HTTP. The transport is
//! behind the [`TaskInvoker`] trait so dispatch and pipeline logic can be
//! exercised against scripted invokers in tests.

use crate::observability::metrics;
use crate::registry::AgentRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Errors from invoking an agent endpoint
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("Agent request failed: {0}")]
    Network(String),

    #[error("Agent request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Agent returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Malformed agent response: {0}")]
    MalformedResponse(String),
}

/// Transport for forwarding a task to an agent
#[async_trait]
pub trait TaskInvoker: Send + Sync {
    /// Send a task to the agent's endpoint and return its result value
    async fn invoke(
        &self,
        agent: &AgentRecord,
        capability: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, InvocationError>;
}

/// HTTP invoker posting tasks to `{endpoint}/task`
pub struct HttpTaskInvoker {
    client: Client,
    timeout: Duration,
}

impl HttpTaskInvoker {
    /// Create an invoker with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, InvocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InvocationError::Network(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Task URL for an agent endpoint base
    fn task_url(endpoint: &str) -> String {
        format!("{}/task", endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl TaskInvoker for HttpTaskInvoker {
    async fn invoke(
        &self,
        agent: &AgentRecord,
        capability: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, InvocationError> {
        let url = Self::task_url(&agent.endpoint);
        let request = InvokeTaskRequest {
            capability: capability.to_string(),
            payload,
        };

        metrics().invocation_attempted();
        let start = Instant::now();
        debug!(agent_name = %agent.name, url = %url, capability = %capability, "Forwarding task to agent");

        let response = match self.client.post(&url).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics().invocation_failed(start.elapsed());
                warn!(agent_name = %agent.name, url = %url, error = %e, "Agent request failed");
                return Err(if e.is_timeout() {
                    InvocationError::Timeout(self.timeout)
                } else {
                    InvocationError::Network(e.to_string())
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            metrics().invocation_failed(start.elapsed());
            let body = response.text().await.unwrap_or_default();
            warn!(agent_name = %agent.name, status = %status, "Agent rejected task");
            return Err(InvocationError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let task_response: InvokeTaskResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                metrics().invocation_failed(start.elapsed());
                return Err(InvocationError::MalformedResponse(e.to_string()));
            }
        };

        match task_response.result {
            Some(result) => {
                metrics().invocation_succeeded(start.elapsed());
                Ok(result)
            }
            None => {
                metrics().invocation_failed(start.elapsed());
                Err(InvocationError::MalformedResponse(
                    "response body has no result field".to_string(),
                ))
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct InvokeTaskRequest {
    capability: String,
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct InvokeTaskResponse {
    result: Option<serde_json::Value>,
}
