//! Mock implementations for testing
//!
//! Provides a scriptable TaskInvoker so dispatch and pipeline behavior can be
//! tested without running agent HTTP servers.

use crate::registry::AgentRecord;
use crate::routing::invoker::{InvocationError, TaskInvoker};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded call to the mock invoker
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedInvocation {
    pub agent_name: String,
    pub endpoint: String,
    pub capability: String,
    pub payload: Value,
}

/// Scriptable invoker recording every call.
///
/// Responses are scripted per capability; invoking an unscripted capability
/// fails loudly so tests cannot silently pass on a missing script.
#[derive(Debug, Default)]
pub struct MockInvoker {
    responses: Mutex<HashMap<String, Result<Value, String>>>,
    invocations: Arc<Mutex<Vec<RecordedInvocation>>>,
    delay: Option<Duration>,
}

impl MockInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful result for a capability
    pub fn with_response<S: Into<String>>(self, capability: S, result: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(capability.into(), Ok(result));
        self
    }

    /// Script a failure for a capability
    pub fn with_error<S: Into<String>>(self, capability: S, message: S) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(capability.into(), Err(message.into()));
        self
    }

    /// Delay every invocation, for exercising in-flight states
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All calls made so far, in order
    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Handle to the shared call log, usable after the invoker moves into
    /// an `Arc<dyn TaskInvoker>`
    pub fn invocation_log(&self) -> Arc<Mutex<Vec<RecordedInvocation>>> {
        Arc::clone(&self.invocations)
    }
}

#[async_trait]
impl TaskInvoker for MockInvoker {
    async fn invoke(
        &self,
        agent: &AgentRecord,
        capability: &str,
        payload: Value,
    ) -> Result<Value, InvocationError> {
        self.invocations.lock().unwrap().push(RecordedInvocation {
            agent_name: agent.name.clone(),
            endpoint: agent.endpoint.clone(),
            capability: capability.to_string(),
            payload,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.lock().unwrap().get(capability).cloned();
        match scripted {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(InvocationError::Network(message)),
            None => Err(InvocationError::Network(format!(
                "no scripted response for capability {capability}"
            ))),
        }
    }
}
