//! Shared worker-agent harness
//!
//! Owns everything the skill binaries have in common: the warp task
//! endpoint, the in-memory task table, and the register-then-heartbeat
//! lifecycle against the bridge. A skill only supplies its card metadata
//! and an `execute` function.

use crate::config::WorkerSection;
use crate::error::{BridgeError, BridgeResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::Filter;

/// Errors a skill can raise while handling a task. Both map to a 400 reply.
#[derive(Debug, Error)]
pub enum SkillError {
    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(String),
    #[error("{0}")]
    InvalidPayload(String),
}

/// One worker capability bundle: card metadata plus the task handler
pub trait AgentSkill: Send + Sync + 'static {
    /// Agent name advertised to the bridge
    fn name(&self) -> &str;
    /// Role line shown in the directory
    fn role(&self) -> &str;
    fn description(&self) -> &str;
    fn capabilities(&self) -> Vec<String>;
    /// Run one capability against a task payload
    fn execute(&self, capability: &str, payload: &Value) -> Result<Value, SkillError>;
}

/// HTTP server and bridge lifecycle around one skill
pub struct WorkerAgent {
    skill: Arc<dyn AgentSkill>,
    port: u16,
    advertise_host: String,
    bridge_url: String,
    heartbeat_interval: Duration,
    client: reqwest::Client,
    tasks: Arc<RwLock<HashMap<Uuid, WorkerTask>>>,
}

impl WorkerAgent {
    /// Create a worker serving `skill` on `port`, wired to the bridge from
    /// the worker config section
    pub fn new(skill: Arc<dyn AgentSkill>, port: u16, worker: &WorkerSection) -> BridgeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BridgeError::invocation(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            skill,
            port,
            advertise_host: worker.advertise_host.clone(),
            bridge_url: worker.bridge_url.trim_end_matches('/').to_string(),
            heartbeat_interval: Duration::from_secs(worker.heartbeat_interval_secs),
            client,
            tasks: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Endpoint base advertised in the agent card
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/a2a", self.advertise_host, self.port)
    }

    fn agent_card(&self) -> AgentCard {
        AgentCard {
            name: self.skill.name().to_string(),
            role: self.skill.role().to_string(),
            description: self.skill.description().to_string(),
            capabilities: self.skill.capabilities(),
            endpoint: self.endpoint(),
            status: "active".to_string(),
            framework: "Warp".to_string(),
            provider: "Local".to_string(),
        }
    }

    /// Push the agent card to the bridge once. Returns whether the bridge
    /// accepted it.
    pub async fn register_with_bridge(&self) -> bool {
        Self::register(&self.client, &self.bridge_url, &self.agent_card()).await
    }

    async fn register(client: &reqwest::Client, bridge_url: &str, card: &AgentCard) -> bool {
        let url = format!("{bridge_url}/agents/register");
        match client.post(&url).json(card).send().await {
            Ok(response) if response.status().is_success() => {
                info!(agent = %card.name, bridge = %bridge_url, "Registered with bridge");
                true
            }
            Ok(response) => {
                warn!(
                    agent = %card.name,
                    status = %response.status(),
                    "Bridge rejected registration"
                );
                false
            }
            Err(e) => {
                error!(agent = %card.name, error = %e, "Registration failed");
                false
            }
        }
    }

    /// Spawn the heartbeat loop. A failed heartbeat triggers re-registration
    /// so a restarted bridge picks the worker back up.
    fn spawn_heartbeat_task(
        client: reqwest::Client,
        bridge_url: String,
        card: AgentCard,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // First tick completes immediately, skip it

            loop {
                ticker.tick().await;

                let url = format!("{}/agents/{}/heartbeat", bridge_url, card.name);
                let beat = client
                    .post(&url)
                    .json(&json!({"status": "active"}))
                    .send()
                    .await;

                let accepted = matches!(&beat, Ok(response) if response.status().is_success());
                if !accepted {
                    warn!(agent = %card.name, "Heartbeat failed, attempting re-registration");
                    Self::register(&client, &bridge_url, &card).await;
                }
            }
        })
    }

    /// The worker route tree: `POST /a2a/task` and `GET /a2a/task/{id}`
    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let skill = Arc::clone(&self.skill);
        let submit_store = Arc::clone(&self.tasks);
        let submit = warp::path!("a2a" / "task")
            .and(warp::post())
            .and(warp::body::json())
            .and_then(move |body: Value| {
                let skill = Arc::clone(&skill);
                let tasks = Arc::clone(&submit_store);
                async move {
                    let capability = body
                        .get("capability")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    let payload = body.get("payload").cloned().unwrap_or_else(|| json!({}));

                    let reply = match skill.execute(capability, &payload) {
                        Ok(result) => {
                            let task = WorkerTask::completed(result);
                            tasks.write().unwrap().insert(task.id, task.clone());
                            warp::reply::with_status(warp::reply::json(&task), StatusCode::OK)
                        }
                        Err(e) => warp::reply::with_status(
                            warp::reply::json(&json!({"error": e.to_string()})),
                            StatusCode::BAD_REQUEST,
                        ),
                    };
                    Ok::<_, Infallible>(reply)
                }
            });

        let fetch_store = Arc::clone(&self.tasks);
        let fetch = warp::path!("a2a" / "task" / Uuid)
            .and(warp::get())
            .and_then(move |id: Uuid| {
                let tasks = Arc::clone(&fetch_store);
                async move {
                    let reply = match tasks.read().unwrap().get(&id) {
                        Some(task) => {
                            warp::reply::with_status(warp::reply::json(task), StatusCode::OK)
                        }
                        None => warp::reply::with_status(
                            warp::reply::json(&json!({"error": "Task not found"})),
                            StatusCode::NOT_FOUND,
                        ),
                    };
                    Ok::<_, Infallible>(reply)
                }
            });

        submit.or(fetch).with(
            warp::cors()
                .allow_any_origin()
                .allow_methods(vec!["GET", "POST"])
                .allow_headers(vec!["content-type"]),
        )
    }

    /// Serve the skill, register with the bridge, and keep heartbeating
    pub async fn run(self) {
        let routes = self.routes();
        let card = self.agent_card();

        info!(agent = %card.name, port = self.port, "Worker agent starting");

        Self::register(&self.client, &self.bridge_url, &card).await;
        Self::spawn_heartbeat_task(
            self.client.clone(),
            self.bridge_url.clone(),
            card,
            self.heartbeat_interval,
        );

        warp::serve(routes).run(([0, 0, 0, 0], self.port)).await;
    }
}

/// Wire shape of a completed worker task
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkerTask {
    id: Uuid,
    status: String,
    result: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WorkerTask {
    fn completed(result: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: "completed".to_string(),
            result,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Registration body posted to the bridge
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentCard {
    name: String,
    role: String,
    description: String,
    capabilities: Vec<String>,
    endpoint: String,
    status: String,
    framework: String,
    provider: String,
}
