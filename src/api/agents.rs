//! Agent registry HTTP routes
//!
//! Registration, listing, capability search, heartbeats, deletion, and
//! per-agent activity logs. Mutations persist the non-simulated directory
//! when persistence is configured.

use crate::api::{error_reply, json_reply};
use crate::error::BridgeError;
use crate::observability::metrics;
use crate::registry::{
    ActivityKind, ActivityLog, AgentDirectory, AgentPersistence, AgentRecord, AgentStatus,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use tracing::warn;
use warp::http::StatusCode;
use warp::Filter;

/// Registration request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    capabilities: Vec<String>,
    #[serde(default)]
    endpoint: String,
    status: Option<AgentStatus>,
    framework: Option<String>,
    provider: Option<String>,
    version: Option<String>,
}

/// Heartbeat request body
#[derive(Debug, Deserialize)]
struct HeartbeatRequest {
    status: Option<AgentStatus>,
}

/// Build the `/agents` routes. Search is matched before the name routes so
/// `/agents/search` is never swallowed by the `{name}` segment.
pub fn routes(
    directory: AgentDirectory,
    activity: ActivityLog,
    persistence: Option<AgentPersistence>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register = {
        let directory = directory.clone();
        let activity = activity.clone();
        let persistence = persistence.clone();
        warp::path!("agents" / "register")
            .and(warp::post())
            .and(warp::body::json())
            .and_then(move |request: RegisterRequest| {
                let directory = directory.clone();
                let activity = activity.clone();
                let persistence = persistence.clone();
                async move {
                    if request.name.trim().is_empty() {
                        let error = BridgeError::validation("Agent name is required");
                        return Ok::<_, Infallible>(error_reply(&error));
                    }

                    let record = AgentRecord {
                        name: request.name,
                        role: request.role,
                        description: request.description,
                        capabilities: request.capabilities,
                        endpoint: request.endpoint,
                        status: request.status.unwrap_or(AgentStatus::Active),
                        last_heartbeat: Utc::now(),
                        framework: request.framework,
                        provider: request.provider,
                        version: request.version,
                    };
                    let stored = directory.register(record);
                    metrics().agent_registered();
                    activity.record(
                        &stored.name,
                        ActivityKind::Register,
                        "Agent registered",
                        Some(json!({"endpoint": stored.endpoint})),
                    );
                    persist_directory(&persistence, &directory);

                    Ok::<_, Infallible>(json_reply(&stored, StatusCode::CREATED))
                }
            })
    };

    let search = {
        let directory = directory.clone();
        warp::path!("agents" / "search")
            .and(warp::get())
            .and(warp::query::<HashMap<String, String>>())
            .and_then(move |query: HashMap<String, String>| {
                let directory = directory.clone();
                async move {
                    match query.get("capability") {
                        Some(fragment) => Ok::<_, Infallible>(json_reply(
                            &directory.search_by_capability(fragment),
                            StatusCode::OK,
                        )),
                        None => {
                            let error = BridgeError::validation(
                                "Capability query parameter is required",
                            );
                            Ok::<_, Infallible>(error_reply(&error))
                        }
                    }
                }
            })
    };

    let list = {
        let directory = directory.clone();
        warp::path!("agents").and(warp::get()).and_then(move || {
            let directory = directory.clone();
            async move {
                Ok::<_, Infallible>(json_reply(&directory.list_agents(), StatusCode::OK))
            }
        })
    };

    let logs = {
        let activity = activity.clone();
        warp::path!("agents" / String / "logs")
            .and(warp::get())
            .and_then(move |name: String| {
                let activity = activity.clone();
                async move {
                    Ok::<_, Infallible>(json_reply(&activity.entries_for(&name), StatusCode::OK))
                }
            })
    };

    let heartbeat = {
        let directory = directory.clone();
        let activity = activity.clone();
        let persistence = persistence.clone();
        warp::path!("agents" / String / "heartbeat")
            .and(warp::post())
            .and(warp::body::json())
            .and_then(move |name: String, request: HeartbeatRequest| {
                let directory = directory.clone();
                let activity = activity.clone();
                let persistence = persistence.clone();
                async move {
                    match directory.heartbeat(&name, request.status) {
                        Some(last_heartbeat) => {
                            metrics().heartbeat_received();
                            activity.record(
                                &name,
                                ActivityKind::Heartbeat,
                                "Heartbeat received",
                                None,
                            );
                            persist_directory(&persistence, &directory);
                            Ok::<_, Infallible>(json_reply(
                                &json!({"status": "updated", "lastHeartbeat": last_heartbeat}),
                                StatusCode::OK,
                            ))
                        }
                        None => {
                            let error = BridgeError::not_found("Agent");
                            Ok::<_, Infallible>(error_reply(&error))
                        }
                    }
                }
            })
    };

    let get = {
        let directory = directory.clone();
        warp::path!("agents" / String)
            .and(warp::get())
            .and_then(move |name: String| {
                let directory = directory.clone();
                async move {
                    match directory.find_agent_by_name(&name) {
                        Some(agent) => Ok::<_, Infallible>(json_reply(&agent, StatusCode::OK)),
                        None => {
                            let error = BridgeError::not_found("Agent");
                            Ok::<_, Infallible>(error_reply(&error))
                        }
                    }
                }
            })
    };

    let delete = {
        let directory = directory.clone();
        let activity = activity.clone();
        let persistence = persistence.clone();
        warp::path!("agents" / String)
            .and(warp::delete())
            .and_then(move |name: String| {
                let directory = directory.clone();
                let activity = activity.clone();
                let persistence = persistence.clone();
                async move {
                    match directory.remove(&name) {
                        Some(_) => {
                            metrics().agent_deleted();
                            activity.record(
                                &name,
                                ActivityKind::Delete,
                                "Agent deleted",
                                None,
                            );
                            persist_directory(&persistence, &directory);
                            Ok::<_, Infallible>(json_reply(
                                &json!({"status": "deleted"}),
                                StatusCode::OK,
                            ))
                        }
                        None => {
                            let error = BridgeError::not_found("Agent");
                            Ok::<_, Infallible>(error_reply(&error))
                        }
                    }
                }
            })
    };

    register
        .or(search)
        .or(list)
        .or(logs)
        .or(heartbeat)
        .or(get)
        .or(delete)
}

/// Write the directory to disk when persistence is configured; failures are
/// logged and swallowed
fn persist_directory(persistence: &Option<AgentPersistence>, directory: &AgentDirectory) {
    if let Some(persistence) = persistence {
        if let Err(e) = persistence.save(&directory.list_agents()) {
            warn!(error = %e, "Failed to persist agent directory");
        }
    }
}
