//! Task and pipeline HTTP routes
//!
//! The router surface: dispatch a task, start a pipeline, poll either by id.
//! Dispatch and start return 202 with the `processing`/`running` snapshot.

use crate::api::{error_reply, json_reply};
use crate::routing::{PipelineOrchestrator, PipelineStep, TaskDispatcher};
use serde_json::json;
use std::convert::Infallible;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::Filter;

/// Build the `/task`, `/tasks`, `/pipeline`, `/pipelines` routes
pub fn routes(
    dispatcher: TaskDispatcher,
    orchestrator: PipelineOrchestrator,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let dispatch = {
        let dispatcher = dispatcher.clone();
        warp::path!("task")
            .and(warp::post())
            .and(warp::body::json())
            .and_then(move |body: serde_json::Value| {
                let dispatcher = dispatcher.clone();
                async move {
                    let capability = body
                        .get("capability")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    let payload = body.get("payload").cloned().unwrap_or_else(|| json!({}));
                    let target_agent = body.get("targetAgent").and_then(|v| v.as_str());

                    match dispatcher.dispatch(capability, payload, target_agent) {
                        Ok(task) => {
                            Ok::<_, Infallible>(json_reply(&task, StatusCode::ACCEPTED))
                        }
                        Err(e) => Ok::<_, Infallible>(error_reply(&e)),
                    }
                }
            })
    };

    let get_task = {
        let dispatcher = dispatcher.clone();
        warp::path!("task" / Uuid)
            .and(warp::get())
            .and_then(move |id: Uuid| {
                let dispatcher = dispatcher.clone();
                async move {
                    match dispatcher.get_task(&id) {
                        Ok(task) => Ok::<_, Infallible>(json_reply(&task, StatusCode::OK)),
                        Err(e) => Ok::<_, Infallible>(error_reply(&e)),
                    }
                }
            })
    };

    let list_tasks = {
        let dispatcher = dispatcher.clone();
        warp::path!("tasks").and(warp::get()).and_then(move || {
            let dispatcher = dispatcher.clone();
            async move {
                Ok::<_, Infallible>(json_reply(&dispatcher.list_tasks(), StatusCode::OK))
            }
        })
    };

    let start_pipeline = {
        let orchestrator = orchestrator.clone();
        warp::path!("pipeline")
            .and(warp::post())
            .and(warp::body::json())
            .and_then(move |body: serde_json::Value| {
                let orchestrator = orchestrator.clone();
                async move {
                    let steps = match parse_steps(&body) {
                        Ok(steps) => steps,
                        Err(e) => return Ok::<_, Infallible>(error_reply(&e)),
                    };
                    let input = body.get("input").cloned().unwrap_or_else(|| json!({}));

                    match orchestrator.start(steps, input) {
                        Ok(pipeline) => {
                            Ok::<_, Infallible>(json_reply(&pipeline, StatusCode::ACCEPTED))
                        }
                        Err(e) => Ok::<_, Infallible>(error_reply(&e)),
                    }
                }
            })
    };

    let get_pipeline = {
        let orchestrator = orchestrator.clone();
        warp::path!("pipeline" / Uuid)
            .and(warp::get())
            .and_then(move |id: Uuid| {
                let orchestrator = orchestrator.clone();
                async move {
                    match orchestrator.get_pipeline(&id) {
                        Ok(pipeline) => Ok::<_, Infallible>(json_reply(&pipeline, StatusCode::OK)),
                        Err(e) => Ok::<_, Infallible>(error_reply(&e)),
                    }
                }
            })
    };

    let list_pipelines = {
        let orchestrator = orchestrator.clone();
        warp::path!("pipelines").and(warp::get()).and_then(move || {
            let orchestrator = orchestrator.clone();
            async move {
                Ok::<_, Infallible>(json_reply(
                    &orchestrator.list_pipelines(),
                    StatusCode::OK,
                ))
            }
        })
    };

    dispatch
        .or(get_task)
        .or(list_tasks)
        .or(start_pipeline)
        .or(get_pipeline)
        .or(list_pipelines)
}

/// Extract the declared steps from a pipeline request body
fn parse_steps(body: &serde_json::Value) -> crate::error::BridgeResult<Vec<PipelineStep>> {
    use crate::error::BridgeError;

    let steps = match body.get("steps").and_then(|v| v.as_array()) {
        Some(steps) if !steps.is_empty() => steps,
        _ => return Err(BridgeError::validation("steps must be a non-empty array")),
    };

    steps
        .iter()
        .cloned()
        .map(serde_json::from_value)
        .collect::<Result<Vec<PipelineStep>, _>>()
        .map_err(|_| BridgeError::validation("each step requires a capability"))
}
