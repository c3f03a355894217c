//! Integration tests for the pipeline API
//!
//! Drives sequential multi-step execution over HTTP:
//! - Step ordering and result threading between agents
//! - Request validation and pre-validation of capabilities
//! - Step failure handling and pipeline lookup


use serde_json::{json, Value};
use taskbridge::testing::MockInvoker;
use test_helpers::{live_agent, test_bridge, wait_for_pipeline};
use uuid::Uuid;
use warp::http::StatusCode;

#[tokio::test]
async fn test_pipeline_runs_steps_in_order() {
    let bridge = test_bridge(
        MockInvoker::new()
            .with_response("summarize_text", json!({"summary": "condensed"}))
            .with_response("analyze_sentiment", json!({"sentiment": "positive", "score": 2})),
    );
    bridge
        .directory
        .register(live_agent("SummarizerAgent", &["summarize_text"], 4001));
    bridge
        .directory
        .register(live_agent("SentimentAgent", &["analyze_sentiment"], 4002));
    let routes = bridge.server.routes();

    let response = warp::test::request()
        .method("POST")
        .path("/pipeline")
        .json(&json!({
            "steps": [
                {"capability": "summarize_text"},
                {"capability": "analyze_sentiment"}
            ],
            "input": {"text": "a long report about the launch"}
        }))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let accepted: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(accepted["status"], "running");
    let id = accepted["id"].as_str().expect("pipeline id");

    let pipeline = wait_for_pipeline(&bridge, id).await;
    assert_eq!(pipeline["status"], "completed");

    let results = pipeline["results"].as_array().expect("step results");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["capability"], "summarize_text");
    assert_eq!(results[0]["agentName"], "SummarizerAgent");
    assert_eq!(results[0]["status"], "completed");
    assert!(results[0]["durationMs"].is_u64());
    assert_eq!(results[1]["capability"], "analyze_sentiment");
    assert_eq!(results[1]["agentName"], "SentimentAgent");

    assert_eq!(pipeline["finalResult"]["sentiment"], "positive");

    // The first agent saw the caller input, the second saw the first's result
    let calls = bridge.invoker.invocations();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].payload["text"], "a long report about the launch");
    assert_eq!(calls[1].payload["summary"], "condensed");
}

#[tokio::test]
async fn test_pipeline_missing_steps_is_400() {
    let bridge = test_bridge(MockInvoker::new());
    let routes = bridge.server.routes();

    let response = warp::test::request()
        .method("POST")
        .path("/pipeline")
        .json(&json!({"input": {"text": "hi"}}))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"], "steps must be a non-empty array");
}

#[tokio::test]
async fn test_pipeline_empty_steps_is_400() {
    let bridge = test_bridge(MockInvoker::new());
    let routes = bridge.server.routes();

    let response = warp::test::request()
        .method("POST")
        .path("/pipeline")
        .json(&json!({"steps": [], "input": {}}))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"], "steps must be a non-empty array");
}

#[tokio::test]
async fn test_pipeline_step_without_capability_is_400() {
    let bridge = test_bridge(MockInvoker::new());
    let routes = bridge.server.routes();

    let response = warp::test::request()
        .method("POST")
        .path("/pipeline")
        .json(&json!({"steps": [{"params": {"text": "hi"}}], "input": {}}))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"], "each step requires a capability");
}

#[tokio::test]
async fn test_pipeline_with_unsatisfiable_step_is_rejected_up_front() {
    let bridge = test_bridge(MockInvoker::new());
    bridge
        .directory
        .register(live_agent("SummarizerAgent", &["summarize_text"], 4001));
    let routes = bridge.server.routes();

    let response = warp::test::request()
        .method("POST")
        .path("/pipeline")
        .json(&json!({
            "steps": [
                {"capability": "summarize_text"},
                {"capability": "analyze_sentiment"}
            ],
            "input": {}
        }))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"], "No agent available for analyze_sentiment");

    // Rejected pipelines are never stored
    let response = warp::test::request()
        .method("GET")
        .path("/pipelines")
        .reply(&routes)
        .await;
    let pipelines: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(pipelines.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_pipeline_step_failure_fails_pipeline() {
    let bridge = test_bridge(
        MockInvoker::new()
            .with_response("summarize_text", json!({"summary": "condensed"}))
            .with_error("analyze_sentiment", "boom"),
    );
    bridge
        .directory
        .register(live_agent("SummarizerAgent", &["summarize_text"], 4001));
    bridge
        .directory
        .register(live_agent("SentimentAgent", &["analyze_sentiment"], 4002));
    let routes = bridge.server.routes();

    let response = warp::test::request()
        .method("POST")
        .path("/pipeline")
        .json(&json!({
            "steps": [
                {"capability": "summarize_text"},
                {"capability": "analyze_sentiment"}
            ],
            "input": {"text": "hi"}
        }))
        .reply(&routes)
        .await;
    let accepted: Value = serde_json::from_slice(response.body()).unwrap();
    let id = accepted["id"].as_str().expect("pipeline id");

    let pipeline = wait_for_pipeline(&bridge, id).await;
    assert_eq!(pipeline["status"], "failed");

    let results = pipeline["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["status"], "completed");
    assert_eq!(results[1]["status"], "failed");
    assert!(
        results[1]["error"].as_str().unwrap().contains("boom"),
        "step error should carry the transport failure: {pipeline}"
    );
    assert!(
        pipeline.get("finalResult").is_none(),
        "failed pipelines have no final result"
    );
}

#[tokio::test]
async fn test_step_params_override_threaded_input() {
    let bridge = test_bridge(
        MockInvoker::new().with_response("analyze_sentiment", json!({"sentiment": "neutral"})),
    );
    bridge
        .directory
        .register(live_agent("SentimentAgent", &["analyze_sentiment"], 4002));
    let routes = bridge.server.routes();

    let response = warp::test::request()
        .method("POST")
        .path("/pipeline")
        .json(&json!({
            "steps": [
                {"capability": "analyze_sentiment", "params": {"text": "override"}}
            ],
            "input": {"text": "original", "lang": "en"}
        }))
        .reply(&routes)
        .await;
    let accepted: Value = serde_json::from_slice(response.body()).unwrap();
    let id = accepted["id"].as_str().expect("pipeline id");

    wait_for_pipeline(&bridge, id).await;

    let calls = bridge.invoker.invocations();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].payload["text"], "override");
    assert_eq!(calls[0].payload["lang"], "en");
}

#[tokio::test]
async fn test_scalar_results_thread_as_text() {
    let bridge = test_bridge(
        MockInvoker::new()
            .with_response("summarize_text", json!("just a plain string"))
            .with_response("analyze_sentiment", json!({"sentiment": "neutral"})),
    );
    bridge
        .directory
        .register(live_agent("SummarizerAgent", &["summarize_text"], 4001));
    bridge
        .directory
        .register(live_agent("SentimentAgent", &["analyze_sentiment"], 4002));
    let routes = bridge.server.routes();

    let response = warp::test::request()
        .method("POST")
        .path("/pipeline")
        .json(&json!({
            "steps": [
                {"capability": "summarize_text"},
                {"capability": "analyze_sentiment"}
            ],
            "input": {"topic": "launch"}
        }))
        .reply(&routes)
        .await;
    let accepted: Value = serde_json::from_slice(response.body()).unwrap();
    let id = accepted["id"].as_str().expect("pipeline id");

    wait_for_pipeline(&bridge, id).await;

    let calls = bridge.invoker.invocations();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].payload["text"], "just a plain string");
    assert_eq!(calls[1].payload["topic"], "launch");
}

#[tokio::test]
async fn test_get_unknown_pipeline_is_404() {
    let bridge = test_bridge(MockInvoker::new());
    let routes = bridge.server.routes();

    let response = warp::test::request()
        .method("GET")
        .path(&format!("/pipeline/{}", Uuid::new_v4()))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"], "Pipeline not found");
}

#[tokio::test]
async fn test_list_pipelines_returns_started_pipelines() {
    let bridge = test_bridge(
        MockInvoker::new().with_response("summarize_text", json!({"summary": "s"})),
    );
    bridge
        .directory
        .register(live_agent("SummarizerAgent", &["summarize_text"], 4001));
    let routes = bridge.server.routes();

    let response = warp::test::request()
        .method("POST")
        .path("/pipeline")
        .json(&json!({"steps": [{"capability": "summarize_text"}], "input": {"text": "hi"}}))
        .reply(&routes)
        .await;
    let accepted: Value = serde_json::from_slice(response.body()).unwrap();
    let id = accepted["id"].as_str().expect("pipeline id");

    let response = warp::test::request()
        .method("GET")
        .path("/pipelines")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let pipelines: Value = serde_json::from_slice(response.body()).unwrap();
    let pipelines = pipelines.as_array().unwrap();
    assert_eq!(pipelines.len(), 1);
    assert_eq!(pipelines[0]["id"], id);
}
