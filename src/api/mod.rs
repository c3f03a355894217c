//! Bridge HTTP API
//!
//! One warp server exposing the router surface (`/task`, `/pipeline`), the
//! agent registry (`/agents`), and the operational endpoints (`/health`,
//! `/metrics`). All responses are JSON; CORS is permissive.

pub mod agents;
pub mod router;

use crate::error::BridgeError;
use crate::observability::metrics;
use crate::registry::{ActivityLog, AgentDirectory, AgentPersistence};
use crate::routing::{PipelineOrchestrator, TaskDispatcher};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use tracing::info;
use warp::http::StatusCode;
use warp::Filter;

/// Error body returned for every failed request
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Health probe body
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: DateTime<Utc>,
}

/// JSON reply with an explicit status code
pub(crate) fn json_reply<T: Serialize>(
    body: &T,
    status: StatusCode,
) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(body), status)
}

/// JSON `{error}` reply with the error's mapped status code
pub(crate) fn error_reply(error: &BridgeError) -> warp::reply::WithStatus<warp::reply::Json> {
    json_reply(
        &ErrorResponse {
            error: error.to_string(),
        },
        error.http_status(),
    )
}

/// The bridge HTTP server and its collaborators
pub struct ApiServer {
    dispatcher: TaskDispatcher,
    orchestrator: PipelineOrchestrator,
    directory: AgentDirectory,
    activity: ActivityLog,
    persistence: Option<AgentPersistence>,
}

impl ApiServer {
    /// Create a server over the routing and registry components
    pub fn new(
        dispatcher: TaskDispatcher,
        orchestrator: PipelineOrchestrator,
        directory: AgentDirectory,
        activity: ActivityLog,
        persistence: Option<AgentPersistence>,
    ) -> Self {
        Self {
            dispatcher,
            orchestrator,
            directory,
            activity,
            persistence,
        }
    }

    /// The complete route tree, usable directly with `warp::test`
    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let health = warp::path!("health").and(warp::get()).and_then(|| async {
            let response = HealthResponse {
                status: "ok".to_string(),
                timestamp: Utc::now(),
            };
            Ok::<_, Infallible>(warp::reply::json(&response))
        });

        let metrics_route = warp::path!("metrics").and(warp::get()).and_then(|| async {
            Ok::<_, Infallible>(warp::reply::json(&metrics().get_metrics()))
        });

        router::routes(self.dispatcher.clone(), self.orchestrator.clone())
            .or(agents::routes(
                self.directory.clone(),
                self.activity.clone(),
                self.persistence.clone(),
            ))
            .or(health)
            .or(metrics_route)
            .with(
                warp::cors()
                    .allow_any_origin()
                    .allow_methods(vec!["GET", "POST", "DELETE"])
                    .allow_headers(vec!["content-type"]),
            )
    }

    /// Serve until the process is killed
    pub async fn run(self, addr: impl Into<SocketAddr> + 'static) {
        let routes = self.routes();
        warp::serve(routes).run(addr).await;
    }

    /// Serve until the shutdown future resolves, then drain gracefully
    pub async fn run_with_shutdown(
        self,
        addr: impl Into<SocketAddr> + 'static,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) {
        let routes = self.routes();
        let (bound, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, shutdown);
        info!(address = %bound, "Bridge API listening");
        server.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AgentRecord;
    use crate::routing::{PipelineStore, TaskInvoker, TaskStore};
    use crate::testing::MockInvoker;
    use std::sync::Arc;

    fn test_server() -> ApiServer {
        let directory = AgentDirectory::new();
        let activity = ActivityLog::new();
        let invoker: Arc<dyn TaskInvoker> = Arc::new(MockInvoker::new());
        ApiServer::new(
            TaskDispatcher::new(
                directory.clone(),
                activity.clone(),
                TaskStore::new(),
                Arc::clone(&invoker),
            ),
            PipelineOrchestrator::new(
                directory.clone(),
                activity.clone(),
                PipelineStore::new(),
                invoker,
            ),
            directory,
            activity,
            None,
        )
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = test_server();
        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&server.routes())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["status"], "ok");
        assert!(body.get("timestamp").is_some());
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let server = test_server();
        let response = warp::test::request()
            .method("GET")
            .path("/metrics")
            .reply(&server.routes())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert!(body.get("tasks").is_some());
        assert!(body.get("uptime_seconds").is_some());
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let server = test_server();
        let response = warp::test::request()
            .method("GET")
            .path("/nonsense")
            .reply(&server.routes())
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_agents_listing_round_trip() {
        let server = test_server();
        server.directory.register(AgentRecord::new(
            "worker",
            "Worker",
            "A live worker",
            vec!["cap".to_string()],
            "http://localhost:4001/a2a",
        ));

        let response = warp::test::request()
            .method("GET")
            .path("/agents")
            .reply(&server.routes())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "worker");
    }
}
