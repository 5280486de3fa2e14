//! HTTP metrics and lag server

use crate::lag_tracker::{StreamLagTracker, StreamSummary};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use vreplag_core::{current_timestamp_ms, ChartPoint};
use vreplag_types::StreamKey;

#[derive(Debug, Serialize, Deserialize)]
pub struct StreamsResponse {
    pub workflow: String,
    pub streams: Vec<StreamSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreamLagResponse {
    pub stream: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_ms: Option<i64>,
    pub data: Vec<ChartPoint>,
}

#[derive(Debug, Deserialize)]
struct LagQuery {
    span_ms: Option<i64>,
}

/// HTTP metrics server
pub struct MetricsServer {
    addr: SocketAddr,
    tracker: StreamLagTracker,
    cors: bool,
}

impl MetricsServer {
    /// Create a new metrics server
    pub fn new(addr: SocketAddr, tracker: StreamLagTracker) -> Self {
        Self {
            addr,
            tracker,
            cors: false,
        }
    }

    /// Allow any origin, for browser dashboards
    pub fn with_cors(mut self, cors: bool) -> Self {
        self.cors = cors;
        self
    }

    pub fn router(&self) -> Router {
        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .route("/streams", get(streams_handler))
            .route("/streams/:key/lag", get(stream_lag_handler))
            .with_state(self.tracker.clone());

        if self.cors {
            app.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            app
        }
    }

    /// Start the metrics server
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Start the metrics server, stopping once `signal` resolves
    pub async fn start_with_shutdown<F>(
        self,
        signal: F,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();

        info!(
            "Starting metrics server on {} for workflow {}",
            self.addr,
            self.tracker.workflow()
        );

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(signal)
            .await?;

        info!("Metrics server on {} stopped", self.addr);
        Ok(())
    }
}

/// Metrics endpoint handler
async fn metrics_handler() -> Response {
    match crate::exporter::export_metrics() {
        Ok(metrics) => (StatusCode::OK, metrics).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error exporting metrics: {}", e),
        )
            .into_response(),
    }
}

/// Health check endpoint
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn streams_handler(State(tracker): State<StreamLagTracker>) -> Json<StreamsResponse> {
    Json(StreamsResponse {
        workflow: tracker.workflow().to_string(),
        streams: tracker.summaries(),
    })
}

async fn stream_lag_handler(
    State(tracker): State<StreamLagTracker>,
    Path(key): Path<String>,
    Query(query): Query<LagQuery>,
) -> Response {
    if let Err(e) = key.parse::<StreamKey>() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response();
    }

    match tracker.series(&key, query.span_ms, current_timestamp_ms()) {
        Some(data) => Json(StreamLagResponse {
            stream: key,
            span_ms: query.span_ms,
            data,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("stream {} is not tracked", key) })),
        )
            .into_response(),
    }
}
