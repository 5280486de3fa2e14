//! Client and poller against a stub vtadmin-api served over real HTTP.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use vreplag_client::{
    ClientConfig, ClientError, PollEvent, PollerConfig, StreamWatcher, VtAdminClient,
    WorkflowStreamSource,
};
use vreplag_core::ChartPolicy;
use vreplag_types::StreamKey;

#[derive(Clone, Default)]
struct Stub {
    /// time_updated of the `-80` stream, bumped by one on every fetch
    tick: Arc<AtomicI64>,
}

async fn workflow(
    State(stub): State<Stub>,
    Path((cluster, keyspace, name)): Path<(String, String, String)>,
) -> (StatusCode, Json<Value>) {
    if name != "commerce2customer" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "ok": false,
                "error": { "code": "not_found", "message": format!("no workflow {}", name) }
            })),
        );
    }

    let updated = 100 + stub.tick.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "result": {
                "cluster": { "id": cluster, "name": cluster },
                "keyspace": keyspace,
                "workflow": {
                    "name": name,
                    "shard_streams": {
                        "-80": {
                            "streams": [{
                                "id": 1,
                                "shard": "-80",
                                "tablet": { "cell": "zone1", "uid": 200 },
                                "time_updated": { "seconds": updated.to_string() },
                                "transaction_timestamp": { "seconds": 98 }
                            }]
                        }
                    }
                }
            }
        })),
    )
}

async fn debug_vars() -> Json<Value> {
    Json(json!({
        "ok": true,
        "result": {
            "BuildGitBranch": "main",
            "QPS": { "All": [1.0, 2.5] },
            "VReplicationQPS": { "All": [3.0], "1": [3.0] }
        }
    }))
}

async fn not_an_envelope() -> Json<Value> {
    Json(json!({ "result": {} }))
}

async fn spawn_stub() -> SocketAddr {
    let app = Router::new()
        .route("/api/workflow/:cluster/:keyspace/:name", get(workflow))
        .route(
            "/api/experimental/tablet/:alias/debug/vars",
            get(debug_vars),
        )
        .route("/api/workflows", get(not_an_envelope))
        .with_state(Stub::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> VtAdminClient {
    let config = ClientConfig {
        base_url: format!("http://{}", addr),
        ..ClientConfig::test_config()
    };
    VtAdminClient::new(config).unwrap()
}

#[tokio::test]
async fn test_fetch_workflow_and_stream() {
    let client = client(spawn_stub().await);

    let wf = client
        .fetch_workflow("local", "customer", "commerce2customer")
        .await
        .unwrap();
    assert_eq!(wf.cluster_id(), Some("local"));
    assert_eq!(wf.streams().len(), 1);

    let stream = client
        .fetch_stream("local", "customer", "commerce2customer", &"-80-1".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(stream.lag_seconds(), Some(3));
}

#[tokio::test]
async fn test_missing_stream_and_not_ok() {
    let client = client(spawn_stub().await);

    let err = client
        .fetch_stream("local", "customer", "commerce2customer", &StreamKey::new("80-", 9))
        .await
        .unwrap_err();
    assert_eq!(err.error_type(), "stream_not_found");

    let err = client
        .fetch_workflow("local", "customer", "nope")
        .await
        .unwrap_err();
    match err {
        ClientError::NotOk { status, code, .. } => {
            assert_eq!(status, 404);
            assert_eq!(code, "not_found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_malformed_envelope() {
    let client = client(spawn_stub().await);
    let err = client.fetch::<Value>("/api/workflows").await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedEnvelope { .. }));
}

#[tokio::test]
async fn test_fetch_tablet_debug_vars() {
    let client = client(spawn_stub().await);
    let vars = client
        .fetch_tablet_debug_vars("local", "zone1-200")
        .await
        .unwrap();

    assert_eq!(vars.build_git_branch.as_deref(), Some("main"));
    assert_eq!(vars.qps.unwrap()["All"], vec![1.0, 2.5]);
}

#[tokio::test]
async fn test_unreachable_server_is_fetch_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let err = client(addr)
        .fetch_workflow("local", "customer", "commerce2customer")
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.error_type(), "fetch");
}

#[tokio::test]
async fn test_watcher_polls_over_http() {
    let client = client(spawn_stub().await);
    let source = WorkflowStreamSource::new(
        client,
        "local",
        "customer",
        "commerce2customer",
        "-80-1".parse().unwrap(),
    );
    let config = PollerConfig::new(ChartPolicy::sparkline())
        .with_interval(Duration::from_millis(5))
        .with_max_polls(Some(4));
    let mut watcher = StreamWatcher::new(source, config);

    let (_tx, rx) = watch::channel(false);
    let mut appended = 0;
    watcher
        .run(rx, |event| {
            if let PollEvent::Polled { appended: true, .. } = event {
                appended += 1;
            }
        })
        .await;

    assert_eq!(appended, 4);
    assert_eq!(
        watcher.history().lags(),
        vec![Some(2.0), Some(3.0), Some(4.0), Some(5.0)]
    );
}
