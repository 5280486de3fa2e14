use crate::commands::{build_policy, shutdown_on_ctrl_c, ServeArgs, WorkflowArgs};
use crate::output::{info, success};
use crate::Cli;
use anyhow::Result;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use vreplag_client::VtAdminClient;
use vreplag_core::current_timestamp_ms;
use vreplag_metrics::{MetricsServer, StreamLagTracker};

/// Fetch the workflow once and fold every stream into the tracker. Streams
/// the workflow no longer lists are forgotten; a failed fetch keeps them.
async fn poll_workflow(client: &VtAdminClient, target: &WorkflowArgs, tracker: &StreamLagTracker) {
    let started = Instant::now();
    let result = client
        .fetch_workflow(&target.cluster, &target.keyspace, &target.workflow)
        .await;
    tracker.observe_poll_duration(started.elapsed().as_secs_f64());

    match result {
        Ok(workflow) => {
            let appended = tracker.record_workflow(&workflow, current_timestamp_ms());
            debug!(workflow = %target.workflow, appended, "polled workflow");
        }
        Err(e) => {
            warn!(
                workflow = %target.workflow,
                error_type = e.error_type(),
                "workflow poll failed: {}",
                e
            );
            tracker.record_error(e.error_type());
        }
    }
}

pub async fn execute(args: &ServeArgs, cli: &Cli) -> Result<()> {
    let policy = build_policy(args.policy, args.window)?;
    let client = cli.client()?;
    let target = &args.target;
    let tracker = StreamLagTracker::new(target.workflow.clone(), policy);

    let mut shutdown = shutdown_on_ctrl_c();
    let mut server_shutdown = shutdown.clone();
    let server = MetricsServer::new(args.addr, tracker.clone()).with_cors(args.cors);
    let mut server_task = tokio::spawn(server.start_with_shutdown(async move {
        let _ = server_shutdown.wait_for(|stop| *stop).await;
    }));

    info(&format!(
        "Serving lag for {}/{} on http://{}",
        target.keyspace, target.workflow, args.addr
    ));
    println!("   GET  /metrics            - Prometheus metrics");
    println!("   GET  /health             - Health check");
    println!("   GET  /streams            - Tracked streams and latest lag");
    println!("   GET  /streams/{{key}}/lag  - Lag series (?span_ms=)");

    let mut ticker = tokio::time::interval(Duration::from_millis(args.interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => poll_workflow(&client, target, &tracker).await,
            _ = shutdown.changed() => break,
            result = &mut server_task => {
                return match result? {
                    Ok(()) => Ok(()),
                    Err(e) => Err(anyhow::anyhow!("Metrics server failed: {}", e)),
                };
            }
        }
    }

    if let Err(e) = server_task.await? {
        return Err(anyhow::anyhow!("Metrics server failed: {}", e));
    }
    success("Server shut down");
    Ok(())
}
