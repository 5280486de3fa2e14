use crate::commands::{build_policy, shutdown_on_ctrl_c, WatchArgs};
use crate::output::{error, format_lag, format_timestamp, info, success, OutputDisplay};
use crate::{Cli, OutputFormat};
use anyhow::Result;
use serde::Serialize;
use std::time::Duration;
use tabled::Tabled;
use vreplag_client::{PollEvent, PollerConfig, StreamWatcher, WorkflowStreamSource};
use vreplag_core::{current_timestamp_ms, LagHistory, LagRow};

#[derive(Tabled, Serialize)]
struct LagRowDisplay {
    #[tabled(rename = "Updated at")]
    updated_at: String,
    #[tabled(rename = "Transaction ts")]
    transaction_timestamp: String,
    #[tabled(rename = "Replication lag")]
    replication_lag: String,
}

impl From<LagRow> for LagRowDisplay {
    fn from(row: LagRow) -> Self {
        Self {
            updated_at: format_timestamp(row.updated_at_seconds),
            transaction_timestamp: format_timestamp(row.transaction_at_seconds),
            replication_lag: format_lag(row.lag_seconds),
        }
    }
}

/// Rows newest first, restricted to the trailing span when one is set.
fn visible_rows(history: &LagHistory, span_ms: Option<i64>, now_millis: i64) -> Vec<LagRowDisplay> {
    let rows = match span_ms {
        Some(span) => history.window_for(span, now_millis).rows(),
        None => history.rows(),
    };
    rows.into_iter().map(LagRowDisplay::from).collect()
}

pub async fn execute(args: &WatchArgs, cli: &Cli) -> Result<()> {
    let policy = build_policy(args.policy, args.window)?;
    let config = PollerConfig::new(policy)
        .with_interval(Duration::from_millis(args.interval_ms))
        .with_max_polls(args.ticks);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid poller configuration: {}", e))?;

    let t = &args.target;
    let source = WorkflowStreamSource::new(
        cli.client()?,
        &t.cluster,
        &t.keyspace,
        &t.workflow,
        args.stream.clone(),
    );
    let mut watcher = StreamWatcher::new(source, config);

    if cli.format == OutputFormat::Table {
        info(&format!(
            "Watching stream {} of {}/{} every {}ms (Ctrl+C to stop)",
            args.stream, t.keyspace, t.workflow, args.interval_ms
        ));
    }

    let polls = watcher
        .run(shutdown_on_ctrl_c(), |event| match event {
            PollEvent::Polled { appended, history } => {
                if !appended {
                    return;
                }
                let rows = visible_rows(history, args.span_ms, current_timestamp_ms());
                if let Err(e) = rows.display(cli) {
                    error(&format!("Failed to render lag table: {}", e));
                }
            }
            PollEvent::Failed(e) => error(&format!("Poll failed: {}", e)),
        })
        .await;

    if cli.format == OutputFormat::Table {
        success(&format!("Stopped after {} poll(s)", polls));
    }
    Ok(())
}
