use crate::commands::WorkflowArgs;
use crate::output::{format_lag, format_timestamp, info, OutputDisplay};
use crate::Cli;
use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;
use vreplag_types::{Stream, Workflow};

#[derive(Tabled, Serialize)]
struct StreamRow {
    stream: String,
    state: String,
    source: String,
    tablet: String,
    updated_at: String,
    lag: String,
}

impl From<&Stream> for StreamRow {
    fn from(stream: &Stream) -> Self {
        Self {
            stream: stream
                .key()
                .map(|k| k.to_string())
                .unwrap_or_else(|| format!("{}-?", stream.shard)),
            state: stream.state.clone(),
            source: stream
                .binlog_source
                .as_ref()
                .map(|s| format!("{}/{}", s.keyspace, s.shard))
                .unwrap_or_else(|| "-".to_string()),
            tablet: stream
                .tablet
                .as_ref()
                .and_then(|t| t.format())
                .unwrap_or_else(|| "-".to_string()),
            updated_at: format_timestamp(stream.updated_at_seconds()),
            lag: format_lag(stream.lag_seconds().map(|l| l as f64)),
        }
    }
}

fn rows(workflow: &Workflow) -> Vec<StreamRow> {
    workflow.streams().into_iter().map(StreamRow::from).collect()
}

pub async fn execute(args: &WorkflowArgs, cli: &Cli) -> Result<()> {
    let client = cli.client()?;
    let workflow = client
        .fetch_workflow(&args.cluster, &args.keyspace, &args.workflow)
        .await?;

    if cli.format == crate::OutputFormat::Table {
        info(&format!(
            "{}/{} on {}: {} stream(s), last updated {}",
            args.keyspace,
            args.workflow,
            args.cluster,
            workflow.streams().len(),
            format_timestamp(workflow.time_updated())
        ));
    }

    rows(&workflow).display(cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows() {
        let workflow: Workflow = serde_json::from_value(json!({
            "workflow": {
                "shard_streams": {
                    "-80": { "streams": [{
                        "id": 1,
                        "shard": "-80",
                        "state": "Running",
                        "tablet": { "cell": "zone1", "uid": 200 },
                        "binlog_source": { "keyspace": "commerce", "shard": "0" },
                        "time_updated": { "seconds": 0 },
                        "transaction_timestamp": { "seconds": 0 }
                    }]},
                    "80-": { "streams": [{ "shard": "80-", "state": "Error" }]}
                }
            }
        }))
        .unwrap();

        let rows = rows(&workflow);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].stream, "-80-1");
        assert_eq!(rows[0].source, "commerce/0");
        assert_eq!(rows[0].tablet, "zone1-200");
        assert_eq!(rows[0].updated_at, "1970-01-01 00:00:00");
        assert_eq!(rows[0].lag, "0s");
        assert_eq!(rows[1].stream, "80--?");
        assert_eq!(rows[1].lag, "-");
    }
}
