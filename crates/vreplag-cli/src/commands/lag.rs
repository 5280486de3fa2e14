use crate::commands::LagArgs;
use crate::output::{display_single, format_lag, format_timestamp, warning};
use crate::Cli;
use anyhow::Result;
use serde::Serialize;
use vreplag_types::Stream;

#[derive(Serialize)]
struct LagReport {
    stream: String,
    state: String,
    updated_at: String,
    transaction_timestamp: String,
    lag_seconds: Option<i64>,
    lag: String,
}

impl LagReport {
    fn new(key: String, stream: &Stream) -> Self {
        let observation = stream.observation();
        let lag = observation.lag_seconds();
        Self {
            stream: key,
            state: stream.state.clone(),
            updated_at: format_timestamp(observation.updated_at_seconds),
            transaction_timestamp: format_timestamp(observation.transaction_at_seconds),
            lag_seconds: lag,
            lag: format_lag(lag.map(|l| l as f64)),
        }
    }
}

pub async fn execute(args: &LagArgs, cli: &Cli) -> Result<()> {
    let client = cli.client()?;
    let t = &args.target;
    let stream = client
        .fetch_stream(&t.cluster, &t.keyspace, &t.workflow, &args.stream)
        .await?;

    let report = LagReport::new(args.stream.to_string(), &stream);
    if report.lag_seconds.is_none() && cli.format == crate::OutputFormat::Table {
        warning("Stream has no transaction timestamp yet; lag cannot be computed");
    }

    display_single(&report, cli)
}
