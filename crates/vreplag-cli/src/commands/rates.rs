use crate::commands::RatesArgs;
use crate::output::OutputDisplay;
use crate::Cli;
use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;
use vreplag_core::rates::{qps_timeseries, vreplication_qps_timeseries};
use vreplag_core::{current_timestamp_ms, TimeseriesMap};

#[derive(Tabled, Serialize)]
struct RateRow {
    series: String,
    latest: f64,
    peak: f64,
    /// Mean over the whole 15 minute window; missing buckets count as 0.
    avg_15m: f64,
}

fn summarize(timeseries: &TimeseriesMap) -> Vec<RateRow> {
    timeseries
        .iter()
        .map(|(name, points)| {
            let values: Vec<f64> = points.iter().filter_map(|p| p.y).collect();
            let avg_15m = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            RateRow {
                series: name.clone(),
                latest: values.last().copied().unwrap_or(0.0),
                peak: values.iter().copied().fold(0.0, f64::max),
                avg_15m: (avg_15m * 100.0).round() / 100.0,
            }
        })
        .collect()
}

pub async fn execute(args: &RatesArgs, cli: &Cli) -> Result<()> {
    let client = cli.client()?;
    let vars = client
        .fetch_tablet_debug_vars(&args.cluster, &args.tablet)
        .await?;

    let now = current_timestamp_ms();
    let timeseries = if args.vreplication {
        vreplication_qps_timeseries(Some(&vars), now)
    } else {
        qps_timeseries(Some(&vars), now)
    };

    summarize(&timeseries).display(cli)
}
