//! Rates counters from tablet `/debug/vars`.
//!
//! Rates stats come back as bare arrays without timestamps: one sample per
//! 5 second bucket, least recent first, covering at most 15 minutes. The
//! timestamps are inferred backwards from the time the response arrived.

use crate::render::{ChartPoint, NamedSeries};
use std::collections::BTreeMap;
use vreplag_types::{RatesMap, TabletDebugVars};

pub const RATES_INTERVAL_MILLIS: i64 = 5 * 1000;
pub const RATES_MAX_SPAN_MILLIS: i64 = 15 * 60 * 1000;
pub const SERIES_LENGTH: usize = (RATES_MAX_SPAN_MILLIS / RATES_INTERVAL_MILLIS) as usize;

/// Aggregate series present in every non-empty Rates map.
pub const AGGREGATE_SERIES: &str = "All";

pub type TimeseriesMap = BTreeMap<String, Vec<ChartPoint>>;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Expands each Rates series into [`SERIES_LENGTH`] points ending at
/// `end_at_millis`, oldest first. Buckets older than the data are 0.0.
///
/// An empty map yields a single empty-valued `All` series so charts still
/// render their axes.
pub fn format_rates_timeseries(rates: &RatesMap, end_at_millis: i64) -> TimeseriesMap {
    let empty: RatesMap = [(AGGREGATE_SERIES.to_string(), Vec::new())].into();
    let rates = if rates.is_empty() { &empty } else { rates };

    rates
        .iter()
        .map(|(name, samples)| {
            let mut points: Vec<ChartPoint> = (0..SERIES_LENGTH)
                .map(|i| {
                    let y = samples
                        .len()
                        .checked_sub(i + 1)
                        .map_or(0.0, |idx| round2(samples[idx]));
                    ChartPoint {
                        x: end_at_millis - i as i64 * RATES_INTERVAL_MILLIS,
                        y: Some(y),
                    }
                })
                .collect();
            points.reverse();
            (name.clone(), points)
        })
        .collect()
}

pub fn qps_timeseries(vars: Option<&TabletDebugVars>, end_at_millis: i64) -> TimeseriesMap {
    let rates = vars.and_then(|v| v.qps.clone()).unwrap_or_default();
    format_rates_timeseries(&rates, end_at_millis)
}

pub fn vreplication_qps_timeseries(
    vars: Option<&TabletDebugVars>,
    end_at_millis: i64,
) -> TimeseriesMap {
    let rates = vars
        .and_then(|v| v.vreplication_qps.clone())
        .unwrap_or_default();
    format_rates_timeseries(&rates, end_at_millis)
}

/// Per-stream series named `{prefix}/{series}`, leaving out the aggregate.
pub fn stream_series(prefix: &str, timeseries: &TimeseriesMap) -> Vec<NamedSeries> {
    timeseries
        .iter()
        .filter(|(name, _)| name.as_str() != AGGREGATE_SERIES)
        .map(|(name, data)| NamedSeries {
            name: format!("{}/{}", prefix, name),
            data: data.clone(),
        })
        .collect()
}
