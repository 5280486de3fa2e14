//! Prometheus metrics exporter

use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, Encoder,
    GaugeVec, HistogramVec, TextEncoder,
};

lazy_static::lazy_static! {
    /// Most recent computable lag per stream
    pub static ref STREAM_LAG_SECONDS: GaugeVec = register_gauge_vec!(
        "vreplag_stream_lag_seconds",
        "Approximate replication lag (time_updated - transaction_timestamp) in seconds",
        &["workflow", "stream"]
    ).unwrap();

    /// Observations that produced a new history point
    pub static ref STREAM_OBSERVATIONS: CounterVec = register_counter_vec!(
        "vreplag_stream_observations_total",
        "Total number of observations appended to a stream's lag history",
        &["workflow", "stream"]
    ).unwrap();

    pub static ref STREAM_LAST_UPDATED: GaugeVec = register_gauge_vec!(
        "vreplag_stream_last_updated_timestamp_seconds",
        "time_updated of the stream's last observation (Unix epoch)",
        &["workflow", "stream"]
    ).unwrap();

    /// Failed polls by error kind
    pub static ref POLL_ERRORS: CounterVec = register_counter_vec!(
        "vreplag_poll_errors_total",
        "Total number of failed workflow polls",
        &["workflow", "error_type"]
    ).unwrap();

    pub static ref POLL_DURATION: HistogramVec = register_histogram_vec!(
        "vreplag_poll_duration_seconds",
        "Duration of workflow polls in seconds",
        &["workflow"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    ).unwrap();
}

/// Export metrics in Prometheus text format
pub fn export_metrics() -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
