//! vreplag Metrics - per-stream lag histories, Prometheus export and HTTP server
//!
//! The [`StreamLagTracker`] keeps one [`LagHistory`](vreplag_core::LagHistory)
//! per stream of a workflow and mirrors the latest values into Prometheus
//! gauges. [`MetricsServer`] exposes both over HTTP.

pub mod exporter;
pub mod lag_tracker;
pub mod server;

pub use exporter::*;
pub use lag_tracker::{StreamLagTracker, StreamSummary};
pub use server::MetricsServer;
