//! # vreplag-core
//!
//! Client-side derivation of VReplication lag timeseries.
//!
//! The backend only reports two timestamps per stream (`time_updated` and
//! `transaction_timestamp`). Polling them repeatedly and subtracting one from
//! the other gives an *approximation* of replication lag. This crate turns
//! that stream of polls into a bounded, chartable history:
//!
//! - [`LagHistory`]: the count-bounded cache (`initialize`, `ingest`, `window_for`)
//! - [`ChartPolicy`]: window size, time-axis, null-handling and de-duplication
//! - [`render`]: `{x, y}` series for charting widgets
//! - [`rates`]: 15-minute Rates counters from tablet `/debug/vars`
//!
//! Histories are plain values. Whoever drives the polling owns them, so their
//! lifetime and sharing scope are decided by the composing application.
//!
//! ## Example
//!
//! ```rust
//! use vreplag_core::{ChartPolicy, LagHistory};
//! use vreplag_types::Observation;
//!
//! let policy = ChartPolicy::lag_table().with_window_size(3);
//! let history = LagHistory::for_policy(&policy)
//!     .ingest(&Observation::complete(50, 48), &policy, 0)
//!     .ingest(&Observation::complete(51, 48), &policy, 1_000)
//!     .ingest(&Observation::complete(51, 48), &policy, 2_000);
//!
//! assert_eq!(history.lags(), vec![Some(2.0), Some(3.0)]);
//! ```

pub mod history;
pub mod policy;
pub mod rates;
pub mod render;

pub use history::{ingest, window_for, LagHistory, LagPoint, SEED_SENTINEL};
pub use policy::{ChartPolicy, NullPolicy, TimeAxis};
pub use rates::{format_rates_timeseries, TimeseriesMap};
pub use render::{ChartPoint, LagRow, NamedSeries, TrailingSeries};

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn current_timestamp_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
