//! Chart policies.
//!
//! Lag charts differ in three independent choices: how many points they keep,
//! where a point sits on the x-axis, and what to do when a poll cannot
//! produce a lag. [`ChartPolicy`] makes each choice explicit.

use crate::history::SEED_SENTINEL;
use serde::{Deserialize, Serialize};

/// Where a point is placed on the x-axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeAxis {
    /// Time the poll response was received. Keeps several streams on one
    /// chart comparable on a shared axis.
    #[default]
    PollArrival,

    /// `updated_at_seconds * 1000`, i.e. server time.
    ServerUpdated,
}

/// What to do with an observation that is missing a timestamp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NullPolicy {
    /// Drop the observation; no point is appended.
    #[default]
    Skip,

    /// Append a point with a null lag so the line shows a gap.
    Gap,
}

/// Windowing and ingestion policy for one lag chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChartPolicy {
    /// Maximum number of points kept (oldest evicted first)
    pub window_size: usize,

    /// X-axis placement of new points
    pub time_axis: TimeAxis,

    /// Handling of observations without a computable lag
    pub null_policy: NullPolicy,

    /// Skip observations whose `updated_at_seconds` matches the last stored point
    pub dedup: bool,

    /// Pre-fill the history so the first render is not empty
    pub seed: Option<f64>,
}

impl Default for ChartPolicy {
    fn default() -> Self {
        Self {
            window_size: 15,
            time_axis: TimeAxis::PollArrival,
            null_policy: NullPolicy::Skip,
            dedup: true,
            seed: None,
        }
    }
}

impl ChartPolicy {
    /// Per-stream detail chart: 30 points, seeded with 29 zeros and a
    /// near-zero sentinel, gaps for missing data.
    pub fn stream_detail() -> Self {
        Self {
            window_size: 30,
            time_axis: TimeAxis::PollArrival,
            null_policy: NullPolicy::Gap,
            dedup: true,
            seed: Some(SEED_SENTINEL),
        }
    }

    /// Compact sparkline shown next to each stream in a list.
    pub fn sparkline() -> Self {
        Self {
            window_size: 15,
            time_axis: TimeAxis::PollArrival,
            null_policy: NullPolicy::Gap,
            dedup: true,
            seed: None,
        }
    }

    /// Chart + table of raw timestamps, plotted on server time.
    pub fn lag_table() -> Self {
        Self {
            window_size: 15,
            time_axis: TimeAxis::ServerUpdated,
            null_policy: NullPolicy::Skip,
            dedup: true,
            seed: None,
        }
    }

    /// Fixed visual span (last 3 minutes at one poll per second). Pair with
    /// [`LagHistory::window_for`](crate::LagHistory::window_for).
    pub fn trailing_span() -> Self {
        Self {
            window_size: 180,
            time_axis: TimeAxis::PollArrival,
            null_policy: NullPolicy::Skip,
            dedup: true,
            seed: None,
        }
    }

    /// Create config for testing (tiny window)
    pub fn test_config() -> Self {
        Self {
            window_size: 3,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.window_size == 0 {
            return Err("window_size must be > 0".to_string());
        }

        if let Some(seed) = self.seed {
            if !seed.is_finite() {
                return Err(format!("seed must be finite, got {}", seed));
            }
        }

        Ok(())
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_time_axis(mut self, time_axis: TimeAxis) -> Self {
        self.time_axis = time_axis;
        self
    }

    pub fn with_null_policy(mut self, null_policy: NullPolicy) -> Self {
        self.null_policy = null_policy;
        self
    }

    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn with_seed(mut self, seed: Option<f64>) -> Self {
        self.seed = seed;
        self
    }
}
