//! Adapters from lag histories to whatever draws them.
//!
//! Charting widgets want `[{x, y}]`; the lag table wants the raw timestamps
//! next to each derived lag, newest first.

use crate::history::{LagHistory, LagPoint};
use serde::{Deserialize, Serialize};

/// A numeric `(x, y)` pair. `y` is null for gaps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: i64,
    pub y: Option<f64>,
}

impl From<&LagPoint> for ChartPoint {
    fn from(point: &LagPoint) -> Self {
        Self {
            x: point.timestamp_millis,
            y: point.lag_seconds,
        }
    }
}

/// A named series, e.g. `zone1-200/1` on a multi-stream chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    pub data: Vec<ChartPoint>,
}

/// Series clipped to a fixed visual span ending at its most recent point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingSeries {
    /// Left edge of the x-axis
    pub soft_min: i64,
    pub data: Vec<ChartPoint>,
}

/// One row of the raw-timestamp lag table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagRow {
    pub updated_at_seconds: Option<i64>,
    pub transaction_at_seconds: Option<i64>,
    pub lag_seconds: Option<f64>,
}

impl LagHistory {
    /// `[{x, y}]`, oldest first.
    pub fn to_series(&self) -> Vec<ChartPoint> {
        self.points().map(ChartPoint::from).collect()
    }

    pub fn to_named_series(&self, name: impl Into<String>) -> NamedSeries {
        NamedSeries {
            name: name.into(),
            data: self.to_series(),
        }
    }

    /// Points within `span_millis` of the most recent point (or of
    /// `now_millis` when the history is empty).
    pub fn trailing_series(&self, span_millis: i64, now_millis: i64) -> TrailingSeries {
        let last_ts = self.last().map_or(now_millis, |p| p.timestamp_millis);
        let soft_min = last_ts.saturating_sub(span_millis);

        TrailingSeries {
            soft_min,
            data: self.window_for(span_millis, last_ts).to_series(),
        }
    }

    /// Table rows, newest first.
    pub fn rows(&self) -> Vec<LagRow> {
        self.points()
            .rev()
            .map(|p| LagRow {
                updated_at_seconds: p.updated_at_seconds,
                transaction_at_seconds: p.transaction_at_seconds,
                lag_seconds: p.lag_seconds,
            })
            .collect()
    }
}
