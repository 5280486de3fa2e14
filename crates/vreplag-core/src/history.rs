//! Count-bounded lag history.
//!
//! A [`LagHistory`] is built from successive [`Observation`]s. Each accepted
//! observation becomes one [`LagPoint`]; once the configured window size is
//! exceeded the oldest point is evicted. Nothing here can fail: incomplete
//! observations either produce no point or a point with a null lag,
//! depending on the [`NullPolicy`].

use crate::policy::{ChartPolicy, NullPolicy, TimeAxis};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::trace;
use vreplag_types::Observation;

/// Lag of the last seeded point. Non-zero so an all-zero chart still has a
/// y-range to draw.
pub const SEED_SENTINEL: f64 = 1e-6;

/// One entry in a rendered lag series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagPoint {
    /// X-axis position (see [`TimeAxis`])
    pub timestamp_millis: i64,
    /// `updated - transaction`, `None` when not computable
    pub lag_seconds: Option<f64>,
    /// Raw `time_updated` this point was derived from
    pub updated_at_seconds: Option<i64>,
    /// Raw `transaction_timestamp` this point was derived from
    pub transaction_at_seconds: Option<i64>,
}

impl LagPoint {
    fn placeholder(lag_seconds: f64) -> Self {
        Self {
            timestamp_millis: 0,
            lag_seconds: Some(lag_seconds),
            updated_at_seconds: None,
            transaction_at_seconds: None,
        }
    }
}

/// Ordered, bounded sequence of lag points, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LagHistory {
    points: VecDeque<LagPoint>,
}

impl LagHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty history, or a pre-seeded one of exactly `window_size`
    /// points when `seed` is given.
    ///
    /// Seeded histories hold `window_size - 1` zero-lag placeholders at the
    /// epoch followed by one point carrying `seed` (normally
    /// [`SEED_SENTINEL`]). Placeholders carry no raw timestamps, so any
    /// observation with a `time_updated` is new relative to them.
    pub fn initialize(window_size: usize, seed: Option<f64>) -> Self {
        let Some(seed) = seed else {
            return Self::new();
        };
        if window_size == 0 {
            return Self::new();
        }

        let mut points: VecDeque<LagPoint> = (0..window_size - 1)
            .map(|_| LagPoint::placeholder(0.0))
            .collect();
        points.push_back(LagPoint::placeholder(seed));

        Self { points }
    }

    /// Initializes according to a policy's window size and seed.
    pub fn for_policy(policy: &ChartPolicy) -> Self {
        Self::initialize(policy.window_size, policy.seed)
    }

    /// Returns a new history with `observation` folded in. `self` is left
    /// untouched.
    pub fn ingest(&self, observation: &Observation, policy: &ChartPolicy, now_millis: i64) -> Self {
        let mut next = self.clone();
        next.push_observation(observation, policy, now_millis);
        next
    }

    /// In-place variant of [`LagHistory::ingest`]. Returns whether a point
    /// was appended.
    pub fn push_observation(
        &mut self,
        observation: &Observation,
        policy: &ChartPolicy,
        now_millis: i64,
    ) -> bool {
        let lag = observation.lag_seconds();
        if lag.is_none() && policy.null_policy == NullPolicy::Skip {
            return false;
        }

        let timestamp_millis = match (policy.time_axis, observation.updated_at_seconds) {
            (TimeAxis::ServerUpdated, Some(updated)) => updated.saturating_mul(1000),
            _ => now_millis,
        };

        if policy.dedup && self.is_duplicate(observation) {
            trace!(
                updated_at = ?observation.updated_at_seconds,
                "skipping observation with unchanged time_updated"
            );
            return false;
        }

        self.points.push_back(LagPoint {
            timestamp_millis,
            lag_seconds: lag.map(|l| l as f64),
            updated_at_seconds: observation.updated_at_seconds,
            transaction_at_seconds: observation.transaction_at_seconds,
        });

        while self.points.len() > policy.window_size {
            if let Some(evicted) = self.points.pop_front() {
                trace!(timestamp_millis = evicted.timestamp_millis, "evicted lag point");
            }
        }

        true
    }

    fn is_duplicate(&self, observation: &Observation) -> bool {
        self.points
            .back()
            .is_some_and(|last| last.updated_at_seconds == observation.updated_at_seconds)
    }

    /// Points whose timestamp falls within the trailing `span_millis` before
    /// `now_millis`, in their original order.
    pub fn window_for(&self, span_millis: i64, now_millis: i64) -> Self {
        let first = now_millis.saturating_sub(span_millis);
        Self {
            points: self
                .points
                .iter()
                .filter(|p| p.timestamp_millis >= first)
                .copied()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl DoubleEndedIterator<Item = &LagPoint> + ExactSizeIterator {
        self.points.iter()
    }

    pub fn first(&self) -> Option<&LagPoint> {
        self.points.front()
    }

    pub fn last(&self) -> Option<&LagPoint> {
        self.points.back()
    }

    /// Lag of the most recent point.
    pub fn latest_lag(&self) -> Option<f64> {
        self.last().and_then(|p| p.lag_seconds)
    }

    pub fn lags(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.lag_seconds).collect()
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.points.iter().map(|p| p.timestamp_millis).collect()
    }
}

/// Free-function form of [`LagHistory::ingest`].
pub fn ingest(
    history: &LagHistory,
    observation: &Observation,
    policy: &ChartPolicy,
    now_millis: i64,
) -> LagHistory {
    history.ingest(observation, policy, now_millis)
}

/// Free-function form of [`LagHistory::window_for`].
pub fn window_for(history: &LagHistory, span_millis: i64, now_millis: i64) -> LagHistory {
    history.window_for(span_millis, now_millis)
}
