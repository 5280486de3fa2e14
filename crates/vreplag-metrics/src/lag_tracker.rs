//! Per-stream lag tracking

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use vreplag_core::{ChartPoint, ChartPolicy, LagHistory};
use vreplag_types::{Observation, Workflow};

/// Latest state of one tracked stream, as served on `/streams`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub stream: String,
    pub points: usize,
    pub latest_lag_seconds: Option<f64>,
    pub updated_at_seconds: Option<i64>,
}

/// Lag histories for every stream of one workflow.
///
/// Each history is written only by the poller for its workflow; readers get
/// cloned snapshots.
#[derive(Clone)]
pub struct StreamLagTracker {
    workflow: String,
    policy: ChartPolicy,
    /// Stream key (`{shard}-{id}`) -> history
    histories: Arc<DashMap<String, LagHistory>>,
}

impl StreamLagTracker {
    pub fn new(workflow: impl Into<String>, policy: ChartPolicy) -> Self {
        Self {
            workflow: workflow.into(),
            policy,
            histories: Arc::new(DashMap::new()),
        }
    }

    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    pub fn policy(&self) -> &ChartPolicy {
        &self.policy
    }

    /// Fold one observation into a stream's history, creating the history on
    /// first sight. Returns whether a point was appended.
    pub fn record(&self, stream: &str, observation: &Observation, now_millis: i64) -> bool {
        let appended = self
            .histories
            .entry(stream.to_string())
            .or_insert_with(|| LagHistory::for_policy(&self.policy))
            .push_observation(observation, &self.policy, now_millis);

        if !appended {
            return false;
        }

        let labels = [self.workflow.as_str(), stream];
        crate::exporter::STREAM_OBSERVATIONS
            .with_label_values(&labels)
            .inc();

        // A gap point reads as NaN so the gauge never outlives the history.
        let lag = observation.lag_seconds().map_or(f64::NAN, |lag| lag as f64);
        crate::exporter::STREAM_LAG_SECONDS
            .with_label_values(&labels)
            .set(lag);

        if let Some(updated) = observation.updated_at_seconds {
            crate::exporter::STREAM_LAST_UPDATED
                .with_label_values(&labels)
                .set(updated as f64);
        }

        true
    }

    /// Record every keyed stream of a freshly fetched workflow, then forget
    /// tracked streams the workflow no longer has. Returns the number of
    /// streams that gained a point.
    pub fn record_workflow(&self, workflow: &Workflow, now_millis: i64) -> usize {
        let mut appended = 0;
        let mut live = HashSet::new();
        for stream in workflow.streams() {
            let Some(key) = stream.key() else {
                debug!(shard = %stream.shard, "skipping stream without id");
                continue;
            };
            let key = key.to_string();
            if self.record(&key, &stream.observation(), now_millis) {
                appended += 1;
            }
            live.insert(key);
        }
        self.retain_streams(&live);
        appended
    }

    /// Forget every tracked stream not in `live`. Returns the forgotten keys.
    pub fn retain_streams(&self, live: &HashSet<String>) -> Vec<String> {
        let gone: Vec<String> = self
            .streams()
            .into_iter()
            .filter(|stream| !live.contains(stream))
            .collect();
        for stream in &gone {
            debug!(workflow = %self.workflow, stream = %stream, "forgetting vanished stream");
            self.forget(stream);
        }
        gone
    }

    /// Count a failed poll
    pub fn record_error(&self, error_type: &str) {
        crate::exporter::POLL_ERRORS
            .with_label_values(&[self.workflow.as_str(), error_type])
            .inc();
    }

    pub fn observe_poll_duration(&self, seconds: f64) {
        crate::exporter::POLL_DURATION
            .with_label_values(&[self.workflow.as_str()])
            .observe(seconds);
    }

    /// Snapshot of a stream's history
    pub fn history(&self, stream: &str) -> Option<LagHistory> {
        self.histories.get(stream).map(|h| h.clone())
    }

    /// Chart series for a stream, restricted to the last `span_millis` when
    /// given.
    pub fn series(
        &self,
        stream: &str,
        span_millis: Option<i64>,
        now_millis: i64,
    ) -> Option<Vec<ChartPoint>> {
        let history = self.histories.get(stream)?;
        Some(match span_millis {
            Some(span) => history.window_for(span, now_millis).to_series(),
            None => history.to_series(),
        })
    }

    /// One summary per stream, sorted by key
    pub fn summaries(&self) -> Vec<StreamSummary> {
        let mut summaries: Vec<StreamSummary> = self
            .histories
            .iter()
            .map(|entry| {
                let history = entry.value();
                StreamSummary {
                    stream: entry.key().clone(),
                    points: history.len(),
                    latest_lag_seconds: history.latest_lag(),
                    updated_at_seconds: history.last().and_then(|p| p.updated_at_seconds),
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.stream.cmp(&b.stream));
        summaries
    }

    pub fn streams(&self) -> Vec<String> {
        let mut streams: Vec<String> = self.histories.iter().map(|e| e.key().clone()).collect();
        streams.sort();
        streams
    }

    /// Drop a stream's history and its gauges. Returns whether it existed.
    pub fn forget(&self, stream: &str) -> bool {
        let labels = [self.workflow.as_str(), stream];
        let _ = crate::exporter::STREAM_LAG_SECONDS.remove_label_values(&labels);
        let _ = crate::exporter::STREAM_LAST_UPDATED.remove_label_values(&labels);
        let _ = crate::exporter::STREAM_OBSERVATIONS.remove_label_values(&labels);
        self.histories.remove(stream).is_some()
    }
}
