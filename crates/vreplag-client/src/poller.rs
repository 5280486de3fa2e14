//! Periodic polling of a single stream into a [`LagHistory`].

use crate::client::{ClientError, VtAdminClient};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use vreplag_core::{current_timestamp_ms, ChartPolicy, LagHistory};
use vreplag_types::{Observation, StreamKey};

/// Anything that can produce the current `(time_updated, transaction_timestamp)`
/// pair for one stream.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    async fn observe(&self) -> Result<Observation, ClientError>;

    /// Human-readable name used in logs and metric labels.
    fn describe(&self) -> String;
}

/// Observes one stream of a workflow by refetching the whole workflow.
pub struct WorkflowStreamSource {
    client: VtAdminClient,
    cluster_id: String,
    keyspace: String,
    workflow: String,
    key: StreamKey,
}

impl WorkflowStreamSource {
    pub fn new(
        client: VtAdminClient,
        cluster_id: impl Into<String>,
        keyspace: impl Into<String>,
        workflow: impl Into<String>,
        key: StreamKey,
    ) -> Self {
        Self {
            client,
            cluster_id: cluster_id.into(),
            keyspace: keyspace.into(),
            workflow: workflow.into(),
            key,
        }
    }

    pub fn key(&self) -> &StreamKey {
        &self.key
    }
}

#[async_trait]
impl ObservationSource for WorkflowStreamSource {
    async fn observe(&self) -> Result<Observation, ClientError> {
        let stream = self
            .client
            .fetch_stream(&self.cluster_id, &self.keyspace, &self.workflow, &self.key)
            .await?;
        Ok(Observation::from(&stream))
    }

    fn describe(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.cluster_id, self.keyspace, self.workflow, self.key
        )
    }
}

/// Poll loop configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between polls
    pub interval: Duration,

    /// How polled observations are folded into the history
    pub policy: ChartPolicy,

    /// Stop after this many polls (None = until shutdown)
    pub max_polls: Option<usize>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            policy: ChartPolicy::default(),
            max_polls: None,
        }
    }
}

impl PollerConfig {
    pub fn new(policy: ChartPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Create config for testing (fast ticks, small window)
    pub fn test_config() -> Self {
        Self {
            interval: Duration::from_millis(5),
            policy: ChartPolicy::test_config(),
            max_polls: Some(5),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.interval.is_zero() {
            return Err("interval must be > 0".to_string());
        }

        if self.max_polls == Some(0) {
            return Err("max_polls must be > 0 when set".to_string());
        }

        self.policy.validate()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_policy(mut self, policy: ChartPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_polls(mut self, max_polls: Option<usize>) -> Self {
        self.max_polls = max_polls;
        self
    }
}

/// Outcome of a single tick, handed to the `run` callback.
#[derive(Debug)]
pub enum PollEvent<'a> {
    Polled {
        /// Whether the observation produced a new point
        appended: bool,
        history: &'a LagHistory,
    },
    Failed(&'a ClientError),
}

/// Owns a stream's lag history and keeps it current.
///
/// A failed poll leaves the history exactly as it was; the next tick simply
/// tries again.
pub struct StreamWatcher<S> {
    source: S,
    config: PollerConfig,
    history: LagHistory,
    clock: fn() -> i64,
}

impl<S: ObservationSource> StreamWatcher<S> {
    pub fn new(source: S, config: PollerConfig) -> Self {
        let history = LagHistory::for_policy(&config.policy);
        Self {
            source,
            config,
            history,
            clock: current_timestamp_ms,
        }
    }

    /// Replaces the wall clock used for poll-arrival timestamps.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn history(&self) -> &LagHistory {
        &self.history
    }

    pub fn into_history(self) -> LagHistory {
        self.history
    }

    /// Fetches one observation and folds it into the history.
    pub async fn poll_once(&mut self) -> Result<bool, ClientError> {
        let observation = self.source.observe().await?;
        let now = (self.clock)();
        let appended = self
            .history
            .push_observation(&observation, &self.config.policy, now);

        debug!(
            source = %self.source.describe(),
            appended,
            lag = ?observation.lag_seconds(),
            "polled stream"
        );
        Ok(appended)
    }

    /// Polls on `config.interval` until `shutdown` flips to true, the sender
    /// goes away, or `max_polls` ticks have run. Returns the number of polls.
    pub async fn run<F>(&mut self, mut shutdown: watch::Receiver<bool>, mut on_update: F) -> usize
    where
        F: FnMut(PollEvent<'_>),
    {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            source = %self.source.describe(),
            interval_ms = self.config.interval.as_millis() as u64,
            window = self.config.policy.window_size,
            "starting stream watcher"
        );

        let mut polls = 0usize;
        while !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let started = Instant::now();
            match self.poll_once().await {
                Ok(appended) => on_update(PollEvent::Polled {
                    appended,
                    history: &self.history,
                }),
                Err(e) => {
                    warn!(
                        source = %self.source.describe(),
                        error_type = e.error_type(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "poll failed: {}",
                        e
                    );
                    on_update(PollEvent::Failed(&e));
                }
            }

            polls += 1;
            if self.config.max_polls.is_some_and(|max| polls >= max) {
                break;
            }
        }

        info!(source = %self.source.describe(), polls, "stream watcher stopped");
        polls
    }
}
