use clap::Args;
use std::net::SocketAddr;
use tokio::sync::watch::Receiver;
use tracing::warn;
use vreplag_core::ChartPolicy;
use vreplag_types::StreamKey;

pub mod lag;
pub mod rates;
pub mod serve;
pub mod streams;
pub mod watch;

/// Identifies a workflow on vtadmin-api
#[derive(Args, Clone, Debug)]
pub struct WorkflowArgs {
    /// Cluster id
    #[arg(short, long)]
    pub cluster: String,
    /// Target keyspace
    #[arg(short, long)]
    pub keyspace: String,
    /// Workflow name
    #[arg(short, long)]
    pub workflow: String,
}

#[derive(Args, Clone, Debug)]
pub struct LagArgs {
    #[command(flatten)]
    pub target: WorkflowArgs,
    /// Stream key, `{shard}-{id}` (e.g. -80-1)
    #[arg(short, long, allow_hyphen_values = true)]
    pub stream: StreamKey,
}

#[derive(Args, Clone, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub target: WorkflowArgs,
    /// Stream key, `{shard}-{id}` (e.g. -80-1)
    #[arg(short, long, allow_hyphen_values = true)]
    pub stream: StreamKey,
    /// Milliseconds between polls
    #[arg(long, default_value = "1000")]
    pub interval_ms: u64,
    /// Chart preset
    #[arg(long, value_enum, default_value = "table")]
    pub policy: PolicyPreset,
    /// Override the preset's window size
    #[arg(long)]
    pub window: Option<usize>,
    /// Only show points from the last N milliseconds
    #[arg(long)]
    pub span_ms: Option<i64>,
    /// Stop after N polls
    #[arg(long)]
    pub ticks: Option<usize>,
}

#[derive(Args, Clone, Debug)]
pub struct RatesArgs {
    /// Cluster id
    #[arg(short, long)]
    pub cluster: String,
    /// Tablet alias, `{cell}-{uid}`
    #[arg(short, long)]
    pub tablet: String,
    /// Show VReplicationQPS instead of QPS
    #[arg(long)]
    pub vreplication: bool,
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub target: WorkflowArgs,
    /// Address for /metrics, /health and /streams
    #[arg(long, env = "VREPLAG_METRICS_ADDR", default_value = "127.0.0.1:9102")]
    pub addr: SocketAddr,
    /// Enable CORS for web dashboards
    #[arg(long)]
    pub cors: bool,
    /// Milliseconds between workflow polls
    #[arg(long, default_value = "1000")]
    pub interval_ms: u64,
    /// Chart preset for the per-stream histories
    #[arg(long, value_enum, default_value = "span")]
    pub policy: PolicyPreset,
    /// Override the preset's window size
    #[arg(long)]
    pub window: Option<usize>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyPreset {
    /// 30 points, seeded, gaps for missing lag
    Detail,
    /// 15 points, gaps for missing lag
    Sparkline,
    /// 15 points on server time, incomplete polls skipped
    Table,
    /// 180 points for a trailing 3 minute span
    Span,
}

impl PolicyPreset {
    pub fn policy(self) -> ChartPolicy {
        match self {
            Self::Detail => ChartPolicy::stream_detail(),
            Self::Sparkline => ChartPolicy::sparkline(),
            Self::Table => ChartPolicy::lag_table(),
            Self::Span => ChartPolicy::trailing_span(),
        }
    }
}

/// Preset with an optional window override, validated.
pub fn build_policy(preset: PolicyPreset, window: Option<usize>) -> anyhow::Result<ChartPolicy> {
    let mut policy = preset.policy();
    if let Some(window) = window {
        policy = policy.with_window_size(window);
    }
    policy
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid chart policy: {}", e))?;
    Ok(policy)
}

/// Receiver that flips to `true` on Ctrl+C.
pub fn shutdown_on_ctrl_c() -> Receiver<bool> {
    let (tx, rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(true);
            }
            Err(e) => {
                warn!("failed to install Ctrl+C handler: {}", e);
                // Dropping the sender would stop every receiver.
                std::future::pending::<()>().await;
            }
        }
    });
    rx
}
