use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vreplag_client::{ClientConfig, VtAdminClient};

mod commands;
mod output;

use commands::*;

#[derive(Parser)]
#[command(
    name = "vreplag",
    about = "vreplag - VReplication stream lag from vtadmin-api",
    version = "0.1.0",
    long_about = None
)]
pub struct Cli {
    /// vtadmin-api base URL
    #[arg(
        long,
        env = "VTADMIN_API_ADDRESS",
        default_value = "http://127.0.0.1:14200"
    )]
    pub api: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn client(&self) -> anyhow::Result<VtAdminClient> {
        Ok(VtAdminClient::new(ClientConfig::new(self.api.clone()))?)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the streams of a workflow with their current lag
    Streams(WorkflowArgs),

    /// Show the current lag of one stream
    Lag(LagArgs),

    /// Poll one stream and print its rolling lag history
    Watch(WatchArgs),

    /// Show a tablet's QPS rates
    Rates(RatesArgs),

    /// Poll every stream of a workflow and serve metrics over HTTP
    Serve(ServeArgs),
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match &cli.command {
        Commands::Streams(args) => streams::execute(args, &cli).await,
        Commands::Lag(args) => lag::execute(args, &cli).await,
        Commands::Watch(args) => watch::execute(args, &cli).await,
        Commands::Rates(args) => rates::execute(args, &cli).await,
        Commands::Serve(args) => serve::execute(args, &cli).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch() {
        let cli = Cli::try_parse_from([
            "vreplag",
            "--api",
            "http://vtadmin:14200",
            "watch",
            "--cluster",
            "local",
            "--keyspace",
            "customer",
            "--workflow",
            "commerce2customer",
            "--stream",
            "-80-1",
            "--policy",
            "detail",
            "--ticks",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.api, "http://vtadmin:14200");
        assert_eq!(cli.format, OutputFormat::Table);
        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.stream.to_string(), "-80-1");
                assert_eq!(args.policy, PolicyPreset::Detail);
                assert_eq!(args.ticks, Some(3));
                assert_eq!(args.interval_ms, 1000);
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_invalid_stream_key_is_rejected() {
        let result = Cli::try_parse_from([
            "vreplag",
            "lag",
            "--cluster",
            "local",
            "--keyspace",
            "customer",
            "--workflow",
            "wf",
            "--stream",
            "nokey",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from([
            "vreplag",
            "--format",
            "json",
            "serve",
            "--cluster",
            "local",
            "--keyspace",
            "customer",
            "--workflow",
            "wf",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Serve(args) => {
                assert!(!args.cors);
                assert_eq!(args.policy, PolicyPreset::Span);
            }
            _ => panic!("expected serve"),
        }
    }
}
