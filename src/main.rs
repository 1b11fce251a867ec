use anyhow::Result;
use clap::{Parser, Subcommand};
use juicesync::checkpoint::{FileCheckpoint, parse_checkpoint};
use juicesync::config::{Config, LEGACY_INFLUX_CONF, LEGACY_JUICENET_CONF};
use juicesync::influx::{DryRunSink, InfluxClient, PointSink};
use juicesync::juicenet::JuicenetClient;
use juicesync::run::{HistoryRun, StatusRun};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "juicesync", version, about = "Export JuiceNet charger data to InfluxDB")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Read the legacy key=value files from /etc/swarm-gateway instead
    #[arg(long, global = true, conflicts_with = "config")]
    legacy: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export charging sessions finished since the last run
    History {
        /// Backfill sessions that started before this RFC 3339 time
        #[arg(long)]
        before: Option<String>,

        /// Log the records instead of writing them; keep the checkpoint
        #[arg(long)]
        dry_run: bool,
    },
    /// Export a live status snapshot of every charger
    Status {
        /// Log the records instead of writing them
        #[arg(long)]
        dry_run: bool,
    },
}

fn load_config(cli: &Cli) -> juicesync::Result<Config> {
    if cli.legacy {
        return Config::from_legacy_files(LEGACY_JUICENET_CONF, LEGACY_INFLUX_CONF);
    }
    match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
}

fn make_sink(config: &Config, dry_run: bool) -> juicesync::Result<Box<dyn PointSink>> {
    if dry_run {
        return Ok(Box::new(DryRunSink::new()));
    }
    Ok(Box::new(InfluxClient::new(&config.influx)?))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    config.validate()?;
    juicesync::logging::init_logging(&config.logging)?;

    let source = JuicenetClient::new(&config.juicenet)?;

    match cli.command {
        Commands::History { before, dry_run } => {
            let before = before.as_deref().map(parse_checkpoint).transpose()?;
            let sink = make_sink(&config, dry_run)?;
            let checkpoints = FileCheckpoint::new(&config.history.checkpoint_file);

            let mut run = HistoryRun::new(&config, &source, sink.as_ref(), &checkpoints)?;
            if dry_run {
                run = run.without_checkpoint_update();
            }
            let summary = run.execute(before).await?;
            info!(
                "History run complete: {} unit(s), {} session(s) merged into {}, \
                 {} sample(s), {} record(s)",
                summary.units,
                summary.raw_sessions,
                summary.merged_sessions,
                summary.samples,
                summary.records
            );
        }
        Commands::Status { dry_run } => {
            let sink = make_sink(&config, dry_run)?;
            let written = StatusRun::new(&config, &source, sink.as_ref()).execute().await?;
            info!("Status run complete: {} record(s)", written);
        }
    }

    Ok(())
}
