//! Off-chain replay service for the `clmm-core` simulator.
//!
//! Replays a decoded stream of pool events in order, keeps the simulated
//! pool state in sync, periodically snapshots it to RocksDB, and serves a
//! read-only query/fork API over the result.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use clmm_core::Simulator;
use clmm_replay::config::{IngestConfig, ReplayConfig};
use clmm_replay::ingest::source::{ChannelEventSource, JsonLinesEventSource};
use clmm_replay::ingest::run_ingest_loop_shared;
use clmm_replay::metadata::StaticMetadataProvider;
use clmm_replay::storage::RocksSnapshotStore;
use clmm_replay::api;
use tokio::signal;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clmm-replay")]
#[command(about = "Off-chain concentrated-liquidity pool replay service", version, author)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "replay-config.toml")]
    config: String,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Dry run mode (validate config and exit)
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if std::path::Path::new(&cli.config).exists() {
        ReplayConfig::from_file(&cli.config)?
    } else {
        warn!("Config file '{}' not found, using defaults", cli.config);
        ReplayConfig::default()
    };

    if let Some(log_level) = cli.log_level {
        config.monitoring.log_level = log_level;
    }

    init_logging(&config)?;

    info!("clmm-replay v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Ingest: {:?}", config.ingest);
    info!("  RocksDB path: {:?}", config.storage.rocksdb_path);
    info!("  API bind address: {}", config.api.bind_address);
    info!("  Metrics port: {}", config.monitoring.metrics_port);
    info!("  Tracked pools: {}", config.simulator.pool_metadata.len());

    config.validate_config()?;
    config.ensure_directories()?;
    info!("Configuration validated");

    if cli.dry_run {
        info!("Dry run mode, configuration is valid, exiting");
        return Ok(());
    }

    info!("Opening snapshot store...");
    let store = Arc::new(RocksSnapshotStore::open(&config.storage.rocksdb_path)?);
    info!("Snapshot store ready");

    let skip_list: HashSet<String> = config.simulator.skip_pools.iter().cloned().collect();
    let provider = StaticMetadataProvider::new(config.simulator.pool_metadata.clone());
    let simulator = Arc::new(RwLock::new(Simulator::new(provider).with_skip_list(skip_list)));

    info!("Starting API server...");
    let api_handle = api::start_server(simulator.clone(), &config.api).await?;
    info!("API server started on {}", config.api.bind_address);

    info!("Starting metrics server...");
    let metrics_handle = api::start_metrics_server(simulator.clone(), config.monitoring.metrics_port).await?;
    info!("Metrics server started on port {}", config.monitoring.metrics_port);

    let cancel = CancellationToken::new();
    let flush_interval = Duration::from_secs(config.storage.flush_interval_secs);

    info!("Starting ingest loop...");
    let ingest_cancel = cancel.clone();
    let ingest_store = store.clone();
    let ingest_simulator = simulator.clone();
    let ingest_kind = config.ingest.clone();
    let ingest_handle = tokio::spawn(async move {
        let run = async move {
            match ingest_kind {
                IngestConfig::JsonLines { path } => {
                    let source = JsonLinesEventSource::open(&path).await?;
                    run_ingest_loop_shared(source, ingest_simulator, ingest_store.as_ref(), flush_interval, ingest_cancel)
                        .await
                }
                IngestConfig::Channel => {
                    let (_tx, rx) = tokio::sync::mpsc::channel(1024);
                    let source = ChannelEventSource::new(rx);
                    run_ingest_loop_shared(source, ingest_simulator, ingest_store.as_ref(), flush_interval, ingest_cancel)
                        .await
                }
            }
        };
        if let Err(err) = run.await {
            error!(error = %err, "ingest loop stopped with a fatal error");
        }
    });

    info!("clmm-replay started successfully");
    info!("Press Ctrl+C to shutdown");

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = ingest_handle => {
            match result {
                Ok(_) => info!("Ingest loop finished"),
                Err(e) => error!("Ingest task error: {}", e),
            }
        }
        result = api_handle => {
            match result {
                Ok(_) => info!("API server finished"),
                Err(e) => error!("API server task error: {}", e),
            }
        }
        result = metrics_handle => {
            match result {
                Ok(_) => info!("Metrics server finished"),
                Err(e) => error!("Metrics server task error: {}", e),
            }
        }
    }

    cancel.cancel();
    info!("Shutting down clmm-replay");
    Ok(())
}

fn init_logging(config: &ReplayConfig) -> Result<()> {
    let log_level = config.monitoring.log_level.parse().unwrap_or(tracing::Level::INFO);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("clmm_replay={log_level},clmm_core={log_level}").into());

    if config.monitoring.structured_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }

    Ok(())
}
