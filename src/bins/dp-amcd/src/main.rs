//! Domain Proxy Active Mode Controller daemon
//!
//! Periodically loads the feasible CBSDs from the database, decides the
//! next SAS requests and bookkeeping for each of them and applies the
//! result in one transaction per tick.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use dp_amc::{run_tick, ActionGenerator, ThreadRandom};
use dp_dbi::{DbiError, DetailedCbsd, MemoryStore, MongoStore};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod config;

use config::{AmcConfig, ConfigError};

/// Domain Proxy Active Mode Controller
#[derive(Parser, Debug)]
#[command(name = "dp-amcd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CBRS Domain Proxy active mode controller", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, default_value = "/etc/dp/amc.yaml")]
    config: String,

    /// Log level (trace, debug, info, warn, error), overrides the config file
    #[arg(short = 'e', long)]
    log_level: Option<String>,

    /// MongoDB URI, overrides the config file
    #[arg(long)]
    db_uri: Option<String>,

    /// Run a single tick and exit
    #[arg(long)]
    once: bool,

    /// Run one tick over a JSON file of CBSDs and print the actions, without a database
    #[arg(long, value_name = "JSON")]
    snapshot: Option<PathBuf>,
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        shutdown.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")
}

fn new_generator(config: &AmcConfig) -> ActionGenerator {
    ActionGenerator::new(
        config.heartbeat_timeout(),
        config.inactivity_timeout(),
        Box::new(ThreadRandom),
    )
}

/// Sleep up to `interval`, waking early on shutdown
async fn wait(shutdown: &AtomicBool, interval: Duration) {
    let deadline = Instant::now() + interval;
    while !shutdown.load(Ordering::SeqCst) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

fn run_snapshot(config: &AmcConfig, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot '{}'", path.display()))?;
    let state: Vec<DetailedCbsd> =
        serde_json::from_str(&content).context("Failed to parse snapshot")?;
    log::info!("Loaded {} CBSDs from '{}'", state.len(), path.display());

    let mut store = MemoryStore::from_state(state);
    let report = run_tick(&mut store, &mut new_generator(config), Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&report.actions)?);
    Ok(())
}

async fn connect(db_uri: String, shutdown: &AtomicBool, retry_interval: Duration) -> Result<Option<MongoStore>> {
    loop {
        let uri = db_uri.clone();
        match tokio::task::spawn_blocking(move || MongoStore::connect(&uri)).await? {
            Ok(store) => return Ok(Some(store)),
            Err(DbiError::Retry) => {
                log::warn!("Database not reachable, retrying in {retry_interval:?}");
                wait(shutdown, retry_interval).await;
                if shutdown.load(Ordering::SeqCst) {
                    return Ok(None);
                }
            }
            Err(e) => return Err(e).context("Failed to connect to database"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = AmcConfig::load(&args.config);
    let level = args
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().ok().map(|c| c.logger.level.clone()))
        .unwrap_or_else(|| "info".to_string());
    init_logging(&level);

    log::info!("Domain Proxy AMC v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(config) => config,
        Err(e @ ConfigError::Io { .. }) => {
            log::warn!("{e}. Using defaults.");
            AmcConfig::default()
        }
        Err(e) => return Err(e).context("Invalid configuration"),
    };
    if let Some(db_uri) = args.db_uri {
        config.db.uri = db_uri;
    }
    config.validate().context("Invalid configuration")?;

    if let Some(path) = &args.snapshot {
        return run_snapshot(&config, path);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    let interval = config.polling_interval();
    let Some(mut store) = connect(config.db.uri.clone(), &shutdown, interval).await? else {
        log::info!("AMC shutdown complete");
        return Ok(());
    };
    let mut generator = new_generator(&config);

    log::info!(
        "AMC ready (polling every {}s, heartbeat timeout {}s, inactivity timeout {}s)",
        config.amc.polling_interval_sec,
        config.amc.heartbeat_send_timeout_sec,
        config.amc.cbsd_inactivity_timeout_sec
    );

    // Main loop
    while !shutdown.load(Ordering::SeqCst) {
        let (returned_store, returned_generator, result) = tokio::task::spawn_blocking(move || {
            let result = run_tick(&mut store, &mut generator, Utc::now());
            (store, generator, result)
        })
        .await
        .context("Tick task failed")?;
        store = returned_store;
        generator = returned_generator;

        if let Err(e) = result {
            log::error!("Tick failed: {e}");
        }
        if args.once {
            break;
        }
        wait(&shutdown, interval).await;
    }

    log::info!("AMC shutdown complete");
    Ok(())
}
