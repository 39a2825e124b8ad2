use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;
use treeguard_core::monitor::resolve_root;
use treeguard_core::paths::{config_path, data_dir, snapshot_dir};
use treeguard_core::{
    snapshot_key, Baseline, IgnoreRules, Monitor, MonitorOptions, MonitorSettings, Persistence,
    Scanner, SnapshotStore, StreamHasher,
};

mod deliver;
mod notify;
mod poll_loop;
mod render;
mod sink;

use crate::deliver::{Delivery, Mode};
use crate::notify::select_notifier;
use crate::render::{select_paint, Tone};
use crate::sink::ReportFile;

#[derive(Parser, Debug)]
#[command(author, version, about = "Treeguard file integrity monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    opts: GlobalOpts,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare a folder against its stored snapshot once
    Check { folder: PathBuf },
    /// Keep checking a folder until interrupted
    Watch {
        folder: PathBuf,
        /// Seconds between cycles
        #[arg(short, long)]
        interval: Option<u64>,
    },
    /// Replace the stored snapshot with a fresh scan
    Baseline { folder: PathBuf },
    /// Delete the stored snapshot for a folder, or all snapshots
    Reset { folder: Option<PathBuf> },
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Hash algorithm: blake3, sha256 or sha512
    #[arg(short, long, global = true)]
    algorithm: Option<String>,
    /// Files hashed in parallel
    #[arg(long, global = true)]
    concurrency: Option<usize>,
    /// Max mtime difference in seconds for a delete+add to count as a move
    #[arg(long, global = true)]
    move_window: Option<f64>,
    /// Show file sizes in reports
    #[arg(short, long, global = true)]
    show_size: bool,
    /// Disable desktop notifications
    #[arg(long, global = true)]
    no_notifications: bool,
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
    /// Append reports to this file
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
    /// State directory (defaults to $TREEGUARD_DATA_DIR, then the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.opts.verbose);

    let data = match &cli.opts.data_dir {
        Some(dir) => dir.clone(),
        None => data_dir()?,
    };
    let settings = apply_overrides(MonitorSettings::load(&config_path(&data))?, &cli.opts);

    match cli.command {
        Commands::Check { folder } => check_command(&folder, &data, &settings),
        Commands::Watch { folder, interval } => {
            watch_command(&folder, &data, &settings, interval.unwrap_or(settings.interval_secs)).await
        }
        Commands::Baseline { folder } => baseline_command(&folder, &data, &settings),
        Commands::Reset { folder } => reset_command(folder.as_deref(), &data),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn apply_overrides(mut settings: MonitorSettings, opts: &GlobalOpts) -> MonitorSettings {
    if let Some(alg) = &opts.algorithm {
        settings.algorithm = alg.clone();
    }
    if let Some(n) = opts.concurrency {
        settings.concurrency = Some(n);
    }
    if let Some(window) = opts.move_window {
        settings.move_window_secs = window;
    }
    if opts.show_size {
        settings.show_size = true;
    }
    if opts.no_notifications {
        settings.notifications = false;
    }
    if opts.no_color {
        settings.color = false;
    }
    if let Some(out) = &opts.output {
        settings.report_file = Some(out.clone());
    }
    settings
}

/// Validate everything up front; nothing is written until this succeeds.
fn build_monitor(folder: &Path, data: &Path, settings: &MonitorSettings) -> Result<(Monitor, IgnoreRules)> {
    let algorithm = settings.hash_algorithm()?;
    if settings.move_window_secs.is_nan() || settings.move_window_secs < 0.0 {
        return Err(anyhow!("move window must be a non-negative number of seconds"));
    }
    let root = resolve_root(folder)?;
    let ignore = IgnoreRules::load(&root);
    let store = SnapshotStore::open(snapshot_dir(data))?;
    let monitor = Monitor::new(MonitorOptions {
        root,
        store,
        ignore: Box::new(ignore.clone()),
        hasher: Box::new(StreamHasher::new(algorithm)),
        scanner: Scanner::new(settings.scanner_config()),
        policy: settings.move_policy(),
    });
    Ok((monitor, ignore))
}

fn build_delivery(settings: &MonitorSettings) -> Delivery {
    Delivery {
        paint: select_paint(settings.color),
        notifier: select_notifier(settings.notifications),
        report_file: settings.report_file.clone().map(ReportFile::new),
        show_size: settings.show_size,
    }
}

fn print_banner(monitor: &Monitor, ignore: &IgnoreRules) {
    println!("Monitoring: {}", monitor.root().display());
    if !ignore.is_empty() {
        println!("Ignoring: {}", ignore.patterns().collect::<Vec<_>>().join(", "));
    }
    println!("Snapshot: {}", monitor.snapshot_path().display());
    println!("Algorithm: {}", monitor.hasher_name());
}

/// Scan and save a fresh baseline, reporting the outcome.
fn create_baseline(monitor: &Monitor, delivery: &Delivery) -> Result<treeguard_core::Snapshot> {
    println!("Creating baseline...");
    let outcome = monitor.baseline();
    if let Persistence::Failed(reason) = &outcome.persistence {
        return Err(anyhow!("cannot save baseline: {reason}"));
    }
    println!(
        "{}",
        delivery.paint.paint(
            &format!("Baseline created with {} files.", outcome.snapshot.len()),
            Tone::Info,
        )
    );
    Ok(outcome.snapshot)
}

fn check_command(folder: &Path, data: &Path, settings: &MonitorSettings) -> Result<()> {
    let (monitor, ignore) = build_monitor(folder, data, settings)?;
    let delivery = build_delivery(settings);
    print_banner(&monitor, &ignore);

    let mut current = match monitor.load_baseline() {
        Baseline::Present(snapshot) => snapshot,
        Baseline::Absent | Baseline::Corrupt(_) => {
            create_baseline(&monitor, &delivery)?;
            return Ok(());
        }
    };

    let outcome = monitor.run_cycle(&mut current);
    delivery.deliver(&outcome, Mode::Once);
    if let Persistence::Failed(reason) = &outcome.persistence {
        return Err(anyhow!("snapshot not saved: {reason}"));
    }
    Ok(())
}

async fn watch_command(folder: &Path, data: &Path, settings: &MonitorSettings, interval: u64) -> Result<()> {
    let (monitor, ignore) = build_monitor(folder, data, settings)?;
    let delivery = build_delivery(settings);
    print_banner(&monitor, &ignore);
    println!("Interval: {interval}s");
    println!("Press Ctrl+C to stop.\n");

    let current = match monitor.load_baseline() {
        Baseline::Present(snapshot) => snapshot,
        Baseline::Absent | Baseline::Corrupt(_) => create_baseline(&monitor, &delivery)?,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let summary = poll_loop::run_watch(
        Arc::new(monitor),
        current,
        Duration::from_secs(interval.max(1)),
        &delivery,
        shutdown_rx,
    )
    .await?;
    info!(cycles = summary.cycles, degraded = summary.degraded_cycles, "watch finished");
    println!("\nStopping treeguard.");
    Ok(())
}

fn baseline_command(folder: &Path, data: &Path, settings: &MonitorSettings) -> Result<()> {
    let (monitor, ignore) = build_monitor(folder, data, settings)?;
    let delivery = build_delivery(settings);
    print_banner(&monitor, &ignore);
    create_baseline(&monitor, &delivery)?;
    Ok(())
}

fn reset_command(folder: Option<&Path>, data: &Path) -> Result<()> {
    let store = SnapshotStore::open(snapshot_dir(data))?;
    match folder {
        Some(folder) => {
            let root = resolve_root(folder)?;
            if store.remove(&snapshot_key(&root))? {
                println!("Snapshot reset for '{}'.", root.display());
            } else {
                println!("No snapshot found for '{}'.", root.display());
            }
        }
        None => {
            let removed = store.clear()?;
            if removed > 0 {
                println!("All snapshots cleared ({removed} files).");
            } else {
                println!("No snapshots found to clear.");
            }
        }
    }
    Ok(())
}
