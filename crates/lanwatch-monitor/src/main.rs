//! CLI entry point for the lanwatch monitor daemon.

use std::net::Ipv4Addr;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use lanwatch_monitor::config::MonitorConfig;
use lanwatch_monitor::console::ConsoleReporter;
use lanwatch_monitor::scanner::NmapScanner;
use lanwatch_monitor::scheduler::MonitorLoop;
use lanwatch_monitor::snapshot::JsonSnapshotWriter;

#[derive(Parser)]
#[command(name = "lanwatch")]
#[command(about = "Continuous subnet activity monitor for a /16 address space")]
struct Cli {
    /// Base address of the monitored /16 (e.g. 192.168.0.0).
    #[arg(short, long)]
    base_network: Option<Ipv4Addr>,

    /// Minutes between detail reports.
    #[arg(long)]
    detail_interval: Option<u64>,

    /// Hours between summary reports.
    #[arg(long)]
    summary_interval: Option<u64>,

    /// Directory the final snapshot is written to.
    #[arg(long)]
    snapshot_dir: Option<String>,

    /// Run a single monitoring cycle and exit.
    #[arg(long)]
    once: bool,

    /// Config file prefix (default: lanwatch).
    #[arg(short, long, default_value = "lanwatch")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut config = MonitorConfig::load(&cli.config)?;
    if let Some(base) = cli.base_network {
        config.base_network = base;
    }
    if let Some(mins) = cli.detail_interval {
        config.detail_interval_mins = mins;
    }
    if let Some(hours) = cli.summary_interval {
        config.summary_interval_hours = hours;
    }
    if let Some(dir) = cli.snapshot_dir {
        config.snapshot_dir = dir;
    }

    // Verify nmap installation before entering the loop.
    let scanner = NmapScanner::new(&config.nmap_path);
    let version = scanner.verify_installation().await?;
    tracing::info!(
        nmap_version = %version.lines().next().unwrap_or_default(),
        "Nmap verified"
    );

    let reporter = Box::new(ConsoleReporter);
    let snapshots = Box::new(JsonSnapshotWriter::new(&config.snapshot_dir));

    tracing::info!(
        base = %config.base_network,
        detail_mins = config.detail_interval_mins,
        summary_hours = config.summary_interval_hours,
        "Starting monitor"
    );
    let monitor = MonitorLoop::new(config, scanner, reporter, snapshots);

    let path = if cli.once {
        monitor.run_once().await?
    } else {
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received, finishing current cycle");
                let _ = tx.send(true);
            }
        });
        monitor.run(rx).await?
    };

    tracing::info!(path = %path.display(), "Run complete");
    Ok(())
}
