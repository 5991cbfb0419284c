//! The monitoring loop: one cooperative scheduler driving four cadences.
//!
//! A fixed 60-second cycle carries four independently-timed concerns:
//! subnet discovery (10-minute interval, Quick/Full by cycle parity), the
//! unconditional per-subnet scan phase, the detail report, and the summary
//! report. The timers are orthogonal comparator checks against stored
//! last-fired timestamps, not a single state enum.
//!
//! Cancellation is polled at the top of each iteration: an in-flight cycle
//! completes, a new one never starts after the flag is set. Every exit path,
//! including a fatal scanner error, runs the finalization sequence — one
//! last summary report and the model snapshot.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;

use lanwatch_core::report::{DetailReport, SummaryReport};
use lanwatch_core::{Device, MonitoringModel, SubnetPrefix};

use crate::classify;
use crate::config::MonitorConfig;
use crate::console::Reporter;
use crate::error::{MonitorError, Result};
use crate::planner;
use crate::scanner::SubnetScanner;
use crate::snapshot::SnapshotWriter;

/// Fixed inter-cycle sleep. All timer checks have at most this granularity.
pub const CYCLE_INTERVAL: Duration = Duration::from_secs(60);

/// At most this many devices per subnet get a port probe in a detail report.
const PORT_PROBE_SAMPLE: usize = 3;

/// The top-level monitor: owns the model (single-writer discipline) and the
/// working subnet set, and drives the scanner on each cadence.
pub struct MonitorLoop<S> {
    config: MonitorConfig,
    scanner: S,
    reporter: Box<dyn Reporter>,
    snapshots: Box<dyn SnapshotWriter>,
    model: MonitoringModel,
    subnets: Vec<SubnetPrefix>,
    last_discovery: Option<DateTime<Utc>>,
    last_detail: DateTime<Utc>,
    last_summary: DateTime<Utc>,
}

impl<S: SubnetScanner> MonitorLoop<S> {
    pub fn new(
        config: MonitorConfig,
        scanner: S,
        reporter: Box<dyn Reporter>,
        snapshots: Box<dyn SnapshotWriter>,
    ) -> Self {
        let now = Utc::now();
        Self {
            config,
            scanner,
            reporter,
            snapshots,
            model: MonitoringModel::new(now),
            subnets: Vec::new(),
            last_discovery: None,
            last_detail: now,
            last_summary: now,
        }
    }

    /// Run until the cancellation flag is observed or a fatal error stops
    /// the loop, then finalize. Returns the snapshot path.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) -> Result<PathBuf> {
        let outcome = self.run_cycles(&mut cancel).await;
        if let Err(e) = &outcome {
            tracing::error!(error = %e, "Monitor loop stopped on error");
        }
        let path = self.finalize()?;
        outcome.map(|()| path)
    }

    /// Run exactly one cycle, then finalize.
    pub async fn run_once(mut self) -> Result<PathBuf> {
        let outcome = self.run_cycle().await;
        if let Err(e) = &outcome {
            tracing::error!(error = %e, "Monitoring cycle failed");
        }
        let path = self.finalize()?;
        outcome.map(|()| path)
    }

    async fn run_cycles(&mut self, cancel: &mut watch::Receiver<bool>) -> Result<()> {
        loop {
            if *cancel.borrow() {
                tracing::info!("Cancellation observed, stopping before next cycle");
                return Ok(());
            }
            self.run_cycle().await?;
            tokio::select! {
                _ = tokio::time::sleep(CYCLE_INTERVAL) => {}
                _ = cancel.changed() => {}
            }
        }
    }

    /// One full cycle: discovery if due, scan every monitored subnet, then
    /// evaluate the report timers.
    async fn run_cycle(&mut self) -> Result<()> {
        self.model.total_cycles += 1;
        let cycle = self.model.total_cycles;
        let now = Utc::now();

        if planner::should_rediscover(now, self.last_discovery, self.subnets.len()) {
            let mode = planner::scan_mode(cycle);
            tracing::info!(cycle, mode = ?mode, "Running subnet discovery");
            self.subnets =
                planner::discover_subnets(&self.scanner, self.config.base_network, mode).await;
            self.last_discovery = Some(Utc::now());
            tracing::info!(cycle, subnet_count = self.subnets.len(), "Discovery complete");
        }

        for prefix in self.subnets.clone() {
            match self.scanner.discover_hosts(&prefix).await {
                Ok(hosts) => {
                    let host_count = hosts.len();
                    let devices: Vec<Device> = hosts
                        .into_iter()
                        .filter(|d| !classify::is_infrastructure(&d.mac, &d.vendor))
                        .collect();
                    tracing::debug!(
                        prefix = %prefix,
                        hosts = host_count,
                        devices = devices.len(),
                        "Subnet scan merged"
                    );
                    self.model.merge_subnet_scan(&prefix, devices, Utc::now());
                }
                // Without the scanner binary no later cycle can succeed.
                Err(e @ MonitorError::NmapNotFound { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        prefix = %prefix,
                        error = %e,
                        "Subnet scan failed, skipping merge this cycle"
                    );
                }
            }
        }

        let now = Utc::now();
        if self.detail_due(now) {
            self.emit_detail(now).await;
            self.last_detail = now;
        }
        if self.summary_due(now) {
            self.emit_summary(now);
            self.last_summary = now;
        }

        Ok(())
    }

    fn detail_due(&self, now: DateTime<Utc>) -> bool {
        now - self.last_detail >= TimeDelta::minutes(self.config.detail_interval_mins as i64)
    }

    fn summary_due(&self, now: DateTime<Utc>) -> bool {
        now - self.last_summary >= TimeDelta::hours(self.config.summary_interval_hours as i64)
    }

    /// Build and emit a detail report, port-probing the first few devices of
    /// each subnet best-effort. A failed probe leaves `open_ports` unset.
    async fn emit_detail(&mut self, now: DateTime<Utc>) {
        let mut report = DetailReport::build(&self.model, now);

        for subnet in &mut report.subnets {
            for entry in subnet.devices.iter_mut().take(PORT_PROBE_SAMPLE) {
                let Ok(addr) = entry.address.parse::<Ipv4Addr>() else {
                    continue;
                };
                match self.scanner.probe_open_ports(addr).await {
                    Ok(ports) => entry.open_ports = Some(ports),
                    Err(e) => {
                        tracing::debug!(addr = %entry.address, error = %e, "Port probe failed");
                    }
                }
            }
        }

        self.model.detail_reports += 1;
        self.reporter.detail(&report);
    }

    fn emit_summary(&mut self, now: DateTime<Utc>) {
        let report = SummaryReport::build(&self.model, now);
        self.model.summary_reports += 1;
        self.reporter.summary(&report);
    }

    /// Runs on every exit path: one final summary, then the full snapshot.
    fn finalize(&mut self) -> Result<PathBuf> {
        let now = Utc::now();
        tracing::info!(
            cycles = self.model.total_cycles,
            subnets = self.model.subnets.len(),
            devices = self.model.devices.len(),
            "Finalizing run"
        );
        self.emit_summary(now);
        self.snapshots.write(&self.model.snapshot(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    enum DiscoverBehavior {
        /// Per-prefix device lists; unknown prefixes yield empty scans.
        Hosts(HashMap<String, Vec<Device>>),
        NmapMissing,
        NmapFailed,
    }

    struct ScriptedScanner {
        reachable: HashSet<Ipv4Addr>,
        behavior: DiscoverBehavior,
        port_probes: AtomicUsize,
    }

    impl SubnetScanner for ScriptedScanner {
        async fn discover_hosts(&self, prefix: &SubnetPrefix) -> Result<Vec<Device>> {
            match &self.behavior {
                DiscoverBehavior::Hosts(map) => {
                    Ok(map.get(&prefix.to_string()).cloned().unwrap_or_default())
                }
                DiscoverBehavior::NmapMissing => Err(MonitorError::NmapNotFound {
                    path: "nmap".to_string(),
                }),
                DiscoverBehavior::NmapFailed => Err(MonitorError::NmapFailed {
                    code: 1,
                    stderr: "host seems down".to_string(),
                }),
            }
        }

        async fn probe_reachable(&self, addr: Ipv4Addr, _timeout: Duration) -> bool {
            self.reachable.contains(&addr)
        }

        async fn probe_open_ports(&self, _addr: Ipv4Addr) -> Result<Vec<u16>> {
            self.port_probes.fetch_add(1, Ordering::SeqCst);
            Ok(vec![80])
        }
    }

    #[derive(Clone, Default)]
    struct RecordingReporter {
        details: Arc<Mutex<Vec<DetailReport>>>,
        summaries: Arc<Mutex<Vec<SummaryReport>>>,
    }

    impl Reporter for RecordingReporter {
        fn detail(&self, report: &DetailReport) {
            self.details.lock().unwrap().push(report.clone());
        }

        fn summary(&self, report: &SummaryReport) {
            self.summaries.lock().unwrap().push(report.clone());
        }
    }

    fn device(prefix: &SubnetPrefix, last_octet: u8, mac: &str, vendor: &str) -> Device {
        Device {
            addr: prefix.host(last_octet),
            mac: mac.to_string(),
            vendor: vendor.to_string(),
            seen_at: Utc::now(),
        }
    }

    fn test_loop(
        scanner: ScriptedScanner,
        snapshot_dir: &std::path::Path,
    ) -> (MonitorLoop<ScriptedScanner>, RecordingReporter) {
        let reporter = RecordingReporter::default();
        let config = MonitorConfig {
            snapshot_dir: snapshot_dir.to_string_lossy().into_owned(),
            ..MonitorConfig::default()
        };
        let monitor = MonitorLoop::new(
            config,
            scanner,
            Box::new(reporter.clone()),
            Box::new(crate::snapshot::JsonSnapshotWriter::new(snapshot_dir)),
        );
        (monitor, reporter)
    }

    #[tokio::test]
    async fn test_first_cycle_discovers_scans_and_filters() {
        let prefix = SubnetPrefix::new(192, 168, 1);
        let mut hosts = HashMap::new();
        hosts.insert(
            prefix.to_string(),
            vec![
                device(&prefix, 1, "E4:8D:8C:61:07:AA", "Routerboard.com"),
                device(&prefix, 23, "AA:BB:CC:DD:EE:01", "Apple, Inc."),
            ],
        );
        let scanner = ScriptedScanner {
            reachable: [prefix.host(1)].into(),
            behavior: DiscoverBehavior::Hosts(hosts),
            port_probes: AtomicUsize::new(0),
        };

        let dir = tempfile::tempdir().unwrap();
        let (mut monitor, _reporter) = test_loop(scanner, dir.path());

        monitor.run_cycle().await.unwrap();

        assert_eq!(monitor.model.total_cycles, 1);
        assert_eq!(monitor.subnets, vec![prefix]);
        assert!(monitor.last_discovery.is_some());

        // The router is filtered; only the user device is tracked.
        let record = monitor.model.subnets.get("192.168.1").unwrap();
        assert_eq!(record.current_device_count, 1);
        assert_eq!(record.total_scans, 1);
        assert!(monitor.model.devices.contains_key("AA:BB:CC:DD:EE:01"));
        assert!(!monitor.model.devices.contains_key("E4:8D:8C:61:07:AA"));
    }

    #[tokio::test]
    async fn test_scan_failure_skips_merge_and_continues() {
        let scanner = ScriptedScanner {
            reachable: HashSet::new(),
            behavior: DiscoverBehavior::NmapFailed,
            port_probes: AtomicUsize::new(0),
        };
        let dir = tempfile::tempdir().unwrap();
        let (mut monitor, _reporter) = test_loop(scanner, dir.path());

        // Discovery falls back to the base /24; its scan fails and is skipped.
        monitor.run_cycle().await.unwrap();
        assert_eq!(monitor.model.total_cycles, 1);
        assert!(monitor.model.subnets.is_empty());
    }

    #[tokio::test]
    async fn test_missing_scanner_is_fatal_but_still_finalizes() {
        let scanner = ScriptedScanner {
            reachable: HashSet::new(),
            behavior: DiscoverBehavior::NmapMissing,
            port_probes: AtomicUsize::new(0),
        };
        let dir = tempfile::tempdir().unwrap();
        let (monitor, reporter) = test_loop(scanner, dir.path());

        let (_tx, rx) = watch::channel(false);
        let err = monitor.run(rx).await.unwrap_err();
        assert!(matches!(err, MonitorError::NmapNotFound { .. }));

        // Finalization still produced the summary and the snapshot.
        assert_eq!(reporter.summaries.lock().unwrap().len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_before_first_cycle() {
        let scanner = ScriptedScanner {
            reachable: HashSet::new(),
            behavior: DiscoverBehavior::Hosts(HashMap::new()),
            port_probes: AtomicUsize::new(0),
        };
        let dir = tempfile::tempdir().unwrap();
        let (monitor, reporter) = test_loop(scanner, dir.path());

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        monitor.run(rx).await.unwrap();

        // No cycle ran, but finalization did.
        assert_eq!(reporter.summaries.lock().unwrap().len(), 1);
        assert_eq!(reporter.details.lock().unwrap().len(), 0);
        assert_eq!(reporter.summaries.lock().unwrap()[0].cycle, 0);
    }

    #[tokio::test]
    async fn test_detail_timer_fires_once_per_elapsed_interval() {
        let scanner = ScriptedScanner {
            reachable: HashSet::new(),
            behavior: DiscoverBehavior::Hosts(HashMap::new()),
            port_probes: AtomicUsize::new(0),
        };
        let dir = tempfile::tempdir().unwrap();
        let (mut monitor, reporter) = test_loop(scanner, dir.path());

        // Interval elapsed: the report fires and the timer resets.
        monitor.last_detail = Utc::now() - TimeDelta::minutes(16);
        monitor.run_cycle().await.unwrap();
        assert_eq!(reporter.details.lock().unwrap().len(), 1);

        // Next cycle, timer freshly reset: no second report.
        monitor.run_cycle().await.unwrap();
        assert_eq!(reporter.details.lock().unwrap().len(), 1);
        assert_eq!(monitor.model.detail_reports, 1);
    }

    #[tokio::test]
    async fn test_summary_timer_independent_of_detail() {
        let scanner = ScriptedScanner {
            reachable: HashSet::new(),
            behavior: DiscoverBehavior::Hosts(HashMap::new()),
            port_probes: AtomicUsize::new(0),
        };
        let dir = tempfile::tempdir().unwrap();
        let (mut monitor, reporter) = test_loop(scanner, dir.path());

        monitor.last_summary = Utc::now() - TimeDelta::hours(3);
        monitor.run_cycle().await.unwrap();

        assert_eq!(reporter.summaries.lock().unwrap().len(), 1);
        assert_eq!(reporter.details.lock().unwrap().len(), 0);
        assert_eq!(monitor.model.summary_reports, 1);
    }

    #[tokio::test]
    async fn test_detail_report_probes_at_most_three_devices() {
        let prefix = SubnetPrefix::new(192, 168, 0);
        let mut hosts = HashMap::new();
        hosts.insert(
            prefix.to_string(),
            (0..5)
                .map(|i| {
                    device(
                        &prefix,
                        30 + i,
                        &format!("AA:BB:CC:DD:EE:{i:02X}"),
                        "Acme Computer",
                    )
                })
                .collect(),
        );
        // Nothing reachable: discovery falls back to 192.168.0 where the
        // scripted hosts live.
        let scanner = ScriptedScanner {
            reachable: HashSet::new(),
            behavior: DiscoverBehavior::Hosts(hosts),
            port_probes: AtomicUsize::new(0),
        };
        let dir = tempfile::tempdir().unwrap();
        let (mut monitor, reporter) = test_loop(scanner, dir.path());

        monitor.last_detail = Utc::now() - TimeDelta::minutes(20);
        monitor.run_cycle().await.unwrap();

        assert_eq!(monitor.scanner.port_probes.load(Ordering::SeqCst), 3);

        let details = reporter.details.lock().unwrap();
        let subnet = &details[0].subnets[0];
        assert_eq!(subnet.devices.len(), 5);
        let probed = subnet
            .devices
            .iter()
            .filter(|d| d.open_ports.is_some())
            .count();
        assert_eq!(probed, 3);
    }
}
