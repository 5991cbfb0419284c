//! The scanner collaborator: host discovery and probing.
//!
//! The monitoring core only consumes scan results; how hosts are actually
//! probed is behind the [`SubnetScanner`] trait. The shipped implementation
//! wraps nmap as a child process via `tokio::process::Command` and parses
//! its XML output.

use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::Utc;
use tokio::process::Command;
use uuid::Uuid;

use lanwatch_core::{Device, SubnetPrefix};

use crate::error::{MonitorError, Result};
use crate::nmap_xml::{self, NmapRun};

/// Fixed probe set for the best-effort open-port check.
pub const PROBE_PORTS: [u16; 4] = [80, 443, 22, 8080];

/// Host discovery and probing capability consumed by the monitor loop.
#[allow(async_fn_in_trait)]
pub trait SubnetScanner {
    /// Enumerate live hosts in the given /24.
    async fn discover_hosts(&self, prefix: &SubnetPrefix) -> Result<Vec<Device>>;

    /// Whether a single address answers within `timeout`. Probe errors count
    /// as unreachable; discovery never fails outright on a bad probe.
    async fn probe_reachable(&self, addr: Ipv4Addr, timeout: Duration) -> bool;

    /// Which of [`PROBE_PORTS`] are open on the given address.
    async fn probe_open_ports(&self, addr: Ipv4Addr) -> Result<Vec<u16>>;
}

/// Wrapper around the nmap binary.
pub struct NmapScanner {
    nmap_path: String,
}

impl NmapScanner {
    pub fn new(nmap_path: &str) -> Self {
        Self {
            nmap_path: nmap_path.to_string(),
        }
    }

    /// Verify nmap is installed and accessible.
    pub async fn verify_installation(&self) -> Result<String> {
        let output = Command::new(&self.nmap_path)
            .arg("--version")
            .output()
            .await
            .map_err(|_| MonitorError::NmapNotFound {
                path: self.nmap_path.clone(),
            })?;

        String::from_utf8(output.stdout).map_err(|e| MonitorError::XmlParse(e.to_string()))
    }

    /// Run nmap with the given arguments plus `-oX -` and parse the XML.
    async fn run_nmap(&self, args: &[String]) -> Result<NmapRun> {
        let output = Command::new(&self.nmap_path)
            .args(args)
            .arg("-oX")
            .arg("-")
            .arg("--noninteractive")
            .output()
            .await
            .map_err(|_| MonitorError::NmapNotFound {
                path: self.nmap_path.clone(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(MonitorError::NmapFailed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        nmap_xml::parse_nmap_xml(&output.stdout)
    }
}

impl SubnetScanner for NmapScanner {
    /// Ping sweep of the whole /24. Hosts that answer without a MAC address
    /// (typically the scanning machine itself) are not trackable and are
    /// dropped here.
    async fn discover_hosts(&self, prefix: &SubnetPrefix) -> Result<Vec<Device>> {
        let scan_id = Uuid::new_v4();
        let target = prefix.network().to_string();
        tracing::debug!(scan_id = %scan_id, target = %target, "Starting host sweep");

        let run = self.run_nmap(&["-sn".to_string(), target.clone()]).await?;
        let now = Utc::now();

        let devices: Vec<Device> = run
            .hosts
            .iter()
            .filter(|h| h.is_up())
            .filter_map(|h| {
                let addr: Ipv4Addr = h.ipv4()?.parse().ok()?;
                let mac = h.mac()?.to_string();
                Some(Device {
                    addr,
                    mac,
                    vendor: h.mac_vendor().unwrap_or("Unknown").to_string(),
                    seen_at: now,
                })
            })
            .collect();

        tracing::info!(
            scan_id = %scan_id,
            target = %target,
            hosts = devices.len(),
            "Host sweep complete"
        );

        Ok(devices)
    }

    async fn probe_reachable(&self, addr: Ipv4Addr, timeout: Duration) -> bool {
        let ms = timeout.as_millis().max(1);
        let args = vec![
            "-sn".to_string(),
            "--host-timeout".to_string(),
            format!("{ms}ms"),
            addr.to_string(),
        ];

        match self.run_nmap(&args).await {
            Ok(run) => run.hosts.iter().any(|h| h.is_up()),
            Err(e) => {
                tracing::debug!(addr = %addr, error = %e, "Reachability probe failed");
                false
            }
        }
    }

    async fn probe_open_ports(&self, addr: Ipv4Addr) -> Result<Vec<u16>> {
        let ports = PROBE_PORTS.map(|p| p.to_string()).join(",");
        let run = self
            .run_nmap(&["-p".to_string(), ports, addr.to_string()])
            .await?;

        Ok(run
            .hosts
            .iter()
            .filter(|h| h.is_up())
            .flat_map(|h| h.open_tcp_ports())
            .collect())
    }
}
