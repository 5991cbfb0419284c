//! Configuration for the lanwatch monitor daemon.

use std::net::Ipv4Addr;

use serde::Deserialize;

use crate::error::{MonitorError, Result};

/// Monitor configuration.
///
/// Loaded from `lanwatch.toml` `[monitor]` section or
/// `LANWATCH__` environment variables. Scheduling policy that is not
/// listed here (rediscovery interval, status windows, probe offsets,
/// port probe set) is fixed, not runtime-configurable.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Base address of the monitored /16 (default: 192.168.0.0).
    #[serde(default = "default_base_network")]
    pub base_network: Ipv4Addr,

    /// Minutes between detail reports.
    #[serde(default = "default_detail_interval")]
    pub detail_interval_mins: u64,

    /// Hours between summary reports.
    #[serde(default = "default_summary_interval")]
    pub summary_interval_hours: u64,

    /// Path to the nmap binary (default: "nmap").
    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    /// Directory the final snapshot is written to.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
}

impl MonitorConfig {
    /// Load configuration from `{file_prefix}.toml` plus environment
    /// overrides, falling back to defaults when neither is present.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("LANWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| MonitorError::Config(e.to_string()))?;

        match cfg.get::<MonitorConfig>("monitor") {
            Ok(c) => Ok(c),
            Err(_) => Ok(Self::default()),
        }
    }
}

fn default_base_network() -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 0, 0)
}

fn default_detail_interval() -> u64 {
    15
}

fn default_summary_interval() -> u64 {
    2
}

fn default_nmap_path() -> String {
    "nmap".to_string()
}

fn default_snapshot_dir() -> String {
    "./snapshots".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_network: default_base_network(),
            detail_interval_mins: default_detail_interval(),
            summary_interval_hours: default_summary_interval(),
            nmap_path: default_nmap_path(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}
