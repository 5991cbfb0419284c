//! Structured report types handed to reporter sinks.
//!
//! The monitor loop builds these from the model on its report cadences;
//! rendering (tables, color) is the sink's concern, not the core's.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::MonitoringModel;
use crate::types::{SubnetStatus, DETAIL_WINDOWS, SUMMARY_WINDOWS};

/// Per-subnet status report, emitted on the detail cadence (default 15 min).
#[derive(Debug, Clone, Serialize)]
pub struct DetailReport {
    pub cycle: u64,
    pub runtime_minutes: i64,
    pub subnets: Vec<SubnetDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubnetDetail {
    pub prefix: String,
    pub status: SubnetStatus,
    pub current_count: u32,
    pub peak_count: u32,
    pub scan_count: u64,
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceEntry {
    pub address: String,
    pub mac: String,
    pub vendor: String,
    /// Filled in by the loop for a small sample of devices; `None` means the
    /// device was not probed, not that no ports are open.
    pub open_ports: Option<Vec<u16>>,
}

impl DetailReport {
    /// Build a detail report from the model. `open_ports` is left unset;
    /// the loop fills it for sampled devices before handing the report off.
    pub fn build(model: &MonitoringModel, now: DateTime<Utc>) -> Self {
        let subnets = model
            .subnets
            .iter()
            .map(|(prefix, record)| SubnetDetail {
                prefix: prefix.clone(),
                status: SubnetStatus::derive(record.last_active, now, DETAIL_WINDOWS),
                current_count: record.current_device_count,
                peak_count: record.peak_device_count,
                scan_count: record.total_scans,
                devices: record
                    .current_devices
                    .iter()
                    .map(|d| DeviceEntry {
                        address: d.addr.to_string(),
                        mac: d.mac.clone(),
                        vendor: d.vendor.clone(),
                        open_ports: None,
                    })
                    .collect(),
            })
            .collect();

        Self {
            cycle: model.total_cycles,
            runtime_minutes: (now - model.started_at).num_minutes(),
            subnets,
        }
    }
}

/// Aggregate report, emitted on the summary cadence (default 2 h).
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub cycle: u64,
    pub runtime_hours: f64,
    pub subnet_count: usize,
    pub unique_device_count: usize,
    /// All subnets ordered by peak device count, busiest first.
    pub ranked_subnets: Vec<RankedSubnet>,
    pub persistent_devices: Vec<PersistentDevice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedSubnet {
    pub prefix: String,
    pub status: SubnetStatus,
    pub current_count: u32,
    pub peak_count: u32,
    pub scan_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersistentDevice {
    pub mac: String,
    pub vendor: String,
    pub home_subnet: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub address_count: usize,
}

impl SummaryReport {
    pub fn build(model: &MonitoringModel, now: DateTime<Utc>) -> Self {
        let mut ranked: Vec<RankedSubnet> = model
            .subnets
            .iter()
            .map(|(prefix, record)| RankedSubnet {
                prefix: prefix.clone(),
                status: SubnetStatus::derive(record.last_active, now, SUMMARY_WINDOWS),
                current_count: record.current_device_count,
                peak_count: record.peak_device_count,
                scan_count: record.total_scans,
            })
            .collect();
        // Busiest first; prefix order breaks ties so the ranking is stable.
        ranked.sort_by(|a, b| b.peak_count.cmp(&a.peak_count).then(a.prefix.cmp(&b.prefix)));

        let persistent_devices = model
            .persistent_devices(now)
            .into_iter()
            .map(|(mac, record)| PersistentDevice {
                mac: mac.to_string(),
                vendor: record.vendor.clone(),
                home_subnet: record.home_subnet.clone(),
                first_seen: record.first_seen,
                last_seen: record.last_seen,
                address_count: record.ip_history.len(),
            })
            .collect();

        Self {
            cycle: model.total_cycles,
            runtime_hours: (now - model.started_at).num_minutes() as f64 / 60.0,
            subnet_count: model.subnets.len(),
            unique_device_count: model.devices.len(),
            ranked_subnets: ranked,
            persistent_devices,
        }
    }
}
