//! The monitoring model — the single owned mutable state of a run.
//!
//! All scan results flow into the model through [`MonitoringModel::merge_subnet_scan`];
//! no other component mutates it. The scheduling loop owns the only instance,
//! so merges are strictly serialized and the monotone counters
//! (`total_scans`, `peak_device_count`) need no locking.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{canonical_mac, Device, DeviceRecord, SubnetPrefix, SubnetRecord};

/// A device counts as persistent once it has been known at least this long
/// and was seen within the same window.
const PERSISTENCE_WINDOW_MINS: i64 = 30;

/// Aggregate of all subnet and device records plus run-level counters.
///
/// Subnet records are keyed by the 3-octet prefix string (`"192.168.5"`),
/// device records by canonical (uppercase) MAC. Records are never deleted
/// during a run; both maps grow without bound for the life of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringModel {
    pub subnets: BTreeMap<String, SubnetRecord>,
    pub devices: BTreeMap<String, DeviceRecord>,
    pub started_at: DateTime<Utc>,
    pub total_cycles: u64,
    pub detail_reports: u64,
    pub summary_reports: u64,
}

impl MonitoringModel {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            subnets: BTreeMap::new(),
            devices: BTreeMap::new(),
            started_at,
            total_cycles: 0,
            detail_reports: 0,
            summary_reports: 0,
        }
    }

    /// Merge one completed subnet scan into the model.
    ///
    /// The subnet record is created on first contact and updated in place
    /// afterwards: `current_devices` is replaced wholesale (a device absent
    /// from the latest scan drops out of the current list even though its
    /// history remains), `total_scans` increments exactly once, and
    /// `last_active` is set unconditionally — a zero-device scan still proves
    /// the subnet was tested. Every observed device is upserted into the
    /// device history.
    pub fn merge_subnet_scan(
        &mut self,
        prefix: &SubnetPrefix,
        devices: Vec<Device>,
        now: DateTime<Utc>,
    ) {
        let key = prefix.to_string();

        for device in &devices {
            self.upsert_device(device, &key, now);
        }

        let record = self.subnets.entry(key.clone()).or_insert_with(|| {
            tracing::debug!(prefix = %key, "First contact with subnet");
            SubnetRecord {
                first_seen: now,
                last_active: now,
                current_device_count: 0,
                peak_device_count: 0,
                total_scans: 0,
                current_devices: Vec::new(),
            }
        });

        record.current_device_count = devices.len() as u32;
        record.peak_device_count = record.peak_device_count.max(record.current_device_count);
        record.total_scans += 1;
        record.last_active = now;
        record.current_devices = devices;
    }

    fn upsert_device(&mut self, device: &Device, home_subnet: &str, now: DateTime<Utc>) {
        let key = canonical_mac(&device.mac);
        let addr = device.addr.to_string();

        match self.devices.get_mut(&key) {
            Some(record) => {
                record.last_seen = now;
                if !record.ip_history.contains(&addr) {
                    record.ip_history.push(addr);
                }
            }
            None => {
                tracing::debug!(mac = %key, vendor = %device.vendor, "New device recorded");
                self.devices.insert(
                    key,
                    DeviceRecord {
                        vendor: device.vendor.clone(),
                        first_seen: now,
                        last_seen: now,
                        ip_history: vec![addr],
                        home_subnet: home_subnet.to_string(),
                    },
                );
            }
        }
    }

    /// Devices known for longer than the persistence window and still seen
    /// within it — long-term, currently-present devices. Used by the summary
    /// report.
    pub fn persistent_devices(&self, now: DateTime<Utc>) -> Vec<(&str, &DeviceRecord)> {
        let window = TimeDelta::minutes(PERSISTENCE_WINDOW_MINS);
        self.devices
            .iter()
            .filter(|(_, r)| now - r.first_seen > window && now - r.last_seen < window)
            .map(|(mac, r)| (mac.as_str(), r))
            .collect()
    }

    /// Flush the full model into the snapshot schema for persistence.
    pub fn snapshot(&self, ended_at: DateTime<Utc>) -> ModelSnapshot {
        ModelSnapshot {
            monitoring_info: MonitoringInfo {
                start_time: self.started_at,
                end_time: ended_at,
                detail_report_count: self.detail_reports,
                summary_report_count: self.summary_reports,
                total_cycles: self.total_cycles,
            },
            subnet_activity: self.subnets.clone(),
            device_history: self.devices.clone(),
        }
    }
}

/// The persisted form of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub monitoring_info: MonitoringInfo,
    pub subnet_activity: BTreeMap<String, SubnetRecord>,
    pub device_history: BTreeMap<String, DeviceRecord>,
}

/// Run-level counters carried in the snapshot header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringInfo {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub detail_report_count: u64,
    pub summary_report_count: u64,
    pub total_cycles: u64,
}
