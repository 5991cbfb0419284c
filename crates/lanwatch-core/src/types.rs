//! Core domain types for subnet activity tracking.
//!
//! These types represent one run's view of a /16 address space: which /24
//! subnets have shown life, and which user devices have been observed where.

use std::fmt;
use std::net::Ipv4Addr;

use chrono::{DateTime, TimeDelta, Utc};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

// ── Subnet prefix ─────────────────────────────────────────────────

/// The first three octets of a /24 network, e.g. `192.168.5`.
///
/// Subnet records are keyed by the `Display` form of this prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubnetPrefix {
    octets: [u8; 3],
}

impl SubnetPrefix {
    pub fn new(a: u8, b: u8, c: u8) -> Self {
        Self { octets: [a, b, c] }
    }

    /// Derive the prefix of the /24 containing `addr`.
    pub fn from_addr(addr: Ipv4Addr) -> Self {
        let [a, b, c, _] = addr.octets();
        Self { octets: [a, b, c] }
    }

    /// Same first two octets, different third octet. Used when sweeping
    /// candidate /24s within a /16.
    pub fn with_third_octet(&self, third: u8) -> Self {
        Self {
            octets: [self.octets[0], self.octets[1], third],
        }
    }

    /// The host address at `offset` within this /24.
    pub fn host(&self, offset: u8) -> Ipv4Addr {
        Ipv4Addr::new(self.octets[0], self.octets[1], self.octets[2], offset)
    }

    /// The /24 network for this prefix, e.g. `192.168.5.0/24`.
    pub fn network(&self) -> Ipv4Net {
        Ipv4Net::new(self.host(0), 24).expect("/24 is a valid prefix length")
    }
}

impl fmt::Display for SubnetPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.octets[0], self.octets[1], self.octets[2])
    }
}

// ── Devices ───────────────────────────────────────────────────────

/// Canonical form of a hardware address for use as a map key.
/// MAC comparisons throughout lanwatch are case-insensitive.
pub fn canonical_mac(mac: &str) -> String {
    mac.trim().to_ascii_uppercase()
}

/// A single observation of a host during one subnet scan.
///
/// Ephemeral: produced by the scanner, consumed once by the classifier and
/// the model merge, not retained itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub addr: Ipv4Addr,
    pub mac: String,
    pub vendor: String,
    pub seen_at: DateTime<Utc>,
}

/// Longitudinal history for one unique hardware address, across the whole
/// monitored address space. Keyed by canonical MAC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub vendor: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Every address this MAC has ever been observed at, in insertion order,
    /// without duplicates. Never shrinks; no eviction for the life of a run.
    pub ip_history: Vec<String>,
    /// The prefix where this device was first recorded. A first-seen tag,
    /// not a live location: it does not change on later sightings.
    pub home_subnet: String,
}

// ── Subnets ───────────────────────────────────────────────────────

/// Activity record for one discovered /24, updated in place on every scan
/// and never deleted during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetRecord {
    pub first_seen: DateTime<Utc>,
    /// Time of the last completed scan of this subnet — last successful
    /// contact, not last nonzero device count. A zero-device scan still
    /// updates it.
    pub last_active: DateTime<Utc>,
    pub current_device_count: u32,
    /// Monotone: never decreases across merges.
    pub peak_device_count: u32,
    /// Increments exactly once per completed scan, zero-device scans included.
    pub total_scans: u64,
    /// Latest scan's device list, replaced wholesale each merge.
    pub current_devices: Vec<Device>,
}

/// How recently a subnet was successfully scanned, relative to a threshold
/// window set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetStatus {
    Active,
    Recent,
    Inactive,
}

impl SubnetStatus {
    /// Derive a status from the time since last successful contact.
    /// Boundaries are strict: a subnet exactly at `active_mins` is `Recent`.
    pub fn derive(last_active: DateTime<Utc>, now: DateTime<Utc>, windows: StatusWindows) -> Self {
        let elapsed = now - last_active;
        if elapsed < TimeDelta::minutes(windows.active_mins) {
            Self::Active
        } else if elapsed < TimeDelta::minutes(windows.recent_mins) {
            Self::Recent
        } else {
            Self::Inactive
        }
    }
}

impl fmt::Display for SubnetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Recent => write!(f, "recent"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

/// An Active/Recent cutoff pair, in minutes since last contact.
///
/// The two report cadences intentionally use different windows matched to
/// their own period: a subnet that looks stale fifteen minutes into a detail
/// window can still be "active" on a two-hour summary horizon.
#[derive(Debug, Clone, Copy)]
pub struct StatusWindows {
    pub active_mins: i64,
    pub recent_mins: i64,
}

/// Window set used by the detail report.
pub const DETAIL_WINDOWS: StatusWindows = StatusWindows {
    active_mins: 5,
    recent_mins: 15,
};

/// Window set used by the summary report.
pub const SUMMARY_WINDOWS: StatusWindows = StatusWindows {
    active_mins: 30,
    recent_mins: 120,
};
