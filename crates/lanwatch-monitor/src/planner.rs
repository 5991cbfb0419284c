//! Discovery planning: when to rediscover subnets and how widely to sweep.
//!
//! Every third cycle widens the sweep from the curated candidate list to all
//! 256 third-octet values, so quiet subnets off the common ranges still get
//! picked up a few times an hour.

use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use lanwatch_core::SubnetPrefix;

use crate::scanner::SubnetScanner;

/// Minutes between discovery passes once at least one subnet is known.
pub const REDISCOVERY_INTERVAL_MINS: i64 = 10;

/// Third-octet candidates for a quick sweep, spanning the common ranges.
pub const QUICK_THIRD_OCTETS: [u8; 13] = [0, 1, 2, 3, 10, 11, 20, 50, 100, 150, 200, 254, 255];

/// Host offsets probed within each candidate /24. The first responder is
/// enough to declare the subnet active.
pub const PROBE_OFFSETS: [u8; 5] = [1, 10, 50, 100, 254];

/// Per-host probe timeout during discovery.
const PROBE_TIMEOUT: Duration = Duration::from_millis(800);

/// How widely a discovery pass sweeps the /16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Curated candidate third-octets only.
    Quick,
    /// All 256 third-octet values.
    Full,
}

/// Quick/Full alternation by cycle number: every third cycle sweeps fully.
pub fn scan_mode(cycle: u64) -> ScanMode {
    if cycle % 3 == 0 {
        ScanMode::Full
    } else {
        ScanMode::Quick
    }
}

/// Whether a discovery pass is due: always when nothing is known yet,
/// otherwise on the fixed rediscovery interval.
pub fn should_rediscover(
    now: DateTime<Utc>,
    last_discovery: Option<DateTime<Utc>>,
    known_subnet_count: usize,
) -> bool {
    if known_subnet_count == 0 {
        return true;
    }
    match last_discovery {
        None => true,
        Some(last) => now - last >= TimeDelta::minutes(REDISCOVERY_INTERVAL_MINS),
    }
}

/// The deterministic fallback target when discovery comes up empty:
/// the /24 containing the configured base address.
pub fn fallback_subnet(base: Ipv4Addr) -> SubnetPrefix {
    SubnetPrefix::from_addr(base)
}

/// Sweep the /16 above `base` for active /24s.
///
/// Each candidate subnet is probed at the fixed host offsets with a short
/// timeout, short-circuiting on the first responder. Never returns an empty
/// set: with no responders anywhere the fallback subnet is supplied so the
/// scan phase always has at least one target.
pub async fn discover_subnets<S: SubnetScanner>(
    scanner: &S,
    base: Ipv4Addr,
    mode: ScanMode,
) -> Vec<SubnetPrefix> {
    let base_prefix = SubnetPrefix::from_addr(base);
    let candidates: Vec<u8> = match mode {
        ScanMode::Quick => QUICK_THIRD_OCTETS.to_vec(),
        ScanMode::Full => (0..=255).collect(),
    };

    let mut active = Vec::new();
    for third in candidates {
        let prefix = base_prefix.with_third_octet(third);
        for offset in PROBE_OFFSETS {
            if scanner.probe_reachable(prefix.host(offset), PROBE_TIMEOUT).await {
                active.push(prefix);
                break;
            }
        }
    }

    if active.is_empty() {
        let fallback = fallback_subnet(base);
        tracing::warn!(
            prefix = %fallback,
            "Discovery found no active subnets, falling back to the base /24"
        );
        active.push(fallback);
    }

    active
}
