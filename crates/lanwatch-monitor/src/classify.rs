//! Infrastructure classification.
//!
//! Separates routers and access points from trackable user devices so the
//! activity model only follows the latter. The deny lists are fixed policy:
//! known gateway hardware addresses, manufacturer OUI blocks, and vendor
//! name fragments for common network equipment makers.

/// Exact hardware addresses of known routers and access points.
const ROUTER_MACS: &[&str] = &[
    "64:D1:54:9C:2E:41",
    "E4:8D:8C:61:07:AA",
    "C0:25:E9:44:B1:05",
];

/// Manufacturer blocks (first three octets) belonging to network
/// infrastructure vendors.
const INFRA_MAC_PREFIXES: &[&str] = &[
    // MikroTik / RouterBOARD
    "4C:5E:0C",
    "6C:3B:6B",
    "B8:69:F4",
    "D4:CA:6D",
    "E4:8D:8C",
    "64:D1:54",
    // TP-Link
    "14:CC:20",
    "50:C7:BF",
    "C0:25:E9",
    "F4:F2:6D",
    // Ubiquiti
    "24:A4:3C",
    "78:8A:20",
    "FC:EC:DA",
];

/// Vendor name fragments that mark a host as infrastructure.
const INFRA_VENDOR_FRAGMENTS: &[&str] = &[
    "mikrotik",
    "routerboard",
    "tp-link",
    "ubiquiti",
    "unifi",
    "cisco",
    "d-link",
    "netgear",
    "zyxel",
    "huawei",
    "aruba",
    "juniper",
];

/// Decide whether a discovered host is infrastructure (router/AP) rather
/// than a trackable user device.
///
/// Pure and total: the same `(mac, vendor)` pair always yields the same
/// answer. All comparisons are case-insensitive.
pub fn is_infrastructure(mac: &str, vendor: &str) -> bool {
    let mac = mac.trim().to_ascii_uppercase();
    if ROUTER_MACS.contains(&mac.as_str()) {
        return true;
    }
    if INFRA_MAC_PREFIXES.iter().any(|p| mac.starts_with(p)) {
        return true;
    }
    let vendor = vendor.to_lowercase();
    INFRA_VENDOR_FRAGMENTS.iter().any(|f| vendor.contains(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_router_mac_any_case() {
        assert!(is_infrastructure("64:D1:54:9C:2E:41", ""));
        assert!(is_infrastructure("64:d1:54:9c:2e:41", ""));
    }

    #[test]
    fn test_oui_prefix_match() {
        assert!(is_infrastructure("4C:5E:0C:12:34:56", "SomeVendor"));
        assert!(is_infrastructure("f4:f2:6d:00:00:01", ""));
        // Same bytes deeper in the address do not count.
        assert!(!is_infrastructure("AA:4C:5E:0C:00:01", "Acme Computer"));
    }

    #[test]
    fn test_vendor_substring_match() {
        // Matches on vendor fragment even though the MAC is unlisted.
        assert!(is_infrastructure("AA:BB:CC:DD:EE:FF", "TP-Link Technologies"));
        assert!(is_infrastructure("AA:BB:CC:DD:EE:FF", "Mikrotik Networks"));
        assert!(is_infrastructure("AA:BB:CC:DD:EE:FF", "CISCO SYSTEMS, INC."));
    }

    #[test]
    fn test_user_device_passes() {
        assert!(!is_infrastructure("AA:BB:CC:DD:EE:FF", "Apple, Inc."));
        assert!(!is_infrastructure("00:16:3E:11:22:33", "Xensource, Inc."));
        assert!(!is_infrastructure("AA:BB:CC:DD:EE:FF", ""));
    }

    #[test]
    fn test_deterministic() {
        let inputs = [
            ("AA:BB:CC:DD:EE:FF", "TP-Link Technologies"),
            ("00:16:3E:11:22:33", "Xensource, Inc."),
        ];
        for (mac, vendor) in inputs {
            let first = is_infrastructure(mac, vendor);
            for _ in 0..10 {
                assert_eq!(is_infrastructure(mac, vendor), first);
            }
        }
    }
}
