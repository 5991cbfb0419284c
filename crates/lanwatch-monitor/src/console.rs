//! Reporter sink: renders structured reports for the operator.

use lanwatch_core::report::{DetailReport, SummaryReport};

/// Sink receiving structured report data on each cadence.
pub trait Reporter {
    fn detail(&self, report: &DetailReport);
    fn summary(&self, report: &SummaryReport);
}

/// Renders reports as plain text on stdout.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn detail(&self, report: &DetailReport) {
        println!();
        println!(
            "=== Subnet detail — cycle {}, {} min runtime ===",
            report.cycle, report.runtime_minutes
        );
        for subnet in &report.subnets {
            println!(
                "{:<13} {:<9} devices {:>3}  peak {:>3}  scans {:>4}",
                format!("{}.0/24", subnet.prefix),
                subnet.status,
                subnet.current_count,
                subnet.peak_count,
                subnet.scan_count
            );
            for device in &subnet.devices {
                let ports = match &device.open_ports {
                    Some(ports) if !ports.is_empty() => format!(
                        "  open: {}",
                        ports
                            .iter()
                            .map(u16::to_string)
                            .collect::<Vec<_>>()
                            .join(",")
                    ),
                    Some(_) => "  open: none".to_string(),
                    None => String::new(),
                };
                println!(
                    "    {:<15} {:<17} {}{}",
                    device.address, device.mac, device.vendor, ports
                );
            }
        }
    }

    fn summary(&self, report: &SummaryReport) {
        println!();
        println!(
            "=== Summary — cycle {}, {:.1} h runtime ===",
            report.cycle, report.runtime_hours
        );
        println!(
            "{} subnets seen, {} unique devices",
            report.subnet_count, report.unique_device_count
        );
        for (rank, subnet) in report.ranked_subnets.iter().enumerate() {
            let marker = if rank < 3 { "*" } else { " " };
            println!(
                " {marker} #{:<3} {:<13} {:<9} peak {:>3}  now {:>3}  scans {:>4}",
                rank + 1,
                format!("{}.0/24", subnet.prefix),
                subnet.status,
                subnet.peak_count,
                subnet.current_count,
                subnet.scan_count
            );
        }
        if !report.persistent_devices.is_empty() {
            println!("Persistent devices:");
            for device in &report.persistent_devices {
                println!(
                    "    {:<17} {:<24} home {:<13} addresses {}",
                    device.mac, device.vendor, device.home_subnet, device.address_count
                );
            }
        }
    }
}
