//! lanwatch-monitor: Continuous subnet activity monitor for a /16 address space.
//!
//! Discovers which /24 subnets currently have live hosts, enumerates
//! non-infrastructure devices within each, and maintains a longitudinal
//! activity model, emitting periodic reports and a final snapshot.

pub mod classify;
pub mod config;
pub mod console;
pub mod error;
pub mod nmap_xml;
pub mod planner;
pub mod scanner;
pub mod scheduler;
pub mod snapshot;
