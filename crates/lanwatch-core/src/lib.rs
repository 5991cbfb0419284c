//! lanwatch-core: Shared types and the longitudinal activity model for lanwatch.
//!
//! This crate provides the foundational pieces used by the monitor daemon:
//! - Domain types (`Device`, `SubnetPrefix`, `SubnetRecord`, `DeviceRecord`)
//! - The `MonitoringModel` — the single owned mutable state of a run,
//!   merged from scan results and flushed to a snapshot at shutdown
//! - Structured report types handed to reporter sinks

pub mod model;
pub mod report;
pub mod types;

pub use model::{ModelSnapshot, MonitoringModel};
pub use types::{Device, DeviceRecord, SubnetPrefix, SubnetRecord, SubnetStatus};
