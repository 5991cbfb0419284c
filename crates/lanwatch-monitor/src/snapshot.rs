//! Snapshot persistence for the final monitoring model.
//!
//! Snapshots are written once, at shutdown, as pretty-printed JSON with a
//! timestamped filename.

use std::fs;
use std::path::{Path, PathBuf};

use lanwatch_core::ModelSnapshot;

use crate::error::Result;

/// Persistence backend for the end-of-run model snapshot.
pub trait SnapshotWriter {
    /// Persist the snapshot, returning where it landed.
    fn write(&self, snapshot: &ModelSnapshot) -> Result<PathBuf>;
}

/// File-system backed snapshot writer.
///
/// Creates the target directory if it doesn't exist and names the file after
/// the write moment: `lanwatch-20260827-153000.json`.
pub struct JsonSnapshotWriter {
    dir: PathBuf,
}

impl JsonSnapshotWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl SnapshotWriter for JsonSnapshotWriter {
    fn write(&self, snapshot: &ModelSnapshot) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let stamp = snapshot.monitoring_info.end_time.format("%Y%m%d-%H%M%S");
        let path = self.dir.join(format!("lanwatch-{stamp}.json"));

        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json)?;

        tracing::info!(
            path = %path.display(),
            subnets = snapshot.subnet_activity.len(),
            devices = snapshot.device_history.len(),
            "Snapshot written"
        );

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lanwatch_core::MonitoringModel;

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonSnapshotWriter::new(dir.path().join("nested"));

        let now = Utc::now();
        let mut model = MonitoringModel::new(now);
        model.total_cycles = 3;
        let snapshot = model.snapshot(now);

        let path = writer.write(&snapshot).unwrap();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("lanwatch-"));

        let raw = fs::read_to_string(&path).unwrap();
        let back: ModelSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.monitoring_info.total_cycles, 3);
    }
}
