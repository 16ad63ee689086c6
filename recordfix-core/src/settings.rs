//! Clap-free settings for the pipelines.

use camino::Utf8PathBuf;
use recordfix_snapshot::HealthWeights;

/// Settings for the plan pipeline.
#[derive(Debug, Clone)]
pub struct PlanSettings {
    pub out_dir: Utf8PathBuf,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            out_dir: Utf8PathBuf::from("artifacts/recordfix"),
        }
    }
}

/// Settings for the snapshot pipeline.
#[derive(Debug, Clone)]
pub struct SnapshotSettings {
    pub out_dir: Utf8PathBuf,
    pub case_volume_threshold: u64,
    pub weights: HealthWeights,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            out_dir: Utf8PathBuf::from("artifacts/recordfix/snapshots"),
            case_volume_threshold: 10,
            weights: HealthWeights::default(),
        }
    }
}

/// Settings for the apply pipeline.
#[derive(Debug, Clone)]
pub struct ApplySettings {
    pub out_dir: Utf8PathBuf,

    pub dry_run: bool,
    pub resync_priority: i64,

    /// Take a snapshot before and after the run and compare them.
    pub measure: bool,
    pub snapshot: SnapshotSettings,
}

impl Default for ApplySettings {
    fn default() -> Self {
        Self {
            out_dir: Utf8PathBuf::from("artifacts/recordfix"),
            dry_run: true,
            resync_priority: 5,
            measure: false,
            snapshot: SnapshotSettings::default(),
        }
    }
}

/// Settings for the rollback pipeline.
#[derive(Debug, Clone)]
pub struct RollbackSettings {
    pub out_dir: Utf8PathBuf,
    pub dry_run: bool,
}

impl Default for RollbackSettings {
    fn default() -> Self {
        Self {
            out_dir: Utf8PathBuf::from("artifacts/recordfix"),
            dry_run: true,
        }
    }
}
