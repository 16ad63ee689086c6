//! Configuration file loading for recordfix.
//!
//! Discovers and loads `recordfix.toml` from the working directory (or an
//! explicit `--config` path). CLI arguments take precedence over the file.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use recordfix_core::settings::{ApplySettings, RollbackSettings, SnapshotSettings};
use recordfix_snapshot::HealthWeights;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "recordfix.toml";

/// Top-level configuration from recordfix.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordfixConfig {
    /// Where artifacts are written when `--out-dir` is not given.
    pub out_dir: Option<Utf8PathBuf>,

    pub engine: EngineConfig,
    pub snapshot: SnapshotConfig,
}

/// Engine section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Priority of queued resync requests.
    pub resync_priority: i64,

    /// Snapshot before and after every apply.
    pub measure: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resync_priority: 5,
            measure: false,
        }
    }
}

/// Snapshot section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapshotConfig {
    /// Directory for persisted snapshot files.
    pub out_dir: Option<Utf8PathBuf>,

    pub case_volume_threshold: u64,

    /// Health score weights; unspecified weights keep their defaults.
    pub weights: HealthWeights,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            out_dir: None,
            case_volume_threshold: 10,
            weights: HealthWeights::default(),
        }
    }
}

/// Discover `recordfix.toml` in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<RecordfixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<RecordfixConfig> {
    let config: RecordfixConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load the explicit config if given, else discover one in `dir`, else defaults.
pub fn load_or_default(
    explicit: Option<&Utf8Path>,
    dir: &Utf8Path,
) -> anyhow::Result<RecordfixConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(RecordfixConfig::default()),
    }
}

/// Builder for merging the config file with CLI arguments.
pub struct ConfigMerger {
    config: RecordfixConfig,
}

impl ConfigMerger {
    pub fn new(config: RecordfixConfig) -> Self {
        Self { config }
    }

    /// Artifact directory: CLI, then config, then the built-in default.
    pub fn out_dir(&self, cli_out_dir: Option<&Utf8Path>) -> Utf8PathBuf {
        cli_out_dir
            .map(Utf8Path::to_path_buf)
            .or_else(|| self.config.out_dir.clone())
            .unwrap_or_else(|| Utf8PathBuf::from("artifacts/recordfix"))
    }

    /// Snapshot directory: `<--out-dir>/snapshots`, then `[snapshot].out_dir`,
    /// then `snapshots` under the configured artifact directory.
    pub fn merge_snapshot_args(
        &self,
        cli_out_dir: Option<&Utf8Path>,
        cli_case_volume_threshold: Option<u64>,
    ) -> SnapshotSettings {
        let out_dir = match cli_out_dir {
            Some(dir) => dir.join("snapshots"),
            None => self
                .config
                .snapshot
                .out_dir
                .clone()
                .unwrap_or_else(|| self.out_dir(None).join("snapshots")),
        };
        SnapshotSettings {
            out_dir,
            case_volume_threshold: cli_case_volume_threshold
                .unwrap_or(self.config.snapshot.case_volume_threshold),
            weights: self.config.snapshot.weights.clone(),
        }
    }

    /// `--apply` switches off dry-run; `--measure` ORs with the config flag.
    pub fn merge_apply_args(
        &self,
        cli_out_dir: Option<&Utf8Path>,
        apply: bool,
        cli_measure: bool,
        cli_resync_priority: Option<i64>,
    ) -> ApplySettings {
        ApplySettings {
            out_dir: self.out_dir(cli_out_dir),
            dry_run: !apply,
            resync_priority: cli_resync_priority.unwrap_or(self.config.engine.resync_priority),
            measure: cli_measure || self.config.engine.measure,
            snapshot: self.merge_snapshot_args(cli_out_dir, None),
        }
    }

    pub fn merge_rollback_args(&self, cli_out_dir: Option<&Utf8Path>, apply: bool) -> RollbackSettings {
        RollbackSettings {
            out_dir: self.out_dir(cli_out_dir),
            dry_run: !apply,
        }
    }
}
