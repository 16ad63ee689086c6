use crate::error::SnapshotError;
use camino::{Utf8Path, Utf8PathBuf};
use recordfix_types::snapshot::DataSnapshot;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use tracing::info;

/// Where a snapshot was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotReceipt {
    pub snapshot_id: String,
    pub location: String,
    pub sha256: String,
    pub bytes: u64,
}

/// Persists snapshots as immutable artifacts.
pub trait SnapshotSink {
    fn persist(&self, snapshot: &DataSnapshot) -> Result<SnapshotReceipt, SnapshotError>;
}

/// Writes `snapshot-<timestamp>-<id>.json` files into a directory. Existing
/// files are never overwritten.
#[derive(Debug, Clone)]
pub struct FsSnapshotSink {
    dir: Utf8PathBuf,
}

impl FsSnapshotSink {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn file_name(snapshot: &DataSnapshot) -> String {
        format!(
            "snapshot-{}-{}.json",
            snapshot.generated_at.format("%Y%m%dT%H%M%SZ"),
            snapshot.snapshot_id
        )
    }
}

impl SnapshotSink for FsSnapshotSink {
    fn persist(&self, snapshot: &DataSnapshot) -> Result<SnapshotReceipt, SnapshotError> {
        fs_err::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let path = self.dir.join(Self::file_name(snapshot));

        let mut bytes = serde_json::to_vec_pretty(snapshot)?;
        bytes.push(b'\n');

        let mut file = match fs_err::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(SnapshotError::AlreadyExists(path));
            }
            Err(e) => return Err(SnapshotError::Io { path, source: e }),
        };
        file.write_all(&bytes).map_err(io_error(&path))?;
        file.flush().map_err(io_error(&path))?;

        let sha256 = sha256_hex(&bytes);
        info!(path = path.as_str(), sha256 = sha256.as_str(), "snapshot persisted");
        Ok(SnapshotReceipt {
            snapshot_id: snapshot.snapshot_id.clone(),
            location: path.to_string(),
            sha256,
            bytes: bytes.len() as u64,
        })
    }
}

fn io_error(path: &Utf8Path) -> impl FnOnce(std::io::Error) -> SnapshotError + use<> {
    let path = path.to_owned();
    move |source| SnapshotError::Io { path, source }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
