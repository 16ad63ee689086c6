use camino::Utf8PathBuf;
use recordfix_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot query failed: {0}")]
    Store(#[from] StoreError),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("snapshot artifact already exists: {0}")]
    AlreadyExists(Utf8PathBuf),

    #[error("failed to write snapshot {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}
