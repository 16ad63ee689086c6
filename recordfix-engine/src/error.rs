use recordfix_domain::Unclassified;
use recordfix_store::StoreError;
use thiserror::Error;

/// Why a single issue could not be remediated. Never fatal to a batch.
#[derive(Debug, Error)]
pub enum RemediationError {
    #[error("unsupported issue: {0}")]
    Unsupported(Unclassified),

    #[error("{table} record '{id}' not found")]
    RecordNotFound { table: String, id: String },

    #[error("missing metadata '{0}'")]
    MissingMetadata(&'static str),

    #[error("{table} record '{id}' is unusable: {reason}")]
    InvalidRecord {
        table: String,
        id: String,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RemediationError {
    pub fn not_found(table: &str, id: &str) -> Self {
        RemediationError::RecordNotFound {
            table: table.to_string(),
            id: id.to_string(),
        }
    }

    pub fn invalid(table: &str, id: &str, reason: impl Into<String>) -> Self {
        RemediationError::InvalidRecord {
            table: table.to_string(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable tag stored on failed results.
    pub fn tag(&self) -> &'static str {
        match self {
            RemediationError::Unsupported(reason) => reason.tag(),
            RemediationError::RecordNotFound { .. } => "record_not_found",
            RemediationError::MissingMetadata(_) => "missing_metadata",
            RemediationError::InvalidRecord { .. } => "invalid_record",
            RemediationError::Store(_) => "store_error",
        }
    }
}
