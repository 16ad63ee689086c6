use thiserror::Error;

/// Errors surfaced by a [`DataStore`](crate::DataStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record that should carry a primary key does not.
    #[error("record in '{table}' has no usable 'id'")]
    MissingId { table: String },

    /// Insert collided with an existing primary key.
    #[error("duplicate id '{id}' in '{table}'")]
    DuplicateId { table: String, id: String },

    /// The dataset handed to the store is not shaped as `{ table: [record] }`.
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// Any backend failure (connection, timeout, constraint, poisoned state).
    #[error("{operation} on '{table}' failed: {message}")]
    Backend {
        table: String,
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn backend(table: &str, operation: &'static str, message: impl Into<String>) -> Self {
        StoreError::Backend {
            table: table.to_string(),
            operation,
            message: message.into(),
        }
    }
}
