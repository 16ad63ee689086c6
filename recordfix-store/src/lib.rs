//! Store port for recordfix.
//!
//! The remediation engine and snapshot generator only talk to the data store
//! through [`DataStore`]: filtered select (equality, range, ordering, limit,
//! single row), insert, update-by-filter, delete-by-filter and count. Any
//! backend exposing that surface can be plugged in; [`InMemoryStore`] is the
//! embedded adapter used by the CLI and by tests.

mod error;
mod memory;
mod ports;
mod query;

pub use error::StoreError;
pub use memory::{InMemoryStore, StoreOp};
pub use ports::DataStore;
pub use query::{Direction, Filter, OrderBy, Query, compare_values, keys_equal, values_equal};

/// A single row: a JSON object keyed by column name.
pub type Record = serde_json::Map<String, serde_json::Value>;
