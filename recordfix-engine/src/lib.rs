//! Auto-remediation engine.
//!
//! Executes auto-fixable issues against a [`DataStore`](recordfix_store::DataStore),
//! one handler per issue kind. Every handler reads before it writes so the
//! prior field values can be captured as rollback info, and a dry-run engine
//! performs the same reads while skipping every write.

mod engine;
mod error;
mod handlers;

pub use engine::{EngineOptions, RemediationEngine};
pub use error::RemediationError;
