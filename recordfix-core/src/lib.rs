//! Embeddable core library for recordfix.
//!
//! Provides clap-free, I/O-abstracted entry points suitable for linking into
//! a service or another host process.
//!
//! # Port traits
//!
//! All file I/O is abstracted behind port traits in [`ports`]:
//! - [`IssueSource`](ports::IssueSource): load validator issues
//! - [`WritePort`](ports::WritePort): write files and create directories
//!
//! Record access goes through [`recordfix_store::DataStore`]. The [`adapters`]
//! module provides filesystem-backed implementations, including a JSON
//! dataset file loaded into an [`InMemoryStore`].
//!
//! # Entry points
//!
//! - [`run_plan`](pipeline::run_plan): issues to a remediation plan
//! - [`run_apply`](pipeline::run_apply): execute auto-fixable issues
//! - [`run_snapshot`](pipeline::run_snapshot): measure data quality
//! - [`run_rollback`](pipeline::run_rollback): replay captured rollback info

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-exported so embedders don't need recordfix-store directly.
pub use recordfix_store::{DataStore, InMemoryStore};
