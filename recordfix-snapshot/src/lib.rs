//! Data quality snapshots.
//!
//! A snapshot is a set of independent read-only aggregates over the store
//! (entity counts plus seven quality counters) and a derived health score.
//! Taking one before and after a remediation run measures its effect.

mod error;
mod generator;
mod health;
mod sink;

pub use error::SnapshotError;
pub use generator::{SnapshotGenerator, SnapshotOptions};
pub use health::{HealthWeights, compare_snapshots, compute_health_score};
pub use sink::{FsSnapshotSink, SnapshotReceipt, SnapshotSink};
