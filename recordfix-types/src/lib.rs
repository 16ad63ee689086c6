//! Shared DTOs (schemas-as-code) for the recordfix workspace.
//!
//! # Design constraints
//! - These types are serialized to disk and exchanged with the issue validator.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod action;
pub mod issue;
pub mod plan;
pub mod result;
pub mod snapshot;

/// Schema identifiers.
pub mod schema {
    pub const RECORDFIX_PLAN_V1: &str = "recordfix.plan.v1";
    pub const RECORDFIX_APPLY_V1: &str = "recordfix.apply.v1";
    pub const RECORDFIX_SNAPSHOT_V1: &str = "recordfix.snapshot.v1";
}

/// Table names of the judicial-records store.
pub mod tables {
    pub const JUDGES: &str = "judges";
    pub const COURTS: &str = "courts";
    pub const CASES: &str = "cases";
    pub const ASSIGNMENTS: &str = "judge_court_assignments";
    pub const SYNC_QUEUE: &str = "sync_queue";
}
