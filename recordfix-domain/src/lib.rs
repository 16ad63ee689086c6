//! Domain logic: turn validator issues into a deterministic remediation plan.
//!
//! This crate owns *what* should be fixed, how confident we are, and how risky
//! it is. It does not touch the data store; executing fixes is the job of
//! `recordfix-engine`.

mod classify;
pub mod names;
mod planner;
mod rules;
pub mod taxonomy;

pub use classify::{IssueKind, Unclassified, classify};
pub use names::{NameFlags, detect_name_issues, standardize_name};
pub use planner::Planner;
pub use rules::{RULES, RemediationRule, lookup_rule, rule_keys};
