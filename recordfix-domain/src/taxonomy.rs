//! Canonical case-outcome taxonomy.

/// Outcome values the analytics layer understands.
pub const CANONICAL_OUTCOMES: &[&str] = &[
    "affirmed",
    "reversed",
    "remanded",
    "dismissed",
    "settled",
    "granted",
    "denied",
    "plaintiff_verdict",
    "defendant_verdict",
    "pending",
    "other",
];

pub fn is_canonical_outcome(outcome: &str) -> bool {
    CANONICAL_OUTCOMES.contains(&outcome)
}
