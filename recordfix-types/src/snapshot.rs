use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point-in-time, immutable measurement of data quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSnapshot {
    pub schema: String,
    pub snapshot_id: String,
    pub generated_at: DateTime<Utc>,
    pub judges: JudgeStats,
    pub courts: CourtStats,
    pub cases: CaseStats,
    pub assignments: AssignmentStats,
    pub quality: QualityMetrics,
    pub health_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeStats {
    pub total: u64,
    pub with_primary_court: u64,
    pub without_primary_court: u64,
    /// Judges whose cached case total is below the case-volume threshold.
    pub below_case_threshold: u64,
    pub case_volume_threshold: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtStats {
    pub total: u64,
    pub with_judges: u64,
    pub without_judges: u64,
    pub jurisdictions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStats {
    pub total: u64,
    pub linked_to_judge: u64,
    pub unassigned: u64,
    pub orphaned: u64,
    pub valid_outcome: u64,
    pub invalid_outcome: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentStats {
    pub total: u64,
    pub active: u64,
    pub primary: u64,
    pub overlapping: u64,
}

/// The seven quality counters feeding the health score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub orphaned_records: u64,
    pub duplicate_identifiers: u64,
    pub missing_required_fields: u64,
    pub standardization_issues: u64,
    pub relationship_inconsistencies: u64,
    pub temporal_overlaps: u64,
    pub jurisdiction_mismatches: u64,
}

impl QualityMetrics {
    pub fn total(&self) -> u64 {
        self.orphaned_records
            + self.duplicate_identifiers
            + self.missing_required_fields
            + self.standardization_issues
            + self.relationship_inconsistencies
            + self.temporal_overlaps
            + self.jurisdiction_mismatches
    }
}

/// Difference between two snapshots (`after - before`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDelta {
    pub before_id: String,
    pub after_id: String,
    pub health_delta: f64,
    pub orphaned_records: i64,
    pub duplicate_identifiers: i64,
    pub missing_required_fields: i64,
    pub standardization_issues: i64,
    pub relationship_inconsistencies: i64,
    pub temporal_overlaps: i64,
    pub jurisdiction_mismatches: i64,
    pub improved: bool,
}
