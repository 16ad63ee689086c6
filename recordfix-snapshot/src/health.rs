use recordfix_types::snapshot::{CaseStats, DataSnapshot, JudgeStats, QualityMetrics, SnapshotDelta};
use serde::{Deserialize, Serialize};

/// Health score weights.
///
/// Per-unit weights are subtracted once per counted issue; proportional
/// weights are multiplied by a fraction in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthWeights {
    pub orphaned_record: f64,
    pub duplicate_identifier: f64,
    pub missing_field: f64,
    pub standardization_issue: f64,
    pub relationship_inconsistency: f64,
    pub temporal_overlap: f64,
    pub jurisdiction_mismatch: f64,

    pub judges_without_primary_court: f64,
    pub orphaned_cases: f64,
    pub judges_below_case_threshold: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            orphaned_record: 0.5,
            duplicate_identifier: 2.0,
            missing_field: 1.0,
            standardization_issue: 0.25,
            relationship_inconsistency: 3.0,
            temporal_overlap: 1.5,
            jurisdiction_mismatch: 1.0,
            judges_without_primary_court: 20.0,
            orphaned_cases: 15.0,
            judges_below_case_threshold: 10.0,
        }
    }
}

fn fraction(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64).min(1.0)
    }
}

/// Score in `[0, 100]`, rounded to two decimals. Non-increasing in every
/// quality counter as long as the weights are non-negative.
pub fn compute_health_score(
    quality: &QualityMetrics,
    judges: &JudgeStats,
    cases: &CaseStats,
    weights: &HealthWeights,
) -> f64 {
    let per_unit = weights.orphaned_record * quality.orphaned_records as f64
        + weights.duplicate_identifier * quality.duplicate_identifiers as f64
        + weights.missing_field * quality.missing_required_fields as f64
        + weights.standardization_issue * quality.standardization_issues as f64
        + weights.relationship_inconsistency * quality.relationship_inconsistencies as f64
        + weights.temporal_overlap * quality.temporal_overlaps as f64
        + weights.jurisdiction_mismatch * quality.jurisdiction_mismatches as f64;

    let proportional = weights.judges_without_primary_court
        * fraction(judges.without_primary_court, judges.total)
        + weights.orphaned_cases * fraction(cases.orphaned, cases.total)
        + weights.judges_below_case_threshold * fraction(judges.below_case_threshold, judges.total);

    let score = (100.0 - per_unit - proportional).clamp(0.0, 100.0);
    if score.is_nan() {
        return 0.0;
    }
    (score * 100.0).round() / 100.0
}

/// `after - before`, counter by counter.
pub fn compare_snapshots(before: &DataSnapshot, after: &DataSnapshot) -> SnapshotDelta {
    let d = |b: u64, a: u64| a as i64 - b as i64;
    let (b, a) = (&before.quality, &after.quality);
    let health_delta = ((after.health_score - before.health_score) * 100.0).round() / 100.0;

    SnapshotDelta {
        before_id: before.snapshot_id.clone(),
        after_id: after.snapshot_id.clone(),
        health_delta,
        orphaned_records: d(b.orphaned_records, a.orphaned_records),
        duplicate_identifiers: d(b.duplicate_identifiers, a.duplicate_identifiers),
        missing_required_fields: d(b.missing_required_fields, a.missing_required_fields),
        standardization_issues: d(b.standardization_issues, a.standardization_issues),
        relationship_inconsistencies: d(
            b.relationship_inconsistencies,
            a.relationship_inconsistencies,
        ),
        temporal_overlaps: d(b.temporal_overlaps, a.temporal_overlaps),
        jurisdiction_mismatches: d(b.jurisdiction_mismatches, a.jurisdiction_mismatches),
        improved: health_delta > 0.0 || (health_delta == 0.0 && a.total() < b.total()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_dataset_scores_100() {
        let score = compute_health_score(
            &QualityMetrics::default(),
            &JudgeStats {
                total: 10,
                with_primary_court: 10,
                ..JudgeStats::default()
            },
            &CaseStats::default(),
            &HealthWeights::default(),
        );
        assert_eq!(score, 100.0);
    }

    #[test]
    fn per_unit_and_proportional_penalties_add_up() {
        let quality = QualityMetrics {
            orphaned_records: 2,
            relationship_inconsistencies: 1,
            ..QualityMetrics::default()
        };
        let judges = JudgeStats {
            total: 4,
            with_primary_court: 3,
            without_primary_court: 1,
            below_case_threshold: 2,
            case_volume_threshold: 10,
        };
        let cases = CaseStats {
            total: 10,
            orphaned: 1,
            ..CaseStats::default()
        };
        // 100 - (1 + 3) - (20 * 0.25 + 15 * 0.1 + 10 * 0.5)
        let score = compute_health_score(&quality, &judges, &cases, &HealthWeights::default());
        assert_eq!(score, 84.5);
    }

    #[test]
    fn score_is_clamped_at_zero() {
        let quality = QualityMetrics {
            duplicate_identifiers: 1_000,
            ..QualityMetrics::default()
        };
        let score = compute_health_score(
            &quality,
            &JudgeStats::default(),
            &CaseStats::default(),
            &HealthWeights::default(),
        );
        assert_eq!(score, 0.0);
    }

    #[test]
    fn weights_parse_from_partial_toml_like_json() {
        let w: HealthWeights =
            serde_json::from_str(r#"{"orphaned_record": 1.0}"#).expect("weights");
        assert_eq!(w.orphaned_record, 1.0);
        assert_eq!(w.duplicate_identifier, 2.0);
        assert!(serde_json::from_str::<HealthWeights>(r#"{"bogus": 1}"#).is_err());
    }
}
