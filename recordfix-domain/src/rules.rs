//! Registry of remediation rules.
//!
//! Each classified issue kind maps to exactly one rule. The planner reads the
//! base confidence and action type from here, the engine reads the result
//! label, and `recordfix explain` prints the prose.

use recordfix_types::action::ActionType;
use recordfix_types::issue::IssueType;

#[derive(Debug, Clone)]
pub struct RemediationRule {
    /// User-facing key, e.g. `orphaned-case`.
    pub key: &'static str,
    /// Kind segment of action ids, e.g. `orphaned_case`.
    pub kind: &'static str,
    pub title: &'static str,
    pub issue_type: IssueType,
    pub action_type: ActionType,
    pub base_confidence: u8,
    /// Engine result label (`action_taken`).
    pub label: &'static str,
    pub description: &'static str,
    pub safety_rationale: &'static str,
    pub remediation: &'static str,
}

pub static RULES: &[RemediationRule] = &[
    RemediationRule {
        key: "orphaned-case",
        kind: "orphaned_case",
        title: "Detach orphaned case reference",
        issue_type: IssueType::OrphanedRecord,
        action_type: ActionType::Nullify,
        base_confidence: 95,
        label: "nullify_orphaned_reference",
        description: r#"Sets the dangling foreign key on a case (by default `judge_id`,
or the column named by the `field` metadata key) to null.

The case itself is kept; only the reference to the missing parent record is
removed so that the case stops pointing at a judge or court that no longer
exists."#,
        safety_rationale: r#"Low risk:
- the prior value is captured before the write and can be restored
- no rows are deleted
- the case becomes unattributed, which is visible in analytics"#,
        remediation: r#"If the parent record should exist, restore it and re-run the
validator instead of applying this fix. Otherwise reassign the case to the
correct judge by hand after the reference is cleared."#,
    },
    RemediationRule {
        key: "orphaned-assignment",
        kind: "orphaned_assignment",
        title: "Delete orphaned assignment",
        issue_type: IssueType::OrphanedRecord,
        action_type: ActionType::Delete,
        base_confidence: 90,
        label: "delete_orphaned_assignment",
        description: r#"Hard-deletes a judge/court assignment whose judge or court no longer
exists."#,
        safety_rationale: r#"High risk:
- deletes are irreversible and no rollback information is captured
- always requires manual review"#,
        remediation: r#"Export the assignment row before applying. If the judge or court was
removed by mistake, restore it instead of deleting the assignment."#,
    },
    RemediationRule {
        key: "multiple-primary",
        kind: "multiple_primary",
        title: "Demote extra primary assignments",
        issue_type: IssueType::InconsistentRelationship,
        action_type: ActionType::Update,
        base_confidence: 90,
        label: "resolve_multiple_primary",
        description: r#"A judge has more than one concurrent primary assignment. The
most recently started one stays primary; every other one is set to
`visiting`."#,
        safety_rationale: r#"Medium confidence in which assignment is current:
- start dates are assumed to be accurate
- each demoted assignment's prior type is captured for rollback"#,
        remediation: r#"If the most recent assignment is not the judge's real primary
court, set `assignment_type` by hand and mark the issue as not auto-fixable."#,
    },
    RemediationRule {
        key: "temporal-overlap",
        kind: "temporal_overlap",
        title: "Close overlapping assignment",
        issue_type: IssueType::InconsistentRelationship,
        action_type: ActionType::Update,
        base_confidence: 85,
        label: "resolve_temporal_overlap",
        description: r#"Two assignments of the same judge overlap in time. The earlier
assignment's `end_date` is set to the later assignment's `start_date`."#,
        safety_rationale: r#"The earlier end date (often null) is captured for rollback. The
fix assumes the later assignment superseded the earlier one."#,
        remediation: r#"If both assignments really were concurrent (for example a
visiting posting), convert one of them to `visiting` instead."#,
    },
    RemediationRule {
        key: "case-count",
        kind: "case_count",
        title: "Recalculate cached case count",
        issue_type: IssueType::DataIntegrity,
        action_type: ActionType::Recalculate,
        base_confidence: 98,
        label: "recalculate_case_count",
        description: r#"Overwrites a judge's cached `total_cases` with a live count of the
cases that reference the judge."#,
        safety_rationale: r#"The live count is authoritative. The cached value is captured for
rollback, but a later recount may differ, so the fix is only partially
reversible."#,
        remediation: r#"No manual action is usually needed. If counts keep drifting, look for
writers that bypass the counter."#,
    },
    RemediationRule {
        key: "name-standardization",
        kind: "name_standardization",
        title: "Standardize name",
        issue_type: IssueType::DataIntegrity,
        action_type: ActionType::Update,
        base_confidence: 75,
        label: "standardize_name",
        description: r#"Applies the flagged name cleanup rules: strip honorific prefixes
("Hon.", "Judge", ...), title-case names written entirely in upper or lower
case, and collapse repeated whitespace. Without flags the validator's
`suggested_name` is used as is."#,
        safety_rationale: r#"Name heuristics can be wrong for unusual spellings (for example
"McDonald" or "de la Cruz"), so confidence is moderate. The prior name is
captured for rollback."#,
        remediation: r#"Set the name by hand when the suggested form is wrong."#,
    },
    RemediationRule {
        key: "outcome-mapping",
        kind: "outcome_mapping",
        title: "Map case outcome",
        issue_type: IssueType::DataIntegrity,
        action_type: ActionType::Update,
        base_confidence: 80,
        label: "map_case_outcome",
        description: r#"Replaces a free-text case outcome with the suggested canonical
outcome value."#,
        safety_rationale: r#"The prior outcome is captured for rollback. Only canonical outcome
values are accepted."#,
        remediation: r#"Review the mapping when the original outcome text is ambiguous."#,
    },
    RemediationRule {
        key: "stale-resync",
        kind: "stale_resync",
        title: "Queue external resync",
        issue_type: IssueType::StaleData,
        action_type: ActionType::QueueSync,
        base_confidence: 100,
        label: "queue_resync",
        description: r#"Inserts a pending entry into `sync_queue` so the external sync
worker refreshes the record from its source, keyed by the record's external
id."#,
        safety_rationale: r#"Additive: nothing existing is modified. Records without an external
id cannot be resynced and produce no action."#,
        remediation: r#"Link the record to its external source first if it has no external
id."#,
    },
];

/// Look up a rule by key (`orphaned-case`) or kind (`orphaned_case`).
pub fn lookup_rule(query: &str) -> Option<&'static RemediationRule> {
    let normalized = query.trim().to_lowercase().replace('_', "-");
    RULES.iter().find(|rule| rule.key == normalized)
}

pub fn rule_keys() -> Vec<&'static str> {
    RULES.iter().map(|r| r.key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn lookup_accepts_key_and_kind() {
        assert_eq!(lookup_rule("case-count").map(|r| r.kind), Some("case_count"));
        assert_eq!(lookup_rule("CASE_COUNT").map(|r| r.key), Some("case-count"));
        assert!(lookup_rule("nope").is_none());
    }

    #[test]
    fn keys_and_kinds_are_unique_and_consistent() {
        let keys: BTreeSet<_> = RULES.iter().map(|r| r.key).collect();
        assert_eq!(keys.len(), RULES.len());
        for rule in RULES {
            assert_eq!(rule.kind.replace('_', "-"), rule.key);
            assert!(rule.base_confidence <= 100);
        }
    }

    #[test]
    fn only_deletes_are_irreversible_rules() {
        let deletes: Vec<_> = RULES
            .iter()
            .filter(|r| r.action_type == ActionType::Delete)
            .map(|r| r.key)
            .collect();
        assert_eq!(deletes, vec!["orphaned-assignment"]);
    }
}
