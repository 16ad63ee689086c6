use crate::names::NameFlags;
use crate::rules::{RULES, RemediationRule};
use crate::taxonomy::is_canonical_outcome;
use recordfix_types::issue::{EntityKind, IssueType, ValidationIssue};
use std::fmt;

/// What an issue is, as far as remediation is concerned.
///
/// Both the planner and the engine dispatch on this, so an issue is either
/// handled the same way by both or rejected by both.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    OrphanedCase {
        field: String,
    },
    OrphanedAssignment,
    MultiplePrimary {
        assignment_ids: Vec<String>,
    },
    TemporalOverlap {
        assignment_ids: Vec<String>,
        later_start_date: Option<String>,
    },
    CaseCountMismatch {
        actual_count: Option<u64>,
        stored_count: Option<u64>,
    },
    NameStandardization {
        flags: NameFlags,
        suggested_name: Option<String>,
        current_name: Option<String>,
    },
    OutcomeMapping {
        suggested_outcome: String,
        current_outcome: Option<String>,
    },
    StaleData {
        external_id: String,
    },
    Unclassified(Unclassified),
}

/// Why an issue could not be mapped to a remediation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unclassified {
    UnknownIssueType,
    UnsupportedEntity {
        issue_type: IssueType,
        entity: EntityKind,
    },
    UnrecognizedRelationship,
    UnrecognizedIntegrityCheck,
    NonCanonicalOutcome(String),
    MissingExternalId,
}

impl Unclassified {
    /// Stable tag carried by failed engine results.
    pub fn tag(&self) -> &'static str {
        match self {
            Unclassified::UnknownIssueType => "unknown_issue_type",
            Unclassified::UnsupportedEntity { .. } => "unsupported_entity",
            Unclassified::UnrecognizedRelationship => "unknown_relationship_conflict",
            Unclassified::UnrecognizedIntegrityCheck => "unknown_integrity_check",
            Unclassified::NonCanonicalOutcome(_) => "non_canonical_outcome",
            Unclassified::MissingExternalId => "missing_external_id",
        }
    }
}

impl fmt::Display for Unclassified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unclassified::UnknownIssueType => write!(f, "unknown issue type"),
            Unclassified::UnsupportedEntity { issue_type, entity } => {
                write!(f, "{} is not supported for {} records", issue_type, entity)
            }
            Unclassified::UnrecognizedRelationship => {
                write!(f, "relationship conflict is neither multiple-primary nor overlap")
            }
            Unclassified::UnrecognizedIntegrityCheck => {
                write!(f, "integrity issue carries no case-count, name or outcome hint")
            }
            Unclassified::NonCanonicalOutcome(o) => {
                write!(f, "suggested outcome '{}' is not canonical", o)
            }
            Unclassified::MissingExternalId => write!(f, "record has no external id"),
        }
    }
}

impl IssueKind {
    /// The rule that remediates this kind; `None` when unclassified.
    pub fn rule(&self) -> Option<&'static RemediationRule> {
        let kind = match self {
            IssueKind::OrphanedCase { .. } => "orphaned_case",
            IssueKind::OrphanedAssignment => "orphaned_assignment",
            IssueKind::MultiplePrimary { .. } => "multiple_primary",
            IssueKind::TemporalOverlap { .. } => "temporal_overlap",
            IssueKind::CaseCountMismatch { .. } => "case_count",
            IssueKind::NameStandardization { .. } => "name_standardization",
            IssueKind::OutcomeMapping { .. } => "outcome_mapping",
            IssueKind::StaleData { .. } => "stale_resync",
            IssueKind::Unclassified(_) => return None,
        };
        RULES.iter().find(|r| r.kind == kind)
    }
}

/// Classify one issue from its type, entity and metadata.
pub fn classify(issue: &ValidationIssue) -> IssueKind {
    let unsupported = || {
        IssueKind::Unclassified(Unclassified::UnsupportedEntity {
            issue_type: issue.issue_type,
            entity: issue.entity,
        })
    };

    match issue.issue_type {
        IssueType::OrphanedRecord => match issue.entity {
            EntityKind::Case => IssueKind::OrphanedCase {
                field: issue.meta_str("field").unwrap_or("judge_id").to_string(),
            },
            EntityKind::Assignment => IssueKind::OrphanedAssignment,
            EntityKind::Judge | EntityKind::Court => unsupported(),
        },

        IssueType::InconsistentRelationship => {
            if !matches!(issue.entity, EntityKind::Judge | EntityKind::Assignment) {
                return unsupported();
            }
            let assignment_ids = issue.meta_str_list("assignment_ids");
            match relationship_conflict(issue) {
                Some(Conflict::MultiplePrimary) => IssueKind::MultiplePrimary { assignment_ids },
                Some(Conflict::TemporalOverlap) => IssueKind::TemporalOverlap {
                    assignment_ids,
                    later_start_date: issue.meta_str("later_start_date").map(str::to_string),
                },
                None => IssueKind::Unclassified(Unclassified::UnrecognizedRelationship),
            }
        }

        IssueType::DataIntegrity => classify_integrity(issue),

        IssueType::StaleData => {
            match issue
                .meta_str("external_id")
                .or_else(|| issue.meta_str("courtlistener_id"))
            {
                Some(external_id) => IssueKind::StaleData {
                    external_id: external_id.to_string(),
                },
                None => IssueKind::Unclassified(Unclassified::MissingExternalId),
            }
        }

        IssueType::Unknown => IssueKind::Unclassified(Unclassified::UnknownIssueType),
    }
}

enum Conflict {
    MultiplePrimary,
    TemporalOverlap,
}

fn relationship_conflict(issue: &ValidationIssue) -> Option<Conflict> {
    if let Some(conflict) = issue.meta_str("conflict") {
        return match conflict.to_ascii_lowercase().as_str() {
            "multiple_primary" | "multiple_primaries" | "multiple-primary" => {
                Some(Conflict::MultiplePrimary)
            }
            "temporal_overlap" | "overlap" | "temporal-overlap" => Some(Conflict::TemporalOverlap),
            _ => None,
        };
    }

    let message = issue.message.to_lowercase();
    if message.contains("primary") {
        Some(Conflict::MultiplePrimary)
    } else if message.contains("overlap") {
        Some(Conflict::TemporalOverlap)
    } else {
        None
    }
}

fn classify_integrity(issue: &ValidationIssue) -> IssueKind {
    let unsupported = IssueKind::Unclassified(Unclassified::UnsupportedEntity {
        issue_type: issue.issue_type,
        entity: issue.entity,
    });
    let message = issue.message.to_lowercase();

    if issue.metadata.contains_key("actual_count")
        || message.contains("case count")
        || message.contains("total_cases")
    {
        if issue.entity != EntityKind::Judge {
            return unsupported;
        }
        return IssueKind::CaseCountMismatch {
            actual_count: issue.meta_u64("actual_count"),
            stored_count: issue.meta_u64("stored_count"),
        };
    }

    if issue.metadata.contains_key("name_issues") || issue.metadata.contains_key("suggested_name")
    {
        if !matches!(issue.entity, EntityKind::Judge | EntityKind::Court) {
            return unsupported;
        }
        return IssueKind::NameStandardization {
            flags: NameFlags::from_tags(&issue.meta_str_list("name_issues")),
            suggested_name: issue.meta_str("suggested_name").map(str::to_string),
            current_name: issue.meta_str("current_name").map(str::to_string),
        };
    }

    if let Some(outcome) = issue.meta_str("suggested_outcome") {
        if issue.entity != EntityKind::Case {
            return unsupported;
        }
        if !is_canonical_outcome(outcome) {
            return IssueKind::Unclassified(Unclassified::NonCanonicalOutcome(outcome.to_string()));
        }
        return IssueKind::OutcomeMapping {
            suggested_outcome: outcome.to_string(),
            current_outcome: issue.meta_str("current_outcome").map(str::to_string),
        };
    }

    IssueKind::Unclassified(Unclassified::UnrecognizedIntegrityCheck)
}
