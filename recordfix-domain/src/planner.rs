use crate::classify::{IssueKind, classify};
use crate::names::standardize_name;
use crate::rules::RemediationRule;
use chrono::{DateTime, Utc};
use recordfix_types::action::{
    ActionType, DataLossRisk, ImpactAnalysis, RemediationAction, Reversibility, RiskLevel,
};
use recordfix_types::issue::{Severity, ValidationIssue};
use recordfix_types::plan::{PlanSummary, RemediationPlan, RiskAssessment, SeverityCounts};
use recordfix_types::tables;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

const REVIEW_CONFIDENCE_FLOOR: u8 = 70;
const BATCH_RECORDS_THRESHOLD: u64 = 5;
const HIGH_RISK_ACTIONS_THRESHOLD: u64 = 5;
const IRREVERSIBLE_ACTIONS_THRESHOLD: u64 = 3;

/// Pure issue-to-plan transformation. No I/O.
#[derive(Debug, Clone, Default)]
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(&self, issues: &[ValidationIssue]) -> RemediationPlan {
        self.plan_at(issues, Utc::now())
    }

    /// Like [`Planner::plan`] with a caller-supplied timestamp, so the whole
    /// plan is a function of its inputs.
    pub fn plan_at(&self, issues: &[ValidationIssue], created_at: DateTime<Utc>) -> RemediationPlan {
        let mut actions = Vec::with_capacity(issues.len());
        let mut unclassified = 0u64;

        for issue in issues {
            let kind = classify(issue);
            let Some(rule) = kind.rule() else {
                if let IssueKind::Unclassified(reason) = &kind {
                    debug!(
                        issue_id = issue.issue_id().as_str(),
                        reason = reason.tag(),
                        "issue excluded from plan"
                    );
                }
                unclassified += 1;
                continue;
            };
            actions.push(build_action(issue, &kind, rule));
        }

        assign_action_ids(&mut actions);

        let mut ordered: Vec<&RemediationAction> = actions.iter().collect();
        ordered.sort_by_key(|a| stable_action_sort_key(a));
        let execution_order: Vec<String> = ordered.iter().map(|a| a.action_id.clone()).collect();

        let mut plan = RemediationPlan::new(deterministic_plan_id(&execution_order).to_string(), created_at);
        plan.summary = summarize(&actions, unclassified);
        plan.risk_assessment = assess_risk(&actions);
        plan.estimated_duration_ms = actions.iter().map(|a| a.estimated_duration_ms).sum();
        plan.execution_order = execution_order;
        plan.actions = actions;
        plan
    }
}

fn build_action(issue: &ValidationIssue, kind: &IssueKind, rule: &RemediationRule) -> RemediationAction {
    let (target_table, target_record_id, changes) = target_and_changes(issue, kind);
    let action_type = rule.action_type;

    let confidence_score = match confidence_hint(issue) {
        Some(hint) => hint.min(rule.base_confidence),
        None => rule.base_confidence,
    };

    let records_affected = match kind {
        IssueKind::MultiplePrimary { assignment_ids } if assignment_ids.len() > 1 => {
            assignment_ids.len() as u64 - 1
        }
        _ => match issue.meta_str_list("affected_ids").len() {
            0 => 1,
            n => n as u64,
        },
    };
    let mut tables_affected = vec![target_table.clone()];
    if action_type == ActionType::Recalculate {
        tables_affected.push(tables::CASES.to_string());
    }
    let impact_analysis = ImpactAnalysis {
        records_affected,
        tables_affected,
        downstream_effects: downstream_effects(&target_table, action_type)
            .iter()
            .map(|s| s.to_string())
            .collect(),
        reversibility: reversibility(action_type),
        data_loss_risk: data_loss_risk(action_type),
    };

    let risk_level = risk_level(confidence_score, &impact_analysis, action_type);

    RemediationAction {
        action_id: format!("{}:{}:{}", issue.entity_id, issue.issue_type, rule.kind),
        issue_type: issue.issue_type,
        severity: issue.severity,
        entity: issue.entity,
        entity_id: issue.entity_id.clone(),
        action_type,
        target_table,
        target_record_id,
        changes,
        description: Some(rule.title.to_string()),
        confidence_score,
        risk_level,
        requires_manual_review: !issue.auto_fixable || risk_level == RiskLevel::High,
        estimated_duration_ms: per_record_ms(action_type) * records_affected,
        impact_analysis,
        dependencies: vec![],
        rollback_supported: action_type != ActionType::Delete,
    }
}

fn target_and_changes(issue: &ValidationIssue, kind: &IssueKind) -> (String, String, Map<String, Value>) {
    let mut changes = Map::new();
    let entity_id = issue.entity_id.clone();

    let (table, record_id) = match kind {
        IssueKind::OrphanedCase { field } => {
            changes.insert(field.clone(), Value::Null);
            (tables::CASES, entity_id)
        }
        IssueKind::OrphanedAssignment => (tables::ASSIGNMENTS, entity_id),
        // The demoted rows are chosen at apply time, so the action records
        // the candidate set rather than a single row.
        IssueKind::MultiplePrimary { assignment_ids } => {
            changes.insert("assignment_type".into(), json!("visiting"));
            if assignment_ids.is_empty() {
                changes.insert("judge_id".into(), json!(entity_id));
            } else {
                changes.insert("assignment_ids".into(), json!(assignment_ids));
            }
            (tables::ASSIGNMENTS, entity_id)
        }
        IssueKind::TemporalOverlap {
            assignment_ids,
            later_start_date,
        } => {
            if let Some(later) = later_start_date {
                changes.insert("end_date".into(), json!(later));
            }
            let target = assignment_ids.first().cloned().unwrap_or(entity_id);
            (tables::ASSIGNMENTS, target)
        }
        IssueKind::CaseCountMismatch { actual_count, .. } => {
            if let Some(actual) = actual_count {
                changes.insert("total_cases".into(), json!(actual));
            }
            (tables::JUDGES, entity_id)
        }
        IssueKind::NameStandardization {
            flags,
            suggested_name,
            current_name,
        } => {
            let name = if flags.is_empty() {
                suggested_name.clone()
            } else {
                current_name.as_deref().map(|n| standardize_name(n, flags))
            };
            if let Some(name) = name {
                changes.insert("name".into(), json!(name));
            }
            (issue.entity.table(), entity_id)
        }
        IssueKind::OutcomeMapping {
            suggested_outcome, ..
        } => {
            changes.insert("outcome".into(), json!(suggested_outcome));
            (tables::CASES, entity_id)
        }
        IssueKind::StaleData { external_id } => {
            changes.insert("entity_type".into(), json!(issue.entity.as_str()));
            changes.insert("entity_id".into(), json!(issue.entity_id));
            changes.insert("external_id".into(), json!(external_id));
            (tables::SYNC_QUEUE, entity_id)
        }
        IssueKind::Unclassified(_) => (issue.entity.table(), entity_id),
    };

    (table.to_string(), record_id, changes)
}

/// Metadata `confidence` as a 0-100 score. Values in `[0, 1]` are fractions.
fn confidence_hint(issue: &ValidationIssue) -> Option<u8> {
    let raw = issue.meta_f64("confidence")?;
    if !raw.is_finite() {
        return None;
    }
    let scaled = if (0.0..=1.0).contains(&raw) { raw * 100.0 } else { raw };
    Some(scaled.clamp(0.0, 100.0).round() as u8)
}

fn reversibility(action_type: ActionType) -> Reversibility {
    match action_type {
        ActionType::Delete => Reversibility::Irreversible,
        ActionType::Recalculate => Reversibility::PartiallyReversible,
        _ => Reversibility::FullyReversible,
    }
}

fn data_loss_risk(action_type: ActionType) -> DataLossRisk {
    match action_type {
        ActionType::Delete => DataLossRisk::High,
        ActionType::Nullify => DataLossRisk::Low,
        _ => DataLossRisk::None,
    }
}

fn risk_level(confidence: u8, impact: &ImpactAnalysis, action_type: ActionType) -> RiskLevel {
    if confidence < REVIEW_CONFIDENCE_FLOOR
        || impact.reversibility == Reversibility::Irreversible
        || impact.data_loss_risk == DataLossRisk::High
        || action_type == ActionType::Delete
    {
        RiskLevel::High
    } else if impact.reversibility == Reversibility::PartiallyReversible
        || impact.records_affected > BATCH_RECORDS_THRESHOLD
    {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn per_record_ms(action_type: ActionType) -> u64 {
    match action_type {
        ActionType::Update | ActionType::Create => 50,
        ActionType::Nullify => 40,
        ActionType::Delete => 60,
        ActionType::Recalculate => 150,
        ActionType::QueueSync => 20,
    }
}

fn downstream_effects(table: &str, action_type: ActionType) -> &'static [&'static str] {
    match (table, action_type) {
        (tables::CASES, ActionType::Nullify) => &[
            "case drops out of judge analytics",
            "judge total_cases may need recalculation",
        ],
        (tables::CASES, ActionType::Update) => &["case outcome analytics"],
        (tables::ASSIGNMENTS, ActionType::Delete) => &[
            "judge court history loses the assignment",
            "court roster listings",
        ],
        (tables::ASSIGNMENTS, ActionType::Update) => &[
            "judge primary court may change",
            "court roster listings",
        ],
        (tables::JUDGES, ActionType::Recalculate) => &["judge analytics totals"],
        (tables::JUDGES, ActionType::Update) => &["judge directory listing", "search index"],
        (tables::COURTS, ActionType::Update) => &["court directory listing", "search index"],
        (tables::SYNC_QUEUE, ActionType::QueueSync) => &["external sync worker refreshes the record"],
        _ => &[],
    }
}

/// Give repeated `entity:type:kind` composites `#2`, `#3`, ... suffixes.
fn assign_action_ids(actions: &mut [RemediationAction]) {
    let mut seen: BTreeMap<String, u32> = BTreeMap::new();
    for action in actions.iter_mut() {
        let n = seen.entry(action.action_id.clone()).or_insert(0);
        *n += 1;
        if *n > 1 {
            action.action_id = format!("{}#{}", action.action_id, n);
        }
    }
}

fn stable_action_sort_key(action: &RemediationAction) -> (Severity, std::cmp::Reverse<u8>, RiskLevel, usize) {
    (
        action.severity,
        std::cmp::Reverse(action.confidence_score),
        action.risk_level,
        action.dependencies.len(),
    )
}

fn deterministic_plan_id(execution_order: &[String]) -> Uuid {
    const NAMESPACE: Uuid = Uuid::from_bytes([
        0x7a, 0x1e, 0x4c, 0x92, 0x3b, 0x05, 0x4f, 0x61, 0x9d, 0x2c, 0x58, 0xe0, 0x13, 0xa7, 0x6b,
        0x44,
    ]);
    Uuid::new_v5(&NAMESPACE, execution_order.join("\n").as_bytes())
}

fn summarize(actions: &[RemediationAction], unclassified: u64) -> PlanSummary {
    let mut by_severity = SeverityCounts::default();
    for a in actions {
        match a.severity {
            Severity::Critical => by_severity.critical += 1,
            Severity::High => by_severity.high += 1,
            Severity::Medium => by_severity.medium += 1,
            Severity::Low => by_severity.low += 1,
        }
    }
    let manual_review = actions.iter().filter(|a| a.requires_manual_review).count() as u64;

    PlanSummary {
        total_actions: actions.len() as u64,
        by_severity,
        auto_fixable: actions.len() as u64 - manual_review,
        manual_review,
        total_records_affected: actions.iter().map(|a| a.impact_analysis.records_affected).sum(),
        unclassified,
    }
}

fn assess_risk(actions: &[RemediationAction]) -> RiskAssessment {
    let high_risk_actions = actions
        .iter()
        .filter(|a| a.risk_level == RiskLevel::High)
        .count() as u64;
    let irreversible_actions = actions
        .iter()
        .filter(|a| a.impact_analysis.reversibility == Reversibility::Irreversible)
        .count() as u64;
    let data_loss_potential = actions
        .iter()
        .any(|a| a.impact_analysis.data_loss_risk != DataLossRisk::None);
    let manual_review = actions.iter().filter(|a| a.requires_manual_review).count();

    let overall_risk = if high_risk_actions > HIGH_RISK_ACTIONS_THRESHOLD
        || irreversible_actions > IRREVERSIBLE_ACTIONS_THRESHOLD
    {
        RiskLevel::High
    } else if high_risk_actions > 0 || irreversible_actions > 0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let mut warnings = Vec::new();
    if high_risk_actions > HIGH_RISK_ACTIONS_THRESHOLD {
        warnings.push(format!(
            "{} high-risk actions (more than {})",
            high_risk_actions, HIGH_RISK_ACTIONS_THRESHOLD
        ));
    }
    if irreversible_actions > IRREVERSIBLE_ACTIONS_THRESHOLD {
        warnings.push(format!(
            "{} irreversible actions (more than {})",
            irreversible_actions, IRREVERSIBLE_ACTIONS_THRESHOLD
        ));
    }
    if irreversible_actions > 0 {
        warnings.push(format!(
            "{} action(s) cannot be rolled back",
            irreversible_actions
        ));
    }
    if data_loss_potential {
        warnings.push("some actions may lose data; take a backup first".to_string());
    }
    if manual_review > 0 {
        warnings.push(format!("{} action(s) require manual review", manual_review));
    }

    RiskAssessment {
        overall_risk,
        high_risk_actions,
        irreversible_actions,
        data_loss_potential,
        recommended_backup: overall_risk == RiskLevel::High
            || irreversible_actions > 0
            || data_loss_potential,
        warnings,
    }
}
