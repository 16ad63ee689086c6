//! Rendering helpers (markdown) for human-readable artifacts.
//!
//! Output depends only on the input document, so rendering the same plan
//! twice yields byte-identical text.

use recordfix_types::action::RemediationAction;
use recordfix_types::plan::RemediationPlan;
use recordfix_types::result::{RemediationSummary, RollbackReport};
use recordfix_types::snapshot::{DataSnapshot, SnapshotDelta};
use serde_json::{Map, Value};

/// Actions listed in full in the plan report.
pub const PLAN_TOP_ACTIONS: usize = 10;

pub fn render_plan_md(plan: &RemediationPlan) -> String {
    let s = &plan.summary;
    let r = &plan.risk_assessment;
    let mut out = String::new();
    out.push_str("# recordfix plan\n\n");
    out.push_str(&format!("- Plan: `{}`\n", plan.plan_id));
    out.push_str(&format!(
        "- Actions: {} (auto-fixable {}, manual review {})\n",
        s.total_actions, s.auto_fixable, s.manual_review
    ));
    out.push_str(&format!(
        "- By severity: critical {}, high {}, medium {}, low {}\n",
        s.by_severity.critical, s.by_severity.high, s.by_severity.medium, s.by_severity.low
    ));
    out.push_str(&format!(
        "- Records affected: {}\n",
        s.total_records_affected
    ));
    if s.unclassified > 0 {
        out.push_str(&format!("- Unclassified issues: {}\n", s.unclassified));
    }
    out.push_str(&format!(
        "- Estimated duration: {} ms\n\n",
        plan.estimated_duration_ms
    ));

    out.push_str("## Risk\n\n");
    out.push_str(&format!("- Overall: `{}`\n", r.overall_risk));
    out.push_str(&format!(
        "- High-risk actions: {}\n- Irreversible actions: {}\n",
        r.high_risk_actions, r.irreversible_actions
    ));
    out.push_str(&format!(
        "- Data loss potential: `{}`\n- Backup recommended: `{}`\n",
        r.data_loss_potential, r.recommended_backup
    ));
    for w in &r.warnings {
        out.push_str(&format!("- Warning: {}\n", w));
    }
    out.push('\n');

    out.push_str("## Actions\n\n");
    if plan.execution_order.is_empty() {
        out.push_str("_No actions planned._\n");
        return out;
    }

    for (i, action) in plan.ordered_actions().take(PLAN_TOP_ACTIONS).enumerate() {
        render_action(&mut out, i + 1, action);
    }
    let rest = plan.execution_order.len().saturating_sub(PLAN_TOP_ACTIONS);
    if rest > 0 {
        out.push_str(&format!("_... and {} more action(s)._\n", rest));
    }

    out
}

fn render_action(out: &mut String, n: usize, a: &RemediationAction) {
    out.push_str(&format!("### {}. {}\n\n", n, a.action_id));
    if let Some(desc) = &a.description {
        out.push_str(&format!("{}\n\n", desc));
    }
    out.push_str(&format!(
        "- Severity: `{}`\n- Action: `{}` on `{}/{}`\n",
        a.severity, a.action_type, a.target_table, a.target_record_id
    ));
    out.push_str(&format!(
        "- Confidence: {}\n- Risk: `{}`\n",
        a.confidence_score, a.risk_level
    ));
    out.push_str(&format!(
        "- Reversibility: `{}`\n- Data loss risk: `{}`\n",
        a.impact_analysis.reversibility.as_str(),
        a.impact_analysis.data_loss_risk.as_str()
    ));
    if a.requires_manual_review {
        out.push_str("- Requires manual review\n");
    }
    if !a.changes.is_empty() {
        out.push_str(&format!("- Changes: {}\n", inline_changes(&a.changes)));
    }
    out.push('\n');
}

pub fn render_summary_md(summary: &RemediationSummary) -> String {
    let mut out = String::new();
    out.push_str(if summary.dry_run {
        "# recordfix apply (dry run)\n\n"
    } else {
        "# recordfix apply\n\n"
    });
    out.push_str(&format!(
        "- Issues: {}\n- Attempted: {}\n- Successful: {}\n- Failed: {}\n- Skipped: {}\n- Duration: {} ms\n\n",
        summary.total_issues,
        summary.attempted,
        summary.successful,
        summary.failed,
        summary.skipped,
        summary.duration_ms
    ));

    out.push_str("## Results\n\n");
    if summary.results.is_empty() {
        out.push_str("_No results._\n");
        return out;
    }

    for (i, r) in summary.results.iter().enumerate() {
        out.push_str(&format!("### {}. {}\n\n", i + 1, r.issue_id));
        out.push_str(&format!(
            "- Status: `{}`\n- Action: `{}`\n- Records affected: {}\n",
            if r.success { "ok" } else { "failed" },
            r.action_taken,
            r.records_affected
        ));
        if !r.changes_made.is_empty() {
            out.push_str(&format!("- Changes: {}\n", inline_changes(&r.changes_made)));
        }
        if let Some(err) = &r.error {
            let tag = r.error_tag.as_deref().unwrap_or("-");
            out.push_str(&format!("- Error (`{}`): {}\n", tag, err));
        }
        if !r.rollback_info.is_empty() {
            out.push_str(&format!(
                "- Rollback captured for {} record(s)\n",
                r.rollback_info.len()
            ));
        }
        out.push('\n');
    }

    out
}

pub fn render_rollback_md(report: &RollbackReport) -> String {
    let mut out = String::new();
    out.push_str("# recordfix rollback\n\n");
    out.push_str(&format!(
        "- Attempted: {}\n- Restored: {}\n- Failed: {}\n",
        report.attempted, report.restored, report.failed
    ));
    for f in &report.failures {
        out.push_str(&format!("- Not restored: `{}`\n", f));
    }
    out
}

pub fn render_snapshot_md(snapshot: &DataSnapshot, delta: Option<&SnapshotDelta>) -> String {
    let q = &snapshot.quality;
    let mut out = String::new();
    out.push_str("# recordfix snapshot\n\n");
    out.push_str(&format!(
        "- Snapshot: `{}`\n- Generated: {}\n- Health score: {:.2}\n\n",
        snapshot.snapshot_id,
        snapshot.generated_at.to_rfc3339(),
        snapshot.health_score
    ));

    out.push_str("## Entities\n\n");
    out.push_str("| entity | total | detail |\n|---|---|---|\n");
    out.push_str(&format!(
        "| judges | {} | {} without primary court, {} below {} cases |\n",
        snapshot.judges.total,
        snapshot.judges.without_primary_court,
        snapshot.judges.below_case_threshold,
        snapshot.judges.case_volume_threshold
    ));
    out.push_str(&format!(
        "| courts | {} | {} without judges, {} jurisdictions |\n",
        snapshot.courts.total, snapshot.courts.without_judges, snapshot.courts.jurisdictions
    ));
    out.push_str(&format!(
        "| cases | {} | {} orphaned, {} unassigned, {} invalid outcome |\n",
        snapshot.cases.total,
        snapshot.cases.orphaned,
        snapshot.cases.unassigned,
        snapshot.cases.invalid_outcome
    ));
    out.push_str(&format!(
        "| assignments | {} | {} active, {} overlapping |\n\n",
        snapshot.assignments.total, snapshot.assignments.active, snapshot.assignments.overlapping
    ));

    out.push_str("## Quality\n\n");
    let rows: [(&str, u64, Option<i64>); 7] = [
        ("orphaned records", q.orphaned_records, delta.map(|d| d.orphaned_records)),
        ("duplicate identifiers", q.duplicate_identifiers, delta.map(|d| d.duplicate_identifiers)),
        ("missing required fields", q.missing_required_fields, delta.map(|d| d.missing_required_fields)),
        ("standardization issues", q.standardization_issues, delta.map(|d| d.standardization_issues)),
        (
            "relationship inconsistencies",
            q.relationship_inconsistencies,
            delta.map(|d| d.relationship_inconsistencies),
        ),
        ("temporal overlaps", q.temporal_overlaps, delta.map(|d| d.temporal_overlaps)),
        ("jurisdiction mismatches", q.jurisdiction_mismatches, delta.map(|d| d.jurisdiction_mismatches)),
    ];
    if delta.is_some() {
        out.push_str("| metric | count | change |\n|---|---|---|\n");
    } else {
        out.push_str("| metric | count |\n|---|---|\n");
    }
    for (name, count, change) in rows {
        match change {
            Some(c) => out.push_str(&format!("| {} | {} | {:+} |\n", name, count, c)),
            None => out.push_str(&format!("| {} | {} |\n", name, count)),
        }
    }

    if let Some(d) = delta {
        out.push_str(&format!(
            "\nHealth change since `{}`: {:+.2} ({})\n",
            d.before_id,
            d.health_delta,
            if d.improved { "improved" } else { "not improved" }
        ));
    }

    out
}

fn inline_changes(changes: &Map<String, Value>) -> String {
    changes
        .iter()
        .map(|(k, v)| format!("`{}` = `{}`", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}
