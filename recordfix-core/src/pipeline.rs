//! Core plan, apply, snapshot and rollback pipelines, extracted from the CLI.
//!
//! These entry points are I/O-agnostic: issue loading and artifact writes go
//! through the port traits, record access through a [`DataStore`].

use crate::ports::{IssueSource, WritePort};
use crate::settings::{ApplySettings, PlanSettings, RollbackSettings, SnapshotSettings};
use anyhow::Context;
use camino::Utf8Path;
use recordfix_domain::Planner;
use recordfix_engine::{EngineOptions, RemediationEngine};
use recordfix_render::{render_plan_md, render_rollback_md, render_snapshot_md, render_summary_md};
use recordfix_snapshot::{
    SnapshotGenerator, SnapshotOptions, SnapshotReceipt, SnapshotSink, compare_snapshots,
};
use recordfix_store::DataStore;
use recordfix_types::plan::RemediationPlan;
use recordfix_types::result::{RemediationSummary, RollbackReport};
use recordfix_types::snapshot::{DataSnapshot, SnapshotDelta};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Error type for pipeline results. Exit code 2 = remediation failure, 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("remediation failed")]
    RemediationFailed,
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Outcome of `run_plan`.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: RemediationPlan,
}

/// Build a remediation plan. Planning is pure; nothing is read from a store.
pub fn run_plan(
    settings: &PlanSettings,
    issues: &dyn IssueSource,
) -> Result<PlanOutcome, ToolError> {
    let issues = issues.load_issues().context("load issues")?;
    let plan = Planner::new().plan(&issues);
    info!(
        plan_id = plan.plan_id.as_str(),
        actions = plan.actions.len(),
        out_dir = settings.out_dir.as_str(),
        "plan generated"
    );
    Ok(PlanOutcome { plan })
}

/// Write `plan.json` and `plan.md` into `out_dir`.
pub fn write_plan_artifacts(
    outcome: &PlanOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;
    write_json(writer, &out_dir.join("plan.json"), &outcome.plan).context("serialize plan")?;
    let plan_md = render_plan_md(&outcome.plan);
    writer.write_file(&out_dir.join("plan.md"), plan_md.as_bytes())?;
    Ok(())
}

/// Outcome of `run_apply`.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub summary: RemediationSummary,
    /// Present when the run was measured.
    pub before: Option<DataSnapshot>,
    pub after: Option<DataSnapshot>,
    pub delta: Option<SnapshotDelta>,
    /// At least one attempted issue failed.
    pub remediation_failed: bool,
}

/// Execute every auto-fixable issue against `store`.
///
/// Per-issue failures are reported in the summary rather than as an error;
/// callers decide how `remediation_failed` maps to an exit status.
pub async fn run_apply(
    settings: &ApplySettings,
    issues: &dyn IssueSource,
    store: &dyn DataStore,
) -> Result<ApplyOutcome, ToolError> {
    let issues = issues.load_issues().context("load issues")?;

    let before = if settings.measure {
        Some(snapshot(&settings.snapshot, store).await.context("snapshot before remediation")?)
    } else {
        None
    };

    let engine = RemediationEngine::new(
        store,
        EngineOptions {
            dry_run: settings.dry_run,
            resync_priority: settings.resync_priority,
        },
    );
    let summary = engine.execute_remediation(&issues).await;

    let (after, delta) = match &before {
        Some(before) => {
            let after = snapshot(&settings.snapshot, store)
                .await
                .context("snapshot after remediation")?;
            let delta = compare_snapshots(before, &after);
            debug!(health_delta = delta.health_delta, improved = delta.improved, "measured run");
            (Some(after), Some(delta))
        }
        None => (None, None),
    };

    let remediation_failed = summary.failed > 0;
    if remediation_failed {
        warn!(failed = summary.failed, "some remediations failed");
    }

    Ok(ApplyOutcome {
        summary,
        before,
        after,
        delta,
        remediation_failed,
    })
}

/// Write `apply.json` and `apply.md`, plus `snapshot.md` for measured runs.
pub fn write_apply_artifacts(
    outcome: &ApplyOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;
    write_json(writer, &out_dir.join("apply.json"), &outcome.summary)
        .context("serialize summary")?;
    let apply_md = render_summary_md(&outcome.summary);
    writer.write_file(&out_dir.join("apply.md"), apply_md.as_bytes())?;

    if let Some(after) = &outcome.after {
        let snapshot_md = render_snapshot_md(after, outcome.delta.as_ref());
        writer.write_file(&out_dir.join("snapshot.md"), snapshot_md.as_bytes())?;
    }
    Ok(())
}

/// Outcome of `run_snapshot`.
#[derive(Debug, Clone)]
pub struct SnapshotOutcome {
    pub snapshot: DataSnapshot,
    /// Present when a sink persisted the snapshot.
    pub receipt: Option<SnapshotReceipt>,
}

/// Measure data quality, optionally persisting the result through `sink`.
pub async fn run_snapshot(
    settings: &SnapshotSettings,
    store: &dyn DataStore,
    sink: Option<&dyn SnapshotSink>,
) -> Result<SnapshotOutcome, ToolError> {
    let snapshot = snapshot(settings, store).await.context("generate snapshot")?;
    let receipt = match sink {
        Some(sink) => Some(sink.persist(&snapshot).context("persist snapshot")?),
        None => None,
    };
    Ok(SnapshotOutcome { snapshot, receipt })
}

/// Write `snapshot.md` into `out_dir`.
pub fn write_snapshot_artifacts(
    outcome: &SnapshotOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;
    let snapshot_md = render_snapshot_md(&outcome.snapshot, None);
    writer.write_file(&out_dir.join("snapshot.md"), snapshot_md.as_bytes())?;
    Ok(())
}

/// Outcome of `run_rollback`.
#[derive(Debug, Clone)]
pub struct RollbackOutcome {
    pub report: RollbackReport,
    /// At least one entry could not be restored.
    pub remediation_failed: bool,
}

/// Replay the rollback info captured in a previous apply summary, newest first.
pub async fn run_rollback(
    settings: &RollbackSettings,
    summary: &RemediationSummary,
    store: &dyn DataStore,
) -> Result<RollbackOutcome, ToolError> {
    if summary.dry_run {
        warn!("summary is from a dry run; it carries no rollback info");
    }
    let engine = RemediationEngine::new(
        store,
        EngineOptions {
            dry_run: settings.dry_run,
            ..EngineOptions::default()
        },
    );
    let report = engine.rollback_all(&summary.results).await;
    let remediation_failed = report.failed > 0;
    Ok(RollbackOutcome {
        report,
        remediation_failed,
    })
}

/// Write `rollback.json` and `rollback.md` into `out_dir`.
pub fn write_rollback_artifacts(
    outcome: &RollbackOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;
    write_json(writer, &out_dir.join("rollback.json"), &outcome.report)
        .context("serialize rollback report")?;
    let rollback_md = render_rollback_md(&outcome.report);
    writer.write_file(&out_dir.join("rollback.md"), rollback_md.as_bytes())?;
    Ok(())
}

async fn snapshot(
    settings: &SnapshotSettings,
    store: &dyn DataStore,
) -> Result<DataSnapshot, recordfix_snapshot::SnapshotError> {
    let options = SnapshotOptions {
        case_volume_threshold: settings.case_volume_threshold,
        weights: settings.weights.clone(),
    };
    SnapshotGenerator::new(store, options).generate_snapshot().await
}

fn write_json<T: Serialize>(
    writer: &dyn WritePort,
    path: &Utf8Path,
    value: &T,
) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    writer.write_file(path, json.as_bytes())
}
