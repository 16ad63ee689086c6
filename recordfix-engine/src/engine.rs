use crate::error::RemediationError;
use crate::handlers::Applied;
use chrono::Utc;
use recordfix_domain::{IssueKind, classify};
use recordfix_store::{DataStore, Query};
use recordfix_types::issue::ValidationIssue;
use recordfix_types::result::{
    DRY_RUN_PREFIX, RemediationResult, RemediationSummary, RollbackInfo, RollbackReport,
};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Construction-time engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Perform reads only; results are labelled `dry_run:`.
    pub dry_run: bool,
    /// Priority of the `sync_queue` entries created for stale records.
    pub resync_priority: i64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            resync_priority: 5,
        }
    }
}

/// Executes auto-fixable issues one at a time against a store.
pub struct RemediationEngine<'a> {
    pub(crate) store: &'a dyn DataStore,
    pub(crate) options: EngineOptions,
}

impl<'a> RemediationEngine<'a> {
    pub fn new(store: &'a dyn DataStore, options: EngineOptions) -> Self {
        Self { store, options }
    }

    pub fn dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Handle every auto-fixable issue in input order. A failing issue yields
    /// a failed result; it never stops the batch.
    pub async fn execute_remediation(&self, issues: &[ValidationIssue]) -> RemediationSummary {
        let started = Instant::now();
        let mut summary = RemediationSummary::new(self.options.dry_run, Utc::now());
        summary.total_issues = issues.len() as u64;

        for issue in issues {
            if !issue.auto_fixable {
                summary.skipped += 1;
                continue;
            }
            summary.attempted += 1;

            let result = self.execute_one(issue).await;
            if result.success {
                summary.successful += 1;
            } else {
                summary.failed += 1;
            }
            summary.results.push(result);
        }

        summary.ended_at = Utc::now();
        summary.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            dry_run = self.options.dry_run,
            attempted = summary.attempted,
            successful = summary.successful,
            failed = summary.failed,
            skipped = summary.skipped,
            "remediation batch finished"
        );
        summary
    }

    async fn execute_one(&self, issue: &ValidationIssue) -> RemediationResult {
        let issue_id = issue.issue_id();
        let kind = classify(issue);
        let label = kind.rule().map(|r| r.label).unwrap_or("unclassified");
        let action_taken = if self.options.dry_run {
            format!("{}{}", DRY_RUN_PREFIX, label)
        } else {
            label.to_string()
        };

        match self.dispatch(issue, kind).await {
            Ok(applied) => {
                debug!(
                    issue_id = issue_id.as_str(),
                    action = action_taken.as_str(),
                    records_affected = applied.records_affected,
                    "issue remediated"
                );
                RemediationResult {
                    issue_id,
                    success: true,
                    action_taken,
                    records_affected: applied.records_affected,
                    changes_made: applied.changes_made,
                    error: None,
                    error_tag: None,
                    rollback_info: applied.rollback_info,
                }
            }
            Err(err) => {
                warn!(
                    issue_id = issue_id.as_str(),
                    action = action_taken.as_str(),
                    tag = err.tag(),
                    error = %err,
                    "issue remediation failed"
                );
                RemediationResult {
                    issue_id,
                    success: false,
                    action_taken,
                    records_affected: 0,
                    changes_made: Default::default(),
                    error: Some(err.to_string()),
                    error_tag: Some(err.tag().to_string()),
                    rollback_info: vec![],
                }
            }
        }
    }

    async fn dispatch(
        &self,
        issue: &ValidationIssue,
        kind: IssueKind,
    ) -> Result<Applied, RemediationError> {
        match kind {
            IssueKind::OrphanedCase { field } => self.nullify_orphaned_reference(issue, &field).await,
            IssueKind::OrphanedAssignment => self.delete_orphaned_assignment(issue).await,
            IssueKind::MultiplePrimary { assignment_ids } => {
                self.resolve_multiple_primary(issue, &assignment_ids).await
            }
            IssueKind::TemporalOverlap { assignment_ids, .. } => {
                self.resolve_temporal_overlap(&assignment_ids).await
            }
            IssueKind::CaseCountMismatch { .. } => self.recalculate_case_count(issue).await,
            IssueKind::NameStandardization {
                flags,
                suggested_name,
                ..
            } => {
                self.standardize_name(issue, &flags, suggested_name.as_deref())
                    .await
            }
            IssueKind::OutcomeMapping {
                suggested_outcome, ..
            } => self.map_case_outcome(issue, &suggested_outcome).await,
            IssueKind::StaleData { external_id } => self.queue_resync(issue, &external_id).await,
            IssueKind::Unclassified(reason) => Err(RemediationError::Unsupported(reason)),
        }
    }

    /// Write `original_values` back onto the captured record.
    ///
    /// Returns `false` (and logs) when the record is gone or the store fails.
    /// A dry-run engine only checks that the record still exists.
    pub async fn rollback(&self, info: &RollbackInfo) -> bool {
        let query = Query::by_id(&info.table, &info.record_id);

        if self.options.dry_run {
            return match self.store.count(&query).await {
                Ok(n) if n > 0 => true,
                Ok(_) => {
                    warn!(table = info.table.as_str(), record_id = info.record_id.as_str(), "rollback target missing");
                    false
                }
                Err(err) => {
                    warn!(table = info.table.as_str(), record_id = info.record_id.as_str(), error = %err, "rollback check failed");
                    false
                }
            };
        }

        match self.store.update(&query, &info.original_values).await {
            Ok(n) if n > 0 => {
                debug!(table = info.table.as_str(), record_id = info.record_id.as_str(), "rolled back");
                true
            }
            Ok(_) => {
                warn!(table = info.table.as_str(), record_id = info.record_id.as_str(), "rollback target missing");
                false
            }
            Err(err) => {
                warn!(table = info.table.as_str(), record_id = info.record_id.as_str(), error = %err, "rollback failed");
                false
            }
        }
    }

    /// Replay every captured rollback entry, last mutation first.
    pub async fn rollback_all(&self, results: &[RemediationResult]) -> RollbackReport {
        let mut report = RollbackReport::default();
        for info in results.iter().rev().flat_map(|r| r.rollback_info.iter().rev()) {
            report.attempted += 1;
            if self.rollback(info).await {
                report.restored += 1;
            } else {
                report.failed += 1;
                report
                    .failures
                    .push(format!("{}/{}", info.table, info.record_id));
            }
        }
        info!(
            attempted = report.attempted,
            restored = report.restored,
            failed = report.failed,
            "rollback finished"
        );
        report
    }
}
