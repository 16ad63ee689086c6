//! One handler per issue kind.
//!
//! Each handler reads what it needs (including the values it will overwrite),
//! then writes unless the engine is in dry-run mode. `changes_made` is
//! computed from the reads, so a dry run reports the same change set as a
//! live run against the same data.

use crate::engine::RemediationEngine;
use crate::error::RemediationError;
use chrono::Utc;
use recordfix_domain::{NameFlags, standardize_name};
use recordfix_store::{Direction, Query, Record};
use recordfix_types::issue::{EntityKind, ValidationIssue};
use recordfix_types::result::RollbackInfo;
use recordfix_types::tables;
use serde_json::{Value, json};

/// What a handler did (or would do, in dry-run mode).
#[derive(Debug, Default)]
pub(crate) struct Applied {
    pub records_affected: u64,
    pub changes_made: Record,
    pub rollback_info: Vec<RollbackInfo>,
}

impl Applied {
    fn with_change(mut self, key: &str, value: Value) -> Self {
        self.changes_made.insert(key.to_string(), value);
        self
    }
}

fn record(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> Record {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn field(row: &Record, key: &str) -> Value {
    row.get(key).cloned().unwrap_or(Value::Null)
}

fn row_id(row: &Record) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl RemediationEngine<'_> {
    async fn fetch(&self, table: &str, id: &str) -> Result<Record, RemediationError> {
        self.store
            .select_one(&Query::by_id(table, id))
            .await?
            .ok_or_else(|| RemediationError::not_found(table, id))
    }

    /// Overwrite `patch` on one record, capturing the prior values first.
    async fn overwrite(
        &self,
        table: &str,
        id: &str,
        current: &Record,
        patch: Record,
    ) -> Result<Applied, RemediationError> {
        let mut applied = Applied {
            records_affected: 1,
            ..Applied::default()
        };

        if !self.options.dry_run {
            let original_values = patch.keys().map(|k| (k.clone(), field(current, k))).collect();
            applied.rollback_info.push(RollbackInfo {
                table: table.to_string(),
                record_id: id.to_string(),
                original_values,
                timestamp: Utc::now(),
            });
            applied.records_affected = self.store.update(&Query::by_id(table, id), &patch).await?;
        }

        applied.changes_made = patch;
        Ok(applied)
    }

    pub(crate) async fn nullify_orphaned_reference(
        &self,
        issue: &ValidationIssue,
        fk: &str,
    ) -> Result<Applied, RemediationError> {
        let case = self.fetch(tables::CASES, &issue.entity_id).await?;
        let mut patch = Record::new();
        patch.insert(fk.to_string(), Value::Null);
        self.overwrite(tables::CASES, &issue.entity_id, &case, patch)
            .await
    }

    pub(crate) async fn delete_orphaned_assignment(
        &self,
        issue: &ValidationIssue,
    ) -> Result<Applied, RemediationError> {
        let query = Query::by_id(tables::ASSIGNMENTS, &issue.entity_id);
        let removed = if self.options.dry_run {
            self.store.count(&query).await?
        } else {
            self.store.delete(&query).await?
        };
        if removed == 0 {
            return Err(RemediationError::not_found(tables::ASSIGNMENTS, &issue.entity_id));
        }

        Ok(Applied {
            records_affected: removed,
            ..Applied::default()
        }
        .with_change("id", json!(issue.entity_id))
        .with_change("deleted", json!(true)))
    }

    /// Keep the most recently started primary assignment, demote the rest.
    pub(crate) async fn resolve_multiple_primary(
        &self,
        issue: &ValidationIssue,
        assignment_ids: &[String],
    ) -> Result<Applied, RemediationError> {
        let query = Query::table(tables::ASSIGNMENTS);
        let query = if !assignment_ids.is_empty() {
            query.in_list("id", assignment_ids.iter().map(String::as_str))
        } else if issue.entity == EntityKind::Judge {
            query.eq("judge_id", issue.entity_id.as_str())
        } else {
            return Err(RemediationError::MissingMetadata("assignment_ids"));
        };
        let primaries = self
            .store
            .select(
                &query
                    .eq("assignment_type", "primary")
                    .order_by("start_date", Direction::Desc),
            )
            .await?;

        if primaries.len() <= 1 {
            if primaries.is_empty() && !assignment_ids.is_empty() {
                let listed = Query::table(tables::ASSIGNMENTS)
                    .in_list("id", assignment_ids.iter().map(String::as_str));
                if self.store.count(&listed).await? == 0 {
                    return Err(RemediationError::not_found(
                        tables::ASSIGNMENTS,
                        &assignment_ids[0],
                    ));
                }
            }
            return Ok(Applied::default());
        }

        let kept = row_id(&primaries[0]);
        let demoted: Vec<String> = primaries[1..].iter().filter_map(row_id).collect();
        let patch = record([("assignment_type", json!("visiting"))]);

        let mut applied = Applied {
            records_affected: demoted.len() as u64,
            ..Applied::default()
        };
        if !self.options.dry_run {
            let now = Utc::now();
            for row in &primaries[1..] {
                if let Some(id) = row_id(row) {
                    applied.rollback_info.push(RollbackInfo {
                        table: tables::ASSIGNMENTS.to_string(),
                        record_id: id,
                        original_values: record([("assignment_type", field(row, "assignment_type"))]),
                        timestamp: now,
                    });
                }
            }
            applied.records_affected = self
                .store
                .update(
                    &Query::table(tables::ASSIGNMENTS).in_list("id", demoted.iter().map(String::as_str)),
                    &patch,
                )
                .await?;
        }

        applied.changes_made = patch;
        Ok(applied
            .with_change("kept_id", json!(kept))
            .with_change("demoted_ids", json!(demoted)))
    }

    /// Close the earlier of two overlapping assignments at the later one's start.
    pub(crate) async fn resolve_temporal_overlap(
        &self,
        assignment_ids: &[String],
    ) -> Result<Applied, RemediationError> {
        if assignment_ids.len() < 2 {
            return Err(RemediationError::MissingMetadata("assignment_ids"));
        }
        let pair = &assignment_ids[..2];
        let rows = self
            .store
            .select(
                &Query::table(tables::ASSIGNMENTS)
                    .in_list("id", pair.iter().map(String::as_str))
                    .order_by("start_date", Direction::Asc),
            )
            .await?;
        if rows.len() < 2 {
            let missing = pair
                .iter()
                .find(|id| !rows.iter().any(|r| row_id(r).as_deref() == Some(id.as_str())))
                .map(String::as_str)
                .unwrap_or_default();
            return Err(RemediationError::not_found(tables::ASSIGNMENTS, missing));
        }

        let (earlier, later) = (&rows[0], &rows[1]);
        let earlier_id = row_id(earlier).unwrap_or_default();
        let later_start = match later.get("start_date") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => {
                let later_id = row_id(later).unwrap_or_default();
                return Err(RemediationError::invalid(
                    tables::ASSIGNMENTS,
                    &later_id,
                    "no start_date",
                ));
            }
        };

        let patch = record([("end_date", json!(later_start))]);
        self.overwrite(tables::ASSIGNMENTS, &earlier_id, earlier, patch)
            .await
    }

    pub(crate) async fn recalculate_case_count(
        &self,
        issue: &ValidationIssue,
    ) -> Result<Applied, RemediationError> {
        let judge = self.fetch(tables::JUDGES, &issue.entity_id).await?;
        let live = self
            .store
            .count(&Query::table(tables::CASES).eq("judge_id", issue.entity_id.as_str()))
            .await?;
        let patch = record([("total_cases", json!(live))]);
        self.overwrite(tables::JUDGES, &issue.entity_id, &judge, patch)
            .await
    }

    pub(crate) async fn standardize_name(
        &self,
        issue: &ValidationIssue,
        flags: &NameFlags,
        suggested_name: Option<&str>,
    ) -> Result<Applied, RemediationError> {
        let table = issue.entity.table();
        let row = self.fetch(table, &issue.entity_id).await?;
        let current = match row.get("name") {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(RemediationError::invalid(table, &issue.entity_id, "no name")),
        };

        let name = if flags.is_empty() {
            suggested_name
                .map(str::to_string)
                .ok_or(RemediationError::MissingMetadata("suggested_name"))?
        } else {
            standardize_name(&current, flags)
        };
        if name == current {
            return Ok(Applied::default());
        }

        let patch = record([("name", json!(name))]);
        self.overwrite(table, &issue.entity_id, &row, patch).await
    }

    pub(crate) async fn map_case_outcome(
        &self,
        issue: &ValidationIssue,
        outcome: &str,
    ) -> Result<Applied, RemediationError> {
        let case = self.fetch(tables::CASES, &issue.entity_id).await?;
        let patch = record([("outcome", json!(outcome))]);
        self.overwrite(tables::CASES, &issue.entity_id, &case, patch)
            .await
    }

    /// Additive: inserts a pending queue entry and captures no rollback.
    pub(crate) async fn queue_resync(
        &self,
        issue: &ValidationIssue,
        external_id: &str,
    ) -> Result<Applied, RemediationError> {
        let entry = record([
            ("entity_type", json!(issue.entity.as_str())),
            ("entity_id", json!(issue.entity_id)),
            ("external_id", json!(external_id)),
            ("priority", json!(self.options.resync_priority)),
            ("status", json!("pending")),
        ]);

        if !self.options.dry_run {
            let mut row = entry.clone();
            row.insert("requested_at".to_string(), json!(Utc::now().to_rfc3339()));
            self.store.insert(tables::SYNC_QUEUE, row).await?;
        }

        Ok(Applied {
            records_affected: 1,
            changes_made: entry,
            rollback_info: vec![],
        })
    }
}
