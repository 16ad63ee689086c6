use crate::error::SnapshotError;
use crate::health::{HealthWeights, compute_health_score};
use chrono::Utc;
use recordfix_domain::detect_name_issues;
use recordfix_domain::taxonomy::is_canonical_outcome;
use recordfix_store::{DataStore, Query, Record};
use recordfix_types::snapshot::{
    AssignmentStats, CaseStats, CourtStats, DataSnapshot, JudgeStats, QualityMetrics,
};
use recordfix_types::tables;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotOptions {
    /// Judges whose cached `total_cases` is below this count are low-volume.
    pub case_volume_threshold: u64,
    pub weights: HealthWeights,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            case_volume_threshold: 10,
            weights: HealthWeights::default(),
        }
    }
}

/// Computes [`DataSnapshot`]s with read-only queries.
pub struct SnapshotGenerator<'a> {
    store: &'a dyn DataStore,
    options: SnapshotOptions,
}

impl<'a> SnapshotGenerator<'a> {
    pub fn new(store: &'a dyn DataStore, options: SnapshotOptions) -> Self {
        Self { store, options }
    }

    pub async fn generate_snapshot(&self) -> Result<DataSnapshot, SnapshotError> {
        let generated_at = Utc::now();

        let (judges, courts, cases, assignments, quality) = tokio::try_join!(
            self.judge_stats(),
            self.court_stats(),
            self.case_stats(),
            self.assignment_stats(),
            self.quality_metrics(),
        )?;

        let health_score = compute_health_score(&quality, &judges, &cases, &self.options.weights);
        let snapshot = DataSnapshot {
            schema: recordfix_types::schema::RECORDFIX_SNAPSHOT_V1.to_string(),
            snapshot_id: uuid::Uuid::new_v4().to_string(),
            generated_at,
            judges,
            courts,
            cases,
            assignments,
            quality,
            health_score,
        };
        info!(
            snapshot_id = snapshot.snapshot_id.as_str(),
            health_score = snapshot.health_score,
            quality_issues = snapshot.quality.total(),
            "snapshot generated"
        );
        Ok(snapshot)
    }

    async fn count(&self, query: Query) -> Result<u64, SnapshotError> {
        Ok(self.store.count(&query).await?)
    }

    async fn rows(&self, table: &str, columns: &[&str]) -> Result<Vec<Record>, SnapshotError> {
        let rows = self
            .store
            .select(&Query::table(table).columns(columns))
            .await?;
        debug!(table, rows = rows.len(), "snapshot query");
        Ok(rows)
    }

    async fn judge_stats(&self) -> Result<JudgeStats, SnapshotError> {
        let threshold = self.options.case_volume_threshold;
        let (total, with_primary_court, low_volume) = tokio::try_join!(
            self.count(Query::table(tables::JUDGES)),
            self.count(Query::table(tables::JUDGES).not_null("court_id")),
            self.rows(tables::JUDGES, &["id", "total_cases"]),
        )?;

        let below_case_threshold = low_volume
            .iter()
            .filter(|r| r.get("total_cases").and_then(Value::as_u64).unwrap_or(0) < threshold)
            .count() as u64;

        Ok(JudgeStats {
            total,
            with_primary_court,
            without_primary_court: total - with_primary_court,
            below_case_threshold,
            case_volume_threshold: threshold,
        })
    }

    async fn court_stats(&self) -> Result<CourtStats, SnapshotError> {
        let (courts, judges, assignments) = tokio::try_join!(
            self.rows(tables::COURTS, &["id", "jurisdiction"]),
            self.rows(tables::JUDGES, &["court_id"]),
            self.rows(tables::ASSIGNMENTS, &["court_id"]),
        )?;

        let staffed: BTreeSet<String> = judges
            .iter()
            .chain(assignments.iter())
            .filter_map(|r| text(r, "court_id"))
            .collect();
        let with_judges = courts
            .iter()
            .filter(|c| text(c, "id").is_some_and(|id| staffed.contains(&id)))
            .count() as u64;
        let jurisdictions = courts
            .iter()
            .filter_map(|c| text(c, "jurisdiction"))
            .collect::<BTreeSet<_>>()
            .len() as u64;

        Ok(CourtStats {
            total: courts.len() as u64,
            with_judges,
            without_judges: courts.len() as u64 - with_judges,
            jurisdictions,
        })
    }

    async fn case_stats(&self) -> Result<CaseStats, SnapshotError> {
        let (cases, judge_ids) = tokio::try_join!(
            self.rows(tables::CASES, &["id", "judge_id", "outcome"]),
            self.ids(tables::JUDGES),
        )?;

        let mut stats = CaseStats {
            total: cases.len() as u64,
            ..CaseStats::default()
        };
        for case in &cases {
            match text(case, "judge_id") {
                None => stats.unassigned += 1,
                Some(judge) if judge_ids.contains(&judge) => stats.linked_to_judge += 1,
                Some(_) => stats.orphaned += 1,
            }
            match case.get("outcome").and_then(Value::as_str) {
                Some(o) if is_canonical_outcome(o) => stats.valid_outcome += 1,
                Some(_) => stats.invalid_outcome += 1,
                None => {}
            }
        }
        Ok(stats)
    }

    async fn assignment_stats(&self) -> Result<AssignmentStats, SnapshotError> {
        let rows = self.assignments().await?;
        let overlapping: BTreeSet<usize> = overlapping_pairs(&rows)
            .into_iter()
            .flat_map(|(a, b)| [a, b])
            .collect();

        Ok(AssignmentStats {
            total: rows.len() as u64,
            active: rows.iter().filter(|r| is_active(r)).count() as u64,
            primary: rows.iter().filter(|r| is_primary(r)).count() as u64,
            overlapping: overlapping.len() as u64,
        })
    }

    async fn quality_metrics(&self) -> Result<QualityMetrics, SnapshotError> {
        let (
            orphaned_records,
            duplicate_identifiers,
            missing_required_fields,
            standardization_issues,
            relationship_inconsistencies,
            temporal_overlaps,
            jurisdiction_mismatches,
        ) = tokio::try_join!(
            self.orphaned_records(),
            self.duplicate_identifiers(),
            self.missing_required_fields(),
            self.standardization_issues(),
            self.relationship_inconsistencies(),
            self.temporal_overlaps(),
            self.jurisdiction_mismatches(),
        )?;

        Ok(QualityMetrics {
            orphaned_records,
            duplicate_identifiers,
            missing_required_fields,
            standardization_issues,
            relationship_inconsistencies,
            temporal_overlaps,
            jurisdiction_mismatches,
        })
    }

    async fn ids(&self, table: &str) -> Result<BTreeSet<String>, SnapshotError> {
        Ok(self
            .rows(table, &["id"])
            .await?
            .iter()
            .filter_map(|r| text(r, "id"))
            .collect())
    }

    async fn assignments(&self) -> Result<Vec<Record>, SnapshotError> {
        self.rows(
            tables::ASSIGNMENTS,
            &["id", "judge_id", "court_id", "assignment_type", "start_date", "end_date", "status"],
        )
        .await
    }

    /// Cases pointing at a missing judge, and assignments pointing at a
    /// missing judge or court.
    async fn orphaned_records(&self) -> Result<u64, SnapshotError> {
        let (judge_ids, court_ids, cases, assignments) = tokio::try_join!(
            self.ids(tables::JUDGES),
            self.ids(tables::COURTS),
            self.rows(tables::CASES, &["judge_id"]),
            self.rows(tables::ASSIGNMENTS, &["judge_id", "court_id"]),
        )?;

        let dangling = |r: &Record, key: &str, ids: &BTreeSet<String>| {
            text(r, key).is_some_and(|id| !ids.contains(&id))
        };
        let orphaned_cases = cases
            .iter()
            .filter(|c| dangling(c, "judge_id", &judge_ids))
            .count();
        let orphaned_assignments = assignments
            .iter()
            .filter(|a| dangling(a, "judge_id", &judge_ids) || dangling(a, "court_id", &court_ids))
            .count();
        Ok((orphaned_cases + orphaned_assignments) as u64)
    }

    /// Extra records sharing an external id (judges, courts) or case number.
    async fn duplicate_identifiers(&self) -> Result<u64, SnapshotError> {
        let (judges, courts, cases) = tokio::try_join!(
            self.rows(tables::JUDGES, &["courtlistener_id"]),
            self.rows(tables::COURTS, &["courtlistener_id"]),
            self.rows(tables::CASES, &["case_number"]),
        )?;
        Ok(duplicates(&judges, "courtlistener_id")
            + duplicates(&courts, "courtlistener_id")
            + duplicates(&cases, "case_number"))
    }

    async fn missing_required_fields(&self) -> Result<u64, SnapshotError> {
        let (judges, courts, cases) = tokio::try_join!(
            self.rows(tables::JUDGES, &["name"]),
            self.rows(tables::COURTS, &["name", "jurisdiction"]),
            self.rows(tables::CASES, &["case_number"]),
        )?;
        let missing = |rows: &[Record], key: &str| rows.iter().filter(|r| text(r, key).is_none()).count();
        Ok((missing(&judges, "name")
            + missing(&courts, "name")
            + missing(&courts, "jurisdiction")
            + missing(&cases, "case_number")) as u64)
    }

    async fn standardization_issues(&self) -> Result<u64, SnapshotError> {
        let (judges, courts) = tokio::try_join!(
            self.rows(tables::JUDGES, &["name"]),
            self.rows(tables::COURTS, &["name"]),
        )?;
        Ok(judges
            .iter()
            .chain(courts.iter())
            .filter_map(|r| r.get("name").and_then(Value::as_str))
            .filter(|name| !detect_name_issues(name).is_empty())
            .count() as u64)
    }

    /// Judges with more than one active primary assignment.
    async fn relationship_inconsistencies(&self) -> Result<u64, SnapshotError> {
        let rows = self.assignments().await?;
        let mut primaries: BTreeMap<String, u64> = BTreeMap::new();
        for row in rows.iter().filter(|r| is_primary(r) && is_active(r)) {
            if let Some(judge) = text(row, "judge_id") {
                *primaries.entry(judge).or_default() += 1;
            }
        }
        Ok(primaries.values().filter(|n| **n > 1).count() as u64)
    }

    async fn temporal_overlaps(&self) -> Result<u64, SnapshotError> {
        let rows = self.assignments().await?;
        Ok(overlapping_pairs(&rows).len() as u64)
    }

    /// Cases heard in a court whose jurisdiction differs from the jurisdiction
    /// of the judge's primary court.
    async fn jurisdiction_mismatches(&self) -> Result<u64, SnapshotError> {
        let (courts, judges, cases) = tokio::try_join!(
            self.rows(tables::COURTS, &["id", "jurisdiction"]),
            self.rows(tables::JUDGES, &["id", "court_id"]),
            self.rows(tables::CASES, &["judge_id", "court_id"]),
        )?;

        let jurisdiction: BTreeMap<String, String> = courts
            .iter()
            .filter_map(|c| Some((text(c, "id")?, text(c, "jurisdiction")?)))
            .collect();
        let home_court: BTreeMap<String, String> = judges
            .iter()
            .filter_map(|j| Some((text(j, "id")?, text(j, "court_id")?)))
            .collect();

        let mismatches = cases
            .iter()
            .filter(|case| {
                let case_j = text(case, "court_id").and_then(|c| jurisdiction.get(&c));
                let judge_j = text(case, "judge_id")
                    .and_then(|j| home_court.get(&j))
                    .and_then(|c| jurisdiction.get(c));
                matches!((case_j, judge_j), (Some(a), Some(b)) if a != b)
            })
            .count();
        Ok(mismatches as u64)
    }
}

/// Non-empty string (or number) column value.
fn text(row: &Record, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_active(row: &Record) -> bool {
    text(row, "end_date").is_none()
        && !matches!(
            row.get("status").and_then(Value::as_str),
            Some("inactive" | "ended")
        )
}

fn is_primary(row: &Record) -> bool {
    row.get("assignment_type").and_then(Value::as_str) == Some("primary")
}

fn duplicates(rows: &[Record], key: &str) -> u64 {
    let mut seen: BTreeMap<String, u64> = BTreeMap::new();
    for id in rows.iter().filter_map(|r| text(r, key)) {
        *seen.entry(id).or_default() += 1;
    }
    seen.values().map(|n| n - 1).sum()
}

fn ends_after(end: &Option<String>, start: &str) -> bool {
    end.as_deref().is_none_or(|e| e > start)
}

/// Index pairs of same-judge assignments whose `[start, end)` ranges
/// intersect. A missing end date is open-ended; a missing start date never
/// overlaps.
fn overlapping_pairs(rows: &[Record]) -> Vec<(usize, usize)> {
    let mut by_judge: BTreeMap<String, Vec<(usize, String, Option<String>)>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        if let (Some(judge), Some(start)) = (text(row, "judge_id"), text(row, "start_date")) {
            by_judge
                .entry(judge)
                .or_default()
                .push((i, start, text(row, "end_date")));
        }
    }

    let mut pairs = Vec::new();
    for spans in by_judge.values() {
        for (x, (i, start_i, end_i)) in spans.iter().enumerate() {
            for (j, start_j, end_j) in &spans[x + 1..] {
                if ends_after(end_i, start_j) && ends_after(end_j, start_i) {
                    pairs.push((*i, *j));
                }
            }
        }
    }
    pairs
}
