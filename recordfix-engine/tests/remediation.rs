use pretty_assertions::assert_eq;
use recordfix_domain::Planner;
use recordfix_engine::{EngineOptions, RemediationEngine};
use recordfix_store::{InMemoryStore, StoreOp};
use recordfix_types::issue::ValidationIssue;
use serde_json::{Value, json};

fn issues(v: Value) -> Vec<ValidationIssue> {
    serde_json::from_value(v).expect("valid issues")
}

fn live() -> EngineOptions {
    EngineOptions::default()
}

fn dry() -> EngineOptions {
    EngineOptions {
        dry_run: true,
        ..EngineOptions::default()
    }
}

/// Judge j1 caches 40 cases but 42 cases reference it; case c-orphan points
/// at a judge that does not exist.
fn case_count_store() -> InMemoryStore {
    let mut cases: Vec<Value> = (0..42)
        .map(|i| json!({"id": format!("c{}", i), "judge_id": "j1", "outcome": "settled"}))
        .collect();
    cases.push(json!({"id": "c-orphan", "judge_id": "ghost", "outcome": "dismissed"}));
    InMemoryStore::new()
        .with_table("judges", vec![json!({"id": "j1", "name": "Ann Lee", "total_cases": 40})])
        .with_table("cases", cases)
}

fn case_count_issues() -> Vec<ValidationIssue> {
    issues(json!([
        {
            "entity": "case", "entityId": "c-orphan", "type": "orphaned_record",
            "severity": "high", "message": "judge missing", "autoFixable": true
        },
        {
            "entity": "judge", "entityId": "j1", "type": "data_integrity",
            "severity": "medium", "message": "case count mismatch", "autoFixable": true,
            "metadata": { "actual_count": 42, "stored_count": 40 }
        }
    ]))
}

#[tokio::test]
async fn orphaned_case_and_case_count_live_run() {
    let store = case_count_store();
    let engine = RemediationEngine::new(&store, live());
    let summary = engine.execute_remediation(&case_count_issues()).await;

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 0);

    let count = summary
        .results
        .iter()
        .find(|r| r.action_taken == "recalculate_case_count")
        .expect("count result");
    assert_eq!(count.changes_made["total_cases"], json!(42));
    let rb = count.rollback().expect("rollback info");
    assert_eq!(rb.original_values["total_cases"], json!(40));
    assert_eq!(rb.table, "judges");

    assert_eq!(store.get("judges", "j1").unwrap()["total_cases"], json!(42));
    assert_eq!(store.get("cases", "c-orphan").unwrap()["judge_id"], Value::Null);
}

#[tokio::test]
async fn dry_run_never_mutates_and_reports_same_changes() {
    let dry_store = case_count_store();
    let dry_summary = RemediationEngine::new(&dry_store, dry())
        .execute_remediation(&case_count_issues())
        .await;
    assert_eq!(dry_store.mutations(), 0);
    assert!(dry_summary.dry_run);

    let live_store = case_count_store();
    let live_summary = RemediationEngine::new(&live_store, live())
        .execute_remediation(&case_count_issues())
        .await;

    assert_eq!(dry_summary.results.len(), live_summary.results.len());
    for (d, l) in dry_summary.results.iter().zip(&live_summary.results) {
        assert!(d.is_dry_run());
        assert_eq!(d.action_taken, format!("dry_run:{}", l.action_taken));
        assert_eq!(d.changes_made, l.changes_made);
        assert_eq!(d.records_affected, l.records_affected);
        assert!(d.rollback_info.is_empty());
    }
}

/// A store where each of the eight handlers has its own rows, so running the
/// batch live leaves no handler's reads disturbed by an earlier write.
fn every_handler_store() -> InMemoryStore {
    let mut cases: Vec<Value> = (0..42)
        .map(|i| json!({"id": format!("c{}", i), "judge_id": "j1", "outcome": "settled"}))
        .collect();
    cases.push(json!({"id": "c-orphan", "judge_id": "ghost", "outcome": "dismissed"}));
    cases.push(json!({"id": "c-outcome", "judge_id": "j2", "outcome": "Settled out of court"}));
    InMemoryStore::new()
        .with_table(
            "judges",
            vec![
                json!({"id": "j1", "name": "Ann Lee", "total_cases": 40}),
                json!({"id": "j2", "name": "HON. JOHN SMITH", "total_cases": 1}),
            ],
        )
        .with_table("cases", cases)
        .with_table(
            "judge_court_assignments",
            vec![
                json!({"id": "m1", "judge_id": "j3", "assignment_type": "primary", "start_date": "2015-01-01"}),
                json!({"id": "m2", "judge_id": "j3", "assignment_type": "primary", "start_date": "2022-01-01"}),
                json!({"id": "o1", "judge_id": "j4", "assignment_type": "primary", "start_date": "2020-01-01", "end_date": null}),
                json!({"id": "o2", "judge_id": "j4", "assignment_type": "visiting", "start_date": "2021-06-01", "end_date": null}),
                json!({"id": "x1", "judge_id": "ghost", "assignment_type": "visiting", "start_date": "2019-01-01"}),
            ],
        )
}

fn every_handler_issues() -> Vec<ValidationIssue> {
    let mut batch = case_count_issues();
    batch.extend(issues(json!([
        {
            "entity": "judge", "entityId": "j3", "type": "inconsistent_relationship",
            "severity": "high", "message": "judge has multiple primary courts", "autoFixable": true
        },
        {
            "entity": "judge", "entityId": "j4", "type": "inconsistent_relationship",
            "severity": "medium", "autoFixable": true,
            "metadata": { "conflict": "overlap", "assignment_ids": ["o1", "o2"] }
        },
        {
            "entity": "judge", "entityId": "j2", "type": "data_integrity", "severity": "low",
            "autoFixable": true, "metadata": { "name_issues": ["honorific_prefix", "all_uppercase"] }
        },
        {
            "entity": "case", "entityId": "c-outcome", "type": "data_integrity", "severity": "low",
            "autoFixable": true, "metadata": { "suggested_outcome": "settled" }
        },
        {
            "entity": "judge", "entityId": "j9", "type": "stale_data", "severity": "low",
            "autoFixable": true, "metadata": { "external_id": "cl-9" }
        },
        {
            "entity": "assignment", "entityId": "x1", "type": "orphaned_record",
            "severity": "critical", "autoFixable": true
        }
    ])));
    batch
}

#[tokio::test]
async fn dry_run_matches_live_for_every_handler() {
    let dry_store = every_handler_store();
    let dry_summary = RemediationEngine::new(&dry_store, dry())
        .execute_remediation(&every_handler_issues())
        .await;
    assert_eq!(dry_store.mutations(), 0);
    assert_eq!(dry_summary.successful, 8);
    assert_eq!(
        dry_store.get("judge_court_assignments", "x1").unwrap()["judge_id"],
        json!("ghost")
    );

    let live_store = every_handler_store();
    let live_summary = RemediationEngine::new(&live_store, live())
        .execute_remediation(&every_handler_issues())
        .await;
    assert_eq!(live_summary.successful, 8);

    let mut labels: Vec<_> = live_summary
        .results
        .iter()
        .map(|r| r.action_taken.as_str())
        .collect();
    labels.sort_unstable();
    labels.dedup();
    assert_eq!(labels.len(), 8, "{:?}", labels);

    for (d, l) in dry_summary.results.iter().zip(&live_summary.results) {
        assert!(d.is_dry_run());
        assert_eq!(d.action_taken, format!("dry_run:{}", l.action_taken));
        assert_eq!(d.changes_made, l.changes_made, "{}", l.action_taken);
        assert_eq!(d.records_affected, l.records_affected, "{}", l.action_taken);
        assert!(d.rollback_info.is_empty());
    }
}

#[tokio::test]
async fn numeric_ids_resolve_like_string_ids() {
    let store = InMemoryStore::new()
        .with_table("cases", vec![json!({"id": 7, "judge_id": 999})])
        .with_table(
            "judge_court_assignments",
            vec![
                json!({"id": 1, "judge_id": 5, "assignment_type": "primary", "start_date": "2015-01-01"}),
                json!({"id": 2, "judge_id": 5, "assignment_type": "primary", "start_date": "2022-01-01"}),
            ],
        );
    let batch = issues(json!([
        {
            "entity": "case", "entityId": "7", "type": "orphaned_record",
            "severity": "high", "autoFixable": true
        },
        {
            "entity": "judge", "entityId": "5", "type": "inconsistent_relationship",
            "severity": "high", "autoFixable": true,
            "metadata": { "conflict": "multiple_primary", "assignment_ids": [1, 2] }
        }
    ]));

    let summary = RemediationEngine::new(&store, live())
        .execute_remediation(&batch)
        .await;
    assert_eq!(summary.failed, 0, "{:?}", summary.results);

    assert_eq!(store.get("cases", "7").unwrap()["judge_id"], Value::Null);
    let primary = &summary.results[1];
    assert_eq!(primary.records_affected, 1);
    assert_eq!(primary.changes_made["demoted_ids"], json!(["1"]));
    assert_eq!(
        store.get("judge_court_assignments", "1").unwrap()["assignment_type"],
        json!("visiting")
    );
    assert_eq!(
        store.get("judge_court_assignments", "2").unwrap()["assignment_type"],
        json!("primary")
    );
}

#[tokio::test]
async fn multiple_primary_with_unknown_ids_is_not_found() {
    let store = InMemoryStore::new().with_table(
        "judge_court_assignments",
        vec![json!({"id": "a1", "judge_id": "j1", "assignment_type": "primary"})],
    );
    let batch = issues(json!([{
        "entity": "judge", "entityId": "j1", "type": "inconsistent_relationship",
        "severity": "high", "autoFixable": true,
        "metadata": { "conflict": "multiple_primary", "assignment_ids": ["nope", "gone"] }
    }]));
    let summary = RemediationEngine::new(&store, live())
        .execute_remediation(&batch)
        .await;
    assert!(!summary.results[0].success);
    assert_eq!(summary.results[0].error_tag.as_deref(), Some("record_not_found"));
}

#[tokio::test]
async fn planned_name_change_matches_engine_write() {
    let store = InMemoryStore::new().with_table(
        "judges",
        vec![json!({"id": "j1", "name": "HON. JOHN SMITH"})],
    );
    let batch = issues(json!([{
        "entity": "judge", "entityId": "j1", "type": "data_integrity",
        "severity": "low", "autoFixable": true,
        "metadata": {
            "name_issues": ["honorific_prefix", "all_uppercase"],
            "suggested_name": "John Q. Smith",
            "current_name": "HON. JOHN SMITH"
        }
    }]));

    let plan = Planner::new().plan(&batch);
    let summary = RemediationEngine::new(&store, live())
        .execute_remediation(&batch)
        .await;

    assert_eq!(plan.actions[0].changes["name"], summary.results[0].changes_made["name"]);
    assert_eq!(store.get("judges", "j1").unwrap()["name"], json!("John Smith"));
}

#[tokio::test]
async fn overlap_sets_earlier_end_date_and_rolls_back() {
    let store = InMemoryStore::new().with_table(
        "judge_court_assignments",
        vec![
            json!({"id": "B", "judge_id": "j1", "assignment_type": "visiting", "start_date": "2021-06-01", "end_date": null}),
            json!({"id": "A", "judge_id": "j1", "assignment_type": "primary", "start_date": "2020-01-01", "end_date": null}),
        ],
    );
    let batch = issues(json!([{
        "entity": "judge", "entityId": "j1", "type": "inconsistent_relationship",
        "severity": "medium", "message": "assignments overlap", "autoFixable": true,
        "metadata": { "assignment_ids": ["B", "A"] }
    }]));

    let engine = RemediationEngine::new(&store, live());
    let summary = engine.execute_remediation(&batch).await;
    let result = &summary.results[0];
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.action_taken, "resolve_temporal_overlap");

    let a = store.get("judge_court_assignments", "A").unwrap();
    assert_eq!(a["end_date"], json!("2021-06-01"));

    let rb = result.rollback().expect("rollback");
    assert_eq!(rb.record_id, "A");
    assert_eq!(rb.original_values["end_date"], Value::Null);

    assert!(engine.rollback(rb).await);
    let a = store.get("judge_court_assignments", "A").unwrap();
    assert_eq!(a["end_date"], Value::Null);
}

#[tokio::test]
async fn multiple_primary_keeps_latest_and_demotes_rest() {
    let store = InMemoryStore::new().with_table(
        "judge_court_assignments",
        vec![
            json!({"id": "a1", "judge_id": "j1", "assignment_type": "primary", "start_date": "2015-01-01"}),
            json!({"id": "a2", "judge_id": "j1", "assignment_type": "primary", "start_date": "2022-01-01"}),
            json!({"id": "a3", "judge_id": "j1", "assignment_type": "primary", "start_date": "2018-01-01"}),
            json!({"id": "a4", "judge_id": "j2", "assignment_type": "primary", "start_date": "2010-01-01"}),
        ],
    );
    let batch = issues(json!([{
        "entity": "judge", "entityId": "j1", "type": "inconsistent_relationship",
        "severity": "high", "message": "judge has multiple primary courts", "autoFixable": true
    }]));

    let engine = RemediationEngine::new(&store, live());
    let summary = engine.execute_remediation(&batch).await;
    let result = &summary.results[0];
    assert!(result.success);
    assert_eq!(result.records_affected, 2);
    assert_eq!(result.changes_made["kept_id"], json!("a2"));
    assert_eq!(result.changes_made["demoted_ids"], json!(["a3", "a1"]));
    assert_eq!(result.rollback_info.len(), 2);

    let types: Vec<_> = store
        .rows("judge_court_assignments")
        .iter()
        .map(|r| r["assignment_type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(types, vec!["visiting", "primary", "visiting", "primary"]);

    let report = engine.rollback_all(&summary.results).await;
    assert_eq!(report.restored, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(
        store.get("judge_court_assignments", "a1").unwrap()["assignment_type"],
        json!("primary")
    );
}

#[tokio::test]
async fn single_primary_is_a_no_op_success() {
    let store = InMemoryStore::new().with_table(
        "judge_court_assignments",
        vec![json!({"id": "a1", "judge_id": "j1", "assignment_type": "primary", "start_date": "2015-01-01"})],
    );
    let batch = issues(json!([{
        "entity": "judge", "entityId": "j1", "type": "inconsistent_relationship",
        "severity": "low", "autoFixable": true, "metadata": { "conflict": "multiple_primary" }
    }]));
    let summary = RemediationEngine::new(&store, live())
        .execute_remediation(&batch)
        .await;
    assert!(summary.results[0].success);
    assert_eq!(summary.results[0].records_affected, 0);
    assert_eq!(store.mutations(), 0);
}

#[tokio::test]
async fn name_standardization_applies_flagged_rules_only() {
    let store = InMemoryStore::new().with_table(
        "judges",
        vec![json!({"id": "j1", "name": "HON. JOHN SMITH"})],
    );
    let batch = issues(json!([{
        "entity": "judge", "entityId": "j1", "type": "data_integrity",
        "severity": "low", "autoFixable": true,
        "metadata": { "name_issues": ["honorific_prefix", "all_uppercase"] }
    }]));
    let engine = RemediationEngine::new(&store, live());
    let summary = engine.execute_remediation(&batch).await;
    let result = &summary.results[0];
    assert_eq!(result.action_taken, "standardize_name");
    assert_eq!(result.changes_made["name"], json!("John Smith"));
    assert_eq!(result.rollback().unwrap().original_values["name"], json!("HON. JOHN SMITH"));
    assert_eq!(store.get("judges", "j1").unwrap()["name"], json!("John Smith"));
}

#[tokio::test]
async fn outcome_mapping_and_resync_queue() {
    let store = InMemoryStore::new().with_table(
        "cases",
        vec![json!({"id": "c1", "outcome": "Settled out of court"})],
    );
    let batch = issues(json!([
        {
            "entity": "case", "entityId": "c1", "type": "data_integrity", "severity": "low",
            "autoFixable": true, "metadata": { "suggested_outcome": "settled" }
        },
        {
            "entity": "judge", "entityId": "j9", "type": "stale_data", "severity": "low",
            "autoFixable": true, "metadata": { "external_id": "cl-9" }
        }
    ]));
    let engine = RemediationEngine::new(
        &store,
        EngineOptions {
            dry_run: false,
            resync_priority: 3,
        },
    );
    let summary = engine.execute_remediation(&batch).await;
    assert_eq!(summary.successful, 2);

    let outcome = &summary.results[0];
    assert_eq!(outcome.rollback().unwrap().original_values["outcome"], json!("Settled out of court"));
    assert_eq!(store.get("cases", "c1").unwrap()["outcome"], json!("settled"));

    let resync = &summary.results[1];
    assert_eq!(resync.action_taken, "queue_resync");
    assert!(resync.rollback_info.is_empty());
    let queue = store.rows("sync_queue");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["priority"], json!(3));
    assert_eq!(queue[0]["status"], json!("pending"));
    assert_eq!(queue[0]["external_id"], json!("cl-9"));
}

#[tokio::test]
async fn orphaned_assignment_is_deleted_without_rollback() {
    let store = InMemoryStore::new().with_table(
        "judge_court_assignments",
        vec![json!({"id": "a1", "judge_id": "ghost"})],
    );
    let batch = issues(json!([{
        "entity": "assignment", "entityId": "a1", "type": "orphaned_record",
        "severity": "critical", "autoFixable": true
    }]));
    let summary = RemediationEngine::new(&store, live())
        .execute_remediation(&batch)
        .await;
    let result = &summary.results[0];
    assert!(result.success);
    assert_eq!(result.action_taken, "delete_orphaned_assignment");
    assert!(result.rollback_info.is_empty());
    assert!(store.rows("judge_court_assignments").is_empty());
}

#[tokio::test]
async fn failures_are_isolated_per_issue() {
    let store = case_count_store();
    store.fail_on("cases", StoreOp::Update);

    let mut batch = case_count_issues();
    batch.extend(issues(json!([
        { "entity": "judge", "entityId": "j1", "type": "schema_drift", "severity": "low", "autoFixable": true },
        { "entity": "judge", "entityId": "j1", "type": "stale_data", "severity": "low", "autoFixable": false },
        { "entity": "case", "entityId": "missing", "type": "data_integrity", "severity": "low",
          "autoFixable": true, "metadata": { "suggested_outcome": "settled" } }
    ])));

    let summary = RemediationEngine::new(&store, live())
        .execute_remediation(&batch)
        .await;

    assert_eq!(summary.total_issues, 5);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.attempted, 4);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed, 3);

    let tags: Vec<_> = summary
        .failed_results()
        .map(|r| r.error_tag.clone().unwrap_or_default())
        .collect();
    assert_eq!(tags, vec!["store_error", "unknown_issue_type", "record_not_found"]);

    assert_eq!(store.get("judges", "j1").unwrap()["total_cases"], json!(42));
}

#[tokio::test]
async fn overlap_without_ids_fails_with_missing_metadata() {
    let store = InMemoryStore::new();
    let batch = issues(json!([{
        "entity": "judge", "entityId": "j1", "type": "inconsistent_relationship",
        "severity": "low", "autoFixable": true, "metadata": { "conflict": "overlap" }
    }]));
    let summary = RemediationEngine::new(&store, live())
        .execute_remediation(&batch)
        .await;
    assert_eq!(summary.results[0].error_tag.as_deref(), Some("missing_metadata"));
}

#[tokio::test]
async fn rollback_reports_missing_records() {
    let store = case_count_store();
    let engine = RemediationEngine::new(&store, live());
    let summary = engine.execute_remediation(&case_count_issues()).await;

    store.fail_on("judges", StoreOp::Update);
    let report = engine.rollback_all(&summary.results).await;
    assert_eq!(report.attempted, 2);
    assert_eq!(report.restored, 1);
    assert_eq!(report.failures, vec!["judges/j1".to_string()]);
    assert_eq!(store.get("cases", "c-orphan").unwrap()["judge_id"], json!("ghost"));
}
