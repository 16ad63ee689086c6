use camino::Utf8PathBuf;
use pretty_assertions::assert_eq;
use recordfix_snapshot::{
    FsSnapshotSink, SnapshotError, SnapshotGenerator, SnapshotOptions, SnapshotSink,
    compare_snapshots,
};
use recordfix_store::{InMemoryStore, StoreOp};
use serde_json::json;
use tempfile::TempDir;

fn messy_store() -> InMemoryStore {
    InMemoryStore::from_json(json!({
        "courts": [
            {"id": "ct1", "name": "District Court", "jurisdiction": "federal", "courtlistener_id": "c-1"},
            {"id": "ct2", "name": "County Court", "jurisdiction": "state", "courtlistener_id": "c-1"},
            {"id": "ct3", "name": "Empty Court", "jurisdiction": null}
        ],
        "judges": [
            {"id": "j1", "name": "HON. JOHN SMITH", "court_id": "ct1", "total_cases": 40, "courtlistener_id": "cl-1"},
            {"id": "j2", "name": "Ann Lee", "court_id": null, "total_cases": 12, "courtlistener_id": "cl-2"}
        ],
        "cases": [
            {"id": "k1", "case_number": "1", "judge_id": "j1", "court_id": "ct2", "outcome": "settled"},
            {"id": "k2", "case_number": "2", "judge_id": "ghost", "court_id": "ct1", "outcome": "won"},
            {"id": "k3", "case_number": "2", "judge_id": null, "outcome": null}
        ],
        "judge_court_assignments": [
            {"id": "a1", "judge_id": "j1", "court_id": "ct1", "assignment_type": "primary", "start_date": "2020-01-01", "end_date": null},
            {"id": "a2", "judge_id": "j1", "court_id": "ct2", "assignment_type": "primary", "start_date": "2021-06-01", "end_date": null},
            {"id": "a3", "judge_id": "j2", "court_id": "ct9", "assignment_type": "visiting", "start_date": "2019-01-01", "end_date": "2019-12-31"}
        ]
    }))
    .expect("dataset")
}

#[tokio::test]
async fn snapshot_counts_entities_and_quality_issues() {
    let store = messy_store();
    let snap = SnapshotGenerator::new(&store, SnapshotOptions::default())
        .generate_snapshot()
        .await
        .expect("snapshot");

    assert_eq!(snap.schema, "recordfix.snapshot.v1");
    assert_eq!(snap.judges.total, 2);
    assert_eq!(snap.judges.with_primary_court, 1);
    assert_eq!(snap.judges.without_primary_court, 1);
    assert_eq!(snap.judges.below_case_threshold, 0);

    assert_eq!(snap.courts.total, 3);
    assert_eq!(snap.courts.with_judges, 2);
    assert_eq!(snap.courts.jurisdictions, 2);

    assert_eq!(snap.cases.total, 3);
    assert_eq!(snap.cases.linked_to_judge, 1);
    assert_eq!(snap.cases.orphaned, 1);
    assert_eq!(snap.cases.unassigned, 1);
    assert_eq!(snap.cases.valid_outcome, 1);
    assert_eq!(snap.cases.invalid_outcome, 1);

    assert_eq!(snap.assignments.total, 3);
    assert_eq!(snap.assignments.active, 2);
    assert_eq!(snap.assignments.primary, 2);
    assert_eq!(snap.assignments.overlapping, 2);

    let q = snap.quality;
    assert_eq!(q.orphaned_records, 2, "case k2 and assignment a3");
    assert_eq!(q.duplicate_identifiers, 2, "court c-1 and case number 2");
    assert_eq!(q.missing_required_fields, 1);
    assert_eq!(q.standardization_issues, 1);
    assert_eq!(q.relationship_inconsistencies, 1);
    assert_eq!(q.temporal_overlaps, 1);
    assert_eq!(q.jurisdiction_mismatches, 1);

    assert!(snap.health_score < 100.0 && snap.health_score >= 0.0);
    assert_eq!(store.mutations(), 0);
}

#[tokio::test]
async fn empty_store_is_perfectly_healthy() {
    let store = InMemoryStore::new();
    let snap = SnapshotGenerator::new(&store, SnapshotOptions::default())
        .generate_snapshot()
        .await
        .expect("snapshot");
    assert_eq!(snap.health_score, 100.0);
    assert_eq!(snap.quality.total(), 0);
}

#[tokio::test]
async fn store_failure_fails_the_snapshot() {
    let store = messy_store();
    store.fail_on("cases", StoreOp::Select);
    let err = SnapshotGenerator::new(&store, SnapshotOptions::default())
        .generate_snapshot()
        .await
        .expect_err("injected failure");
    assert!(matches!(err, SnapshotError::Store(_)));
}

#[tokio::test]
async fn comparison_reports_improvement_after_cleanup() {
    let store = messy_store();
    let generator = SnapshotGenerator::new(&store, SnapshotOptions::default());
    let before = generator.generate_snapshot().await.unwrap();

    let clean = InMemoryStore::from_json(json!({
        "judges": [{"id": "j1", "name": "John Smith", "court_id": "ct1", "total_cases": 40}],
        "courts": [{"id": "ct1", "name": "District Court", "jurisdiction": "federal"}]
    }))
    .unwrap();
    let after = SnapshotGenerator::new(&clean, SnapshotOptions::default())
        .generate_snapshot()
        .await
        .unwrap();

    let delta = compare_snapshots(&before, &after);
    assert!(delta.improved);
    assert!(delta.health_delta > 0.0);
    assert_eq!(delta.orphaned_records, -2);
    assert_eq!(delta.before_id, before.snapshot_id);
}

#[tokio::test]
async fn fs_sink_writes_once_and_never_overwrites() {
    let tmp = TempDir::new().unwrap();
    let dir = Utf8PathBuf::from_path_buf(tmp.path().join("snapshots")).unwrap();
    let store = messy_store();
    let snap = SnapshotGenerator::new(&store, SnapshotOptions::default())
        .generate_snapshot()
        .await
        .unwrap();

    let sink = FsSnapshotSink::new(dir.clone());
    let receipt = sink.persist(&snap).expect("persist");
    assert_eq!(receipt.sha256.len(), 64);
    assert!(receipt.location.ends_with(&format!("{}.json", snap.snapshot_id)));

    let written = fs_err::read_to_string(&receipt.location).unwrap();
    let reread: recordfix_types::snapshot::DataSnapshot = serde_json::from_str(&written).unwrap();
    assert_eq!(reread, snap);

    let err = sink.persist(&snap).expect_err("second write");
    assert!(matches!(err, SnapshotError::AlreadyExists(_)));
}
