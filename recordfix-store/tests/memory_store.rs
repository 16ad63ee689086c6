use pretty_assertions::assert_eq;
use recordfix_store::{DataStore, Direction, InMemoryStore, Query, Record, StoreError, StoreOp};
use serde_json::{Value, json};

fn patch(v: Value) -> Record {
    match v {
        Value::Object(m) => m,
        _ => panic!("expected object"),
    }
}

fn fixture() -> InMemoryStore {
    InMemoryStore::from_json(json!({
        "judge_court_assignments": [
            {"id": "a1", "judge_id": "j1", "assignment_type": "primary", "start_date": "2019-01-01"},
            {"id": "a2", "judge_id": "j1", "assignment_type": "primary", "start_date": "2022-03-01"},
            {"id": "a3", "judge_id": "j2", "assignment_type": "visiting", "start_date": "2020-05-01"}
        ],
        "judges": [
            {"id": "j1", "name": "Ann Lee", "total_cases": 3},
            {"id": "j2", "name": "Bo Park", "total_cases": 0}
        ]
    }))
    .expect("valid dataset")
}

#[tokio::test]
async fn select_filters_orders_and_limits() {
    let store = fixture();
    let rows = store
        .select(
            &Query::table("judge_court_assignments")
                .eq("judge_id", "j1")
                .order_by("start_date", Direction::Desc),
        )
        .await
        .unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["a2", "a1"]);

    let first = store
        .select_one(
            &Query::table("judge_court_assignments").order_by("start_date", Direction::Asc),
        )
        .await
        .unwrap()
        .expect("row");
    assert_eq!(first["id"], json!("a1"));
}

#[tokio::test]
async fn count_ignores_limit() {
    let store = fixture();
    let n = store
        .count(&Query::table("judge_court_assignments").eq("assignment_type", "primary").limit(1))
        .await
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(store.count(&Query::table("missing")).await.unwrap(), 0);
}

#[tokio::test]
async fn update_merges_patch_and_counts_mutations() {
    let store = fixture();
    assert_eq!(store.mutations(), 0);

    let changed = store
        .update(
            &Query::table("judge_court_assignments").in_list("id", ["a1", "a3"]),
            &patch(json!({"assignment_type": "visiting"})),
        )
        .await
        .unwrap();
    assert_eq!(changed, 2);
    assert_eq!(store.mutations(), 1);

    let a1 = store.get("judge_court_assignments", "a1").expect("a1");
    assert_eq!(a1["assignment_type"], json!("visiting"));
    assert_eq!(a1["start_date"], json!("2019-01-01"));
}

#[tokio::test]
async fn insert_assigns_id_and_rejects_duplicates() {
    let store = InMemoryStore::new();
    let stored = store
        .insert("sync_queue", patch(json!({"external_id": "cl-1"})))
        .await
        .unwrap();
    assert!(stored["id"].as_str().is_some_and(|s| !s.is_empty()));

    store
        .insert("sync_queue", patch(json!({"id": "q1"})))
        .await
        .unwrap();
    let err = store
        .insert("sync_queue", patch(json!({"id": "q1"})))
        .await
        .expect_err("duplicate");
    assert!(matches!(err, StoreError::DuplicateId { .. }));
    assert_eq!(store.rows("sync_queue").len(), 2);
}

#[tokio::test]
async fn delete_removes_matching_rows() {
    let store = fixture();
    let removed = store
        .delete(&Query::by_id("judge_court_assignments", "a3"))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(store.get("judge_court_assignments", "a3").is_none());
}

#[tokio::test]
async fn injected_failures_surface_as_backend_errors() {
    let store = fixture();
    store.fail_on("judges", StoreOp::Update);

    let err = store
        .update(&Query::by_id("judges", "j1"), &patch(json!({"total_cases": 9})))
        .await
        .expect_err("injected");
    assert!(err.to_string().contains("update on 'judges' failed"));
    assert_eq!(store.mutations(), 0);

    store.clear_failures();
    store
        .update(&Query::by_id("judges", "j1"), &patch(json!({"total_cases": 9})))
        .await
        .unwrap();
    assert_eq!(store.get("judges", "j1").unwrap()["total_cases"], json!(9));
}

#[test]
fn from_json_rejects_malformed_datasets() {
    assert!(matches!(
        InMemoryStore::from_json(json!([])),
        Err(StoreError::InvalidDataset(_))
    ));
    assert!(matches!(
        InMemoryStore::from_json(json!({"judges": [{"name": "x"}]})),
        Err(StoreError::MissingId { .. })
    ));
    assert!(matches!(
        InMemoryStore::from_json(json!({"judges": [{"id": "a"}, {"id": "a"}]})),
        Err(StoreError::DuplicateId { .. })
    ));
}

#[test]
fn to_json_round_trips_contents() {
    let store = fixture();
    let dumped = store.to_json().unwrap();
    assert_eq!(dumped["judges"].as_array().map(Vec::len), Some(2));
    let reloaded = InMemoryStore::from_json(dumped).unwrap();
    assert_eq!(reloaded.rows("judge_court_assignments").len(), 3);
}
