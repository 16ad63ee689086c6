use crate::{DataStore, Query, Record, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Store operation kinds, used to inject failures in tests and embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StoreOp {
    Select,
    Count,
    Insert,
    Update,
    Delete,
}

impl StoreOp {
    fn as_str(self) -> &'static str {
        match self {
            StoreOp::Select => "select",
            StoreOp::Count => "count",
            StoreOp::Insert => "insert",
            StoreOp::Update => "update",
            StoreOp::Delete => "delete",
        }
    }
}

/// In-memory [`DataStore`] for embedding and testing.
///
/// Tables are created lazily on first insert; selecting from an unknown table
/// yields no rows. Rows keep insertion order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<BTreeMap<String, Vec<Record>>>,
    failures: Mutex<BTreeSet<(String, StoreOp)>>,
    mutations: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a `{ "table": [ {record}, ... ], ... }` document.
    pub fn from_json(dataset: Value) -> Result<Self, StoreError> {
        let Value::Object(tables) = dataset else {
            return Err(StoreError::InvalidDataset(
                "expected an object of tables".to_string(),
            ));
        };

        let mut out = BTreeMap::new();
        for (name, rows) in tables {
            let Value::Array(rows) = rows else {
                return Err(StoreError::InvalidDataset(format!(
                    "table '{}' is not an array",
                    name
                )));
            };
            let mut records = Vec::with_capacity(rows.len());
            let mut seen = BTreeSet::new();
            for row in rows {
                let Value::Object(record) = row else {
                    return Err(StoreError::InvalidDataset(format!(
                        "table '{}' contains a non-object row",
                        name
                    )));
                };
                let id = record_id(&record).ok_or_else(|| StoreError::MissingId {
                    table: name.clone(),
                })?;
                if !seen.insert(id.clone()) {
                    return Err(StoreError::DuplicateId {
                        table: name.clone(),
                        id,
                    });
                }
                records.push(record);
            }
            out.insert(name, records);
        }

        Ok(Self {
            tables: Mutex::new(out),
            ..Self::default()
        })
    }

    /// Seed a table, replacing its contents. Intended for fixtures.
    pub fn with_table(self, table: &str, rows: Vec<Value>) -> Self {
        let records = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(m) => Some(m),
                _ => None,
            })
            .collect();
        if let Ok(mut tables) = self.tables.lock() {
            tables.insert(table.to_string(), records);
        }
        self
    }

    /// Current contents as a `{ table: [record] }` document.
    pub fn to_json(&self) -> Result<Value, StoreError> {
        let tables = self.lock("*", "export")?;
        let map = tables
            .iter()
            .map(|(name, rows)| {
                let rows = rows.iter().cloned().map(Value::Object).collect();
                (name.clone(), Value::Array(rows))
            })
            .collect();
        Ok(Value::Object(map))
    }

    /// All rows of `table`, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.tables
            .lock()
            .map(|t| t.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Row of `table` with the given id.
    pub fn get(&self, table: &str, id: &str) -> Option<Record> {
        self.rows(table)
            .into_iter()
            .find(|r| record_id(r).as_deref() == Some(id))
    }

    /// Make every `op` against `table` fail with a backend error.
    pub fn fail_on(&self, table: &str, op: StoreOp) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert((table.to_string(), op));
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.clear();
        }
    }

    /// Number of mutating calls (insert, update, delete) that reached the store.
    pub fn mutations(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    fn check_injected(&self, table: &str, op: StoreOp) -> Result<(), StoreError> {
        let injected = self
            .failures
            .lock()
            .map(|f| f.contains(&(table.to_string(), op)))
            .unwrap_or(false);
        if injected {
            debug!(table, op = op.as_str(), "injected store failure");
            return Err(StoreError::backend(table, op.as_str(), "injected failure"));
        }
        Ok(())
    }

    fn lock(
        &self,
        table: &str,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, BTreeMap<String, Vec<Record>>>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::backend(table, operation, "store state poisoned"))
    }
}

fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        self.check_injected(&query.table, StoreOp::Select)?;
        let tables = self.lock(&query.table, "select")?;
        let mut rows: Vec<Record> = tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        drop(tables);

        query.sort(&mut rows);
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows.iter().map(|r| query.project(r)).collect())
    }

    async fn count(&self, query: &Query) -> Result<u64, StoreError> {
        self.check_injected(&query.table, StoreOp::Count)?;
        let tables = self.lock(&query.table, "count")?;
        let n = tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).count())
            .unwrap_or(0);
        Ok(n as u64)
    }

    async fn insert(&self, table: &str, mut record: Record) -> Result<Record, StoreError> {
        self.check_injected(table, StoreOp::Insert)?;
        let mut tables = self.lock(table, "insert")?;
        let rows = tables.entry(table.to_string()).or_default();

        let id = match record_id(&record) {
            Some(id) => id,
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                record.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };
        if rows.iter().any(|r| record_id(r).as_deref() == Some(id.as_str())) {
            return Err(StoreError::DuplicateId {
                table: table.to_string(),
                id,
            });
        }

        rows.push(record.clone());
        self.mutations.fetch_add(1, Ordering::SeqCst);
        debug!(table, id = id.as_str(), "inserted record");
        Ok(record)
    }

    async fn update(&self, query: &Query, patch: &Record) -> Result<u64, StoreError> {
        self.check_injected(&query.table, StoreOp::Update)?;
        let mut tables = self.lock(&query.table, "update")?;
        let mut changed = 0u64;
        if let Some(rows) = tables.get_mut(&query.table) {
            for row in rows.iter_mut().filter(|r| query.matches(r)) {
                for (k, v) in patch {
                    row.insert(k.clone(), v.clone());
                }
                changed += 1;
            }
        }
        self.mutations.fetch_add(1, Ordering::SeqCst);
        debug!(table = query.table.as_str(), changed, "updated records");
        Ok(changed)
    }

    async fn delete(&self, query: &Query) -> Result<u64, StoreError> {
        self.check_injected(&query.table, StoreOp::Delete)?;
        let mut tables = self.lock(&query.table, "delete")?;
        let mut removed = 0u64;
        if let Some(rows) = tables.get_mut(&query.table) {
            let before = rows.len();
            rows.retain(|r| !query.matches(r));
            removed = (before - rows.len()) as u64;
        }
        self.mutations.fetch_add(1, Ordering::SeqCst);
        debug!(table = query.table.as_str(), removed, "deleted records");
        Ok(removed)
    }
}
