use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of record an issue was raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Judge,
    Court,
    Case,
    Assignment,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Judge => "judge",
            EntityKind::Court => "court",
            EntityKind::Case => "case",
            EntityKind::Assignment => "assignment",
        }
    }

    /// Store table holding records of this kind.
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Judge => crate::tables::JUDGES,
            EntityKind::Court => crate::tables::COURTS,
            EntityKind::Case => crate::tables::CASES,
            EntityKind::Assignment => crate::tables::ASSIGNMENTS,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue category as tagged by the validator.
///
/// The validator's taxonomy is open; tags this version does not know about
/// deserialize to `Unknown` instead of failing the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    OrphanedRecord,
    InconsistentRelationship,
    DataIntegrity,
    StaleData,
    #[serde(other)]
    Unknown,
}

impl IssueType {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::OrphanedRecord => "orphaned_record",
            IssueType::InconsistentRelationship => "inconsistent_relationship",
            IssueType::DataIntegrity => "data_integrity",
            IssueType::StaleData => "stale_data",
            IssueType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue severity. Declaration order is priority order: `Critical < Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected data-quality problem, as produced by the external validator.
///
/// recordfix is tolerant when reading issues: unknown fields are ignored and
/// both `snake_case` and the validator's `camelCase` spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Optional validator-assigned id. When absent, [`ValidationIssue::issue_id`]
    /// derives one from the entity and type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub entity: EntityKind,

    #[serde(alias = "entityId")]
    pub entity_id: String,

    #[serde(rename = "type")]
    pub issue_type: IssueType,

    pub severity: Severity,

    #[serde(default)]
    pub message: String,

    #[serde(default, alias = "autoFixable")]
    pub auto_fixable: bool,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ValidationIssue {
    pub fn new(
        entity: EntityKind,
        entity_id: impl Into<String>,
        issue_type: IssueType,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            entity,
            entity_id: entity_id.into(),
            issue_type,
            severity,
            message: message.into(),
            auto_fixable: false,
            metadata: Map::new(),
        }
    }

    pub fn auto_fixable(mut self, auto_fixable: bool) -> Self {
        self.auto_fixable = auto_fixable;
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Stable identifier used to correlate results with their issue.
    pub fn issue_id(&self) -> String {
        match &self.id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => format!("{}:{}:{}", self.entity, self.entity_id, self.issue_type),
        }
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Integer metadata; tolerates numbers encoded as strings.
    pub fn meta_u64(&self, key: &str) -> Option<u64> {
        match self.metadata.get(key)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn meta_f64(&self, key: &str) -> Option<f64> {
        match self.metadata.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// String-list metadata. A single string is treated as a one-element list.
    pub fn meta_str_list(&self, key: &str) -> Vec<String> {
        match self.metadata.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => vec![],
        }
    }
}
