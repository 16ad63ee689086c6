use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Label prefix marking a preview (dry-run) result.
pub const DRY_RUN_PREFIX: &str = "dry_run:";

/// Pre-mutation field snapshot for one record; the sole durable record that
/// enables undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackInfo {
    pub table: String,
    pub record_id: String,
    pub original_values: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of one attempted issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationResult {
    pub issue_id: String,
    pub success: bool,
    pub action_taken: String,
    pub records_affected: u64,

    #[serde(default)]
    pub changes_made: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Stable error tag (`unknown_issue_type`, `record_not_found`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_tag: Option<String>,

    /// One entry per mutated record, in mutation order. Empty for hard deletes,
    /// additive inserts and dry runs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rollback_info: Vec<RollbackInfo>,
}

impl RemediationResult {
    pub fn is_dry_run(&self) -> bool {
        self.action_taken.starts_with(DRY_RUN_PREFIX)
    }

    /// The action label without the dry-run prefix.
    pub fn action_label(&self) -> &str {
        self.action_taken
            .strip_prefix(DRY_RUN_PREFIX)
            .unwrap_or(&self.action_taken)
    }

    /// First captured rollback entry, if any.
    pub fn rollback(&self) -> Option<&RollbackInfo> {
        self.rollback_info.first()
    }
}

/// Aggregate outcome of one engine batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationSummary {
    pub schema: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_issues: u64,
    pub attempted: u64,
    pub successful: u64,
    pub failed: u64,
    pub skipped: u64,
    pub duration_ms: u64,

    #[serde(default)]
    pub results: Vec<RemediationResult>,
}

impl RemediationSummary {
    pub fn new(dry_run: bool, started_at: DateTime<Utc>) -> Self {
        Self {
            schema: crate::schema::RECORDFIX_APPLY_V1.to_string(),
            dry_run,
            started_at,
            ended_at: started_at,
            total_issues: 0,
            attempted: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
            duration_ms: 0,
            results: vec![],
        }
    }

    pub fn failed_results(&self) -> impl Iterator<Item = &RemediationResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// All captured rollback entries in mutation order.
    pub fn rollback_entries(&self) -> impl Iterator<Item = &RollbackInfo> {
        self.results.iter().flat_map(|r| r.rollback_info.iter())
    }
}

/// Outcome of replaying a set of rollback entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackReport {
    pub attempted: u64,
    pub restored: u64,
    pub failed: u64,

    /// `table/record_id` of every entry that could not be restored.
    #[serde(default)]
    pub failures: Vec<String>,
}
