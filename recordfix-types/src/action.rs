use crate::issue::{EntityKind, IssueType, Severity};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Executable directive kind for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Update,
    Delete,
    Create,
    Nullify,
    Recalculate,
    QueueSync,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Update => "update",
            ActionType::Delete => "delete",
            ActionType::Create => "create",
            ActionType::Nullify => "nullify",
            ActionType::Recalculate => "recalculate",
            ActionType::QueueSync => "queue_sync",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level. Declaration order is the execution preference: `Low < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reversibility {
    FullyReversible,
    PartiallyReversible,
    Irreversible,
}

impl Reversibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Reversibility::FullyReversible => "fully_reversible",
            Reversibility::PartiallyReversible => "partially_reversible",
            Reversibility::Irreversible => "irreversible",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLossRisk {
    None,
    Low,
    Medium,
    High,
}

impl DataLossRisk {
    pub fn as_str(self) -> &'static str {
        match self {
            DataLossRisk::None => "none",
            DataLossRisk::Low => "low",
            DataLossRisk::Medium => "medium",
            DataLossRisk::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub records_affected: u64,

    #[serde(default)]
    pub tables_affected: Vec<String>,

    #[serde(default)]
    pub downstream_effects: Vec<String>,

    pub reversibility: Reversibility,
    pub data_loss_risk: DataLossRisk,
}

/// A concrete, scored remediation directive derived from exactly one issue.
///
/// Actions are never mutated after the planner creates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationAction {
    pub action_id: String,

    pub issue_type: IssueType,
    pub severity: Severity,
    pub entity: EntityKind,
    pub entity_id: String,

    pub action_type: ActionType,
    pub target_table: String,
    pub target_record_id: String,

    #[serde(default)]
    pub changes: Map<String, Value>,

    /// Short description of the remediation rule that produced this action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub confidence_score: u8,
    pub risk_level: RiskLevel,
    pub impact_analysis: ImpactAnalysis,

    pub requires_manual_review: bool,
    pub estimated_duration_ms: u64,

    /// Action ids that must run before this one. Advisory: the engine does not
    /// gate on it.
    #[serde(default)]
    pub dependencies: Vec<String>,

    pub rollback_supported: bool,
}
