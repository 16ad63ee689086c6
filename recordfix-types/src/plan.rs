use crate::action::{RemediationAction, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ordered, risk-assessed collection of actions for one issue batch.
///
/// Plans are built atomically; a new batch produces a new plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationPlan {
    pub schema: String,
    pub plan_id: String,
    pub created_at: DateTime<Utc>,
    pub summary: PlanSummary,

    #[serde(default)]
    pub actions: Vec<RemediationAction>,

    /// Permutation of `actions[*].action_id`.
    #[serde(default)]
    pub execution_order: Vec<String>,

    pub estimated_duration_ms: u64,
    pub risk_assessment: RiskAssessment,
}

impl RemediationPlan {
    pub fn new(plan_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            schema: crate::schema::RECORDFIX_PLAN_V1.to_string(),
            plan_id,
            created_at,
            summary: PlanSummary::default(),
            actions: vec![],
            execution_order: vec![],
            estimated_duration_ms: 0,
            risk_assessment: RiskAssessment::default(),
        }
    }

    pub fn action(&self, action_id: &str) -> Option<&RemediationAction> {
        self.actions.iter().find(|a| a.action_id == action_id)
    }

    /// Actions in execution order.
    pub fn ordered_actions(&self) -> impl Iterator<Item = &RemediationAction> {
        self.execution_order.iter().filter_map(|id| self.action(id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_actions: u64,
    pub by_severity: SeverityCounts,
    pub auto_fixable: u64,
    pub manual_review: u64,
    pub total_records_affected: u64,

    /// Issues that produced no action (unclassified or unresolvable).
    #[serde(default)]
    pub unclassified: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall_risk: RiskLevel,
    pub high_risk_actions: u64,
    pub irreversible_actions: u64,
    pub data_loss_potential: bool,
    pub recommended_backup: bool,

    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self {
            overall_risk: RiskLevel::Low,
            high_risk_actions: 0,
            irreversible_actions: 0,
            data_loss_potential: false,
            recommended_backup: false,
            warnings: vec![],
        }
    }
}
