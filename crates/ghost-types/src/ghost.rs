use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::execution::ExecutionNode;

/// Lifecycle of a Ghost Template (§3, §6 approve state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostStatus {
    PendingApproval,
    Approved,
    Active,
    Paused,
    Archived,
}

/// How a Ghost is invoked. The condition grammar is deliberately opaque JSON —
/// open question in §9, resolved in DESIGN.md: the core never parses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Event,
    Schedule,
    Api,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerSpec {
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    pub condition: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Object,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub required: bool,
    pub default_value: Option<Value>,
}

/// An approved, parameterized workflow template with an execution plan and
/// governance metadata (§3, GLOSSARY).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostTemplate {
    pub id: Uuid,
    pub org_id: String,
    pub name: String,
    pub description: Option<String>,
    pub version: u32,
    pub status: GhostStatus,
    pub trigger: TriggerSpec,
    pub parameters: Vec<GhostParameter>,
    pub execution_plan: Vec<ExecutionNode>,
    pub confidence: Option<f64>,
    pub source_pattern_id: Option<Uuid>,
    pub is_active: bool,
    pub usage_stats: Value,
    pub created_by: Option<String>,
    pub approved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GhostTemplate {
    /// §3 invariant: `isActive ⇒ status ∈ {approved, active}`.
    pub fn invariant_holds(&self) -> bool {
        !self.is_active || matches!(self.status, GhostStatus::Approved | GhostStatus::Active)
    }
}

/// One immutable version row appended on every approval (§3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostVersion {
    pub id: Uuid,
    pub ghost_id: Uuid,
    pub version: u32,
    pub execution_plan: Vec<ExecutionNode>,
    pub parameters: Vec<GhostParameter>,
    pub trigger: TriggerSpec,
    pub change_description: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
