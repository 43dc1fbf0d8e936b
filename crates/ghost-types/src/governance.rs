use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

/// Terminates in {approved, rejected, expired} within 24h by default (§3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: Uuid,
    pub ghost_id: Uuid,
    pub execution_id: Option<Uuid>,
    pub org_id: String,
    pub requested_by: String,
    pub approved_by: Option<String>,
    pub status: ApprovalStatus,
    pub reason: Option<String>,
    pub decision_note: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Append-only; RLS/insertion policy forbids update/delete (§3, §4.J, §8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFeedback {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub ghost_id: Uuid,
    pub org_id: String,
    pub user_id: String,
    pub satisfaction_score: Option<u8>,
    pub corrected_actions: Option<Value>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit row written once an Execution finalizes (§4.I step 6, §4.J).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub ghost_id: Uuid,
    pub org_id: String,
    pub status: String,
    pub steps: Value,
    pub duration_ms: u64,
    pub strategies_used: Vec<String>,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgSettings {
    pub org_id: String,
    pub settings: Value,
    pub auto_approve_threshold: f64,
    pub max_executions_per_minute: u32,
    pub llm_provider: String,
    pub llm_model: String,
    pub require_approval_above_value: Option<f64>,
}

impl Default for OrgSettings {
    fn default() -> Self {
        Self {
            org_id: String::new(),
            settings: Value::Null,
            auto_approve_threshold: 0.95,
            max_executions_per_minute: 10,
            llm_provider: "openai-compatible".to_string(),
            llm_model: "default".to_string(),
            require_approval_above_value: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    RequireApproval,
    Block,
    Notify,
    Allow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationPolicy {
    pub id: Uuid,
    pub org_id: String,
    pub name: String,
    pub description: Option<String>,
    pub condition: Value,
    pub action: PolicyAction,
    pub is_active: bool,
}
