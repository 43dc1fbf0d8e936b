use chrono::{Duration, Utc};
use ghost_types::{
    ApprovalRequest, ApprovalStatus, AutomationPolicy, ExecutionLog, OrgSettings, PolicyAction,
    UserFeedback,
};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::error::Result;
use crate::Store;

fn approval_status_str(s: ApprovalStatus) -> &'static str {
    match s {
        ApprovalStatus::Pending => "pending",
        ApprovalStatus::Approved => "approved",
        ApprovalStatus::Rejected => "rejected",
        ApprovalStatus::Expired => "expired",
    }
}

fn approval_status_from_str(s: &str) -> ApprovalStatus {
    match s {
        "approved" => ApprovalStatus::Approved,
        "rejected" => ApprovalStatus::Rejected,
        "expired" => ApprovalStatus::Expired,
        _ => ApprovalStatus::Pending,
    }
}

fn policy_action_str(a: PolicyAction) -> &'static str {
    match a {
        PolicyAction::RequireApproval => "require_approval",
        PolicyAction::Block => "block",
        PolicyAction::Notify => "notify",
        PolicyAction::Allow => "allow",
    }
}

fn policy_action_from_str(s: &str) -> PolicyAction {
    match s {
        "block" => PolicyAction::Block,
        "notify" => PolicyAction::Notify,
        "allow" => PolicyAction::Allow,
        _ => PolicyAction::RequireApproval,
    }
}

impl Store {
    /// Opens an approval request with the default 24h expiry (§3, §6).
    pub fn create_approval_request(
        &self,
        ghost_id: Uuid,
        execution_id: Option<Uuid>,
        org_id: &str,
        requested_by: &str,
        reason: Option<&str>,
    ) -> Result<ApprovalRequest> {
        let request = ApprovalRequest {
            id: Uuid::new_v4(),
            ghost_id,
            execution_id,
            org_id: org_id.to_string(),
            requested_by: requested_by.to_string(),
            approved_by: None,
            status: ApprovalStatus::Pending,
            reason: reason.map(|s| s.to_string()),
            decision_note: None,
            expires_at: Utc::now() + Duration::hours(24),
            created_at: Utc::now(),
            resolved_at: None,
        };
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO approval_requests (
                id, ghost_id, execution_id, org_id, requested_by, approved_by, status,
                reason, decision_note, expires_at, created_at, resolved_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7, NULL, ?8, ?9, NULL)
            "#,
            params![
                request.id.to_string(),
                request.ghost_id.to_string(),
                request.execution_id.map(|id| id.to_string()),
                request.org_id,
                request.requested_by,
                approval_status_str(request.status),
                request.reason,
                request.expires_at.to_rfc3339(),
                request.created_at.to_rfc3339(),
            ],
        )?;
        Ok(request)
    }

    pub fn pending_approval_requests(&self, org_id: &str) -> Result<Vec<ApprovalRequest>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT id, ghost_id, execution_id, org_id, requested_by, approved_by, status,
                   reason, decision_note, expires_at, created_at, resolved_at
            FROM approval_requests WHERE org_id = ?1 AND status = 'pending'
            ORDER BY created_at ASC
            "#,
        )?;
        let rows = stmt.query_map(params![org_id], row_to_approval_request)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Marks any pending request whose `expires_at` has passed as expired
    /// (§3: requests terminate in {approved, rejected, expired} within 24h).
    pub fn expire_stale_approval_requests(&self, org_id: &str) -> Result<u64> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let changed = conn.execute(
            r#"
            UPDATE approval_requests
            SET status = 'expired', resolved_at = ?2
            WHERE org_id = ?1 AND status = 'pending' AND expires_at < ?2
            "#,
            params![org_id, Utc::now().to_rfc3339()],
        )?;
        Ok(changed as u64)
    }

    /// Append-only: no corresponding update/delete method exists (4.J).
    pub fn insert_execution_log(&self, log: &ExecutionLog) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO execution_logs (
                id, execution_id, ghost_id, org_id, status, steps, duration_ms,
                strategies_used, logged_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                log.id.to_string(),
                log.execution_id.to_string(),
                log.ghost_id.to_string(),
                log.org_id,
                log.status,
                serde_json::to_string(&log.steps)?,
                log.duration_ms,
                serde_json::to_string(&log.strategies_used)?,
                log.logged_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn execution_logs_for_org(&self, org_id: &str) -> Result<Vec<ExecutionLog>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT id, execution_id, ghost_id, org_id, status, steps, duration_ms,
                   strategies_used, logged_at
            FROM execution_logs WHERE org_id = ?1 ORDER BY logged_at DESC
            "#,
        )?;
        let rows = stmt.query_map(params![org_id], |row| {
            let steps_json: String = row.get(5)?;
            let strategies_json: String = row.get(7)?;
            Ok(ExecutionLog {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_else(|_| Uuid::nil()),
                execution_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_else(|_| Uuid::nil()),
                ghost_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_else(|_| Uuid::nil()),
                org_id: row.get(3)?,
                status: row.get(4)?,
                steps: serde_json::from_str(&steps_json).unwrap_or(serde_json::Value::Null),
                duration_ms: row.get(6)?,
                strategies_used: serde_json::from_str(&strategies_json).unwrap_or_default(),
                logged_at: row.get::<_, String>(8)?.parse().unwrap_or_else(|_| Utc::now()),
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Append-only: no corresponding update/delete method exists (4.J).
    pub fn insert_user_feedback(&self, feedback: &UserFeedback) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO user_feedback (
                id, execution_id, ghost_id, org_id, user_id, satisfaction_score,
                corrected_actions, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                feedback.id.to_string(),
                feedback.execution_id.to_string(),
                feedback.ghost_id.to_string(),
                feedback.org_id,
                feedback.user_id,
                feedback.satisfaction_score,
                feedback.corrected_actions.as_ref().map(serde_json::to_string).transpose()?,
                feedback.notes,
                feedback.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn org_settings(&self, org_id: &str) -> Result<OrgSettings> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let found: Option<OrgSettings> = conn
            .query_row(
                r#"
                SELECT org_id, settings, auto_approve_threshold, max_executions_per_minute,
                       llm_provider, llm_model, require_approval_above_value
                FROM org_settings WHERE org_id = ?1
                "#,
                params![org_id],
                |row| {
                    let settings_json: String = row.get(1)?;
                    Ok(OrgSettings {
                        org_id: row.get(0)?,
                        settings: serde_json::from_str(&settings_json).unwrap_or(serde_json::Value::Null),
                        auto_approve_threshold: row.get(2)?,
                        max_executions_per_minute: row.get(3)?,
                        llm_provider: row.get(4)?,
                        llm_model: row.get(5)?,
                        require_approval_above_value: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(found.unwrap_or_else(|| OrgSettings {
            org_id: org_id.to_string(),
            ..OrgSettings::default()
        }))
    }

    pub fn upsert_org_settings(&self, settings: &OrgSettings) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO org_settings (
                org_id, settings, auto_approve_threshold, max_executions_per_minute,
                llm_provider, llm_model, require_approval_above_value
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(org_id) DO UPDATE SET
                settings = excluded.settings,
                auto_approve_threshold = excluded.auto_approve_threshold,
                max_executions_per_minute = excluded.max_executions_per_minute,
                llm_provider = excluded.llm_provider,
                llm_model = excluded.llm_model,
                require_approval_above_value = excluded.require_approval_above_value
            "#,
            params![
                settings.org_id,
                serde_json::to_string(&settings.settings)?,
                settings.auto_approve_threshold,
                settings.max_executions_per_minute,
                settings.llm_provider,
                settings.llm_model,
                settings.require_approval_above_value,
            ],
        )?;
        Ok(())
    }

    pub fn insert_automation_policy(&self, policy: &AutomationPolicy) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO automation_policies (
                id, org_id, name, description, condition, action, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                policy.id.to_string(),
                policy.org_id,
                policy.name,
                policy.description,
                serde_json::to_string(&policy.condition)?,
                policy_action_str(policy.action),
                policy.is_active as i64,
            ],
        )?;
        Ok(())
    }

    pub fn automation_policies_for_org(&self, org_id: &str) -> Result<Vec<AutomationPolicy>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT id, org_id, name, description, condition, action, is_active
            FROM automation_policies WHERE org_id = ?1
            "#,
        )?;
        let rows = stmt.query_map(params![org_id], |row| {
            let condition_json: String = row.get(4)?;
            let action_text: String = row.get(5)?;
            Ok(AutomationPolicy {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_else(|_| Uuid::nil()),
                org_id: row.get(1)?,
                name: row.get(2)?,
                description: row.get(3)?,
                condition: serde_json::from_str(&condition_json).unwrap_or(serde_json::Value::Null),
                action: policy_action_from_str(&action_text),
                is_active: row.get::<_, i64>(6)? != 0,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

fn row_to_approval_request(row: &rusqlite::Row) -> rusqlite::Result<ApprovalRequest> {
    let status_text: String = row.get(6)?;
    Ok(ApprovalRequest {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_else(|_| Uuid::nil()),
        ghost_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_else(|_| Uuid::nil()),
        execution_id: row.get::<_, Option<String>>(2)?.and_then(|s| Uuid::parse_str(&s).ok()),
        org_id: row.get(3)?,
        requested_by: row.get(4)?,
        approved_by: row.get(5)?,
        status: approval_status_from_str(&status_text),
        reason: row.get(7)?,
        decision_note: row.get(8)?,
        expires_at: row.get::<_, String>(9)?.parse().unwrap_or_else(|_| Utc::now()),
        created_at: row.get::<_, String>(10)?.parse().unwrap_or_else(|_| Utc::now()),
        resolved_at: row.get::<_, Option<String>>(11)?.and_then(|s| s.parse().ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_request_defaults_to_24h_expiry_and_is_listed_pending() {
        let store = Store::open_in_memory().unwrap();
        let ghost_id = Uuid::new_v4();
        let request = store
            .create_approval_request(ghost_id, None, "org1", "alice", Some("needs review"))
            .unwrap();

        let delta = request.expires_at - request.created_at;
        assert_eq!(delta.num_hours(), 24);

        let pending = store.pending_approval_requests("org1").unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, ApprovalStatus::Pending);
    }

    #[test]
    fn org_settings_falls_back_to_defaults_when_absent() {
        let store = Store::open_in_memory().unwrap();
        let settings = store.org_settings("org-without-settings").unwrap();
        assert_eq!(settings.auto_approve_threshold, 0.95);
        assert_eq!(settings.org_id, "org-without-settings");
    }

    #[test]
    fn upsert_org_settings_round_trips_and_overwrites() {
        let store = Store::open_in_memory().unwrap();
        let mut settings = OrgSettings { org_id: "org1".to_string(), ..OrgSettings::default() };
        store.upsert_org_settings(&settings).unwrap();

        settings.auto_approve_threshold = 0.5;
        store.upsert_org_settings(&settings).unwrap();

        let fetched = store.org_settings("org1").unwrap();
        assert_eq!(fetched.auto_approve_threshold, 0.5);
    }
}
