use chrono::Utc;
use ghost_types::{Execution, ExecutionStatus, ExecutionStep, StepStatus, Strategy};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::Store;

fn status_str(s: ExecutionStatus) -> &'static str {
    match s {
        ExecutionStatus::Running => "running",
        ExecutionStatus::Completed => "completed",
        ExecutionStatus::Failed => "failed",
        ExecutionStatus::Cancelled => "cancelled",
    }
}

fn status_from_str(s: &str) -> ExecutionStatus {
    match s {
        "completed" => ExecutionStatus::Completed,
        "failed" => ExecutionStatus::Failed,
        "cancelled" => ExecutionStatus::Cancelled,
        _ => ExecutionStatus::Running,
    }
}

fn step_status_str(s: StepStatus) -> &'static str {
    match s {
        StepStatus::Pending => "pending",
        StepStatus::Running => "running",
        StepStatus::Completed => "completed",
        StepStatus::Failed => "failed",
        StepStatus::Skipped => "skipped",
    }
}

fn step_status_from_str(s: &str) -> StepStatus {
    match s {
        "running" => StepStatus::Running,
        "completed" => StepStatus::Completed,
        "failed" => StepStatus::Failed,
        "skipped" => StepStatus::Skipped,
        _ => StepStatus::Pending,
    }
}

impl Store {
    pub fn insert_execution(&self, execution: &Execution) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO executions (
                id, ghost_id, status, parameters, trigger, step_count, started_at,
                completed_at, error
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                execution.id.to_string(),
                execution.ghost_id.to_string(),
                status_str(execution.status),
                serde_json::to_string(&execution.parameters)?,
                execution.trigger,
                execution.step_count,
                execution.started_at.to_rfc3339(),
                execution.completed_at.map(|t| t.to_rfc3339()),
                execution.error,
            ],
        )?;
        Ok(())
    }

    /// Finalizes an execution's terminal status and step count. Called once
    /// per run, even on failure — the audit trail in `execution_logs` must
    /// exist regardless.
    pub fn finalize_execution(&self, id: Uuid, status: ExecutionStatus, step_count: u32, error: Option<&str>) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "UPDATE executions SET status = ?2, completed_at = ?3, step_count = ?4, error = ?5 WHERE id = ?1",
            params![
                id.to_string(),
                status_str(status),
                Utc::now().to_rfc3339(),
                step_count,
                error,
            ],
        )?;
        Ok(())
    }

    pub fn execution_by_id(&self, id: Uuid) -> Result<Execution> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row(
            r#"
            SELECT id, ghost_id, status, parameters, trigger, step_count, started_at,
                   completed_at, error
            FROM executions WHERE id = ?1
            "#,
            params![id.to_string()],
            |row| {
                let parameters_json: String = row.get(3)?;
                let status_text: String = row.get(2)?;
                Ok(Execution {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_else(|_| Uuid::nil()),
                    ghost_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_else(|_| Uuid::nil()),
                    status: status_from_str(&status_text),
                    parameters: serde_json::from_str(&parameters_json).unwrap_or(serde_json::Value::Null),
                    trigger: row.get(4)?,
                    step_count: row.get(5)?,
                    started_at: row.get::<_, String>(6)?.parse().unwrap_or_else(|_| Utc::now()),
                    completed_at: row
                        .get::<_, Option<String>>(7)?
                        .and_then(|s| s.parse().ok()),
                    error: row.get(8)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("execution {id}")))
    }

    pub fn insert_execution_step(&self, execution_id: Uuid, step: &ExecutionStep) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO execution_steps (
                id, execution_id, node_id, status, strategy, duration_ms, output, error, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                Uuid::new_v4().to_string(),
                execution_id.to_string(),
                step.node_id,
                step_status_str(step.status),
                step.strategy.as_string(),
                step.duration_ms,
                step.output.as_ref().map(serde_json::to_string).transpose()?,
                step.error,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn steps_for_execution(&self, execution_id: Uuid) -> Result<Vec<ExecutionStep>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT node_id, status, strategy, duration_ms, output, error
            FROM execution_steps WHERE execution_id = ?1 ORDER BY created_at ASC
            "#,
        )?;
        let rows = stmt.query_map(params![execution_id.to_string()], |row| {
            let status_text: String = row.get(1)?;
            let strategy_text: String = row.get(2)?;
            let output_json: Option<String> = row.get(4)?;
            Ok(ExecutionStep {
                node_id: row.get(0)?,
                status: step_status_from_str(&status_text),
                strategy: Strategy::from_str(&strategy_text),
                duration_ms: row.get(3)?,
                output: output_json.and_then(|s| serde_json::from_str(&s).ok()),
                error: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_execution(ghost_id: Uuid) -> Execution {
        Execution {
            id: Uuid::new_v4(),
            ghost_id,
            status: ExecutionStatus::Running,
            parameters: serde_json::json!({"foo": "bar"}),
            trigger: "manual".to_string(),
            step_count: 0,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    #[test]
    fn insert_step_and_finalize_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let ghost_id = Uuid::new_v4();
        let execution = sample_execution(ghost_id);
        let id = execution.id;
        store.insert_execution(&execution).unwrap();

        store
            .insert_execution_step(
                id,
                &ExecutionStep {
                    node_id: "n1".to_string(),
                    status: StepStatus::Completed,
                    strategy: Strategy::SelfHealed(Box::new(Strategy::Semantic)),
                    duration_ms: 120,
                    output: Some(serde_json::json!({"ok": true})),
                    error: None,
                },
            )
            .unwrap();

        let steps = store.steps_for_execution(id).unwrap();
        assert_eq!(steps.len(), 1);
        assert!(steps[0].strategy.is_self_healed());

        store.finalize_execution(id, ExecutionStatus::Completed, 1, None).unwrap();
        let fetched = store.execution_by_id(id).unwrap();
        assert_eq!(fetched.status, ExecutionStatus::Completed);
        assert_eq!(fetched.step_count, 1);
        assert!(fetched.completed_at.is_some());
    }
}
