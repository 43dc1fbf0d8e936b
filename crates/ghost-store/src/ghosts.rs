use chrono::Utc;
use ghost_types::{GhostStatus, GhostTemplate, GhostVersion};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::Store;

fn status_str(s: GhostStatus) -> &'static str {
    match s {
        GhostStatus::PendingApproval => "pending_approval",
        GhostStatus::Approved => "approved",
        GhostStatus::Active => "active",
        GhostStatus::Paused => "paused",
        GhostStatus::Archived => "archived",
    }
}

fn status_from_str(s: &str) -> GhostStatus {
    match s {
        "approved" => GhostStatus::Approved,
        "active" => GhostStatus::Active,
        "paused" => GhostStatus::Paused,
        "archived" => GhostStatus::Archived,
        _ => GhostStatus::PendingApproval,
    }
}

fn row_to_ghost(row: &rusqlite::Row) -> rusqlite::Result<GhostTemplate> {
    let trigger_json: String = row.get(6)?;
    let parameters_json: String = row.get(7)?;
    let plan_json: String = row.get(8)?;
    let usage_json: String = row.get(13)?;
    let status_text: String = row.get(5)?;
    Ok(GhostTemplate {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_else(|_| Uuid::nil()),
        org_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        version: row.get::<_, i64>(4)? as u32,
        status: status_from_str(&status_text),
        trigger: serde_json::from_str(&trigger_json).unwrap_or(ghost_types::TriggerSpec {
            kind: ghost_types::TriggerKind::Event,
            condition: serde_json::Value::Null,
        }),
        parameters: serde_json::from_str(&parameters_json).unwrap_or_default(),
        execution_plan: serde_json::from_str(&plan_json).unwrap_or_default(),
        confidence: row.get(9)?,
        source_pattern_id: row
            .get::<_, Option<String>>(10)?
            .and_then(|s| Uuid::parse_str(&s).ok()),
        created_by: row.get(11)?,
        approved_by: row.get(12)?,
        is_active: row.get::<_, i64>(14)? != 0,
        usage_stats: serde_json::from_str(&usage_json).unwrap_or(serde_json::Value::Null),
        created_at: row.get::<_, String>(15)?.parse().unwrap_or_else(|_| Utc::now()),
        updated_at: row.get::<_, String>(16)?.parse().unwrap_or_else(|_| Utc::now()),
    })
}

const SELECT_COLUMNS: &str = r#"
    id, org_id, name, description, version, status, trigger, parameters, execution_plan,
    confidence, source_pattern_id, created_by, approved_by, usage_stats, is_active,
    created_at, updated_at
"#;

impl Store {
    pub fn insert_ghost(&self, ghost: &GhostTemplate) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO ghosts (
                id, org_id, name, description, version, status, trigger, parameters,
                execution_plan, confidence, source_pattern_id, created_by, approved_by,
                is_active, usage_stats, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                ghost.id.to_string(),
                ghost.org_id,
                ghost.name,
                ghost.description,
                ghost.version,
                status_str(ghost.status),
                serde_json::to_string(&ghost.trigger)?,
                serde_json::to_string(&ghost.parameters)?,
                serde_json::to_string(&ghost.execution_plan)?,
                ghost.confidence,
                ghost.source_pattern_id.map(|id| id.to_string()),
                ghost.created_by,
                ghost.approved_by,
                ghost.is_active as i64,
                serde_json::to_string(&ghost.usage_stats)?,
                ghost.created_at.to_rfc3339(),
                ghost.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn ghost_by_id(&self, id: Uuid) -> Result<GhostTemplate> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let sql = format!("SELECT {} FROM ghosts WHERE id = ?1", SELECT_COLUMNS);
        conn.query_row(&sql, params![id.to_string()], row_to_ghost)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("ghost {id}")))
    }

    pub fn ghosts_for_org(&self, org_id: &str) -> Result<Vec<GhostTemplate>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let sql = format!(
            "SELECT {} FROM ghosts WHERE org_id = ?1 ORDER BY updated_at DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![org_id], row_to_ghost)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn set_ghost_state(&self, id: Uuid, status: GhostStatus, is_active: bool, approved_by: Option<&str>) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            UPDATE ghosts SET status = ?2, is_active = ?3, approved_by = COALESCE(?4, approved_by), updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                id.to_string(),
                status_str(status),
                is_active as i64,
                approved_by,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn resolve_pending_approval(&self, ghost_id: Uuid, approved_by: &str, status: &str, note: Option<&str>) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            UPDATE approval_requests
            SET status = ?2, approved_by = ?3, decision_note = ?4, resolved_at = ?5
            WHERE ghost_id = ?1 AND status = 'pending'
            "#,
            params![
                ghost_id.to_string(),
                status,
                approved_by,
                note,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// `pending_approval --approve--> approved`: bumps the version, snapshots the
    /// approved plan into `ghost_versions`, activates the ghost, and resolves any
    /// matching pending approval request (§6).
    pub fn approve_ghost(&self, id: Uuid, approved_by: &str, change_description: Option<&str>) -> Result<GhostTemplate> {
        let ghost = self.ghost_by_id(id)?;
        if ghost.status != GhostStatus::PendingApproval {
            return Err(Error::Invariant(format!(
                "cannot approve ghost {id} from status {:?}",
                ghost.status
            )));
        }
        let new_version = ghost.version + 1;
        {
            let conn = self.conn.lock().expect("store mutex poisoned");
            conn.execute(
                r#"
                INSERT INTO ghost_versions (
                    id, ghost_id, version, execution_plan, parameters, trigger,
                    change_description, created_by, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    id.to_string(),
                    new_version,
                    serde_json::to_string(&ghost.execution_plan)?,
                    serde_json::to_string(&ghost.parameters)?,
                    serde_json::to_string(&ghost.trigger)?,
                    change_description,
                    approved_by,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            conn.execute(
                "UPDATE ghosts SET version = ?2, updated_at = ?3 WHERE id = ?1",
                params![id.to_string(), new_version, Utc::now().to_rfc3339()],
            )?;
        }
        self.set_ghost_state(id, GhostStatus::Approved, true, Some(approved_by))?;
        self.resolve_pending_approval(id, approved_by, "approved", change_description)?;
        self.ghost_by_id(id)
    }

    /// `pending_approval --reject--> archived`.
    pub fn reject_ghost(&self, id: Uuid, decided_by: &str, note: Option<&str>) -> Result<GhostTemplate> {
        let ghost = self.ghost_by_id(id)?;
        if ghost.status != GhostStatus::PendingApproval {
            return Err(Error::Invariant(format!(
                "cannot reject ghost {id} from status {:?}",
                ghost.status
            )));
        }
        self.set_ghost_state(id, GhostStatus::Archived, false, Some(decided_by))?;
        self.resolve_pending_approval(id, decided_by, "rejected", note)?;
        self.ghost_by_id(id)
    }

    /// `any --archive--> archived`.
    pub fn archive_ghost(&self, id: Uuid) -> Result<GhostTemplate> {
        self.set_ghost_state(id, GhostStatus::Archived, false, None)?;
        self.ghost_by_id(id)
    }

    /// `approved|active --pause--> paused`.
    pub fn pause_ghost(&self, id: Uuid) -> Result<GhostTemplate> {
        let ghost = self.ghost_by_id(id)?;
        if !matches!(ghost.status, GhostStatus::Approved | GhostStatus::Active) {
            return Err(Error::Invariant(format!(
                "cannot pause ghost {id} from status {:?}",
                ghost.status
            )));
        }
        self.set_ghost_state(id, GhostStatus::Paused, false, None)?;
        self.ghost_by_id(id)
    }

    /// `paused|approved --activate--> active`.
    pub fn activate_ghost(&self, id: Uuid) -> Result<GhostTemplate> {
        let ghost = self.ghost_by_id(id)?;
        if !matches!(ghost.status, GhostStatus::Paused | GhostStatus::Approved) {
            return Err(Error::Invariant(format!(
                "cannot activate ghost {id} from status {:?}",
                ghost.status
            )));
        }
        self.set_ghost_state(id, GhostStatus::Active, true, None)?;
        self.ghost_by_id(id)
    }

    pub fn ghost_versions(&self, ghost_id: Uuid) -> Result<Vec<GhostVersion>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT id, ghost_id, version, execution_plan, parameters, trigger,
                   change_description, created_by, created_at
            FROM ghost_versions WHERE ghost_id = ?1 ORDER BY version ASC
            "#,
        )?;
        let rows = stmt.query_map(params![ghost_id.to_string()], |row| {
            let plan_json: String = row.get(3)?;
            let parameters_json: String = row.get(4)?;
            let trigger_json: String = row.get(5)?;
            Ok(GhostVersion {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_else(|_| Uuid::nil()),
                ghost_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_else(|_| Uuid::nil()),
                version: row.get::<_, i64>(2)? as u32,
                execution_plan: serde_json::from_str(&plan_json).unwrap_or_default(),
                parameters: serde_json::from_str(&parameters_json).unwrap_or_default(),
                trigger: serde_json::from_str(&trigger_json).unwrap_or(ghost_types::TriggerSpec {
                    kind: ghost_types::TriggerKind::Event,
                    condition: serde_json::Value::Null,
                }),
                change_description: row.get(6)?,
                created_by: row.get(7)?,
                created_at: row.get::<_, String>(8)?.parse().unwrap_or_else(|_| Utc::now()),
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_testing::pending_ghost;

    #[test]
    fn approve_activates_bumps_version_and_resolves_pending_request() {
        let store = Store::open_in_memory().unwrap();
        let ghost = pending_ghost("org1", "test-ghost");
        let id = ghost.id;
        store.insert_ghost(&ghost).unwrap();

        let conn = store.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO approval_requests (
                id, ghost_id, execution_id, org_id, requested_by, approved_by, status,
                reason, decision_note, expires_at, created_at, resolved_at
            ) VALUES (?1, ?2, NULL, ?3, 'tester', NULL, 'pending', NULL, NULL, ?4, ?4, NULL)
            "#,
            params![
                Uuid::new_v4().to_string(),
                id.to_string(),
                "org1",
                Utc::now().to_rfc3339()
            ],
        )
        .unwrap();
        drop(conn);

        let approved = store.approve_ghost(id, "reviewer@example.com", Some("looks good")).unwrap();
        assert_eq!(approved.status, GhostStatus::Approved);
        assert!(approved.is_active);
        assert_eq!(approved.version, 2);

        let versions = store.ghost_versions(id).unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, 2);

        let conn = store.conn.lock().unwrap();
        let resolved_status: String = conn
            .query_row(
                "SELECT status FROM approval_requests WHERE ghost_id = ?1",
                params![id.to_string()],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(resolved_status, "approved");
    }

    #[test]
    fn approve_rejects_ghosts_not_pending_approval() {
        let store = Store::open_in_memory().unwrap();
        let mut ghost = pending_ghost("org1", "test-ghost");
        ghost.status = GhostStatus::Active;
        let id = ghost.id;
        store.insert_ghost(&ghost).unwrap();

        let result = store.approve_ghost(id, "reviewer", None);
        assert!(result.is_err());
    }

    #[test]
    fn pause_and_activate_cycle_through_valid_states() {
        let store = Store::open_in_memory().unwrap();
        let mut ghost = pending_ghost("org1", "test-ghost");
        ghost.status = GhostStatus::Active;
        ghost.is_active = true;
        let id = ghost.id;
        store.insert_ghost(&ghost).unwrap();

        let paused = store.pause_ghost(id).unwrap();
        assert_eq!(paused.status, GhostStatus::Paused);
        assert!(!paused.is_active);

        let active = store.activate_ghost(id).unwrap();
        assert_eq!(active.status, GhostStatus::Active);
        assert!(active.is_active);
    }
}
