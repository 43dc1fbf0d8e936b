//! DDL for the persisted schema (§6, abbreviated to what this service reads
//! and writes itself). Array/jsonb columns from the source schema are stored
//! as TEXT holding JSON, since SQLite has no native array/jsonb type —
//! `agtrace-index`'s schema-on-read-but-index-on-write style, adapted.
//!
//! Row-level `org_id` scoping in the source schema is a database-role
//! concern outside this process; here it is enforced by always filtering
//! and inserting with an explicit `org_id` parameter rather than relying on
//! ambient session state.

use rusqlite::Connection;

use crate::error::Result;

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS secure_events (
            id TEXT PRIMARY KEY,
            session_fingerprint TEXT NOT NULL,
            timestamp_bucket TEXT NOT NULL,
            intent_vector TEXT NOT NULL,
            structural_hash TEXT NOT NULL,
            org_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            intent_label TEXT NOT NULL,
            intent_confidence REAL NOT NULL,
            element_signature TEXT,
            sequence_number INTEGER NOT NULL,
            device_fingerprint TEXT NOT NULL,
            batch_id TEXT NOT NULL,
            ingested_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_secure_events_org ON secure_events(org_id, ingested_at);
        CREATE INDEX IF NOT EXISTS idx_secure_events_session ON secure_events(session_fingerprint, sequence_number);

        CREATE TABLE IF NOT EXISTS detected_patterns (
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL,
            intent_sequence TEXT NOT NULL,
            structural_hashes TEXT NOT NULL,
            occurrences INTEGER NOT NULL,
            confidence REAL NOT NULL,
            suggested_name TEXT,
            suggested_description TEXT,
            first_seen TEXT NOT NULL,
            last_seen TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_patterns_org ON detected_patterns(org_id, status);

        CREATE TABLE IF NOT EXISTS ghosts (
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            version INTEGER NOT NULL,
            status TEXT NOT NULL,
            trigger TEXT NOT NULL,
            parameters TEXT NOT NULL,
            execution_plan TEXT NOT NULL,
            confidence REAL,
            source_pattern_id TEXT,
            created_by TEXT,
            approved_by TEXT,
            is_active INTEGER NOT NULL,
            usage_stats TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_ghosts_org ON ghosts(org_id, status);

        CREATE TABLE IF NOT EXISTS ghost_versions (
            id TEXT PRIMARY KEY,
            ghost_id TEXT NOT NULL,
            version INTEGER NOT NULL,
            execution_plan TEXT NOT NULL,
            parameters TEXT NOT NULL,
            trigger TEXT NOT NULL,
            change_description TEXT,
            created_by TEXT,
            created_at TEXT NOT NULL,
            UNIQUE(ghost_id, version)
        );

        CREATE TABLE IF NOT EXISTS executions (
            id TEXT PRIMARY KEY,
            ghost_id TEXT NOT NULL,
            status TEXT NOT NULL,
            parameters TEXT NOT NULL,
            trigger TEXT NOT NULL,
            step_count INTEGER NOT NULL,
            started_at TEXT NOT NULL,
            completed_at TEXT,
            error TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_executions_ghost ON executions(ghost_id);

        CREATE TABLE IF NOT EXISTS execution_steps (
            id TEXT PRIMARY KEY,
            execution_id TEXT NOT NULL,
            node_id TEXT NOT NULL,
            status TEXT NOT NULL,
            strategy TEXT NOT NULL,
            duration_ms INTEGER NOT NULL,
            output TEXT,
            error TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_steps_execution ON execution_steps(execution_id);

        -- Append-only: no UPDATE/DELETE statement against this table exists
        -- anywhere in this crate (4.J).
        CREATE TABLE IF NOT EXISTS execution_logs (
            id TEXT PRIMARY KEY,
            execution_id TEXT NOT NULL,
            ghost_id TEXT NOT NULL,
            org_id TEXT NOT NULL,
            status TEXT NOT NULL,
            steps TEXT NOT NULL,
            duration_ms INTEGER NOT NULL,
            strategies_used TEXT NOT NULL,
            logged_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_logs_org ON execution_logs(org_id, logged_at);

        CREATE TABLE IF NOT EXISTS approval_requests (
            id TEXT PRIMARY KEY,
            ghost_id TEXT NOT NULL,
            execution_id TEXT,
            org_id TEXT NOT NULL,
            requested_by TEXT NOT NULL,
            approved_by TEXT,
            status TEXT NOT NULL,
            reason TEXT,
            decision_note TEXT,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            resolved_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_approvals_ghost ON approval_requests(ghost_id, status);

        -- Append-only (4.J).
        CREATE TABLE IF NOT EXISTS user_feedback (
            id TEXT PRIMARY KEY,
            execution_id TEXT NOT NULL,
            ghost_id TEXT NOT NULL,
            org_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            satisfaction_score INTEGER,
            corrected_actions TEXT,
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS org_settings (
            org_id TEXT PRIMARY KEY,
            settings TEXT NOT NULL,
            auto_approve_threshold REAL NOT NULL DEFAULT 0.95,
            max_executions_per_minute INTEGER NOT NULL DEFAULT 10,
            llm_provider TEXT NOT NULL,
            llm_model TEXT NOT NULL,
            require_approval_above_value REAL
        );

        CREATE TABLE IF NOT EXISTS automation_policies (
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            condition TEXT NOT NULL,
            action TEXT NOT NULL,
            is_active INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}
