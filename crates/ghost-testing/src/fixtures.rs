//! Factories for Ghost/Pattern fixtures used across store, cluster, and
//! engine test suites.

use chrono::Utc;
use ghost_types::{
    DetectedPattern, ExecutionNode, GhostStatus, GhostTemplate, IntentClass, NodeType,
    PatternStatus, StructuralHash, TriggerKind, TriggerSpec,
};
use serde_json::Value;
use uuid::Uuid;

pub fn pending_ghost(org_id: &str, name: &str) -> GhostTemplate {
    GhostTemplate {
        id: Uuid::new_v4(),
        org_id: org_id.to_string(),
        name: name.to_string(),
        description: Some("fixture ghost".to_string()),
        version: 1,
        status: GhostStatus::PendingApproval,
        trigger: TriggerSpec { kind: TriggerKind::Event, condition: Value::Null },
        parameters: vec![],
        execution_plan: vec![ExecutionNode {
            id: "s1".to_string(),
            node_type: NodeType::Action,
            action: None,
            condition: None,
            children: None,
            fallback: None,
            timeout_ms: None,
        }],
        confidence: Some(0.8),
        source_pattern_id: None,
        is_active: false,
        usage_stats: Value::Null,
        created_by: Some("fixture".to_string()),
        approved_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn approved_ghost(org_id: &str, name: &str) -> GhostTemplate {
    let mut ghost = pending_ghost(org_id, name);
    ghost.status = GhostStatus::Active;
    ghost.is_active = true;
    ghost.approved_by = Some("fixture-reviewer".to_string());
    ghost
}

pub fn detected_pattern(org_id: &str, sequence: Vec<IntentClass>) -> DetectedPattern {
    let now = Utc::now();
    DetectedPattern {
        id: Uuid::new_v4(),
        org_id: org_id.to_string(),
        intent_sequence: sequence,
        structural_hashes: vec![StructuralHash("deadbeef".to_string())],
        occurrences: 3,
        confidence: 0.8,
        suggested_name: Some("fixture pattern".to_string()),
        suggested_description: Some("generated by ghost-testing".to_string()),
        first_seen: now,
        last_seen: now,
        status: PatternStatus::AutoSuggested,
        created_at: now,
        updated_at: now,
    }
}
