//! Shared data model for the capture/privacy/clustering/execution pipeline (spec §3).

pub mod error;
pub mod execution;
pub mod fingerprint;
pub mod ghost;
pub mod governance;
pub mod intent;
pub mod pattern;
pub mod raw_event;
pub mod secure_event;

pub use error::{Error, ErrorCode, Result};
pub use execution::{
    ActionSpec, Execution, ExecutionNode, ExecutionStatus, ExecutionStep, NodeType, StepStatus,
    Strategy, Tool,
};
pub use fingerprint::{AriaInfo, ElementContext, ElementFingerprint, Position};
pub use ghost::{
    GhostParameter, GhostStatus, GhostTemplate, GhostVersion, ParamType, TriggerKind, TriggerSpec,
};
pub use governance::{
    ApprovalRequest, ApprovalStatus, AutomationPolicy, ExecutionLog, OrgSettings, PolicyAction,
    UserFeedback,
};
pub use intent::IntentClass;
pub use pattern::{DetectedPattern, PatternStatus};
pub use raw_event::{
    DomMutPayload, ErrorPayload, HttpMethod, MutationRecord, NetworkPayload, RawContext,
    RawEvent, RawEventType, RawPayload, TargetInfo, UserAction, UserIntPayload,
};
pub use secure_event::{
    SecureEvent, SecureEventBatch, SessionFingerprint, StructuralHash, INTENT_VECTOR_LEN,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_round_trips_through_json_including_unknown_names() {
        let json = serde_json::json!("api_call");
        let tool: Tool = serde_json::from_value(json).unwrap();
        assert_eq!(tool, Tool::ApiCall);

        let json = serde_json::json!("wiggle_the_mouse");
        let tool: Tool = serde_json::from_value(json).unwrap();
        assert_eq!(tool, Tool::Other("wiggle_the_mouse".to_string()));
        assert_eq!(serde_json::to_value(&tool).unwrap(), "wiggle_the_mouse");
    }

    #[test]
    fn strategy_self_healed_prefixes_the_inner_strategy() {
        let s = Strategy::SelfHealed(Box::new(Strategy::Human));
        assert_eq!(s.as_string(), "self_healed:human");
        assert_eq!(Strategy::from_str("self_healed:human"), s);
        assert!(s.is_self_healed());
        assert!(!Strategy::Human.is_self_healed());
    }

    #[test]
    fn ghost_active_invariant_requires_approved_or_active_status() {
        let mut ghost = sample_ghost();
        ghost.is_active = true;
        ghost.status = GhostStatus::Paused;
        assert!(!ghost.invariant_holds());

        ghost.status = GhostStatus::Active;
        assert!(ghost.invariant_holds());
    }

    fn sample_ghost() -> GhostTemplate {
        GhostTemplate {
            id: uuid::Uuid::new_v4(),
            org_id: "org1".to_string(),
            name: "test".to_string(),
            description: None,
            version: 1,
            status: GhostStatus::PendingApproval,
            trigger: TriggerSpec {
                kind: TriggerKind::Event,
                condition: serde_json::Value::Null,
            },
            parameters: vec![],
            execution_plan: vec![],
            confidence: None,
            source_pattern_id: None,
            is_active: false,
            usage_stats: serde_json::Value::Null,
            created_by: None,
            approved_by: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn position_clamps_relative_coordinates_to_unit_interval() {
        let p = Position::from_rect(-50, 2000, 10, 10, 1000, 800);
        assert_eq!(p.rel_x, 0.0);
        assert_eq!(p.rel_y, 1.0);
    }
}
