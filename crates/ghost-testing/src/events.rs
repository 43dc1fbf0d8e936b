//! Builders for Raw/Secure Events, reducing per-test struct-literal noise.

use chrono::Utc;
use ghost_types::{
    HttpMethod, IntentClass, NetworkPayload, RawContext, RawEvent, RawEventType, RawPayload,
    SecureEvent, SessionFingerprint, StructuralHash, TargetInfo, UserAction, UserIntPayload,
};
use uuid::Uuid;

pub struct RawEventBuilder {
    event: RawEvent,
}

impl RawEventBuilder {
    pub fn user_click(tag: &str) -> Self {
        Self {
            event: RawEvent {
                timestamp: 1_700_000_000_000,
                session_id: Uuid::new_v4(),
                event_type: RawEventType::UserInt,
                payload: RawPayload::UserInt(UserIntPayload {
                    action: UserAction::Click,
                    value: None,
                    target: TargetInfo {
                        tag: tag.to_string(),
                        role: None,
                        input_type: None,
                        in_form: false,
                        form_id: None,
                    },
                }),
                context: RawContext {
                    url: "https://example.com/app".to_string(),
                    viewport: (1280, 800),
                    user_agent: "ghost-testing".to_string(),
                    tab_id: "tab-1".to_string(),
                },
                element: None,
            },
        }
    }

    pub fn network(method: HttpMethod, url: &str, status: Option<u16>) -> Self {
        Self {
            event: RawEvent {
                timestamp: 1_700_000_000_000,
                session_id: Uuid::new_v4(),
                event_type: RawEventType::Network,
                payload: RawPayload::Network(NetworkPayload { method, url: url.to_string(), status }),
                context: RawContext {
                    url: url.to_string(),
                    viewport: (1280, 800),
                    user_agent: "ghost-testing".to_string(),
                    tab_id: "tab-1".to_string(),
                },
                element: None,
            },
        }
    }

    pub fn timestamp(mut self, ts: u64) -> Self {
        self.event.timestamp = ts;
        self
    }

    pub fn build(self) -> RawEvent {
        self.event
    }
}

/// A minimal, schema-valid Secure Event for tests that only care about
/// clustering/storage behavior, not privacy-pipeline internals.
pub fn secure_event(org_id: &str, label: IntentClass, session_fingerprint: &str, sequence_number: u64) -> SecureEvent {
    SecureEvent {
        session_fingerprint: SessionFingerprint(session_fingerprint.to_string()),
        timestamp_bucket: Utc::now().to_rfc3339(),
        intent_vector: vec![0.0; ghost_types::INTENT_VECTOR_LEN],
        structural_hash: StructuralHash("deadbeef".to_string()),
        org_id: org_id.to_string(),
        event_type: RawEventType::UserInt,
        intent_label: label,
        intent_confidence: 0.9,
        element_signature: Some("button@form>div>button".to_string()),
        sequence_number,
    }
}
