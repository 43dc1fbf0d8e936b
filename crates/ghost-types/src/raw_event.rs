use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fingerprint::ElementFingerprint;

/// Raw Event's top-level category (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawEventType {
    DomMut,
    UserInt,
    Network,
    Error,
}

/// User-interaction action kinds driving the 4.C decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    Input,
    Paste,
    Navigate,
    Click,
    Select,
    Copy,
    Scroll,
    Focus,
}

/// HTTP method observed on an intercepted `fetch`/`XHR` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Other,
}

/// Minimal facts about the element a user/dom_mut event targeted — enough for
/// the 4.C decision table without re-deriving a full fingerprint per event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetInfo {
    pub tag: String,
    pub role: Option<String>,
    pub input_type: Option<String>,
    pub in_form: bool,
    pub form_id: Option<String>,
}

impl TargetInfo {
    pub fn is_anchor(&self) -> bool {
        self.tag.eq_ignore_ascii_case("a")
    }

    pub fn is_button(&self) -> bool {
        self.tag.eq_ignore_ascii_case("button")
            || self.role.as_deref() == Some("button")
    }

    pub fn is_checkbox_or_radio(&self) -> bool {
        matches!(self.input_type.as_deref(), Some("checkbox") | Some("radio"))
    }
}

/// One DOM mutation record within a `dom_mut` event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationRecord {
    pub target: TargetInfo,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIntPayload {
    pub action: UserAction,
    /// Present for input/paste; may contain PII, scrubbed by 4.B before transmission.
    pub value: Option<String>,
    pub target: TargetInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomMutPayload {
    pub added_nodes: u32,
    pub removed_nodes: u32,
    pub mutations: Vec<MutationRecord>,
    pub form_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkPayload {
    pub method: HttpMethod,
    pub url: String,
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Polymorphic Raw Event payload (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawPayload {
    UserInt(UserIntPayload),
    DomMut(DomMutPayload),
    Network(NetworkPayload),
    Error(ErrorPayload),
}

/// Browsing context accompanying a Raw Event (§3). The url here is the
/// plaintext, pre-scrub URL — it must never cross the privacy boundary (4.E).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawContext {
    pub url: String,
    pub viewport: (i32, i32),
    pub user_agent: String,
    pub tab_id: String,
}

/// Device-only Raw Event (§3). Never persisted across the privacy boundary;
/// destroyed after the Privacy Pipeline (4.E) processes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    /// Monotonic milliseconds, device clock.
    pub timestamp: u64,
    pub session_id: Uuid,
    pub event_type: RawEventType,
    pub payload: RawPayload,
    pub context: RawContext,
    /// Fingerprint of the primary target element, when one exists for this event.
    pub element: Option<ElementFingerprint>,
}
