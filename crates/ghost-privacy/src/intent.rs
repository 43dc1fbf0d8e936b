//! Intent Encoder (4.C): classifies a Raw Event into one of twelve
//! [`IntentClass`] labels and emits a deterministic 128-d vector.

use ghost_core::fnv1a32;
use ghost_types::{HttpMethod, IntentClass, RawEvent, RawEventType, RawPayload, UserAction};

/// Classifies an event per the 4.C decision table. Falls through to
/// `(Unknown, 0.1)` for anything not named there.
pub fn classify(event: &RawEvent) -> (IntentClass, f64) {
    match (&event.event_type, &event.payload) {
        (RawEventType::UserInt, RawPayload::UserInt(p)) => {
            let is_sensitive_input = matches!(p.target.input_type.as_deref(), Some("password") | Some("email"));
            match p.action {
                UserAction::Input if is_sensitive_input => (IntentClass::Authentication, 0.85),
                UserAction::Input | UserAction::Paste => (IntentClass::DataEntry, 0.90),
                UserAction::Navigate => (IntentClass::Navigation, 0.95),
                UserAction::Click if p.target.is_anchor() => (IntentClass::Navigation, 0.85),
                UserAction::Click if p.target.is_button() && p.target.in_form => {
                    (IntentClass::DataEntry, 0.80)
                }
                UserAction::Click if p.target.is_button() => (IntentClass::WorkflowTransition, 0.70),
                UserAction::Click if p.target.is_checkbox_or_radio() => {
                    (IntentClass::Configuration, 0.75)
                }
                UserAction::Click => (IntentClass::Unknown, 0.15),
                UserAction::Select => (IntentClass::DataEntry, 0.85),
                UserAction::Copy => (IntentClass::DataExtraction, 0.80),
                UserAction::Scroll => (IntentClass::Research, 0.50),
                UserAction::Focus => (IntentClass::Navigation, 0.40),
            }
        }
        (RawEventType::DomMut, RawPayload::DomMut(p)) => {
            if p.added_nodes + p.removed_nodes > 20 {
                (IntentClass::Navigation, 0.60)
            } else if p.form_id.is_some()
                || p.mutations.iter().any(|m| {
                    let tag = m.target.tag.to_lowercase();
                    tag == "input" || tag == "textarea" || tag == "select" || m.target.form_id.is_some()
                })
            {
                (IntentClass::DataEntry, 0.50)
            } else {
                (IntentClass::Unknown, 0.20)
            }
        }
        (RawEventType::Network, RawPayload::Network(p)) => {
            let url = p.url.to_lowercase();
            let is_write = matches!(p.method, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch);
            if is_write && matches_any(&url, &["auth", "login", "token"]) {
                (IntentClass::Authentication, 0.85)
            } else if is_write && matches_any(&url, &["message", "email", "send"]) {
                (IntentClass::Communication, 0.75)
            } else if is_write {
                (IntentClass::DataEntry, 0.70)
            } else if matches!(p.method, HttpMethod::Delete) {
                (IntentClass::WorkflowTransition, 0.70)
            } else if matches!(p.method, HttpMethod::Get) && matches_any(&url, &["search", "query"]) {
                (IntentClass::Research, 0.70)
            } else if matches!(p.method, HttpMethod::Get) && matches_any(&url, &["export", "download"]) {
                (IntentClass::DataExtraction, 0.75)
            } else if p.status.map(|s| s >= 400).unwrap_or(false) {
                (IntentClass::ErrorHandling, 0.60)
            } else {
                (IntentClass::Unknown, 0.15)
            }
        }
        (RawEventType::Error, RawPayload::Error(_)) => (IntentClass::ErrorHandling, 0.90),
        _ => (IntentClass::Unknown, 0.10),
    }
}

fn matches_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn action_order(action: UserAction) -> u32 {
    match action {
        UserAction::Input => 0,
        UserAction::Paste => 1,
        UserAction::Navigate => 2,
        UserAction::Click => 3,
        UserAction::Select => 4,
        UserAction::Copy => 5,
        UserAction::Scroll => 6,
        UserAction::Focus => 7,
    }
}

fn method_order(method: HttpMethod) -> u32 {
    match method {
        HttpMethod::Get => 0,
        HttpMethod::Post => 1,
        HttpMethod::Put => 2,
        HttpMethod::Patch => 3,
        HttpMethod::Delete => 4,
        HttpMethod::Other => 5,
    }
}

/// The seven scalar features mixed into the base vector (4.C), each centered
/// on `[-0.5, 0.5]` with `0.0` standing in when an event has no value for it.
fn extract_features(event: &RawEvent) -> [f64; 7] {
    let mut action_index = 0.0;
    let mut tag_hash = 0.0;
    let mut dom_depth = 0.0;
    let mut rel_x = 0.0;
    let mut rel_y = 0.0;
    let mut method_index = 0.0;
    let mut norm_status = 0.0;

    if let RawPayload::UserInt(p) = &event.payload {
        action_index = (action_order(p.action) as f64 / 7.0) - 0.5;
        tag_hash = (fnv1a32(p.target.tag.to_lowercase().as_bytes()) as f64 / u32::MAX as f64) - 0.5;
    }
    if let Some(el) = &event.element {
        dom_depth = (el.dom_path.len().min(20) as f64 / 20.0) - 0.5;
        rel_x = el.position.rel_x - 0.5;
        rel_y = el.position.rel_y - 0.5;
    }
    if let RawPayload::Network(p) = &event.payload {
        method_index = (method_order(p.method) as f64 / 6.0) - 0.5;
        if let Some(status) = p.status {
            norm_status = (status as f64 / 1000.0).min(1.0) - 0.5;
        }
    }
    [action_index, tag_hash, dom_depth, rel_x, rel_y, method_index, norm_status]
}

/// LCG per Numerical Recipes' constants: same seed always yields the same stream.
fn lcg_next(state: u32) -> u32 {
    state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223)
}

fn quantize4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Builds the 128-d intent vector for `class`, mixing in `event`'s features at
/// weight 0.3 and L2-normalizing. Deterministic: identical `(class, event
/// features)` always produce a byte-identical vector (§8).
pub fn vectorize(class: IntentClass, event: &RawEvent) -> Vec<f64> {
    let features = extract_features(event);
    let mut state = class.seed();
    let mut vector = vec![0.0f64; 128];

    for (i, slot) in vector.iter_mut().enumerate() {
        state = lcg_next(state);
        let base = (state as f64 / u32::MAX as f64) - 0.5;
        *slot = base + 0.3 * features[i % 7];
    }

    let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
    for v in vector.iter_mut() {
        *v = quantize4(*v);
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_types::{RawContext, TargetInfo, UserIntPayload};
    use uuid::Uuid;

    fn click_event(tag: &str, in_form: bool) -> RawEvent {
        RawEvent {
            timestamp: 0,
            session_id: Uuid::new_v4(),
            event_type: RawEventType::UserInt,
            payload: RawPayload::UserInt(UserIntPayload {
                action: UserAction::Click,
                value: None,
                target: TargetInfo { tag: tag.to_string(), role: None, input_type: None, in_form, form_id: None },
            }),
            context: RawContext {
                url: "https://example.com".to_string(),
                viewport: (1280, 800),
                user_agent: "test".to_string(),
                tab_id: "t1".to_string(),
            },
            element: None,
        }
    }

    #[test]
    fn anchor_click_classifies_as_navigation() {
        let (label, confidence) = classify(&click_event("a", false));
        assert_eq!(label, IntentClass::Navigation);
        assert_eq!(confidence, 0.85);
    }

    #[test]
    fn button_click_in_form_classifies_as_data_entry() {
        let (label, _) = classify(&click_event("button", true));
        assert_eq!(label, IntentClass::DataEntry);
    }

    #[test]
    fn button_click_outside_form_classifies_as_workflow_transition() {
        let (label, _) = classify(&click_event("button", false));
        assert_eq!(label, IntentClass::WorkflowTransition);
    }

    #[test]
    fn vectorize_is_deterministic_and_unit_length() {
        let event = click_event("a", false);
        let (label, _) = classify(&event);
        let v1 = vectorize(label, &event);
        let v2 = vectorize(label, &event);
        assert_eq!(v1, v2);
        assert_eq!(v1.len(), 128);
        let norm: f64 = v1.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }
}
