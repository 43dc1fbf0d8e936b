//! Privacy Pipeline (4.E): orchestrates B -> C -> D over each Raw Event and
//! emits a Secure Event, owning the monotone per-pipeline sequence counter.

use ghost_core::{element_signature, fnv1a32_hex, structural_hash};
use ghost_types::{RawEvent, RawPayload, SecureEvent, SessionFingerprint, StructuralHash};

use crate::dpu::{anonymize_timestamp, perturb_vector, DpConfig};
use crate::intent::{classify, vectorize};
use crate::pii::Scrubber;

/// Summary of what the scrubber found while pre-processing an event's text
/// fields. None of this is retained on the emitted [`SecureEvent`] — its
/// schema has no slot for raw or scrubbed text — but surfacing it lets
/// callers assert the no-PII boundary in tests (§8).
#[derive(Debug, Clone, Default)]
pub struct ScrubSummary {
    pub contained_pii: bool,
}

/// Hashes a URL as `origin + '/' + fnv1a(path+search).hex` (4.E). Never
/// raises: a URL with no recognizable `scheme://host` prefix is hashed whole.
pub fn hash_url(url: &str) -> String {
    match url.find("://") {
        Some(scheme_end) => {
            let after_scheme = scheme_end + 3;
            match url[after_scheme..].find('/') {
                Some(rel) => {
                    let path_start = after_scheme + rel;
                    let origin = &url[..path_start];
                    let rest = &url[path_start..];
                    format!("{}/{}", origin, fnv1a32_hex(rest.as_bytes()))
                }
                None => format!("{}/{}", url, fnv1a32_hex(b"")),
            }
        }
        None => format!("{}/{}", url, fnv1a32_hex(url.as_bytes())),
    }
}

/// Given `(orgId, deviceId, userId)`, turns Raw Events into Secure Events.
pub struct PrivacyPipeline {
    org_id: String,
    device_id: String,
    user_id: String,
    dp_config: DpConfig,
    scrubber: Scrubber,
    sequence_number: u64,
    session_start_ms: Option<u64>,
}

impl PrivacyPipeline {
    pub fn new(org_id: impl Into<String>, device_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::with_config(org_id, device_id, user_id, DpConfig::default())
    }

    pub fn with_config(
        org_id: impl Into<String>,
        device_id: impl Into<String>,
        user_id: impl Into<String>,
        dp_config: DpConfig,
    ) -> Self {
        Self {
            org_id: org_id.into(),
            device_id: device_id.into(),
            user_id: user_id.into(),
            dp_config,
            scrubber: Scrubber::new(),
            sequence_number: 0,
            session_start_ms: None,
        }
    }

    /// Scrubs the event's free-text fields. Return value is discarded by
    /// `process`, which only stores whether anything looked like PII (4.E step 2).
    fn scrub_text(&mut self, event: &RawEvent) -> ScrubSummary {
        let mut contained_pii = false;
        match &event.payload {
            RawPayload::UserInt(p) => {
                if let Some(value) = &p.value {
                    contained_pii |= self.scrubber.contains_pii(value);
                    self.scrubber.scrub(value);
                }
            }
            RawPayload::DomMut(p) => {
                for mutation in &p.mutations {
                    if let Some(old) = &mutation.old_value {
                        contained_pii |= self.scrubber.contains_pii(old);
                        self.scrubber.scrub(old);
                    }
                    if let Some(new) = &mutation.new_value {
                        contained_pii |= self.scrubber.contains_pii(new);
                        self.scrubber.scrub(new);
                    }
                }
            }
            RawPayload::Error(p) => {
                contained_pii |= self.scrubber.contains_pii(&p.message);
                self.scrubber.scrub(&p.message);
            }
            RawPayload::Network(_) => {}
        }
        if let Some(el) = &event.element {
            contained_pii |= self.scrubber.contains_pii(&el.text_preview);
            self.scrubber.scrub(&el.text_preview);
        }
        ScrubSummary { contained_pii }
    }

    /// Runs B -> C -> D over one Raw Event, returning a Secure Event whose
    /// `sequenceNumber` strictly increases within this pipeline instance.
    pub fn process(&mut self, event: &RawEvent) -> SecureEvent {
        let _ = self.scrub_text(event);
        let _hashed_url = hash_url(&event.context.url);

        let (label, confidence) = classify(event);
        let raw_vector = vectorize(label, event);
        let vector = perturb_vector(&raw_vector, &self.dp_config);

        let timestamp_bucket = anonymize_timestamp(event.timestamp, &self.dp_config);

        let session_start_ms = *self.session_start_ms.get_or_insert(event.timestamp);
        let session_fingerprint: SessionFingerprint =
            ghost_core::session_fingerprint(&self.device_id, &self.user_id, session_start_ms);

        let (structural, signature) = match &event.element {
            Some(el) => (
                StructuralHash(structural_hash(&el.dom_path, &el.tag_name)),
                Some(element_signature(&el.tag_name, el.aria.role.as_deref(), &el.dom_path)),
            ),
            None => (StructuralHash(String::new()), None),
        };

        let sequence_number = self.sequence_number;
        self.sequence_number += 1;

        SecureEvent {
            session_fingerprint,
            timestamp_bucket,
            intent_vector: vector,
            structural_hash: structural,
            org_id: self.org_id.clone(),
            event_type: event.event_type,
            intent_label: label,
            intent_confidence: confidence,
            element_signature: signature,
            sequence_number,
        }
    }

    /// Zeros the sequence counter and the PII token table (4.E).
    pub fn reset(&mut self) {
        self.scrubber.reset();
        self.sequence_number = 0;
        self.session_start_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_types::{RawContext, RawEventType, TargetInfo, UserAction, UserIntPayload};
    use uuid::Uuid;

    fn event(value: Option<&str>, url: &str, timestamp: u64) -> RawEvent {
        RawEvent {
            timestamp,
            session_id: Uuid::new_v4(),
            event_type: RawEventType::UserInt,
            payload: RawPayload::UserInt(UserIntPayload {
                action: UserAction::Input,
                value: value.map(|s| s.to_string()),
                target: TargetInfo { tag: "input".to_string(), role: None, input_type: None, in_form: true, form_id: None },
            }),
            context: RawContext {
                url: url.to_string(),
                viewport: (1280, 800),
                user_agent: "test".to_string(),
                tab_id: "t1".to_string(),
            },
            element: None,
        }
    }

    #[test]
    fn sequence_number_is_monotone_within_a_pipeline() {
        let mut pipeline = PrivacyPipeline::new("org1", "device1", "user1");
        let e1 = pipeline.process(&event(None, "https://example.com/app", 1_700_000_000_000));
        let e2 = pipeline.process(&event(None, "https://example.com/app", 1_700_000_001_000));
        assert_eq!(e1.sequence_number, 0);
        assert_eq!(e2.sequence_number, 1);
    }

    #[test]
    fn reset_zeros_the_sequence_counter() {
        let mut pipeline = PrivacyPipeline::new("org1", "device1", "user1");
        pipeline.process(&event(None, "https://example.com/app", 1_700_000_000_000));
        pipeline.reset();
        let e = pipeline.process(&event(None, "https://example.com/app", 1_700_000_000_000));
        assert_eq!(e.sequence_number, 0);
    }

    #[test]
    fn secure_event_carries_no_raw_url_or_text() {
        let mut pipeline = PrivacyPipeline::new("org1", "device1", "user1");
        let e = pipeline.process(&event(Some("a@x.com"), "https://example.com/secret?x=1", 1_700_000_000_000));
        let json = serde_json::to_value(&e).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("textPreview"));
        assert!(!obj.contains_key("url"));
        assert!(!obj.contains_key("value"));
    }

    #[test]
    fn hash_url_separates_origin_from_hashed_path() {
        let hashed = hash_url("https://example.com/app?foo=bar");
        assert!(hashed.starts_with("https://example.com/"));
        assert_ne!(hashed, "https://example.com/app?foo=bar");
    }
}
