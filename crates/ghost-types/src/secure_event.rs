use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::IntentClass;
use crate::raw_event::RawEventType;

/// Irreversible HMAC-SHA256 session identifier (4.D), 64 lowercase hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionFingerprint(pub String);

impl SessionFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 8-hex FNV-1a structural hash over domPath + tagName (4.D).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralHash(pub String);

impl StructuralHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The boundary record produced by the Privacy Pipeline (§3 Secure Event).
///
/// Invariant: contains no plaintext URL, no user text, no credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureEvent {
    pub session_fingerprint: SessionFingerprint,
    /// ISO-8601, rounded to a 5-minute boundary after Laplacian pre-noise (4.D).
    pub timestamp_bucket: String,
    /// 128 floats, L2-normalized then Gaussian-perturbed, quantized to 4 decimals.
    pub intent_vector: Vec<f64>,
    pub structural_hash: StructuralHash,
    pub org_id: String,
    pub event_type: RawEventType,
    pub intent_label: IntentClass,
    pub intent_confidence: f64,
    /// `"tag[role]@last3PathSegments"`, or None when no target element exists.
    pub element_signature: Option<String>,
    /// Strictly increasing within one sessionFingerprint (§3, §8 monotonicity).
    pub sequence_number: u64,
}

pub const INTENT_VECTOR_LEN: usize = 128;

/// Wire batch shape posted by the Event Transmitter / accepted by `/ingest-events` (4.F, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureEventBatch {
    pub events: Vec<SecureEvent>,
    pub device_fingerprint: String,
    pub batch_id: Uuid,
    pub sent_at: DateTime<Utc>,
}
