use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::IntentClass;
use crate::secure_event::StructuralHash;

/// Lifecycle of a Detected Pattern (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternStatus {
    NeedsReview,
    AutoSuggested,
    Approved,
    Dismissed,
}

/// A clustered, LLM-named, confidence-scored workflow candidate (§3, 4.H).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub id: Uuid,
    pub org_id: String,
    pub intent_sequence: Vec<IntentClass>,
    pub structural_hashes: Vec<StructuralHash>,
    /// Invariant: `occurrences >= MIN_CLUSTER_SIZE` (3) — enforced by 4.H before upsert.
    pub occurrences: u32,
    pub confidence: f64,
    pub suggested_name: Option<String>,
    pub suggested_description: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub status: PatternStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
