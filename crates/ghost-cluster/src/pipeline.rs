//! Temporal Intent Clustering (4.H): ties windowing, density clustering,
//! LLM abstraction lifting, and confidence fusion into one pass over an
//! org's recent Secure Events, upserting surviving clusters as Detected
//! Patterns.

use chrono::Utc;
use ghost_llm::LlmProvider;
use ghost_store::Store;
use ghost_types::{DetectedPattern, PatternStatus};
use uuid::Uuid;

use crate::abstraction::lift_abstraction;
use crate::confidence::{combined_confidence, statistical_score, AUTO_SUGGEST_THRESHOLD, REVIEW_THRESHOLD};
use crate::density::greedy_cluster;
use crate::windowing::{extract_windows, EventSequence, FETCH_SIZE};
use crate::Result;

/// Only the first 5 surviving clusters get an LLM abstraction pass per run,
/// to bound the number of completions one detection pass issues.
const MAX_CLUSTERS_PER_RUN: usize = 5;

/// Runs one full clustering pass for `org_id` and upserts the resulting
/// patterns into `store`. A batch of fewer than 3 events yields an empty
/// result, not an error.
pub async fn detect_patterns(
    store: &Store,
    llm: &dyn LlmProvider,
    org_id: &str,
) -> Result<Vec<DetectedPattern>> {
    let events = store.recent_secure_events_for_org(org_id, FETCH_SIZE)?;
    if events.len() < 3 {
        return Ok(Vec::new());
    }

    let sequences = extract_windows(&events);
    let clusters = greedy_cluster(&sequences);

    let mut patterns = Vec::new();
    for cluster in clusters.iter().take(MAX_CLUSTERS_PER_RUN) {
        let members: Vec<&EventSequence> = cluster.iter().map(|&i| &sequences[i]).collect();
        let abstraction = lift_abstraction(llm, &members).await;

        let statistical = statistical_score(&members);
        let llm_confidence = abstraction.as_ref().and_then(|a| a.confidence);
        let combined = combined_confidence(statistical, llm_confidence);
        if combined < REVIEW_THRESHOLD {
            continue;
        }

        let pattern = build_pattern(org_id, &members, combined, abstraction.as_ref());
        upsert_pattern(store, pattern.clone())?;
        patterns.push(pattern);
    }

    Ok(patterns)
}

fn build_pattern(
    org_id: &str,
    members: &[&EventSequence],
    confidence: f64,
    abstraction: Option<&crate::abstraction::LlmAbstraction>,
) -> DetectedPattern {
    let mut intent_sequence = Vec::new();
    let mut structural_hashes = Vec::new();
    for member in members {
        for event in &member.events {
            if !intent_sequence.contains(&event.intent_label) {
                intent_sequence.push(event.intent_label);
            }
            if !structural_hashes.contains(&event.structural_hash) {
                structural_hashes.push(event.structural_hash.clone());
            }
        }
    }

    let first_seen = members.iter().map(|m| m.timestamp).min().unwrap_or_else(Utc::now);
    let last_seen = members.iter().map(|m| m.timestamp).max().unwrap_or_else(Utc::now);
    let status = if confidence >= AUTO_SUGGEST_THRESHOLD {
        PatternStatus::AutoSuggested
    } else {
        PatternStatus::NeedsReview
    };
    let now = Utc::now();

    DetectedPattern {
        id: Uuid::new_v4(),
        org_id: org_id.to_string(),
        intent_sequence,
        structural_hashes,
        occurrences: members.len() as u32,
        confidence,
        suggested_name: abstraction.map(|a| a.name.clone()),
        suggested_description: abstraction.and_then(|a| a.description.clone()),
        first_seen,
        last_seen,
        status,
        created_at: now,
        updated_at: now,
    }
}

/// Matches an existing pattern by structural-hash set equality within the
/// org and updates it in place; otherwise inserts a new row.
fn upsert_pattern(store: &Store, mut pattern: DetectedPattern) -> Result<()> {
    let existing = store.patterns_for_org(&pattern.org_id)?;
    let mut hashes = pattern.structural_hashes.clone();
    hashes.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    let matched = existing.into_iter().find(|candidate| {
        let mut candidate_hashes = candidate.structural_hashes.clone();
        candidate_hashes.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        candidate_hashes == hashes
    });

    match matched {
        Some(existing) => {
            pattern.id = existing.id;
            pattern.created_at = existing.created_at;
            pattern.suggested_name = pattern.suggested_name.or(existing.suggested_name);
            pattern.suggested_description = pattern.suggested_description.or(existing.suggested_description);
            store.update_pattern(&pattern)?;
        }
        None => {
            store.insert_pattern(&pattern)?;
        }
    }
    Ok(())
}
