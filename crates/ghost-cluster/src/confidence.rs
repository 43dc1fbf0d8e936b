//! Step 4 of 4.H: statistical/LLM confidence fusion.

use std::collections::HashSet;

use crate::windowing::EventSequence;

pub const REVIEW_THRESHOLD: f64 = 0.70;
pub const AUTO_SUGGEST_THRESHOLD: f64 = 0.85;

fn quantize2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// `0.3·min(n/10,1) + 0.4·(1 - (uniqueIntentStrings-1)/n) + 0.3·meanIntentConfidence`.
pub fn statistical_score(members: &[&EventSequence]) -> f64 {
    let n = members.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let unique_intent_strings = members
        .iter()
        .map(|m| m.label_sequence_string())
        .collect::<HashSet<_>>()
        .len() as f64;
    let mean_intent_confidence =
        members.iter().map(|m| m.mean_intent_confidence()).sum::<f64>() / n;

    0.3 * (n / 10.0).min(1.0)
        + 0.4 * (1.0 - (unique_intent_strings - 1.0) / n)
        + 0.3 * mean_intent_confidence
}

/// `0.6·statistical + 0.4·llmConfidence` (default 0.5), rounded to 2 decimals.
pub fn combined_confidence(statistical: f64, llm_confidence: Option<f64>) -> f64 {
    let llm = llm_confidence.unwrap_or(0.5);
    quantize2(0.6 * statistical + 0.4 * llm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_types::{IntentClass, RawEventType, StructuralHash};

    fn sequence_with(label: IntentClass, confidence: f64) -> EventSequence {
        EventSequence {
            session_fingerprint: "fp".to_string(),
            embedding: vec![],
            timestamp: chrono::Utc::now(),
            events: vec![crate::windowing::WindowEvent {
                intent_label: label,
                event_type: RawEventType::UserInt,
                structural_hash: StructuralHash("deadbeef".to_string()),
                intent_confidence: confidence,
            }],
        }
    }

    #[test]
    fn identical_label_sequences_score_higher_than_mixed_ones() {
        let uniform: Vec<EventSequence> = (0..5).map(|_| sequence_with(IntentClass::Navigation, 0.9)).collect();
        let uniform_refs: Vec<&EventSequence> = uniform.iter().collect();

        let mixed = vec![
            sequence_with(IntentClass::Navigation, 0.9),
            sequence_with(IntentClass::DataEntry, 0.9),
            sequence_with(IntentClass::Communication, 0.9),
            sequence_with(IntentClass::Research, 0.9),
            sequence_with(IntentClass::Approval, 0.9),
        ];
        let mixed_refs: Vec<&EventSequence> = mixed.iter().collect();

        assert!(statistical_score(&uniform_refs) > statistical_score(&mixed_refs));
    }

    #[test]
    fn combined_confidence_defaults_llm_to_half_when_absent() {
        let result = combined_confidence(0.8, None);
        assert_eq!(result, quantize2(0.6 * 0.8 + 0.4 * 0.5));
    }

    #[test]
    fn combined_confidence_rounds_to_two_decimals() {
        let result = combined_confidence(1.0, Some(1.0));
        assert_eq!(result, 1.0);
    }
}
