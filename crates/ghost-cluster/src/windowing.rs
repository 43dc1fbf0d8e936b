//! Step 1 of 4.H: group Secure Events by session, slide a window over each
//! session's sequence, and embed each window as the mean of its members'
//! intent vectors.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ghost_types::{IntentClass, RawEventType, SecureEvent, StructuralHash};

pub const WINDOW_SIZE: usize = 50;
/// 5·WINDOW_SIZE, the most recent-events fetch size for one clustering pass.
pub const FETCH_SIZE: u32 = (5 * WINDOW_SIZE) as u32;

/// One member event inside a window, retaining just what clustering and
/// abstraction lifting need — not the full `SecureEvent`.
#[derive(Debug, Clone)]
pub struct WindowEvent {
    pub intent_label: IntentClass,
    pub event_type: RawEventType,
    pub structural_hash: StructuralHash,
    pub intent_confidence: f64,
}

/// A candidate recurring-workflow instance: a contiguous slice of one
/// session's events, embedded as the mean of member intent vectors.
#[derive(Debug, Clone)]
pub struct EventSequence {
    pub session_fingerprint: String,
    pub embedding: Vec<f64>,
    pub timestamp: DateTime<Utc>,
    pub events: Vec<WindowEvent>,
}

impl EventSequence {
    /// Comma-joined intent labels, used to count `uniqueIntentStrings` in
    /// confidence fusion.
    pub fn label_sequence_string(&self) -> String {
        self.events
            .iter()
            .map(|e| e.intent_label.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `"intentLabel (eventType)"` per member, joined by arrows, for the LLM
    /// abstraction-lifting prompt.
    pub fn render_arrow(&self) -> String {
        self.events
            .iter()
            .map(|e| format!("{} ({})", e.intent_label.as_str(), event_type_label(e.event_type)))
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn mean_intent_confidence(&self) -> f64 {
        if self.events.is_empty() {
            return 0.0;
        }
        self.events.iter().map(|e| e.intent_confidence).sum::<f64>() / self.events.len() as f64
    }
}

fn event_type_label(t: RawEventType) -> &'static str {
    match t {
        RawEventType::DomMut => "dom_mut",
        RawEventType::UserInt => "user_int",
        RawEventType::Network => "network",
        RawEventType::Error => "error",
    }
}

fn mean_embedding(vectors: &[&Vec<f64>]) -> Vec<f64> {
    let non_empty: Vec<&&Vec<f64>> = vectors.iter().filter(|v| !v.is_empty()).collect();
    if non_empty.is_empty() {
        return Vec::new();
    }
    let len = non_empty[0].len();
    let mut sum = vec![0.0; len];
    for vector in &non_empty {
        for (i, value) in vector.iter().enumerate() {
            if i < len {
                sum[i] += value;
            }
        }
    }
    let n = non_empty.len() as f64;
    sum.into_iter().map(|v| v / n).collect()
}

/// Groups by `sessionFingerprint`, sorts ascending by `sequenceNumber` within
/// each group, and slides a window of up to `WINDOW_SIZE` with step 1,
/// starting at every index up to `max(0, len - 3)`. Windows shorter than 3
/// events are skipped.
pub fn extract_windows(events: &[SecureEvent]) -> Vec<EventSequence> {
    let mut by_session: HashMap<&str, Vec<&SecureEvent>> = HashMap::new();
    for event in events {
        by_session
            .entry(event.session_fingerprint.as_str())
            .or_default()
            .push(event);
    }

    let mut sequences = Vec::new();
    for (session_fingerprint, mut members) in by_session {
        members.sort_by_key(|e| e.sequence_number);
        let len = members.len();
        if len < 3 {
            continue;
        }
        let last_start = len.saturating_sub(3);
        for start in 0..=last_start {
            let end = (start + WINDOW_SIZE).min(len);
            let window = &members[start..end];
            if window.len() < 3 {
                continue;
            }
            let embedding = mean_embedding(&window.iter().map(|e| &e.intent_vector).collect::<Vec<_>>());
            let timestamp = window[0]
                .timestamp_bucket
                .parse::<DateTime<Utc>>()
                .unwrap_or_else(|_| Utc::now());
            let window_events = window
                .iter()
                .map(|e| WindowEvent {
                    intent_label: e.intent_label,
                    event_type: e.event_type,
                    structural_hash: e.structural_hash.clone(),
                    intent_confidence: e.intent_confidence,
                })
                .collect();
            sequences.push(EventSequence {
                session_fingerprint: session_fingerprint.to_string(),
                embedding,
                timestamp,
                events: window_events,
            });
        }
    }
    sequences
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_testing::secure_event;

    #[test]
    fn sessions_shorter_than_three_produce_no_windows() {
        let events = vec![
            secure_event("org1", IntentClass::Navigation, "fp-1", 0),
            secure_event("org1", IntentClass::Navigation, "fp-1", 1),
        ];
        assert!(extract_windows(&events).is_empty());
    }

    #[test]
    fn a_session_of_five_events_produces_windows_starting_at_every_index_up_to_len_minus_three() {
        let events: Vec<_> = (0..5)
            .map(|i| secure_event("org1", IntentClass::Navigation, "fp-1", i))
            .collect();
        let windows = extract_windows(&events);
        // last_start = max(0, 5-3) = 2 -> starts 0,1,2
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].events.len(), 5);
        assert_eq!(windows[2].events.len(), 3);
    }

    #[test]
    fn distinct_sessions_are_windowed_independently() {
        let mut events: Vec<_> = (0..4)
            .map(|i| secure_event("org1", IntentClass::Navigation, "fp-1", i))
            .collect();
        events.extend((0..3).map(|i| secure_event("org1", IntentClass::DataEntry, "fp-2", i)));
        let windows = extract_windows(&events);
        let sessions: std::collections::HashSet<_> =
            windows.iter().map(|w| w.session_fingerprint.clone()).collect();
        assert_eq!(sessions.len(), 2);
    }
}
