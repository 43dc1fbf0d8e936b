use chrono::Utc;
use ghost_types::{IntentClass, RawEventType, SecureEvent, SessionFingerprint, StructuralHash};
use rusqlite::params;
use uuid::Uuid;

use crate::error::Result;
use crate::Store;

fn event_type_str(t: RawEventType) -> &'static str {
    match t {
        RawEventType::DomMut => "dom_mut",
        RawEventType::UserInt => "user_int",
        RawEventType::Network => "network",
        RawEventType::Error => "error",
    }
}

fn event_type_from_str(s: &str) -> RawEventType {
    match s {
        "dom_mut" => RawEventType::DomMut,
        "user_int" => RawEventType::UserInt,
        "network" => RawEventType::Network,
        _ => RawEventType::Error,
    }
}

impl Store {
    /// Inserts one Secure Event, tagging it with the batch it arrived in (4.G).
    pub fn insert_secure_event(&self, event: &SecureEvent, device_fingerprint: &str, batch_id: Uuid) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO secure_events (
                id, session_fingerprint, timestamp_bucket, intent_vector, structural_hash,
                org_id, event_type, intent_label, intent_confidence, element_signature,
                sequence_number, device_fingerprint, batch_id, ingested_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                Uuid::new_v4().to_string(),
                event.session_fingerprint.as_str(),
                event.timestamp_bucket,
                serde_json::to_string(&event.intent_vector)?,
                event.structural_hash.as_str(),
                event.org_id,
                event_type_str(event.event_type),
                event.intent_label.as_str(),
                event.intent_confidence,
                event.element_signature,
                event.sequence_number as i64,
                device_fingerprint,
                batch_id.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetches every Secure Event for an org within a half-open time window,
    /// ordered by session then sequence — the shape 4.H's windowing needs.
    pub fn secure_events_for_org(&self, org_id: &str, since: &str) -> Result<Vec<SecureEvent>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT session_fingerprint, timestamp_bucket, intent_vector, structural_hash,
                   org_id, event_type, intent_label, intent_confidence, element_signature, sequence_number
            FROM secure_events
            WHERE org_id = ?1 AND ingested_at >= ?2
            ORDER BY session_fingerprint, sequence_number
            "#,
        )?;
        let rows = stmt.query_map(params![org_id, since], row_to_secure_event)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Fetches the most recent `limit` Secure Events for an org, newest first
    /// by ingestion order — the raw material 4.H's window extraction groups
    /// by `sessionFingerprint` and re-sorts ascending within each group.
    pub fn recent_secure_events_for_org(&self, org_id: &str, limit: u32) -> Result<Vec<SecureEvent>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT session_fingerprint, timestamp_bucket, intent_vector, structural_hash,
                   org_id, event_type, intent_label, intent_confidence, element_signature, sequence_number
            FROM secure_events
            WHERE org_id = ?1
            ORDER BY ingested_at DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![org_id, limit], row_to_secure_event)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

fn row_to_secure_event(row: &rusqlite::Row) -> rusqlite::Result<SecureEvent> {
    let intent_vector_json: String = row.get(2)?;
    let intent_label_str: String = row.get(6)?;
    Ok(SecureEvent {
        session_fingerprint: SessionFingerprint(row.get(0)?),
        timestamp_bucket: row.get(1)?,
        intent_vector: serde_json::from_str(&intent_vector_json).unwrap_or_default(),
        structural_hash: StructuralHash(row.get(3)?),
        org_id: row.get(4)?,
        event_type: event_type_from_str(&row.get::<_, String>(5)?),
        intent_label: intent_class_from_str(&intent_label_str),
        intent_confidence: row.get(7)?,
        element_signature: row.get(8)?,
        sequence_number: row.get::<_, i64>(9)? as u64,
    })
}

fn intent_class_from_str(s: &str) -> IntentClass {
    IntentClass::ALL
        .iter()
        .copied()
        .find(|c| c.as_str() == s)
        .unwrap_or(IntentClass::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_testing::secure_event;

    #[test]
    fn round_trips_a_secure_event() {
        let store = Store::open_in_memory().unwrap();
        let event = secure_event("org1", IntentClass::Navigation, "fp-1", 0);
        store.insert_secure_event(&event, "device-1", Uuid::new_v4()).unwrap();

        let fetched = store.secure_events_for_org("org1", "1970-01-01T00:00:00Z").unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].intent_label, IntentClass::Navigation);
        assert_eq!(fetched[0].session_fingerprint.as_str(), "fp-1");
    }

    #[test]
    fn recent_events_are_capped_and_newest_first() {
        let store = Store::open_in_memory().unwrap();
        for i in 0..5u64 {
            let event = secure_event("org1", IntentClass::Navigation, "fp-1", i);
            store.insert_secure_event(&event, "device-1", Uuid::new_v4()).unwrap();
        }

        let recent = store.recent_secure_events_for_org("org1", 3).unwrap();
        assert_eq!(recent.len(), 3);
    }
}
