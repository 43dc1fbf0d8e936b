use chrono::Utc;
use ghost_types::{DetectedPattern, IntentClass, PatternStatus, StructuralHash};
use rusqlite::params;
use uuid::Uuid;

use crate::error::Result;
use crate::Store;

fn status_str(s: PatternStatus) -> &'static str {
    match s {
        PatternStatus::NeedsReview => "needs_review",
        PatternStatus::AutoSuggested => "auto_suggested",
        PatternStatus::Approved => "approved",
        PatternStatus::Dismissed => "dismissed",
    }
}

fn status_from_str(s: &str) -> PatternStatus {
    match s {
        "auto_suggested" => PatternStatus::AutoSuggested,
        "approved" => PatternStatus::Approved,
        "dismissed" => PatternStatus::Dismissed,
        _ => PatternStatus::NeedsReview,
    }
}

impl Store {
    /// Inserts a newly detected pattern (4.H upsert happens at the caller,
    /// which decides whether an equivalent pattern already exists).
    pub fn insert_pattern(&self, pattern: &DetectedPattern) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO detected_patterns (
                id, org_id, intent_sequence, structural_hashes, occurrences, confidence,
                suggested_name, suggested_description, first_seen, last_seen, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                pattern.id.to_string(),
                pattern.org_id,
                serde_json::to_string(&pattern.intent_sequence.iter().map(|c| c.as_str()).collect::<Vec<_>>())?,
                serde_json::to_string(&pattern.structural_hashes.iter().map(|h| h.as_str()).collect::<Vec<_>>())?,
                pattern.occurrences,
                pattern.confidence,
                pattern.suggested_name,
                pattern.suggested_description,
                pattern.first_seen.to_rfc3339(),
                pattern.last_seen.to_rfc3339(),
                status_str(pattern.status),
                pattern.created_at.to_rfc3339(),
                pattern.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Patterns matching the given structural-hash set, used by 4.H to decide
    /// whether a freshly clustered group should upsert an existing row.
    pub fn patterns_for_org(&self, org_id: &str) -> Result<Vec<DetectedPattern>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT id, org_id, intent_sequence, structural_hashes, occurrences, confidence,
                   suggested_name, suggested_description, first_seen, last_seen, status,
                   created_at, updated_at
            FROM detected_patterns
            WHERE org_id = ?1
            ORDER BY updated_at DESC
            "#,
        )?;
        let rows = stmt.query_map(params![org_id], |row| {
            let sequence_json: String = row.get(2)?;
            let hashes_json: String = row.get(3)?;
            let status_text: String = row.get(10)?;
            let sequence: Vec<String> = serde_json::from_str(&sequence_json).unwrap_or_default();
            let hashes: Vec<String> = serde_json::from_str(&hashes_json).unwrap_or_default();
            Ok(DetectedPattern {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_else(|_| Uuid::nil()),
                org_id: row.get(1)?,
                intent_sequence: sequence.iter().map(|s| intent_class_from_str(s)).collect(),
                structural_hashes: hashes.into_iter().map(StructuralHash).collect(),
                occurrences: row.get(4)?,
                confidence: row.get(5)?,
                suggested_name: row.get(6)?,
                suggested_description: row.get(7)?,
                first_seen: row.get::<_, String>(8)?.parse().unwrap_or_else(|_| Utc::now()),
                last_seen: row.get::<_, String>(9)?.parse().unwrap_or_else(|_| Utc::now()),
                status: status_from_str(&status_text),
                created_at: row.get::<_, String>(11)?.parse().unwrap_or_else(|_| Utc::now()),
                updated_at: row.get::<_, String>(12)?.parse().unwrap_or_else(|_| Utc::now()),
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Updates occurrences/confidence/status/last_seen on an existing pattern
    /// (4.H's upsert path when a cluster matches a prior pattern's hashes).
    pub fn update_pattern(&self, pattern: &DetectedPattern) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            UPDATE detected_patterns
            SET occurrences = ?2, confidence = ?3, status = ?4, last_seen = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                pattern.id.to_string(),
                pattern.occurrences,
                pattern.confidence,
                status_str(pattern.status),
                pattern.last_seen.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

fn intent_class_from_str(s: &str) -> IntentClass {
    IntentClass::ALL.iter().copied().find(|c| c.as_str() == s).unwrap_or(IntentClass::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_testing::detected_pattern;

    #[test]
    fn inserts_and_lists_patterns_scoped_to_org() {
        let store = Store::open_in_memory().unwrap();
        let pattern = detected_pattern("org1", vec![IntentClass::Navigation, IntentClass::DataEntry]);
        store.insert_pattern(&pattern).unwrap();

        let fetched = store.patterns_for_org("org1").unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].intent_sequence, vec![IntentClass::Navigation, IntentClass::DataEntry]);

        let other_org = store.patterns_for_org("org2").unwrap();
        assert!(other_org.is_empty());
    }
}
