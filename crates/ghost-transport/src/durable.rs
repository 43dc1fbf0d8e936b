//! Local JSON-lines persistence for the failed-batch queue, so a restart
//! doesn't lose batches the endpoint rejected outright (4.F). One line per
//! `SecureEventBatch`, newest-10 cap enforced by the caller before writing.

use std::collections::VecDeque;
use std::path::Path;

use ghost_types::SecureEventBatch;

use crate::error::Result;

pub fn load(path: &Path) -> Result<VecDeque<SecureEventBatch>> {
    if !path.exists() {
        return Ok(VecDeque::new());
    }
    let content = std::fs::read_to_string(path)?;
    let mut queue = VecDeque::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        queue.push_back(serde_json::from_str(line)?);
    }
    Ok(queue)
}

pub fn save(path: &Path, queue: &VecDeque<SecureEventBatch>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut content = String::new();
    for batch in queue {
        content.push_str(&serde_json::to_string(batch)?);
        content.push('\n');
    }
    std::fs::write(path, content)?;
    Ok(())
}

pub fn clear(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_batch() -> SecureEventBatch {
        SecureEventBatch {
            events: vec![],
            device_fingerprint: "device-1".to_string(),
            batch_id: Uuid::new_v4(),
            sent_at: Utc::now(),
        }
    }

    #[test]
    fn round_trips_a_queue_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed.jsonl");

        let mut queue = VecDeque::new();
        queue.push_back(sample_batch());
        queue.push_back(sample_batch());
        save(&path, &queue).unwrap();

        let restored = load(&path).unwrap();
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn load_of_missing_file_returns_empty_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.jsonl");
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed.jsonl");
        let mut queue = VecDeque::new();
        queue.push_back(sample_batch());
        save(&path, &queue).unwrap();
        assert!(path.exists());

        clear(&path).unwrap();
        assert!(!path.exists());
    }
}
