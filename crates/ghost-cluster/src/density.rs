//! Step 2 of 4.H: a simplified, single-pass greedy density clustering over
//! `EventSequence` embeddings ("simplified HDBSCAN").

use chrono::Duration;

use crate::windowing::EventSequence;

const SIMILARITY_THRESHOLD: f64 = 0.75;
const TIME_WINDOW_MINUTES: i64 = 30;
const MIN_CLUSTER_SIZE: usize = 3;

/// Cosine similarity; zero-length vectors compare as 0 rather than dividing
/// by zero.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Indices into the original `sequences` slice grouped into one cluster.
pub type Cluster = Vec<usize>;

/// Greedy single-pass clustering: for each unassigned sequence, open a
/// cluster seeded at it, then add every later unassigned sequence within the
/// cosine and time thresholds. Clusters with fewer than `MIN_CLUSTER_SIZE`
/// members are discarded.
pub fn greedy_cluster(sequences: &[EventSequence]) -> Vec<Cluster> {
    let mut assigned = vec![false; sequences.len()];
    let mut clusters = Vec::new();

    for i in 0..sequences.len() {
        if assigned[i] {
            continue;
        }
        let mut members = vec![i];
        assigned[i] = true;

        for j in (i + 1)..sequences.len() {
            if assigned[j] {
                continue;
            }
            let similarity = cosine_similarity(&sequences[i].embedding, &sequences[j].embedding);
            let elapsed = (sequences[i].timestamp - sequences[j].timestamp).abs();
            if similarity >= SIMILARITY_THRESHOLD && elapsed <= Duration::minutes(TIME_WINDOW_MINUTES) {
                members.push(j);
                assigned[j] = true;
            }
        }

        if members.len() >= MIN_CLUSTER_SIZE {
            clusters.push(members);
        }
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_zero_length_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn clusters_smaller_than_min_size_are_discarded() {
        let now = chrono::Utc::now();
        let sequences = vec![
            sample_sequence(vec![1.0, 0.0], now),
            sample_sequence(vec![1.0, 0.0], now),
        ];
        assert!(greedy_cluster(&sequences).is_empty());
    }

    #[test]
    fn similar_nearby_sequences_form_one_cluster() {
        let now = chrono::Utc::now();
        let sequences = vec![
            sample_sequence(vec![1.0, 0.0], now),
            sample_sequence(vec![1.0, 0.0], now),
            sample_sequence(vec![1.0, 0.0], now),
        ];
        let clusters = greedy_cluster(&sequences);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 3);
    }

    #[test]
    fn sequences_outside_the_time_window_do_not_merge() {
        let now = chrono::Utc::now();
        let far = now + Duration::hours(2);
        let sequences = vec![
            sample_sequence(vec![1.0, 0.0], now),
            sample_sequence(vec![1.0, 0.0], now),
            sample_sequence(vec![1.0, 0.0], now),
            sample_sequence(vec![1.0, 0.0], far),
            sample_sequence(vec![1.0, 0.0], far),
            sample_sequence(vec![1.0, 0.0], far),
        ];
        let clusters = greedy_cluster(&sequences);
        assert_eq!(clusters.len(), 2);
    }

    fn sample_sequence(embedding: Vec<f64>, timestamp: chrono::DateTime<chrono::Utc>) -> EventSequence {
        EventSequence {
            session_fingerprint: "fp".to_string(),
            embedding,
            timestamp,
            events: vec![],
        }
    }
}
