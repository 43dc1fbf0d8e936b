//! Differential Privacy Unit (4.D): timestamp anonymization, vector
//! perturbation, and randomized response, each policy-configured via
//! [`DpConfig`] rather than hard-coded constants (SPEC_FULL §4 ambient note).

use chrono::{DateTime, Utc};
use ghost_core::{floor_to_bucket_ms, sample_gaussian, sample_laplace};

/// Tunable privacy/utility trade-off knobs, threaded through the pipeline
/// constructor instead of hard-coded constants.
#[derive(Debug, Clone, Copy)]
pub struct DpConfig {
    /// Laplace noise scale, in seconds, applied before bucketing a timestamp.
    pub timestamp_noise_scale_secs: f64,
    /// Width of the timestamp bucket, in milliseconds.
    pub timestamp_bucket_ms: i64,
    /// Privacy budget for vector perturbation; noise std-dev is `sqrt(2)/epsilon`.
    pub epsilon: f64,
    /// Probability a randomized-response flag passes through unflipped.
    pub randomized_response_p: f64,
}

impl Default for DpConfig {
    fn default() -> Self {
        Self {
            timestamp_noise_scale_secs: 30.0,
            timestamp_bucket_ms: 5 * 60 * 1000,
            epsilon: 1.0,
            randomized_response_p: 0.90,
        }
    }
}

/// Adds Laplacian noise then buckets to the nearest boundary, returning an
/// ISO-8601 string at the configured granularity (4.D).
pub fn anonymize_timestamp(timestamp_ms: u64, config: &DpConfig) -> String {
    let noise_ms = (sample_laplace(config.timestamp_noise_scale_secs) * 1000.0) as i64;
    let noisy = timestamp_ms as i64 + noise_ms;
    let bucketed = floor_to_bucket_ms(noisy, config.timestamp_bucket_ms);
    let dt = DateTime::<Utc>::from_timestamp_millis(bucketed.max(0)).unwrap_or_else(Utc::now);
    dt.to_rfc3339()
}

/// Adds i.i.d. Gaussian noise (σ = √2/ε) to each dimension, quantized to 4
/// decimals (4.D).
pub fn perturb_vector(vector: &[f64], config: &DpConfig) -> Vec<f64> {
    let std_dev = (2.0_f64).sqrt() / config.epsilon;
    vector
        .iter()
        .map(|v| {
            let noisy = v + sample_gaussian(std_dev);
            (noisy * 10_000.0).round() / 10_000.0
        })
        .collect()
}

/// With probability `config.randomized_response_p`, passes `value` through;
/// otherwise an independent coin flip. Drawn independently per flag (4.D).
pub fn randomized_response(value: bool, config: &DpConfig) -> bool {
    ghost_core::randomized_response(value, config.randomized_response_p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymized_timestamp_lands_on_the_bucket_grid() {
        let config = DpConfig::default();
        let out = anonymize_timestamp(1_700_000_000_000, &config);
        let parsed = DateTime::parse_from_rfc3339(&out).expect("valid RFC3339");
        assert_eq!(parsed.timestamp_millis() % config.timestamp_bucket_ms, 0);
    }

    #[test]
    fn perturb_vector_preserves_length_and_quantizes() {
        let config = DpConfig::default();
        let input = vec![0.1, -0.2, 0.3];
        let out = perturb_vector(&input, &config);
        assert_eq!(out.len(), 3);
        for v in out {
            let scaled = v * 10_000.0;
            assert!((scaled - scaled.round()).abs() < 1e-6);
        }
    }
}
