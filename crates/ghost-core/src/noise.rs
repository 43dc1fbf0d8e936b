//! Differential-privacy noise primitives used by the DPU (4.D).
//!
//! These take an explicit `unit: f64` in `[0, 1)` rather than reading from a
//! thread-local RNG directly, so callers (and tests) can drive them with
//! `rand`'s uniform sampler or a fixed value without needing a seedable RNG
//! trait object threaded through the whole pipeline.

use rand::Rng;

/// Samples a Laplace(0, scale) value from a uniform draw in `(-0.5, 0.5)`.
/// Used to jitter event timestamps before they leave the device.
pub fn sample_laplace(scale: f64) -> f64 {
    let u: f64 = rand::thread_rng().gen_range(-0.5..0.5);
    -scale * u.signum() * (1.0 - 2.0 * u.abs()).ln()
}

/// Samples a zero-mean Gaussian via the Box-Muller transform. Used to perturb
/// intent-vector dimensions.
pub fn sample_gaussian(std_dev: f64) -> f64 {
    let mut rng = rand::thread_rng();
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Randomized response for a boolean flag: with probability `p` returns the
/// true value, otherwise returns a coin flip. Used where a boolean derived
/// signal would otherwise leak deterministically.
pub fn randomized_response(true_value: bool, p: f64) -> bool {
    let mut rng = rand::thread_rng();
    if rng.gen_bool(p.clamp(0.0, 1.0)) {
        true_value
    } else {
        rng.gen_bool(0.5)
    }
}

/// `⌊timestamp_ms / 900_000⌋` — the 15-minute bucket index that rotates the
/// session fingerprint's HMAC input (4.D).
pub fn session_bucket_index(timestamp_ms: u64) -> u64 {
    timestamp_ms / 900_000
}

/// Floors a millisecond Unix timestamp to the nearest `bucket_ms` boundary.
pub fn floor_to_bucket_ms(timestamp_ms: i64, bucket_ms: i64) -> i64 {
    timestamp_ms.div_euclid(bucket_ms) * bucket_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_bucket_is_stable_within_a_window_and_rotates_across_one() {
        let base = 1_700_000_000_000u64;
        let b1 = session_bucket_index(base);
        let b2 = session_bucket_index(base + 60_000);
        assert_eq!(b1, b2);

        let b3 = session_bucket_index(base + 16 * 60 * 1000);
        assert_ne!(b1, b3);
    }

    #[test]
    fn floor_to_bucket_ms_floors_towards_negative_infinity() {
        assert_eq!(floor_to_bucket_ms(650_000, 300_000), 600_000);
        assert_eq!(floor_to_bucket_ms(0, 300_000), 0);
    }

    #[test]
    fn randomized_response_always_returns_a_bool() {
        for _ in 0..20 {
            let _ = randomized_response(true, 0.9);
        }
    }
}
