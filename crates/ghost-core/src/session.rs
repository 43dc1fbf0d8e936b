//! Session fingerprinting (4.D): `HMAC-SHA256(deviceId|userId|bucket, key=deviceId)`,
//! rendered as lowercase hex, where `bucket = ⌊sessionStart_ms / 900_000⌋`. The
//! server never sees the raw device/user ids, only this one-way fingerprint,
//! which rotates every 15 minutes as the bucket index advances (§8
//! fingerprint-rotation property).

use crate::noise::session_bucket_index;
use ghost_types::SessionFingerprint;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Derives the fingerprint for a given session start. Deterministic: the same
/// `(device_id, user_id, session_start_ms)` triple always yields the same
/// fingerprint, and two session starts in the same 15-minute window always
/// agree, while starts in different windows diverge.
pub fn session_fingerprint(
    device_id: &str,
    user_id: &str,
    session_start_ms: u64,
) -> SessionFingerprint {
    let bucket = session_bucket_index(session_start_ms);
    let message = format!("{}|{}|{}", device_id, user_id, bucket);
    let mut mac =
        HmacSha256::new_from_slice(device_id.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    let digest = mac.finalize().into_bytes();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    SessionFingerprint(hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_MS: u64 = 1_700_000_000_000;

    #[test]
    fn same_input_yields_same_fingerprint() {
        let a = session_fingerprint("device-1", "user-1", BASE_MS);
        let b = session_fingerprint("device-1", "user-1", BASE_MS);
        assert_eq!(a, b);
    }

    #[test]
    fn different_device_yields_different_fingerprint() {
        let a = session_fingerprint("device-1", "user-1", BASE_MS);
        let b = session_fingerprint("device-2", "user-1", BASE_MS);
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_rotates_across_a_15_minute_boundary() {
        let a = session_fingerprint("device-1", "user-1", BASE_MS);
        let b = session_fingerprint("device-1", "user-1", BASE_MS + 60_000);
        assert_eq!(a, b, "same window should agree");

        let c = session_fingerprint("device-1", "user-1", BASE_MS + 16 * 60 * 1000);
        assert_ne!(a, c, "next window should diverge");
    }

    #[test]
    fn fingerprint_is_64_hex_chars() {
        let fp = session_fingerprint("device-1", "user-1", BASE_MS);
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
