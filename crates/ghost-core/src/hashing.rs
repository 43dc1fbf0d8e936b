//! Dependency-free hashing primitives shared by the fingerprinter and DPU (4.A, 4.D).

const FNV_OFFSET_32: u32 = 0x811c_9dc5;
const FNV_PRIME_32: u32 = 0x0100_0193;

/// Standard 32-bit FNV-1a.
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_32;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(FNV_PRIME_32);
    }
    hash
}

/// 8 lowercase hex chars — the wire format for structural hashes (4.D).
pub fn fnv1a32_hex(bytes: &[u8]) -> String {
    format!("{:08x}", fnv1a32(bytes))
}

/// FNV-1a with a caller-supplied offset basis, used to derive independent hash
/// channels from the same input (needed to build a 128-bit simhash out of a
/// 32-bit primitive, per 4.A's "signed FNV-1a of each shingle").
fn fnv1a32_seeded(bytes: &[u8], offset_basis: u32) -> u32 {
    let mut hash = offset_basis;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(FNV_PRIME_32);
    }
    hash
}

/// 128-bit simhash over the character 3-shingles of `text` (4.A textHash).
/// `text` must already be lowercased and trimmed by the caller. Deterministic:
/// identical input always yields identical output.
pub fn simhash128_hex(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut votes = [0i64; 128];

    let shingles: Vec<String> = if chars.len() < 3 {
        vec![text.to_string()]
    } else {
        chars.windows(3).map(|w| w.iter().collect()).collect()
    };

    // Four independent 32-bit FNV-1a channels give 128 bits of hash material per shingle.
    const SEEDS: [u32; 4] = [0x811c_9dc5, 0x9e37_79b9, 0x85eb_ca6b, 0xc2b2_ae35];

    for shingle in &shingles {
        let bytes = shingle.as_bytes();
        let mut bits = [0u32; 4];
        for (i, seed) in SEEDS.iter().enumerate() {
            bits[i] = fnv1a32_seeded(bytes, *seed);
        }
        for bit_index in 0..128 {
            let word = bit_index / 32;
            let offset = bit_index % 32;
            let set = (bits[word] >> offset) & 1 == 1;
            votes[bit_index] += if set { 1 } else { -1 };
        }
    }

    let mut out = [0u8; 16];
    for bit_index in 0..128 {
        if votes[bit_index] > 0 {
            out[bit_index / 8] |= 1 << (bit_index % 8);
        }
    }
    out.iter().map(|b| format!("{:02x}", b)).collect()
}

/// `"tag[role]@last3PathSegments"` element signature (4.D).
pub fn element_signature(tag_name: &str, role: Option<&str>, dom_path: &[String]) -> String {
    let base = match role {
        Some(r) if !r.is_empty() => format!("{}[{}]", tag_name.to_lowercase(), r),
        _ => tag_name.to_lowercase(),
    };
    let start = dom_path.len().saturating_sub(3);
    let last3 = dom_path[start..].join(">");
    format!("{}@{}", base, last3)
}

/// 8-hex FNV-1a structural hash over `domPath.join('>') + ':' + tagName` (4.D).
pub fn structural_hash(dom_path: &[String], tag_name: &str) -> String {
    let joined = format!("{}:{}", dom_path.join(">"), tag_name);
    fnv1a32_hex(joined.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a32_is_deterministic() {
        assert_eq!(fnv1a32(b"hello"), fnv1a32(b"hello"));
        assert_ne!(fnv1a32(b"hello"), fnv1a32(b"world"));
    }

    #[test]
    fn structural_hash_is_8_hex_chars() {
        let path = vec!["body".to_string(), "div".to_string(), "button".to_string()];
        let h = structural_hash(&path, "button");
        assert_eq!(h.len(), 8);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, structural_hash(&path, "button"));
    }

    #[test]
    fn simhash128_is_deterministic_and_fixed_length() {
        let a = simhash128_hex("click the submit button");
        let b = simhash128_hex("click the submit button");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn element_signature_uses_last_three_path_segments() {
        let path = vec![
            "body".to_string(),
            "form".to_string(),
            "div[role=group]".to_string(),
            "button".to_string(),
        ];
        let sig = element_signature("button", None, &path);
        assert_eq!(sig, "button@form>div[role=group]>button");
    }
}
