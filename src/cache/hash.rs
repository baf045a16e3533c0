//! Bucket hashing for cache keys.
//!
//! Keys are mapped to buckets with the 32-bit FNV-1 hash. The hash is only a
//! locality hint: two keys may share a bucket, and the engine tells them apart
//! by the key stored at the head of the slot file.

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Number of hex digits in a slot file name.
pub const BUCKET_ID_LEN: usize = 8;

/// 32-bit FNV-1 hash (multiply, then xor) over the raw key bytes.
pub fn hash_key(key: &[u8]) -> u32 {
    key.iter().fold(FNV_OFFSET, |h, &b| {
        h.wrapping_mul(FNV_PRIME) ^ u32::from(b)
    })
}

/// Reduce `key`'s hash into `0..capacity`.
///
/// `capacity` must be non-zero; the engine rejects non-positive capacities
/// before resolving a slot.
pub fn bucket_index(key: &[u8], capacity: u32) -> u32 {
    hash_key(key) % capacity.max(1)
}

/// Render a bucket index as the 8-character slot file name.
///
/// Digits are emitted least-significant nibble first, so bucket `0x1a`
/// renders as `a1000000`. Existing cache directories depend on this order.
pub fn bucket_id(index: u32) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    let mut value = index;
    let mut out = String::with_capacity(BUCKET_ID_LEN);
    for _ in 0..BUCKET_ID_LEN {
        out.push(char::from(DIGITS[(value & 0xf) as usize]));
        value >>= 4;
    }
    out
}

/// Returns true if `name` has the shape of a slot file name.
pub fn is_bucket_name(name: &str) -> bool {
    name.len() == BUCKET_ID_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_hashes_to_offset_basis() {
        assert_eq!(hash_key(b""), 0x811c_9dc5);
    }

    #[test]
    fn matches_published_fnv1_vectors() {
        assert_eq!(hash_key(b"a"), 0x050c_5d7e);
        assert_eq!(hash_key(b"b"), 0x050c_5d7d);
        assert_eq!(hash_key(b"foobar"), 0x31f0_b262);
    }

    #[test]
    fn bucket_index_stays_below_capacity() {
        for key in [&b""[..], b"a", b"/repo.git/log/?h=main", b"\xff\xfe"] {
            assert!(bucket_index(key, 7) < 7);
        }
    }

    #[test]
    fn capacity_one_maps_everything_to_bucket_zero() {
        assert_eq!(bucket_index(b"first", 1), 0);
        assert_eq!(bucket_index(b"second", 1), 0);
    }

    #[test]
    fn bucket_id_is_low_nibble_first() {
        assert_eq!(bucket_id(0), "00000000");
        assert_eq!(bucket_id(0x1a), "a1000000");
        assert_eq!(bucket_id(0x1234_5678), "87654321");
        assert_eq!(bucket_id(u32::MAX), "ffffffff");
    }

    #[test]
    fn bucket_names_are_eight_chars() {
        assert!(is_bucket_name("a1000000"));
        assert!(!is_bucket_name("a1000000.lock"));
        assert!(!is_bucket_name("a100"));
    }
}
