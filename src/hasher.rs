//! Key hashing
//!
//! 64-bit FNV-1a over the key bytes. Deterministic and stateless, with no
//! resistance to adversarial collisions. Collisions are absorbed by the
//! per-bucket trees.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash a key to an unsigned integer
pub fn index(key: &str) -> u64 {
    key.as_bytes().iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Bucket slot for `key` in a table of `capacity` buckets
#[inline]
pub fn bucket_index(key: &str, capacity: usize) -> usize {
    (index(key) % capacity as u64) as usize
}
