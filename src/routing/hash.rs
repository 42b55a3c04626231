//! Key hashing.

use std::hash::Hasher;
use twox_hash::XxHash64;

/// Maps a key to a 32-bit hash.
///
/// Implementations must be deterministic and pure: the same key always hashes
/// to the same value for the lifetime of a pool.
pub trait KeyHasher: Send + Sync + std::fmt::Debug {
    /// Hash a key.
    fn hash(&self, key: &[u8]) -> u32;
}

/// xxHash64 folded to 32 bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XxHasher {
    seed: u64,
}

impl XxHasher {
    /// Create a hasher with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl KeyHasher for XxHasher {
    fn hash(&self, key: &[u8]) -> u32 {
        let mut hasher = XxHash64::with_seed(self.seed);
        hasher.write(key);
        let hash = hasher.finish();
        (hash ^ (hash >> 32)) as u32
    }
}
