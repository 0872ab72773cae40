//! Seeded randomness for reproducible clustering.
//!
//! A minimal xorshift64 generator plus deterministic sub-seed derivation.
//! Every random draw in the pipeline flows from a single master seed mixed
//! with the identity of the unit and restart it belongs to, never from
//! wall-clock or thread-local state, so results do not depend on the
//! degree of parallelism.

/// Minimal xorshift64 PRNG for reproducible clustering without external deps.
pub(crate) struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    pub(crate) fn next_bounded(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }
}

/// splitmix64 finalizer. Decorrelates structurally close inputs.
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Derive a sub-seed from a seed and a salt (e.g. a restart index).
pub(crate) fn mix_seed(seed: u64, salt: u64) -> u64 {
    splitmix64(seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Derive the seed for one chromosome x condition unit from the master seed.
///
/// Uses FNV-1a over the identity strings, finalized with splitmix64.
pub(crate) fn unit_seed(master: u64, chromosome: &str, condition: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xCBF2_9CE4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

    let mut hash = FNV_OFFSET ^ master;
    for &byte in chromosome.as_bytes() {
        hash = (hash ^ byte as u64).wrapping_mul(FNV_PRIME);
    }
    hash = (hash ^ 0xFF).wrapping_mul(FNV_PRIME);
    for &byte in condition.as_bytes() {
        hash = (hash ^ byte as u64).wrapping_mul(FNV_PRIME);
    }
    splitmix64(hash)
}

// ── Tests ──────────────────────────────────────────────────────────────────
