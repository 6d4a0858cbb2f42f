//! A deterministic, non-random hash mixer.
//!
//! `spec.md` §3 "Hashing policy" requires key hashes to be mixed by a seeded
//! integer mixer with a fixed compile-time seed (not process-random), so
//! that the resulting hash is stable across runs and usable as a key into
//! the process-wide power cache (§4.6). This rules out Rust's default
//! `RandomState` hasher, which re-seeds per process.
//!
//! Grounded on `examples/prospectorengine-prospector-btc`'s
//! `ShardedFilter::compute_deterministic_routing_index`, which routes to a
//! shard with `SipHasher13::new_with_keys(0, 0)` for the same reason:
//! reproducible, non-random distribution. We use the same fixed-key SipHash
//! construction via the `siphasher` crate.

use std::hash::{Hash, Hasher};
use siphasher::sip::SipHasher13;

/// The fixed keys used by every mixer in this crate. Changing these values
/// changes every sub-table routing decision and invalidates any persisted
/// series (see `spec.md` §6), so they must never be derived from runtime
/// state.
const FIXED_KEY_0: u64 = 0x9E37_79B9_7F4A_7C15;
const FIXED_KEY_1: u64 = 0xBF58_476D_1CE4_E5B9;

/// Compute the mixed hash of `value` using the crate-wide fixed-seed
/// mixer. This is the hash used for sub-table selection and intra-table
/// probing; it is *not* collision-resistant and must not be exposed on any
/// network-facing surface (see `spec.md` §9 "Hash salting").
pub fn mix<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(FIXED_KEY_0, FIXED_KEY_1);
    value.hash(&mut hasher);
    hasher.finish()
}

/// Combine an already-computed hash with a fresh value, order-independent
/// (addition, not XOR/rotate) so it matches `spec.md` §4.6's requirement
/// that the power cache's per-series hash mix the tag hash with the *sum*
/// of term-key hashes (summation is order-independent, matching an
/// unordered term set).
pub fn combine_unordered(acc: u64, value: u64) -> u64 {
    acc.wrapping_add(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_is_deterministic_across_calls() {
        assert_eq!(mix(&42u64), mix(&42u64));
        assert_ne!(mix(&42u64), mix(&43u64));
    }

    #[test]
    fn combine_unordered_is_commutative() {
        let a = mix(&1u64);
        let b = mix(&2u64);
        assert_eq!(combine_unordered(a, b), combine_unordered(b, a));
    }
}
