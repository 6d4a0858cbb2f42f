//! The segmented hash table: a bank of `2^L` open-addressed sub-tables
//! selected by the top bits of a mixed key hash (`spec.md` §3 "Segmented
//! table").
//!
//! Each sub-table is a [`hashbrown::HashMap`] (open addressing under the
//! hood, the same family of data structure the original implements by
//! hand) — grounded on `examples/other_examples/manifests/mwillsey-symbol_table`
//! and the several pack repos that reach for `hashbrown` directly rather
//! than hand-rolling probing. This module owns only storage and indexing;
//! the mutation gate lives in `crate::insert`.

use hashbrown::HashMap;
use std::hash::Hash;

use crate::error::{Result, SeriesError};
use crate::hash::mix;

/// Bank of open-addressed sub-tables, the storage layer beneath
/// [`crate::series::Series`].
#[derive(Clone, Debug)]
pub struct SegmentedTable<K, C> {
    segments: Vec<HashMap<K, C>>,
    log2_size: u32,
}

/// `L_max = digits(usize) - 1`, mirroring the original's
/// `max_log2_size = limits_digits<s_size_type> - 1` (`spec.md` §3).
pub const MAX_LOG2_SEGMENTS: u32 = usize::BITS - 1;

const OP_SET_SEGMENTS: &str = "set_n_segments";
const OP_INDEX: &str = "segment_index";

impl<K, C> SegmentedTable<K, C>
where
    K: Eq + Hash,
{
    /// A single empty sub-table (`L = 0`), the default shape.
    pub fn new() -> Self {
        SegmentedTable { segments: vec![HashMap::new()], log2_size: 0 }
    }

    /// Rebuild as `2^l` empty sub-tables. Per `spec.md` §4.1, callers must
    /// only invoke this on an empty table.
    pub fn set_n_segments(&mut self, l: u32) -> Result<()> {
        if l > MAX_LOG2_SEGMENTS {
            return Err(SeriesError::out_of_range(OP_SET_SEGMENTS, MAX_LOG2_SEGMENTS, l));
        }
        let n = 1usize << l;
        self.segments = (0..n).map(|_| HashMap::new()).collect();
        self.log2_size = l;
        Ok(())
    }

    /// Current log2 segment count.
    pub fn log2_size(&self) -> u32 {
        self.log2_size
    }

    /// Number of sub-tables (`2^L`).
    pub fn n_segments(&self) -> usize {
        self.segments.len()
    }

    /// Per-sub-table size limit: `size_type::MAX / 2^L`, guaranteeing the
    /// total fits in `usize` (`spec.md` §3 "Segmented table").
    pub fn segment_size_limit(&self) -> usize {
        usize::MAX / self.segments.len()
    }

    /// Sub-table index for `k`'s (already key-hashed) mixed hash.
    pub fn segment_index_for_hash(&self, mixed_hash: u64) -> usize {
        if self.log2_size == 0 {
            0
        } else {
            (mixed_hash & ((1u64 << self.log2_size) - 1)) as usize
        }
    }

    /// Sub-table index for `k` directly.
    pub fn segment_index(&self, k: &K) -> usize
    where
        K: Hash,
    {
        self.segment_index_for_hash(mix(k))
    }

    /// Immutable access to one sub-table.
    pub fn segment(&self, i: usize) -> &HashMap<K, C> {
        &self.segments[i]
    }

    /// Mutable access to one sub-table.
    pub fn segment_mut(&mut self, i: usize) -> &mut HashMap<K, C> {
        &mut self.segments[i]
    }

    /// Total number of stored terms, across every sub-table.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.len()).sum()
    }

    /// `true` iff no terms are stored.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.is_empty())
    }

    /// Drop all terms, keeping the segment count. Live clearing stays
    /// sequential — `spec.md` §5 "Parallel clear" calls out *destruction*
    /// of a multi-segment series specifically (see the `Drop` impl below),
    /// not this in-place reuse path.
    pub fn clear(&mut self) {
        for s in &mut self.segments {
            s.clear();
        }
    }

    /// Hint each sub-table to accommodate `ceil(n / 2^L)` more terms
    /// (`spec.md` §4.1 `reserve`).
    pub fn reserve(&mut self, n: usize) {
        let per = n.div_ceil(self.segments.len().max(1));
        for s in &mut self.segments {
            s.reserve(per);
        }
    }

    /// Look up the term with key `k`.
    pub fn find(&self, k: &K) -> Option<&C>
    where
        K: Hash,
    {
        let i = self.segment_index(k);
        self.segments[i].get(k)
    }

    /// Iterate over every stored `(key, coefficient)` pair, in unspecified
    /// but lifetime-stable order (`spec.md` §4.1 "iter begin/end").
    pub fn iter(&self) -> impl Iterator<Item = (&K, &C)> {
        self.segments.iter().flat_map(|s| s.iter())
    }

    /// Mutable variant of [`Self::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut C)> {
        self.segments.iter_mut().flat_map(|s| s.iter_mut())
    }

    /// Consume the table, yielding owned `(key, coefficient)` pairs.
    pub fn into_iter_owned(self) -> impl Iterator<Item = (K, C)> {
        self.segments.into_iter().flat_map(|s| s.into_iter())
    }

    /// Debug-only invariant sweep: every term resides in the sub-table its
    /// mixed hash selects (`spec.md` §8 "Invariants").
    #[cfg(debug_assertions)]
    pub fn debug_check_routing(&self)
    where
        K: Hash,
    {
        for (i, seg) in self.segments.iter().enumerate() {
            for k in seg.keys() {
                debug_assert_eq!(
                    self.segment_index(k),
                    i,
                    "{OP_INDEX}: term routed to the wrong sub-table"
                );
            }
        }
    }
}

impl<K, C> Default for SegmentedTable<K, C>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "parallel")]
impl<K, C> Drop for SegmentedTable<K, C>
where
    K: Send + Sync,
    C: Send + Sync,
{
    /// Deallocate the sub-tables in parallel when there is more than one
    /// (`spec.md` §5 "Parallel clear"). Every `Key`/`Coefficient` impl this
    /// crate ships already requires `Send + Sync`, so this bound costs call
    /// sites nothing in practice.
    fn drop(&mut self) {
        if self.segments.len() > 1 {
            rayon::scope(|scope| {
                for seg in &mut self.segments {
                    scope.spawn(move |_| {
                        seg.clear();
                    });
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_n_segments_rejects_over_limit() {
        let mut t: SegmentedTable<i64, i64> = SegmentedTable::new();
        assert!(t.set_n_segments(MAX_LOG2_SEGMENTS + 1).is_err());
        assert!(t.set_n_segments(4).is_ok());
        assert_eq!(t.n_segments(), 16);
    }

    #[test]
    fn reserve_and_clear() {
        let mut t: SegmentedTable<i64, i64> = SegmentedTable::new();
        t.set_n_segments(2).unwrap();
        t.reserve(100);
        t.segment_mut(0).insert(1, 10);
        assert_eq!(t.len(), 1);
        t.clear();
        assert!(t.is_empty());
    }
}
