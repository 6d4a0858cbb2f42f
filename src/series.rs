//! The series container (`spec.md` §4.1): a tuple of `(symbol set,
//! segmented table, log2 segment count, tag)`.

use crate::coefficient::Coefficient;
use crate::error::{Result, SeriesError};
use crate::insert::{add_term, InsertFlags};
use crate::key::Key;
use crate::rank::Ranked;
use crate::symbol::SymbolSet;
use crate::table::SegmentedTable;

/// Marker bound for the user-supplied tag carried alongside a series
/// (`spec.md` §2 item 4: "a user-supplied 'tag' object, plain value that
/// can carry subtype-specific state, e.g. truncation limits").
pub trait Tag: Clone + Default + std::fmt::Debug + Send + Sync + 'static {}
impl<T: Clone + Default + std::fmt::Debug + Send + Sync + 'static> Tag for T {}

/// A sparse multivariate series: symbol set, segmented term table, and a
/// user tag.
#[derive(Clone, Debug)]
pub struct Series<K, C, T = ()> {
    symbols: SymbolSet,
    table: SegmentedTable<K, C>,
    tag: T,
}

const OP_NEW: &str = "Series::new";

impl<K, C, T> Series<K, C, T>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    /// Create an empty series over `symbols`, `L = 0`, default tag.
    pub fn new(symbols: SymbolSet) -> Self {
        Series { symbols, table: SegmentedTable::new(), tag: T::default() }
    }

    /// Create an empty series with an explicit tag.
    pub fn with_tag(symbols: SymbolSet, tag: T) -> Self {
        Series { symbols, table: SegmentedTable::new(), tag }
    }

    /// Number of stored terms.
    pub fn size(&self) -> usize {
        self.table.len()
    }

    /// `true` iff no terms are stored.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The ambient symbol set.
    pub fn symbol_set(&self) -> &SymbolSet {
        &self.symbols
    }

    /// Current log2 segment count.
    pub fn n_segments_log2(&self) -> u32 {
        self.table.log2_size()
    }

    /// Read-only access to the tag.
    pub fn tag(&self) -> &T {
        &self.tag
    }

    /// Mutable access to the tag.
    pub fn tag_mut(&mut self) -> &mut T {
        &mut self.tag
    }

    /// Set the symbol set. Permitted only on an empty series
    /// (`spec.md` §4.1).
    pub fn set_symbol_set(&mut self, symbols: SymbolSet) -> Result<()> {
        if !self.is_empty() {
            return Err(SeriesError::invalid(
                OP_NEW,
                "set_symbol_set is only permitted on an empty series",
            ));
        }
        self.symbols = symbols;
        Ok(())
    }

    /// Set the segment count. Permitted only on an empty series
    /// (`spec.md` §4.1); `l` must be `<= MAX_LOG2_SEGMENTS`.
    pub fn set_n_segments(&mut self, l: u32) -> Result<()> {
        if !self.is_empty() {
            return Err(SeriesError::invalid(
                "Series::set_n_segments",
                "set_n_segments is only permitted on an empty series",
            ));
        }
        self.table.set_n_segments(l)
    }

    /// Hint each sub-table to accommodate its share of `n` more terms.
    pub fn reserve(&mut self, n: usize) {
        self.table.reserve(n);
    }

    /// Erase all terms; keep symbol set, segmentation, and tag.
    pub fn clear_terms(&mut self) {
        self.table.clear();
    }

    /// Erase all terms, reset the symbol set to empty, reset the tag to
    /// default; keep segmentation.
    pub fn clear(&mut self) {
        self.table.clear();
        self.symbols = SymbolSet::empty();
        self.tag = T::default();
    }

    /// Look up the coefficient stored at `k`.
    pub fn find(&self, k: &K) -> Option<&C> {
        self.table.find(k)
    }

    /// Iterate over `(key, coefficient)` term references.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &C)> {
        self.table.iter()
    }

    /// Iterate over `(key, &mut coefficient)`.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut C)> {
        self.table.iter_mut()
    }

    /// `true` iff this series is empty, or has exactly one term whose key
    /// is the unit monomial (`spec.md` §4.1 `is_single_cf`).
    pub fn is_single_cf(&self) -> bool {
        self.size() == 0
            || (self.size() == 1 && self.table.iter().next().map(|(k, _)| k.is_one(&self.symbols)).unwrap_or(false))
    }

    /// Insert a term through the single mutation gate (`spec.md` §4.2).
    pub fn add_term(&mut self, k: K, value: C, flags: InsertFlags) -> Result<()> {
        add_term(&mut self.table, &self.symbols, k, value, flags)
    }

    /// Same as [`Self::add_term`]; named separately in `crate::ops` call
    /// sites to make clear the series is not necessarily empty there (only
    /// [`Self::set_symbol_set`] and [`Self::set_n_segments`] restrict
    /// themselves to empty series).
    pub(crate) fn add_term_raw(&mut self, k: K, value: C, flags: InsertFlags) -> Result<()> {
        self.add_term(k, value, flags)
    }

    /// Overwrite the symbol set without the emptiness check, used by
    /// `crate::ops::extend_symbols` when extension introduces no new
    /// symbols (the stored keys stay compatible, only the ambient set
    /// grows to its superset form).
    pub(crate) fn set_symbol_set_unchecked(&mut self, symbols: SymbolSet) {
        self.symbols = symbols;
    }

    /// Direct access to the underlying table (used by `crate::mul` and
    /// `crate::extend`, which need to build/merge tables without going
    /// through per-term `Series` method calls).
    pub fn table(&self) -> &SegmentedTable<K, C> {
        &self.table
    }

    /// Mutable access to the underlying table.
    pub fn table_mut(&mut self) -> &mut SegmentedTable<K, C> {
        &mut self.table
    }

    /// Construct a `Series` directly from its parts (used internally by
    /// `crate::extend` and `crate::mul` once a result table has been
    /// built).
    pub(crate) fn from_parts(symbols: SymbolSet, table: SegmentedTable<K, C>, tag: T) -> Self {
        Series { symbols, table, tag }
    }

    /// Approximate byte footprint: per-term key/coefficient sizes plus a
    /// fixed per-entry table overhead (`spec.md` §2 item 3, "byte-size
    /// reporting (optional)"). A diagnostic, not precise allocator
    /// accounting.
    pub fn byte_size(&self) -> usize
    where
        K: ApproxByteSize,
        C: Coefficient,
    {
        const PER_ENTRY_OVERHEAD: usize = 2 * std::mem::size_of::<usize>();
        self.iter()
            .map(|(k, c)| k.approx_byte_size() + c.byte_size() + PER_ENTRY_OVERHEAD)
            .sum()
    }

    /// A content fingerprint that depends only on the set of stored terms,
    /// not on table iteration order: each term contributes an
    /// order-independent hash via `crate::hash`, and the accumulator is
    /// run through `blake3` for avalanche before being hex-encoded.
    /// Homomorphic in the sense the supplemented test in `tests/` checks:
    /// building the same series by inserting its terms in a different
    /// order, or via an equivalent sequence of `+`/`-`, yields an identical
    /// digest. A diagnostic identity check, not a cryptographic commitment
    /// (coefficients that decline `hash_contribution` fall back to a fixed
    /// contribution and so don't affect the digest).
    pub fn content_hash_hex(&self) -> String {
        let mut acc: u64 = 0;
        for (k, c) in self.iter() {
            let kh = crate::hash::mix(k);
            let ch = c.hash_contribution().unwrap_or(0);
            acc = crate::hash::combine_unordered(acc, crate::hash::combine_unordered(kh, ch));
        }
        let digest = blake3::hash(&acc.to_le_bytes());
        hex::encode(digest.as_bytes())
    }

    #[cfg(debug_assertions)]
    pub(crate) fn debug_check_invariants(&self) {
        self.table.debug_check_routing();
        for (k, c) in self.table.iter() {
            debug_assert!(!k.is_zero(&self.symbols));
            debug_assert!(!c.is_zero());
            debug_assert!(k.is_compatible(&self.symbols));
        }
        debug_assert!(self.table.log2_size() <= crate::table::MAX_LOG2_SEGMENTS);
    }
}

impl<K, C, T> Default for Series<K, C, T>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    fn default() -> Self {
        Series::new(SymbolSet::empty())
    }
}

impl<K, C, T> PartialEq for Series<K, C, T>
where
    K: Key,
    C: Coefficient,
    T: Tag + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        crate::ops::series_eq(self, other)
    }
}

/// Optional byte-size capability for key types, mirroring the coefficient
/// side's `byte_size` (`spec.md` §2 item 3).
pub trait ApproxByteSize {
    /// Approximate heap+stack footprint of this key.
    fn approx_byte_size(&self) -> usize;
}

impl ApproxByteSize for crate::key::ExpVecMonomial {
    fn approx_byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.0.len() * std::mem::size_of::<i64>()
    }
}

/// Rank composition: a series whose coefficient type is itself ranked has
/// rank `C::RANK + 1` (`spec.md` §3 "Series rank").
impl<K, C, T> Ranked for Series<K, C, T>
where
    C: Ranked,
{
    const RANK: u32 = C::RANK + 1;
}

/// A series is itself usable as a coefficient of an outer series — this is
/// how "series of series" composes in this crate (`spec.md` §2 item 3,
/// "Ranks compose").
impl<K, C, T> Coefficient for Series<K, C, T>
where
    K: Key,
    C: Coefficient,
    T: Tag + PartialEq,
{
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
    fn zero() -> Self {
        Series::new(SymbolSet::empty())
    }
    fn one() -> Self {
        let s = SymbolSet::empty();
        let mut series = Series::new(s.clone());
        series
            .add_term(K::unit(&s), C::one(), InsertFlags::unique_extend(true))
            .expect("inserting the unit term into an empty series cannot fail");
        series
    }
    fn from_i64(n: i64) -> Self {
        let s = SymbolSet::empty();
        let mut series = Series::new(s.clone());
        if n != 0 {
            series
                .add_term(K::unit(&s), C::from_i64(n), InsertFlags::unique_extend(true))
                .expect("inserting a scalar term into an empty series cannot fail");
        }
        series
    }
    fn add_assign_ref(&mut self, other: &Self) {
        let result = crate::ops::add_same_rank(self.clone(), other.clone(), crate::insert::Sign::Plus)
            .expect("series add should not fail for already-compatible operands");
        *self = result;
    }
    fn sub_assign_ref(&mut self, other: &Self) {
        let result = crate::ops::add_same_rank(self.clone(), other.clone(), crate::insert::Sign::Minus)
            .expect("series sub should not fail for already-compatible operands");
        *self = result;
    }
    fn mul_assign_ref(&mut self, other: &Self) {
        let result = crate::mul::mul_serial(self, other)
            .expect("series multiply should not fail for already-compatible operands");
        *self = result;
    }
    fn checked_div(&self, _other: &Self) -> Option<Self> {
        // Series-by-series division is not part of this spec's scope
        // (only scalar-by-series division, §4.4 `÷`).
        None
    }
    fn byte_size(&self) -> usize {
        let mut total = std::mem::size_of::<Self>();
        for (_, c) in self.iter() {
            total += Coefficient::byte_size(c);
        }
        total
    }
}

/// Lift a bare coefficient into a constant (unit-key, empty-symbol-set)
/// series over that same coefficient type — the same embedding
/// `Coefficient::from_i64` already performs for `i64`, generalized to any
/// `C`. This is what lets [`crate::calc::substitute`] be generic over a
/// substitution-value type `V` distinct from the series' own coefficient
/// type `C`: it requires `V: From<C>`, which every `Series<K2, C, T2>`
/// satisfies here, and which `C` itself satisfies trivially via the
/// standard library's blanket `impl<T> From<T> for T` when `V == C`.
impl<K, C, T> From<C> for Series<K, C, T>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    fn from(c: C) -> Self {
        let s = SymbolSet::empty();
        let mut series = Series::new(s.clone());
        if !c.is_zero() {
            series
                .add_term(K::unit(&s), c, InsertFlags::unique_extend(true))
                .expect("inserting a constant term into an empty series cannot fail");
        }
        series
    }
}

impl<K, C, T> Neg for Series<K, C, T>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    type Output = Self;
    fn neg(mut self) -> Self {
        for (_, c) in self.iter_mut() {
            let negated = -c.clone();
            *c = negated;
        }
        self
    }
}

use std::ops::Neg;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ExpVecMonomial;

    #[test]
    fn default_series_is_empty() {
        let s: Series<ExpVecMonomial, i64> = Series::default();
        assert_eq!(s.size(), 0);
        assert!(s.symbol_set().is_empty());
    }

    #[test]
    fn clear_resets_symbols_clear_terms_keeps_them() {
        let ss = SymbolSet::new(["x"]);
        let mut s: Series<ExpVecMonomial, i64> = Series::new(ss.clone());
        s.add_term(ExpVecMonomial::from_exponents(vec![1]), 1, InsertFlags::accumulate()).unwrap();
        s.clear_terms();
        assert_eq!(s.size(), 0);
        assert_eq!(s.symbol_set(), &ss);

        s.add_term(ExpVecMonomial::from_exponents(vec![1]), 1, InsertFlags::accumulate()).unwrap();
        s.clear();
        assert_eq!(s.size(), 0);
        assert!(s.symbol_set().is_empty());
    }

    #[test]
    fn set_symbol_set_fails_when_nonempty() {
        let ss = SymbolSet::new(["x"]);
        let mut s: Series<ExpVecMonomial, i64> = Series::new(ss.clone());
        s.add_term(ExpVecMonomial::from_exponents(vec![1]), 1, InsertFlags::accumulate()).unwrap();
        assert!(s.set_symbol_set(SymbolSet::new(["y"])).is_err());
    }

    #[test]
    fn is_single_cf_detects_unit_key() {
        let ss = SymbolSet::new(["x"]);
        let mut s: Series<ExpVecMonomial, i64> = Series::new(ss.clone());
        assert!(s.is_single_cf());
        s.add_term(ExpVecMonomial::unit(&ss), 5, InsertFlags::accumulate()).unwrap();
        assert!(s.is_single_cf());
        s.add_term(ExpVecMonomial::from_exponents(vec![1]), 1, InsertFlags::accumulate()).unwrap();
        assert!(!s.is_single_cf());
    }
}
