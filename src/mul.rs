//! The multiplication kernel (`spec.md` §4.5): serial and parallel
//! segmented multiplication, plus the two truncated variants.
//!
//! The parallel path is grounded on `examples/logannye-tinyzkp`'s use of
//! `rayon` for its own per-chunk parallel folds (`scheduler.rs`), combined
//! with `parking_lot::Mutex` for the per-sub-table locks — the same
//! locking granularity `examples/prospectorengine-prospector-btc`'s
//! sharded filter uses, adapted here to guard `hashbrown` segments instead
//! of bitsets.

use crate::coefficient::Coefficient;
use crate::error::{Result, SeriesError};
use crate::insert::InsertFlags;
use crate::key::{Key, RangeChecked};
use crate::ops::merge_operands;
use crate::series::{Series, Tag};
use crate::table::SegmentedTable;

const OP: &str = "mul";

/// Pre-multiplication range-overflow check (`spec.md` §4.5): fail fast,
/// before doing any `O(|a| * |b|)` work, if the worst-case exponent sum
/// would not fit in a key component.
pub fn check_range_overflow<K, C, T>(a: &Series<K, C, T>, b: &Series<K, C, T>) -> Result<()>
where
    K: RangeChecked,
    C: Coefficient,
    T: Tag,
{
    let (lo, hi) = K::component_range();
    let max_a = a.iter().map(|(k, _)| k.max_abs_component(a.symbol_set())).max().unwrap_or(0);
    let max_b = b.iter().map(|(k, _)| k.max_abs_component(b.symbol_set())).max().unwrap_or(0);
    let sum = max_a
        .checked_add(max_b)
        .ok_or_else(|| SeriesError::overflow(OP, "worst-case exponent sum overflows i64"))?;
    if sum > hi || sum < lo.saturating_neg() {
        return Err(SeriesError::overflow(
            OP,
            format!("worst-case exponent sum {sum} exceeds component range [{lo}, {hi}]"),
        ));
    }
    Ok(())
}

/// Serial segmented multiplication: merge operands to a common symbol set,
/// then accumulate every cross term through [`Series::add_term`]
/// (`spec.md` §4.5 "Serial multiplication").
pub fn mul_serial<K, C, T>(a: &Series<K, C, T>, b: &Series<K, C, T>) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    let (ua, ub) = merge_operands(a.clone(), b.clone())?;
    let symbols = ua.symbol_set().clone();
    let log2 = ua.n_segments_log2().max(ub.n_segments_log2());
    let mut table = SegmentedTable::new();
    table.set_n_segments(log2)?;
    table.reserve(ua.size().saturating_mul(ub.size().max(1)));
    let mut out = Series::from_parts(symbols.clone(), table, ua.tag().clone());

    for (ka, ca) in ua.iter() {
        for (kb, cb) in ub.iter() {
            let k = ka.checked_mul(kb, &symbols)?;
            let c = ca.mul(cb);
            out.add_term(k, c, InsertFlags::accumulate())?;
        }
    }
    Ok(out)
}

/// [`mul_serial`] preceded by [`check_range_overflow`] — the entry point
/// operator overloads and user-facing call sites should use when `K:
/// RangeChecked` is available. The rank-composing `Coefficient for Series`
/// impl in `crate::series` calls [`mul_serial`] directly instead, since it
/// is generic over any `K: Key` and cannot assume `RangeChecked`; per-term
/// `checked_mul` still catches the same overflow there, just without the
/// fail-fast short circuit.
pub fn mul_checked<K, C, T>(a: &Series<K, C, T>, b: &Series<K, C, T>) -> Result<Series<K, C, T>>
where
    K: RangeChecked,
    C: Coefficient,
    T: Tag,
{
    check_range_overflow(a, b)?;
    mul_serial(a, b)
}

/// Multiply every coefficient of `s` by a bare scalar, dropping terms that
/// become zero (`spec.md` §4.4 cross-rank `*`, `rA > rB` direction; the
/// commutative `rA < rB` case is the same computation with arguments
/// swapped, left to call sites since Rust has no "scalar on the left"
/// ambiguity to resolve generically here).
pub fn mul_scalar<K, C, T>(s: &Series<K, C, T>, scalar: &C) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    let mut out: Series<K, C, T> =
        Series::from_parts(s.symbol_set().clone(), SegmentedTable::new(), s.tag().clone());
    out.set_n_segments(s.n_segments_log2())?;
    out.reserve(s.size());
    for (k, c) in s.iter() {
        let v = c.mul(scalar);
        if !v.is_zero() {
            out.add_term(k.clone(), v, InsertFlags::accumulate())?;
        }
    }
    Ok(out)
}

/// Multiply, dropping every product term whose total degree exceeds
/// `limit` (`spec.md` §4.5 "Truncated multiplication — total degree").
///
/// Terms on both sides are sorted ascending by degree first so the inner
/// loop can break as soon as a prefix of `b` would already overflow the
/// limit, instead of visiting every cross term.
pub fn mul_truncated_total_degree<K, C, T>(
    a: &Series<K, C, T>,
    b: &Series<K, C, T>,
    limit: i64,
) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    let (ua, ub) = merge_operands(a.clone(), b.clone())?;
    let symbols = ua.symbol_set().clone();

    let mut terms_a = degree_sorted(&ua)?;
    let mut terms_b = degree_sorted(&ub)?;
    terms_a.sort_by_key(|(deg, _, _)| *deg);
    terms_b.sort_by_key(|(deg, _, _)| *deg);

    let log2 = ua.n_segments_log2().max(ub.n_segments_log2());
    let mut table = SegmentedTable::new();
    table.set_n_segments(log2)?;
    let mut out = Series::from_parts(symbols.clone(), table, ua.tag().clone());

    for (da, ka, ca) in &terms_a {
        for (db, kb, cb) in &terms_b {
            if da.saturating_add(*db) > limit {
                break; // terms_b is sorted ascending; nothing further fits either
            }
            let k = ka.checked_mul(kb, &symbols)?;
            let c = ca.mul(cb);
            out.add_term(k, c, InsertFlags::accumulate())?;
        }
    }
    Ok(out)
}

/// Multiply, dropping product terms whose degree restricted to `indices`
/// exceeds `limit` (`spec.md` §4.5 "Truncated multiplication — partial
/// degree"). Same sort-and-break structure as
/// [`mul_truncated_total_degree`], scored by `p_degree` instead.
pub fn mul_truncated_partial_degree<K, C, T>(
    a: &Series<K, C, T>,
    b: &Series<K, C, T>,
    indices: &[usize],
    limit: i64,
) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    let (ua, ub) = merge_operands(a.clone(), b.clone())?;
    let symbols = ua.symbol_set().clone();

    let mut terms_a: Vec<(i64, K, C)> = ua
        .iter()
        .map(|(k, c)| Ok((k.p_degree(indices, &symbols)?, k.clone(), c.clone())))
        .collect::<Result<_>>()?;
    let mut terms_b: Vec<(i64, K, C)> = ub
        .iter()
        .map(|(k, c)| Ok((k.p_degree(indices, &symbols)?, k.clone(), c.clone())))
        .collect::<Result<_>>()?;
    terms_a.sort_by_key(|(deg, _, _)| *deg);
    terms_b.sort_by_key(|(deg, _, _)| *deg);

    let log2 = ua.n_segments_log2().max(ub.n_segments_log2());
    let mut table = SegmentedTable::new();
    table.set_n_segments(log2)?;
    let mut out = Series::from_parts(symbols.clone(), table, ua.tag().clone());

    for (da, ka, ca) in &terms_a {
        for (db, kb, cb) in &terms_b {
            if da.saturating_add(*db) > limit {
                break;
            }
            let k = ka.checked_mul(kb, &symbols)?;
            let c = ca.mul(cb);
            out.add_term(k, c, InsertFlags::accumulate())?;
        }
    }
    Ok(out)
}

fn degree_sorted<K, C, T>(s: &Series<K, C, T>) -> Result<Vec<(i64, K, C)>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    s.iter()
        .map(|(k, c)| Ok((k.degree(s.symbol_set())?, k.clone(), c.clone())))
        .collect()
}

/// Parallel segmented multiplication (`spec.md` §4.5 "Parallel
/// multiplication", gated behind the `parallel` feature): each `rayon`
/// worker multiplies one `a`-term against every `b`-term and routes the
/// product into the shared output table, taking only the lock for the
/// one sub-table the product's key hashes into.
#[cfg(feature = "parallel")]
#[tracing::instrument(level = "debug", skip_all, fields(a_terms = a.size(), b_terms = b.size()))]
pub fn mul_parallel<K, C, T>(a: &Series<K, C, T>, b: &Series<K, C, T>) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    use parking_lot::Mutex;
    use rayon::prelude::*;

    let (ua, ub) = merge_operands(a.clone(), b.clone())?;
    let symbols = ua.symbol_set().clone();
    let log2 = ua.n_segments_log2().max(ub.n_segments_log2()).max(1);
    let n_segments = 1usize << log2;
    tracing::debug!(n_segments, "dispatching parallel segmented multiply");

    let segments: Vec<Mutex<hashbrown::HashMap<K, C>>> =
        (0..n_segments).map(|_| Mutex::new(hashbrown::HashMap::new())).collect();

    let terms_b: Vec<(&K, &C)> = ub.iter().collect();
    let a_terms: Vec<(&K, &C)> = ua.iter().collect();

    a_terms
        .into_par_iter()
        .try_for_each(|(ka, ca)| -> Result<()> {
            for (kb, cb) in &terms_b {
                let k = ka.checked_mul(kb, &symbols)?;
                let c = ca.mul(cb);
                let idx = if log2 == 0 { 0 } else { (crate::hash::mix(&k) & ((1u64 << log2) - 1)) as usize };
                let mut seg = segments[idx].lock();
                match seg.entry(k) {
                    hashbrown::hash_map::Entry::Vacant(v) => {
                        if !c.is_zero() {
                            v.insert(c);
                        }
                    }
                    hashbrown::hash_map::Entry::Occupied(mut o) => {
                        o.get_mut().add_assign_ref(&c);
                        if o.get().is_zero() {
                            o.remove();
                        }
                    }
                }
            }
            Ok(())
        })?;

    let mut table: SegmentedTable<K, C> = SegmentedTable::new();
    table.set_n_segments(log2)?;
    for (i, seg) in segments.into_iter().enumerate() {
        *table.segment_mut(i) = seg.into_inner();
    }
    Ok(Series::from_parts(symbols, table, ua.tag().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ExpVecMonomial;
    use crate::symbol::SymbolSet;

    fn poly(ss: &SymbolSet, terms: &[(Vec<i64>, i64)]) -> Series<ExpVecMonomial, i64> {
        let mut s = Series::new(ss.clone());
        for (exps, c) in terms {
            s.add_term(ExpVecMonomial::from_exponents(exps.clone()), *c, InsertFlags::accumulate())
                .unwrap();
        }
        s
    }

    #[test]
    fn serial_multiply_matches_hand_expansion() {
        let ss = SymbolSet::new(["x"]);
        // (x + 1) * (x - 1) = x^2 - 1
        let a = poly(&ss, &[(vec![1], 1), (vec![0], 1)]);
        let b = poly(&ss, &[(vec![1], 1), (vec![0], -1)]);
        let product = mul_serial(&a, &b).unwrap();
        assert_eq!(product.size(), 2);
        assert_eq!(*product.find(&ExpVecMonomial::from_exponents(vec![2])).unwrap(), 1);
        assert_eq!(*product.find(&ExpVecMonomial::from_exponents(vec![0])).unwrap(), -1);
    }

    #[test]
    fn truncated_total_degree_drops_high_degree_terms() {
        let ss = SymbolSet::new(["x"]);
        let a = poly(&ss, &[(vec![2], 1), (vec![0], 1)]);
        let b = poly(&ss, &[(vec![2], 1), (vec![0], 1)]);
        // full product: x^4 + 2x^2 + 1; truncate to degree <= 2
        let truncated = mul_truncated_total_degree(&a, &b, 2).unwrap();
        assert!(truncated.find(&ExpVecMonomial::from_exponents(vec![4])).is_none());
        assert_eq!(*truncated.find(&ExpVecMonomial::from_exponents(vec![2])).unwrap(), 2);
        assert_eq!(*truncated.find(&ExpVecMonomial::from_exponents(vec![0])).unwrap(), 1);
    }

    #[test]
    fn scalar_multiply_drops_zero_result() {
        let ss = SymbolSet::new(["x"]);
        let a = poly(&ss, &[(vec![1], 5)]);
        let scaled = mul_scalar(&a, &0i64).unwrap();
        assert!(scaled.is_empty());
    }
}
