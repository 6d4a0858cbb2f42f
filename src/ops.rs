//! The rank-based binary-operator dispatch (`spec.md` §4.4).
//!
//! Rust's coherence rules make a single generic `impl<A, B> Add<B> for A`
//! that branches on `A::RANK`/`B::RANK` infeasible without specialization
//! (the original relies on C++ SFINAE to pick one overload per rank
//! combination at compile time). This module is the faithful analogue:
//! - same-rank series `+`, `-`, `==` are `std::ops`/`PartialEq` impls on
//!   [`Series`] directly (the common, ergonomic case, and the one the
//!   recursive `Coefficient for Series` impl in `crate::series` relies on);
//! - the two cross-rank directions (`spec.md`'s `rA < rB` / `rA > rB`
//!   cases) are plain functions, since "series whose coefficient is itself
//!   a lower-rank series" and "a bare scalar" are different Rust types at
//!   every call site and the caller already knows which direction applies.

use crate::coefficient::Coefficient;
use crate::error::Result;
use crate::insert::{add_term, InsertFlags, Sign};
use crate::key::Key;
use crate::series::{Series, Tag};
use crate::symbol::SymbolSet;
use crate::table::SegmentedTable;

/// Extend `s` (borrowed by value — it is fully consumed) to the larger
/// symbol set `union`, using the insertion map computed for `s`'s original
/// symbol set. This is `spec.md` §4.3 "Symbol-set extension".
pub(crate) fn extend_symbols<K, C, T>(
    s: Series<K, C, T>,
    union: &SymbolSet,
    map: &crate::symbol::InsertionMap,
) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    if map.is_empty() {
        let mut s = s;
        s.set_symbol_set_unchecked(union.clone());
        return Ok(s);
    }
    let log2 = s.n_segments_log2();
    let tag = s.tag().clone();
    let mut out_table: SegmentedTable<K, C> = SegmentedTable::new();
    out_table.set_n_segments(log2)?;
    out_table.reserve(s.size());

    for (k, c) in s.table().iter() {
        let nk = k.merge_symbols(map, s.symbol_set());
        add_term(
            &mut out_table,
            union,
            nk,
            c.clone(),
            InsertFlags::unique_extend(true),
        )?;
    }
    Ok(Series::from_parts(union.clone(), out_table, tag))
}

/// Reconcile `a` and `b`'s symbol sets, returning both operands extended to
/// their union (`spec.md` §4.4 "Same-rank protocol", steps 1–2).
pub(crate) fn merge_operands<K, C, T>(
    a: Series<K, C, T>,
    b: Series<K, C, T>,
) -> Result<(Series<K, C, T>, Series<K, C, T>)>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    if a.symbol_set() == b.symbol_set() {
        return Ok((a, b));
    }
    let (union, map_a, map_b) = a.symbol_set().merge(b.symbol_set());
    let a = if map_a.is_empty() { a } else { extend_symbols(a, &union, &map_a)? };
    let b = if map_b.is_empty() { b } else { extend_symbols(b, &union, &map_b)? };
    Ok((a, b))
}

/// Same-rank `+`/`-` (`spec.md` §4.4 "Merge-with-identical-symbol-sets").
///
/// Picks the larger operand as the accumulator, then folds the smaller
/// one's terms in; for `-`, negates the result in place if the operands
/// were swapped to keep the larger one as the accumulator.
pub fn add_same_rank<K, C, T>(
    a: Series<K, C, T>,
    b: Series<K, C, T>,
    sign: Sign,
) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    let (a, b) = merge_operands(a, b)?;
    let (mut acc, other, swapped) =
        if a.size() >= b.size() { (a, b, false) } else { (b, a, true) };

    // `sign` applies unconditionally here, swapped or not: when swapped,
    // this computes `b - a` (or `b + a`), and the final negation below
    // turns that into `-(b - a) = a - b` (or leaves `a + b` as is, since
    // `+` doesn't negate). Remapping `sign` to `Plus` here would compute
    // `b + a` instead of `b - a`, which negates to `-(a + b)` instead of
    // `a - b` — wrong whenever the smaller operand (`other`) isn't zero.
    for (k, c) in other.table().iter() {
        acc.add_term_raw(k.clone(), c.clone(), flags_merge(sign))?;
    }

    if sign == Sign::Minus && swapped {
        acc = -acc;
    }
    Ok(acc)
}

fn flags_merge(sign: Sign) -> InsertFlags {
    InsertFlags {
        sign,
        check_zero: true,
        check_compat: false,
        check_size: true,
        assume_unique: false,
    }
}

/// Same-rank `==` (`spec.md` §4.4 "Same-rank `==`"): sizes must match;
/// every term of `a` must have a matching key in `b` with an equal
/// coefficient; tags must compare equal.
pub fn series_eq<K, C, T>(a: &Series<K, C, T>, b: &Series<K, C, T>) -> bool
where
    K: Key,
    C: Coefficient,
    T: Tag + PartialEq,
{
    if a.tag() != b.tag() {
        return false;
    }
    if a.symbol_set() == b.symbol_set() {
        return same_symbols_eq(a, b);
    }
    let (ua, ub) = match merge_operands(a.clone(), b.clone()) {
        Ok(pair) => pair,
        Err(_) => return false,
    };
    same_symbols_eq(&ua, &ub)
}

fn same_symbols_eq<K, C, T>(a: &Series<K, C, T>, b: &Series<K, C, T>) -> bool
where
    K: Key,
    C: Coefficient,
{
    if a.size() != b.size() {
        return false;
    }
    a.iter().all(|(k, c)| b.find(k).map(|bc| bc == c).unwrap_or(false))
}

/// Scalar-left, series-right addition/subtraction: `rank(scalar) <
/// rank(series)` (`spec.md` §4.4, `rA < rB`).
pub fn add_scalar_series<K, C, T>(
    scalar: C,
    series: Series<K, C, T>,
    sign: Sign,
) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    let mut r = match sign {
        Sign::Plus => series,
        Sign::Minus => -series,
    };
    let unit = K::unit(r.symbol_set());
    r.add_term_raw(unit, scalar, flags_merge(Sign::Plus))?;
    Ok(r)
}

/// Series-left, scalar-right addition/subtraction: `rank(series) >
/// rank(scalar)` (`spec.md` §4.4, `rA > rB`).
pub fn add_series_scalar<K, C, T>(
    series: Series<K, C, T>,
    scalar: C,
    sign: Sign,
) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    let mut r = series;
    let unit = K::unit(r.symbol_set());
    r.add_term_raw(unit, scalar, flags_merge(sign))?;
    Ok(r)
}

/// `÷`, defined only when `rank(series) > rank(scalar)` (`spec.md` §4.4):
/// divide every coefficient by `scalar`, dropping terms that become zero.
pub fn div_series_scalar<K, C, T>(series: &Series<K, C, T>, scalar: &C) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    let mut out: Series<K, C, T> =
        Series::from_parts(series.symbol_set().clone(), SegmentedTable::new(), series.tag().clone());
    out.set_n_segments(series.n_segments_log2())?;
    out.reserve(series.size());
    for (k, c) in series.iter() {
        match c.checked_div(scalar) {
            Some(q) if !q.is_zero() => {
                out.add_term_raw(k.clone(), q, flags_merge(Sign::Plus))?;
            }
            Some(_) => {}
            None => {
                return Err(crate::error::SeriesError::invalid(
                    "series / scalar",
                    "coefficient is not exactly divisible by the scalar",
                ));
            }
        }
    }
    Ok(out)
}

impl<K, C, T> std::ops::Add for Series<K, C, T>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    type Output = Series<K, C, T>;
    fn add(self, rhs: Self) -> Self::Output {
        add_same_rank(self, rhs, Sign::Plus).expect("series addition should not overflow")
    }
}

impl<K, C, T> std::ops::Sub for Series<K, C, T>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    type Output = Series<K, C, T>;
    fn sub(self, rhs: Self) -> Self::Output {
        add_same_rank(self, rhs, Sign::Minus).expect("series subtraction should not overflow")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ExpVecMonomial;

    fn poly(ss: &SymbolSet, terms: &[(Vec<i64>, i64)]) -> Series<ExpVecMonomial, i64> {
        let mut s = Series::new(ss.clone());
        for (exps, c) in terms {
            s.add_term(ExpVecMonomial::from_exponents(exps.clone()), *c, InsertFlags::accumulate())
                .unwrap();
        }
        s
    }

    #[test]
    fn identical_symbol_set_add_sub() {
        let ss = SymbolSet::new(["x", "y", "z"]);
        let x = poly(&ss, &[(vec![1, 0, 0], 1)]);
        let y = poly(&ss, &[(vec![0, 1, 0], 1)]);
        // (x + y) - (x - y) = 2y
        let lhs = x.clone() + y.clone();
        let rhs = x - y.clone();
        let result = lhs - rhs;
        assert_eq!(result.size(), 1);
        let k = ExpVecMonomial::from_exponents(vec![0, 1, 0]);
        assert_eq!(*result.find(&k).unwrap(), 2);
    }

    #[test]
    fn symbol_set_merge_on_add() {
        let sa = SymbolSet::new(["x"]);
        let sb = SymbolSet::new(["y"]);
        let a = poly(&sa, &[(vec![1], 1), (vec![0], 1)]); // x + 1
        let b = poly(&sb, &[(vec![1], 1), (vec![0], 1)]); // y + 1
        let sum = a + b;
        assert_eq!(sum.symbol_set(), &SymbolSet::new(["x", "y"]));
        let xk = ExpVecMonomial::from_exponents(vec![1, 0]);
        let yk = ExpVecMonomial::from_exponents(vec![0, 1]);
        let unit = ExpVecMonomial::unit(sum.symbol_set());
        assert_eq!(*sum.find(&xk).unwrap(), 1);
        assert_eq!(*sum.find(&yk).unwrap(), 1);
        assert_eq!(*sum.find(&unit).unwrap(), 2);
    }

    #[test]
    fn sub_self_is_empty() {
        let ss = SymbolSet::new(["x"]);
        let a = poly(&ss, &[(vec![1], 3), (vec![0], 5)]);
        let diff = a.clone() - a;
        assert_eq!(diff.size(), 0);
    }

    #[test]
    fn sub_with_larger_right_operand_is_not_negated() {
        // a = 3, b = x + x^2; a - b must be 3 - x - x^2, not -(a + b).
        // b has more terms than a, so `add_same_rank` picks `b` as the
        // initial accumulator and must still produce `a - b`, not
        // `-(a + b)`.
        let ss = SymbolSet::new(["x"]);
        let a = poly(&ss, &[(vec![0], 3)]);
        let b = poly(&ss, &[(vec![1], 1), (vec![2], 1)]);
        let result = a - b;
        assert_eq!(result.size(), 3);
        let unit = ExpVecMonomial::unit(&ss);
        let x = ExpVecMonomial::from_exponents(vec![1]);
        let x2 = ExpVecMonomial::from_exponents(vec![2]);
        assert_eq!(*result.find(&unit).unwrap(), 3);
        assert_eq!(*result.find(&x).unwrap(), -1);
        assert_eq!(*result.find(&x2).unwrap(), -1);
    }

    #[test]
    fn scalar_series_division_drops_zero_result() {
        let ss = SymbolSet::new(["x"]);
        let a = poly(&ss, &[(vec![1], 6)]);
        let q = div_series_scalar(&a, &3i64).unwrap();
        let k = ExpVecMonomial::from_exponents(vec![1]);
        assert_eq!(*q.find(&k).unwrap(), 2);

        let b = poly(&ss, &[(vec![1], 3)]);
        let q2 = div_series_scalar(&b, &7i64);
        assert!(q2.is_err());
    }
}
