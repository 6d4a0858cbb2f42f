//! Differentiation, integration, substitution, evaluation, and symbol
//! trimming (`spec.md` §4.7) — all built by composing [`Key`]'s per-term
//! algebra with [`Series::add_term`].

use crate::coefficient::Coefficient;
use crate::error::{Result, SeriesError};
use crate::insert::InsertFlags;
use crate::key::Key;
use crate::series::{Series, Tag};
use crate::symbol::SymbolSet;
use crate::table::SegmentedTable;

const OP_DIFF: &str = "diff";
const OP_INTEGRATE: &str = "integrate";
const OP_EVALUATE: &str = "evaluate";

/// `d/d(symbols[index])`. Terms whose exponent in that symbol is already
/// zero contribute nothing and are dropped (`spec.md` §4.7 `diff`).
pub fn diff<K, C, T>(s: &Series<K, C, T>, index: usize) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    if index >= s.symbol_set().len() {
        return Err(SeriesError::invalid(OP_DIFF, "symbol index out of range"));
    }
    let mut out: Series<K, C, T> =
        Series::from_parts(s.symbol_set().clone(), SegmentedTable::new(), s.tag().clone());
    out.set_n_segments(s.n_segments_log2())?;
    out.reserve(s.size());
    for (k, c) in s.iter() {
        let (factor, nk) = k.diff(index, s.symbol_set());
        if factor == 0 {
            continue;
        }
        let mut term = c.clone();
        term.mul_assign_ref(&C::from_i64(factor));
        if !term.is_zero() {
            out.add_term(nk, term, InsertFlags::accumulate())?;
        }
    }
    Ok(out)
}

/// `\int d(symbols[index])`. Every term's coefficient must divide exactly
/// by the `e + 1` factor the power rule introduces; an inexact division
/// (e.g. integrating `2x` over `i64` coefficients yields `x^2`, fine, but
/// integrating `x` yields `x^2/2`, which `i64` cannot represent) is an
/// `InvalidArgument` error rather than a silent truncation (`spec.md` §4.7
/// `integrate`).
pub fn integrate<K, C, T>(s: &Series<K, C, T>, index: usize) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    if index >= s.symbol_set().len() {
        return Err(SeriesError::invalid(OP_INTEGRATE, "symbol index out of range"));
    }
    let mut out: Series<K, C, T> =
        Series::from_parts(s.symbol_set().clone(), SegmentedTable::new(), s.tag().clone());
    out.set_n_segments(s.n_segments_log2())?;
    out.reserve(s.size());
    for (k, c) in s.iter() {
        let (factor, nk) = k.integrate(index, s.symbol_set());
        let divisor = C::from_i64(factor);
        let term = c
            .checked_div(&divisor)
            .ok_or_else(|| SeriesError::invalid(OP_INTEGRATE, "coefficient is not exactly divisible by e + 1"))?;
        if !term.is_zero() {
            out.add_term(nk, term, InsertFlags::accumulate())?;
        }
    }
    Ok(out)
}

/// Bind the symbols named in `bindings` (`(index, value)` pairs) to
/// concrete values of a (possibly different) coefficient type `V`, leaving
/// the symbol set unchanged — callers that also want now-unused symbols
/// removed should follow up with [`trim`] (`spec.md` §4.7 `subs`).
///
/// `V` is independent of `s`'s own coefficient type `C` (matching
/// [`Key::subs`]'s own `V: Coefficient` generic), so substituting a value
/// into a richer ring than `C` — e.g. binding a numeric symbol to another
/// polynomial, as in `spec.md` §8 scenario 7 — produces a `Series<K, V,
/// T>` instead of being pinned to `C`. `V: From<C>` lifts each term's
/// existing coefficient into that ring before multiplying it by the
/// binding's contribution; every vocabulary coefficient type satisfies
/// this trivially via the standard library's blanket `impl<T> From<T> for
/// T` when `V == C`, and [`Series`] satisfies it for any `V = Series<K2,
/// C, T2>` sharing `s`'s coefficient type (`crate::series`'s `From<C> for
/// Series<K, C, T>` impl).
pub fn substitute<K, C, V, T>(s: &Series<K, C, T>, bindings: &[(usize, V)]) -> Result<Series<K, V, T>>
where
    K: Key,
    C: Coefficient,
    V: Coefficient + From<C>,
    T: Tag,
{
    for (idx, _) in bindings {
        if *idx >= s.symbol_set().len() {
            return Err(SeriesError::invalid("subs", "binding references a symbol index out of range"));
        }
    }
    let mut out: Series<K, V, T> =
        Series::from_parts(s.symbol_set().clone(), SegmentedTable::new(), s.tag().clone());
    out.set_n_segments(s.n_segments_log2())?;
    out.reserve(s.size());
    for (k, c) in s.iter() {
        let (multiplier, nk) = k.subs(bindings, s.symbol_set());
        let mut term = V::from(c.clone());
        term.mul_assign_ref(&multiplier);
        if !term.is_zero() {
            out.add_term(nk, term, InsertFlags::accumulate())?;
        }
    }
    Ok(out)
}

/// Fully evaluate `s` at `values` (one value per symbol, in symbol-set
/// order), returning a single coefficient (`spec.md` §4.7 `evaluate`).
pub fn evaluate<K, C, T>(s: &Series<K, C, T>, values: &[C]) -> Result<C>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    if values.len() != s.symbol_set().len() {
        return Err(SeriesError::invalid(
            OP_EVALUATE,
            "values must supply exactly one binding per symbol",
        ));
    }
    let mut acc = C::zero();
    for (k, c) in s.iter() {
        let factor = k.evaluate(values, s.symbol_set());
        let mut term = c.clone();
        term.mul_assign_ref(&factor);
        acc.add_assign_ref(&term);
    }
    Ok(acc)
}

/// Drop every symbol no stored term actually exercises, renumbering the
/// remaining keys to match the shrunk symbol set (`spec.md` §4.7 `trim`).
pub fn trim<K, C, T>(s: &Series<K, C, T>) -> Result<Series<K, C, T>>
where
    K: Key,
    C: Coefficient,
    T: Tag,
{
    let n = s.symbol_set().len();
    let mut used = vec![false; n];
    for (k, _) in s.iter() {
        k.trim_identify(&mut used, s.symbol_set());
    }
    let removed: Vec<usize> = (0..n).filter(|&i| !used[i]).collect();
    if removed.is_empty() {
        return Ok(s.clone());
    }

    let kept_names: Vec<&str> =
        (0..n).filter(|i| used[*i]).filter_map(|i| s.symbol_set().get(i)).collect();
    let new_symbols: SymbolSet = kept_names.into_iter().collect();

    let mut out: Series<K, C, T> = Series::with_tag(new_symbols, s.tag().clone());
    out.set_n_segments(s.n_segments_log2())?;
    out.reserve(s.size());
    for (k, c) in s.iter() {
        let nk = k.trim(&removed, s.symbol_set());
        // Two distinct original keys can only coincide after trimming if
        // they already agreed on every kept component, and the dropped
        // components are exactly those every term holds at zero — so this
        // can never collide two genuinely distinct terms.
        out.add_term(nk, c.clone(), InsertFlags::accumulate())?;
    }
    Ok(out)
}
