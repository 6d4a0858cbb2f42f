//! The monomial ("key") capability trait and one concrete implementation.
//!
//! `spec.md` explicitly puts the monomial representation itself out of
//! scope "beyond the operations it must expose" (§1) — packed integer
//! encodings, Kronecker substitution, etc. are a choice left to the
//! implementer. This crate ships [`ExpVecMonomial`], a plain per-symbol
//! exponent vector, as its one concrete, generically-testable key type; the
//! [`Key`] trait is the actual contract every operation in `series`,
//! `insert`, `mul`, and `calc` programs against.
//!
//! Every operation takes the ambient [`SymbolSet`] as an explicit
//! parameter — a key carries no symbol information of its own (`spec.md`
//! §2 item 2).

use crate::coefficient::Coefficient;
use crate::error::{Result, SeriesError};
use crate::symbol::{InsertionMap, SymbolSet};
use std::hash::Hash;

/// Capability set required of a monomial type.
///
/// Mirrors `spec.md`'s "Key interface" (§6) and component list (§2 item 2).
pub trait Key: Clone + Eq + Hash + Send + Sync + std::fmt::Debug + 'static {
    /// The unit monomial (all exponents zero) over `symbols`.
    fn unit(symbols: &SymbolSet) -> Self;

    /// `true` iff this key, interpreted over `symbols`, represents the
    /// additive-identity monomial. Exponent-vector keys never do (every
    /// monomial is a valid nonzero basis element); a sparser encoding that
    /// can represent an explicit "zero" sentinel would override this.
    fn is_zero(&self, symbols: &SymbolSet) -> bool;

    /// `true` iff this key is the unit monomial over `symbols`.
    fn is_one(&self, symbols: &SymbolSet) -> bool;

    /// `true` iff this key is well-formed with respect to `symbols` (e.g.
    /// same arity).
    fn is_compatible(&self, symbols: &SymbolSet) -> bool;

    /// Rebuild this key over the symbol set obtained by inserting new
    /// symbols as described by `map` (new symbols get exponent 0).
    /// Preserves zeroness, compatibility, and uniqueness across distinct
    /// input keys (`spec.md` §4.3 contract on `key_merge`).
    fn merge_symbols(&self, map: &InsertionMap, symbols: &SymbolSet) -> Self;

    /// Total degree (sum of exponents), checked against overflow.
    fn degree(&self, symbols: &SymbolSet) -> Result<i64>;

    /// Degree restricted to the projection onto `indices`.
    fn p_degree(&self, indices: &[usize], symbols: &SymbolSet) -> Result<i64>;

    /// `self * other`, checked against component and degree overflow.
    fn checked_mul(&self, other: &Self, symbols: &SymbolSet) -> Result<Self>;

    /// `self ^ n`, checked against component and degree overflow.
    fn checked_pow(&self, n: u64, symbols: &SymbolSet) -> Result<Self>;

    /// Differentiate with respect to symbol `index`: returns the integer
    /// factor contributed by the power rule and the resulting key (with
    /// that component decremented). The factor is 0 (and the key
    /// unspecified/ignored by the caller) when the exponent was already 0.
    fn diff(&self, index: usize, symbols: &SymbolSet) -> (i64, Self);

    /// Integrate with respect to symbol `index`: returns the integer factor
    /// `e + 1` the coefficient must be divided by, and the resulting key
    /// (with that component incremented).
    fn integrate(&self, index: usize, symbols: &SymbolSet) -> (i64, Self);

    /// Substitute the symbols named in `bindings` (each a `(index, value)`
    /// pair, indices referring to `symbols`) with concrete coefficient
    /// values. Returns the accumulated multiplier and the resulting key
    /// (substituted components zeroed, the symbol set itself unchanged —
    /// removing now-unused symbols is a separate `trim` step).
    fn subs<V: Coefficient>(&self, bindings: &[(usize, V)], symbols: &SymbolSet) -> (V, Self);

    /// Evaluate fully: `values[i]` is bound to `symbols.get(i)` for every
    /// `i`; the caller has already verified full coverage (`spec.md` §4.7
    /// `evaluate`'s `invalid_argument` on a partial map is the caller's
    /// responsibility, not the key's).
    fn evaluate<V: Coefficient>(&self, values: &[V], symbols: &SymbolSet) -> V;

    /// Mark, in `used` (one entry per symbol), which symbols this key
    /// actually exercises (nonzero exponent).
    fn trim_identify(&self, used: &mut [bool], symbols: &SymbolSet);

    /// Rebuild this key with the components at `removed_indices` dropped.
    fn trim(&self, removed_indices: &[usize], symbols: &SymbolSet) -> Self;

    /// Plain-text rendering of this key, omitted entirely by the caller
    /// when `is_one`.
    fn write_plain(&self, out: &mut dyn std::fmt::Write, symbols: &SymbolSet) -> std::fmt::Result;

    /// TeX rendering; keys with a negative exponent are expected to render
    /// as a LaTeX fraction (`spec.md` §6 "Stream formats").
    fn write_tex(&self, out: &mut dyn std::fmt::Write, symbols: &SymbolSet) -> std::fmt::Result;
}

/// Per-component bounds used by the pre-multiplication range-overflow
/// check (`spec.md` §4.5). Exponent-vector keys use plain `i64` exponents,
/// so the "packed range" collapses to `[i64::MIN/4, i64::MAX/4]`-ish
/// headroom; this trait method exists so `mul::range_overflow_check` stays
/// generic over key representation (a real packed encoding would report
/// its true per-limb bit-width here).
pub trait RangeChecked: Key {
    /// `(lo, hi)` bounds such that every exponent this key can legally
    /// represent lies within `[lo, hi]`.
    fn component_range() -> (i64, i64);

    /// The largest-magnitude exponent across every component.
    fn max_abs_component(&self, symbols: &SymbolSet) -> i64;
}

/// A dense per-symbol exponent vector: `ExpVecMonomial[i]` is the exponent
/// of `symbols[i]`. Exponents are signed to support Laurent-style division
/// results (e.g. `x^-1` from differentiating a constant — not produced by
/// `diff`/`integrate` here, but future-proofed per the original's
/// `d_packed_monomial`, which also allows negative exponents).
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ExpVecMonomial(pub Vec<i64>);

impl ExpVecMonomial {
    /// Build directly from an exponent vector (for tests and call-sites
    /// that already have one in hand).
    pub fn from_exponents(exps: Vec<i64>) -> Self {
        ExpVecMonomial(exps)
    }

    fn exp(&self, index: usize) -> i64 {
        self.0.get(index).copied().unwrap_or(0)
    }
}

const OP: &str = "key";

impl Key for ExpVecMonomial {
    fn unit(symbols: &SymbolSet) -> Self {
        ExpVecMonomial(vec![0; symbols.len()])
    }

    fn is_zero(&self, _symbols: &SymbolSet) -> bool {
        false
    }

    fn is_one(&self, _symbols: &SymbolSet) -> bool {
        self.0.iter().all(|&e| e == 0)
    }

    fn is_compatible(&self, symbols: &SymbolSet) -> bool {
        self.0.len() == symbols.len()
    }

    fn merge_symbols(&self, map: &InsertionMap, _symbols: &SymbolSet) -> Self {
        let mut out = Vec::with_capacity(map.len().saturating_sub(1) + self.0.len());
        for pos in 0..self.0.len() {
            out.extend(std::iter::repeat(0).take(map.insertions_before(pos).len()));
            out.push(self.0[pos]);
        }
        out.extend(std::iter::repeat(0).take(map.insertions_before(self.0.len()).len()));
        ExpVecMonomial(out)
    }

    fn degree(&self, _symbols: &SymbolSet) -> Result<i64> {
        let mut acc: i64 = 0;
        for &e in &self.0 {
            acc = acc
                .checked_add(e)
                .ok_or_else(|| SeriesError::overflow(OP, "degree accumulator overflow"))?;
        }
        Ok(acc)
    }

    fn p_degree(&self, indices: &[usize], _symbols: &SymbolSet) -> Result<i64> {
        let mut acc: i64 = 0;
        for &i in indices {
            acc = acc
                .checked_add(self.exp(i))
                .ok_or_else(|| SeriesError::overflow(OP, "partial degree accumulator overflow"))?;
        }
        Ok(acc)
    }

    fn checked_mul(&self, other: &Self, symbols: &SymbolSet) -> Result<Self> {
        if self.0.len() != other.0.len() {
            return Err(SeriesError::invalid(OP, "monomial arity mismatch in multiply"));
        }
        let mut out = Vec::with_capacity(self.0.len());
        for i in 0..self.0.len() {
            let v = self.0[i]
                .checked_add(other.0[i])
                .ok_or_else(|| SeriesError::overflow(OP, "exponent overflow in multiply"))?;
            out.push(v);
        }
        let result = ExpVecMonomial(out);
        // Re-check the accumulated degree too, matching the spec's "sum of
        // degree extremes across the two operands" half of the check.
        result.degree(symbols)?;
        Ok(result)
    }

    fn checked_pow(&self, n: u64, symbols: &SymbolSet) -> Result<Self> {
        let n = i64::try_from(n)
            .map_err(|_| SeriesError::overflow(OP, "exponent too large to convert"))?;
        let mut out = Vec::with_capacity(self.0.len());
        for &e in &self.0 {
            let v = e
                .checked_mul(n)
                .ok_or_else(|| SeriesError::overflow(OP, "exponent overflow in pow"))?;
            out.push(v);
        }
        let result = ExpVecMonomial(out);
        result.degree(symbols)?;
        Ok(result)
    }

    fn diff(&self, index: usize, _symbols: &SymbolSet) -> (i64, Self) {
        let e = self.exp(index);
        if e == 0 {
            return (0, self.clone());
        }
        let mut out = self.0.clone();
        out[index] = e - 1;
        (e, ExpVecMonomial(out))
    }

    fn integrate(&self, index: usize, _symbols: &SymbolSet) -> (i64, Self) {
        let e = self.exp(index);
        let mut out = self.0.clone();
        out[index] = e + 1;
        (e + 1, ExpVecMonomial(out))
    }

    fn subs<V: Coefficient>(&self, bindings: &[(usize, V)], _symbols: &SymbolSet) -> (V, Self) {
        let mut out = self.0.clone();
        let mut total = V::one();
        for (idx, val) in bindings {
            let e = self.exp(*idx);
            if e != 0 {
                total.mul_assign_ref(&pow_by_squaring(val, e, V::one()));
                out[*idx] = 0;
            }
        }
        (total, ExpVecMonomial(out))
    }

    fn evaluate<V: Coefficient>(&self, values: &[V], _symbols: &SymbolSet) -> V {
        let mut acc = V::one();
        for (i, e) in self.0.iter().enumerate() {
            if *e != 0 {
                let factor = pow_by_squaring(&values[i], *e, V::one());
                acc.mul_assign_ref(&factor);
            }
        }
        acc
    }

    fn trim_identify(&self, used: &mut [bool], _symbols: &SymbolSet) {
        for (i, &e) in self.0.iter().enumerate() {
            if e != 0 {
                used[i] = true;
            }
        }
    }

    fn trim(&self, removed_indices: &[usize], _symbols: &SymbolSet) -> Self {
        let mut out = Vec::with_capacity(self.0.len().saturating_sub(removed_indices.len()));
        for (i, &e) in self.0.iter().enumerate() {
            if !removed_indices.contains(&i) {
                out.push(e);
            }
        }
        ExpVecMonomial(out)
    }

    fn write_plain(&self, out: &mut dyn std::fmt::Write, symbols: &SymbolSet) -> std::fmt::Result {
        let mut first = true;
        for (i, &e) in self.0.iter().enumerate() {
            if e == 0 {
                continue;
            }
            if !first {
                write!(out, "*")?;
            }
            first = false;
            let name = symbols.get(i).unwrap_or("?");
            if e == 1 {
                write!(out, "{name}")?;
            } else {
                write!(out, "{name}**{e}")?;
            }
        }
        Ok(())
    }

    fn write_tex(&self, out: &mut dyn std::fmt::Write, symbols: &SymbolSet) -> std::fmt::Result {
        let mut num_parts = Vec::new();
        let mut den_parts = Vec::new();
        for (i, &e) in self.0.iter().enumerate() {
            if e == 0 {
                continue;
            }
            let name = symbols.get(i).unwrap_or("?");
            if e > 0 {
                if e == 1 {
                    num_parts.push(name.to_string());
                } else {
                    num_parts.push(format!("{name}^{{{e}}}"));
                }
            } else {
                let ae = -e;
                if ae == 1 {
                    den_parts.push(name.to_string());
                } else {
                    den_parts.push(format!("{name}^{{{ae}}}"));
                }
            }
        }
        if den_parts.is_empty() {
            write!(out, "{}", num_parts.join(" "))
        } else {
            let num = if num_parts.is_empty() { "1".to_string() } else { num_parts.join(" ") };
            write!(out, "\\frac{{{}}}{{{}}}", num, den_parts.join(" "))
        }
    }
}

impl RangeChecked for ExpVecMonomial {
    fn component_range() -> (i64, i64) {
        (i64::MIN / 4, i64::MAX / 4)
    }

    fn max_abs_component(&self, _symbols: &SymbolSet) -> i64 {
        self.0.iter().map(|e| e.unsigned_abs()).max().map(|v| v as i64).unwrap_or(0)
    }
}

/// Repeated-squaring power over a [`Coefficient`] ring, used by `subs` and
/// `evaluate` above (negative exponents are not produced by this key type's
/// `diff`/`integrate`, so `e` is assumed non-negative here).
fn pow_by_squaring<V: Coefficient>(base: &V, mut e: i64, identity: V) -> V {
    debug_assert!(e >= 0, "negative exponent substitution is not supported by ExpVecMonomial");
    let mut acc = identity;
    let mut b = base.clone();
    while e > 0 {
        if e & 1 == 1 {
            acc.mul_assign_ref(&b);
        }
        b = b.mul(&b);
        e >>= 1;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ss3() -> SymbolSet {
        SymbolSet::new(["x", "y", "z"])
    }

    #[test]
    fn unit_is_one() {
        let s = ss3();
        let u = ExpVecMonomial::unit(&s);
        assert!(u.is_one(&s));
        assert!(u.is_compatible(&s));
    }

    #[test]
    fn mul_adds_exponents() {
        let s = ss3();
        let x = ExpVecMonomial::from_exponents(vec![1, 0, 0]);
        let y = ExpVecMonomial::from_exponents(vec![0, 1, 0]);
        let xy = x.checked_mul(&y, &s).unwrap();
        assert_eq!(xy.0, vec![1, 1, 0]);
    }

    #[test]
    fn diff_and_integrate_round_trip_factor() {
        let s = SymbolSet::new(["x"]);
        let x2 = ExpVecMonomial::from_exponents(vec![2]);
        let (factor, lowered) = x2.diff(0, &s);
        assert_eq!(factor, 2);
        assert_eq!(lowered.0, vec![1]);
        let (ifactor, raised) = lowered.integrate(0, &s);
        assert_eq!(ifactor, 2);
        assert_eq!(raised.0, vec![2]);
    }

    #[test]
    fn evaluate_product_of_powers() {
        let s = ss3();
        let m = ExpVecMonomial::from_exponents(vec![2, 1, 0]);
        let v = m.evaluate(&[3i64, 5i64, 7i64], &s);
        assert_eq!(v, 9 * 5);
    }

    #[test]
    fn trim_drops_unused_symbol() {
        let s = ss3();
        let m = ExpVecMonomial::from_exponents(vec![1, 0, 2]);
        let mut used = vec![false; 3];
        m.trim_identify(&mut used, &s);
        assert_eq!(used, vec![true, false, true]);
        let trimmed = m.trim(&[1], &s);
        assert_eq!(trimmed.0, vec![1, 2]);
    }
}
