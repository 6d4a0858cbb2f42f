//! Stream formatting: plain-text and TeX renderings of a series
//! (`spec.md` §6 "Stream formats"), grounded on the original's
//! `cf_stream_insert.hpp` / `key_key_stream_insert.cpp` /
//! `key_key_tex_stream_insert.cpp` — term order is whatever the segmented
//! table yields (unspecified but stable for a given instance), long series
//! are truncated with an ellipsis, and a leading `+` before a negative
//! term collapses to a bare `-`.

use std::fmt::Write as _;

use crate::coefficient::Coefficient;
use crate::key::Key;
use crate::series::{Series, Tag};

/// Terms beyond this count are elided with `...` (`spec.md` §6).
pub const MAX_DISPLAYED_TERMS: usize = 50;

/// Render `s` as plain text: `c1*k1 + c2*k2 + ...`, bracketing any
/// coefficient whose own rendering contains a `+`/`-` (i.e. a multi-term
/// inner series), and omitting the key entirely when it is the unit
/// monomial.
pub fn write_plain<K, C, T>(s: &Series<K, C, T>, out: &mut dyn std::fmt::Write) -> std::fmt::Result
where
    K: Key,
    C: Coefficient + WritePlain,
    T: Tag,
{
    write_stream(s, out, false)
}

/// Render `s` as a TeX fragment, using `\frac{}{}` for negative-exponent
/// key components (`spec.md` §6).
pub fn write_tex<K, C, T>(s: &Series<K, C, T>, out: &mut dyn std::fmt::Write) -> std::fmt::Result
where
    K: Key,
    C: Coefficient + WritePlain,
    T: Tag,
{
    write_stream(s, out, true)
}

fn write_stream<K, C, T>(s: &Series<K, C, T>, out: &mut dyn std::fmt::Write, tex: bool) -> std::fmt::Result
where
    K: Key,
    C: Coefficient + WritePlain,
    T: Tag,
{
    if s.is_empty() {
        return write!(out, "0");
    }

    let mut terms: Vec<(&K, &C)> = s.iter().collect();
    // Order is unspecified by the table, but stable rendering across calls
    // on the same instance matters more than a particular order, so sort
    // by a deterministic key-derived tiebreak.
    terms.sort_by(|(ka, _), (kb, _)| format!("{ka:?}").cmp(&format!("{kb:?}")));

    let truncated = terms.len() > MAX_DISPLAYED_TERMS;
    let shown = if truncated { &terms[..MAX_DISPLAYED_TERMS] } else { &terms[..] };

    let mut first = true;
    for (k, c) in shown {
        let mut cf_buf = String::new();
        if tex {
            c.write_tex_cf(&mut cf_buf)?;
        } else {
            c.write_plain_cf(&mut cf_buf)?;
        }
        let negative_leading = cf_buf.starts_with('-');

        if first {
            write!(out, "{cf_buf}")?;
        } else if negative_leading {
            write!(out, " - {}", &cf_buf[1..])?;
        } else {
            write!(out, " + {cf_buf}")?;
        }
        first = false;

        if !k.is_one(s.symbol_set()) {
            write!(out, "*")?;
            if tex {
                k.write_tex(out, s.symbol_set())?;
            } else {
                k.write_plain(out, s.symbol_set())?;
            }
        }
    }

    if truncated {
        write!(out, " + ...")?;
    }
    Ok(())
}

/// Renders a coefficient's own plain/TeX text, bracketing multi-term
/// coefficients (i.e. nested series) in parentheses so `(a + b)*x` isn't
/// misread as `a + b*x`.
pub trait WritePlain {
    /// Plain-text rendering, parenthesized if this coefficient has more
    /// than one term.
    fn write_plain_cf(&self, out: &mut dyn std::fmt::Write) -> std::fmt::Result;
    /// TeX rendering, parenthesized under the same rule.
    fn write_tex_cf(&self, out: &mut dyn std::fmt::Write) -> std::fmt::Result;
}

impl WritePlain for i64 {
    fn write_plain_cf(&self, out: &mut dyn std::fmt::Write) -> std::fmt::Result {
        write!(out, "{self}")
    }
    fn write_tex_cf(&self, out: &mut dyn std::fmt::Write) -> std::fmt::Result {
        write!(out, "{self}")
    }
}

impl WritePlain for crate::coefficient::RationalCf {
    fn write_plain_cf(&self, out: &mut dyn std::fmt::Write) -> std::fmt::Result {
        write!(out, "{}", self.0)
    }
    fn write_tex_cf(&self, out: &mut dyn std::fmt::Write) -> std::fmt::Result {
        if self.0.is_integer() {
            write!(out, "{}", self.0.numer())
        } else if self.0.numer().sign() == num_bigint::Sign::Minus {
            write!(out, "-\\frac{{{}}}{{{}}}", -self.0.numer(), self.0.denom())
        } else {
            write!(out, "\\frac{{{}}}{{{}}}", self.0.numer(), self.0.denom())
        }
    }
}

impl WritePlain for crate::coefficient::FloatCf {
    fn write_plain_cf(&self, out: &mut dyn std::fmt::Write) -> std::fmt::Result {
        write!(out, "{}", self.0)
    }
    fn write_tex_cf(&self, out: &mut dyn std::fmt::Write) -> std::fmt::Result {
        write!(out, "{}", self.0)
    }
}

impl<K, C, T> WritePlain for Series<K, C, T>
where
    K: Key,
    C: Coefficient + WritePlain,
    T: Tag,
{
    fn write_plain_cf(&self, out: &mut dyn std::fmt::Write) -> std::fmt::Result {
        if self.is_single_cf() {
            write_plain(self, out)
        } else {
            write!(out, "(")?;
            write_plain(self, out)?;
            write!(out, ")")
        }
    }
    fn write_tex_cf(&self, out: &mut dyn std::fmt::Write) -> std::fmt::Result {
        if self.is_single_cf() {
            write_tex(self, out)
        } else {
            write!(out, "(")?;
            write_tex(self, out)?;
            write!(out, ")")
        }
    }
}

/// Convenience: render `s` as a plain-text `String`.
pub fn to_plain_string<K, C, T>(s: &Series<K, C, T>) -> String
where
    K: Key,
    C: Coefficient + WritePlain,
    T: Tag,
{
    let mut buf = String::new();
    write_plain(s, &mut buf).expect("writing to a String cannot fail");
    buf
}

/// Convenience: render `s` as a TeX `String`.
pub fn to_tex_string<K, C, T>(s: &Series<K, C, T>) -> String
where
    K: Key,
    C: Coefficient + WritePlain,
    T: Tag,
{
    let mut buf = String::new();
    write_tex(s, &mut buf).expect("writing to a String cannot fail");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insert::InsertFlags;
    use crate::key::ExpVecMonomial;
    use crate::symbol::SymbolSet;

    #[test]
    fn empty_series_renders_zero() {
        let s: Series<ExpVecMonomial, i64> = Series::new(SymbolSet::empty());
        assert_eq!(to_plain_string(&s), "0");
    }

    #[test]
    fn negative_term_collapses_plus_minus() {
        let ss = SymbolSet::new(["x"]);
        let mut s: Series<ExpVecMonomial, i64> = Series::new(ss.clone());
        s.add_term(ExpVecMonomial::from_exponents(vec![1]), 1, InsertFlags::accumulate()).unwrap();
        s.add_term(ExpVecMonomial::from_exponents(vec![0]), -3, InsertFlags::accumulate()).unwrap();
        let text = to_plain_string(&s);
        assert!(!text.contains("+ -"));
    }

    #[test]
    fn unit_key_is_omitted() {
        let ss = SymbolSet::new(["x"]);
        let mut s: Series<ExpVecMonomial, i64> = Series::new(ss.clone());
        s.add_term(ExpVecMonomial::unit(&ss), 7, InsertFlags::accumulate()).unwrap();
        assert_eq!(to_plain_string(&s), "7");
    }

    #[test]
    fn truncates_past_limit() {
        let ss = SymbolSet::new(["x"]);
        let mut s: Series<ExpVecMonomial, i64> = Series::new(ss.clone());
        for i in 1..=60i64 {
            s.add_term(ExpVecMonomial::from_exponents(vec![i]), 1, InsertFlags::accumulate()).unwrap();
        }
        let text = to_plain_string(&s);
        assert!(text.ends_with("..."));
    }
}
