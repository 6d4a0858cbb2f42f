//! Series rank: the nesting depth of series-within-series.
//!
//! `spec.md` §3 "Series rank": 0 for a non-series coefficient type,
//! `rank(C) + 1` for `Series<K, C, Tag>`. The binary-operator dispatch of
//! §4.4 is a small decision table keyed on the ranks of its two operands;
//! [`Ranked::RANK`] is what that table compares.

/// Types that carry a fixed, compile-time rank.
///
/// Implemented for the crate's vocabulary coefficient types (rank 0) and,
/// recursively, for `Series<K, C, Tag>` (rank `C::RANK + 1`) in
/// `crate::series`.
pub trait Ranked {
    /// Nesting depth: 0 for a scalar coefficient, `inner + 1` for a series
    /// whose coefficient is itself ranked.
    const RANK: u32;
}

impl Ranked for i64 {
    const RANK: u32 = 0;
}
impl Ranked for crate::coefficient::RationalCf {
    const RANK: u32 = 0;
}
impl Ranked for crate::coefficient::FloatCf {
    const RANK: u32 = 0;
}
