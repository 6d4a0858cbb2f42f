//! The coefficient capability trait and the concrete coefficient types
//! shipped by this crate.
//!
//! `spec.md` §2 item 3 specifies the ring operations a coefficient type `C`
//! must support: in-place add/sub (both by value and by reference),
//! negation, a zero test, exact conversion from `i64`, and (optionally)
//! hashing and a byte-size report. Ranks compose: a series whose
//! coefficient type is itself a series has rank `rank(C) + 1` — see
//! [`crate::rank::Ranked`].

use std::fmt::Debug;
use std::ops::Neg;

/// Ring operations required of every coefficient type.
///
/// Implemented here for the crate's three vocabulary coefficient types
/// (`i64`, [`RationalCf`], [`FloatCf`]) and, recursively, for
/// `Series<K, C, Tag>` itself (see `crate::series`), which is how rank
/// composition ("a series of series") is expressed in this crate.
pub trait Coefficient:
    Clone + Debug + PartialEq + Neg<Output = Self> + Send + Sync + 'static
{
    /// `true` iff `self` is the additive identity.
    fn is_zero(&self) -> bool;

    /// The additive identity.
    fn zero() -> Self;

    /// The multiplicative identity.
    fn one() -> Self;

    /// Exact conversion from a signed integer. Every vocabulary coefficient
    /// type in this crate can represent any `i64` exactly.
    fn from_i64(n: i64) -> Self;

    /// `self += other`.
    fn add_assign_ref(&mut self, other: &Self);
    /// `self -= other`.
    fn sub_assign_ref(&mut self, other: &Self);
    /// `self *= other`.
    fn mul_assign_ref(&mut self, other: &Self);

    /// Ring multiplication by value (used when one operand can be
    /// consumed), defaulting to the by-reference form.
    fn mul(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.mul_assign_ref(other);
        out
    }

    /// Division, used only by the scalar-division direction of the binary
    /// operator dispatch (`spec.md` §4.4, `÷` with `rank(a) > rank(b)`).
    /// Returns `None` if `other` is zero or the division is inexact for
    /// types (like `i64`) that cannot represent the exact quotient.
    fn checked_div(&self, other: &Self) -> Option<Self>;

    /// Optional: a stable hash contribution. Coefficient types that cannot
    /// be hashed meaningfully (e.g. approximate floats) return `None`,
    /// which disables coefficient-sensitive cache paths without being a
    /// hard error — ranks/keys are always sufficient to route operations.
    fn hash_contribution(&self) -> Option<u64> {
        None
    }

    /// Optional: approximate byte footprint, for `Series::byte_size`
    /// (`spec.md` §2 item 3, "byte-size reporting (optional)"). Defaults to
    /// the type's stack size.
    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

impl Coefficient for i64 {
    fn is_zero(&self) -> bool {
        *self == 0
    }
    fn zero() -> Self {
        0
    }
    fn one() -> Self {
        1
    }
    fn from_i64(n: i64) -> Self {
        n
    }
    fn add_assign_ref(&mut self, other: &Self) {
        *self += *other;
    }
    fn sub_assign_ref(&mut self, other: &Self) {
        *self -= *other;
    }
    fn mul_assign_ref(&mut self, other: &Self) {
        *self *= *other;
    }
    fn checked_div(&self, other: &Self) -> Option<Self> {
        if *other == 0 || self % other != 0 {
            None
        } else {
            Some(self / other)
        }
    }
    fn hash_contribution(&self) -> Option<u64> {
        Some(crate::hash::mix(self))
    }
}

/// An exact arbitrary-precision rational coefficient, built on
/// `num-rational`/`num-bigint` (the same arbitrary-precision stack used by
/// `examples/prospectorengine-prospector-btc/libs/core/math-engine`'s test
/// suite).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RationalCf(pub num_rational::BigRational);

impl RationalCf {
    /// Construct from a numerator/denominator pair of `i64`s.
    pub fn new(numer: i64, denom: i64) -> Self {
        RationalCf(num_rational::BigRational::new(numer.into(), denom.into()))
    }
}

impl Neg for RationalCf {
    type Output = Self;
    fn neg(self) -> Self {
        RationalCf(-self.0)
    }
}

impl Coefficient for RationalCf {
    fn is_zero(&self) -> bool {
        num_traits::Zero::is_zero(&self.0)
    }
    fn zero() -> Self {
        RationalCf(num_traits::Zero::zero())
    }
    fn one() -> Self {
        RationalCf(num_traits::One::one())
    }
    fn from_i64(n: i64) -> Self {
        RationalCf(num_rational::BigRational::from_integer(n.into()))
    }
    fn add_assign_ref(&mut self, other: &Self) {
        self.0 += &other.0;
    }
    fn sub_assign_ref(&mut self, other: &Self) {
        self.0 -= &other.0;
    }
    fn mul_assign_ref(&mut self, other: &Self) {
        self.0 *= &other.0;
    }
    fn checked_div(&self, other: &Self) -> Option<Self> {
        if num_traits::Zero::is_zero(&other.0) {
            None
        } else {
            Some(RationalCf(&self.0 / &other.0))
        }
    }
    fn hash_contribution(&self) -> Option<u64> {
        Some(crate::hash::mix(&self.0.to_string()))
    }
    fn byte_size(&self) -> usize {
        // BigRational's heap digits aren't introspectable from the outside;
        // approximate with the stack footprint, matching the "optional,
        // best-effort diagnostic" framing of the byte-size contract.
        std::mem::size_of::<Self>()
    }
}

/// An arbitrary-precision-*flavored* floating-point coefficient.
///
/// This wraps `f64` rather than vendoring an MPFR binding: no crate in this
/// pack's dependency set provides arbitrary-precision binary floats (see
/// `DESIGN.md`), and introducing one wholesale to satisfy a single example
/// coefficient type would violate the "never fabricate dependencies"
/// constraint. `f64` gives the same *algebraic shape* (inexact, rounding,
/// non-exact division undefined) that the spec's truncation/integration
/// exactness checks exercise.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FloatCf(pub f64);

impl Neg for FloatCf {
    type Output = Self;
    fn neg(self) -> Self {
        FloatCf(-self.0)
    }
}

impl Coefficient for FloatCf {
    fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
    fn zero() -> Self {
        FloatCf(0.0)
    }
    fn one() -> Self {
        FloatCf(1.0)
    }
    fn from_i64(n: i64) -> Self {
        FloatCf(n as f64)
    }
    fn add_assign_ref(&mut self, other: &Self) {
        self.0 += other.0;
    }
    fn sub_assign_ref(&mut self, other: &Self) {
        self.0 -= other.0;
    }
    fn mul_assign_ref(&mut self, other: &Self) {
        self.0 *= other.0;
    }
    fn checked_div(&self, other: &Self) -> Option<Self> {
        if other.0 == 0.0 {
            None
        } else {
            Some(FloatCf(self.0 / other.0))
        }
    }
    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i64_ring_ops() {
        let mut a = 3i64;
        a.add_assign_ref(&4);
        assert_eq!(a, 7);
        assert_eq!(Coefficient::checked_div(&7i64, &2i64), None);
        assert_eq!(Coefficient::checked_div(&6i64, &2i64), Some(3));
    }

    #[test]
    fn rational_exact_division() {
        let a = RationalCf::new(1, 3);
        let b = RationalCf::new(1, 6);
        let q = a.checked_div(&b).unwrap();
        assert_eq!(q, RationalCf::new(2, 1));
    }

    #[test]
    fn float_is_zero() {
        assert!(FloatCf(0.0).is_zero());
        assert!(!FloatCf(1e-300).is_zero());
    }
}
