//! The process-wide power cache (`spec.md` §4.6): repeated exponentiation
//! of the same series instance is memoized across the process, keyed by a
//! type-erased fingerprint of the base series and the exponent.
//!
//! Grounded on `examples/logannye-tinyzkp`'s `srs_setup.rs`, which caches
//! expensive per-degree setup artifacts behind a `once_cell::sync::Lazy`
//! static rather than recomputing them per call; here the cached artifact
//! is keyed per-`(series type, content fingerprint, exponent)` instead of
//! per-degree.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::coefficient::Coefficient;
use crate::error::Result;
use crate::hash;
use crate::key::{Key, RangeChecked};
use crate::mul::mul_checked;
use crate::series::{Series, Tag};

/// A process-wide memoization table for [`pow`]. Most callers should use
/// [`PowerCache::global`]; an explicit instance is exposed for tests and
/// for callers that want an isolated cache (e.g. to bound its lifetime).
pub struct PowerCache {
    entries: Mutex<HashMap<(TypeId, u64), Box<dyn Any + Send + Sync>>>,
}

impl PowerCache {
    /// A fresh, empty cache.
    pub fn new() -> Self {
        PowerCache { entries: Mutex::new(HashMap::new()) }
    }

    /// The process-wide singleton used by [`pow`].
    pub fn global() -> &'static PowerCache {
        static INSTANCE: Lazy<PowerCache> = Lazy::new(PowerCache::new);
        &INSTANCE
    }

    fn get<K, C, T>(&self, key: u64) -> Option<Series<K, C, T>>
    where
        K: Key,
        C: Coefficient,
        T: Tag,
    {
        let entries = self.entries.lock();
        entries
            .get(&(TypeId::of::<Series<K, C, T>>(), key))
            .and_then(|boxed| boxed.downcast_ref::<Series<K, C, T>>())
            .cloned()
    }

    fn put<K, C, T>(&self, key: u64, value: Series<K, C, T>)
    where
        K: Key,
        C: Coefficient,
        T: Tag,
    {
        let mut entries = self.entries.lock();
        entries.insert((TypeId::of::<Series<K, C, T>>(), key), Box::new(value));
    }
}

impl Default for PowerCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a cache fingerprint for `(base, n)`, or `None` if some coefficient
/// in `base` declines to contribute a hash (`Coefficient::hash_contribution`
/// returns `None`) — in that case [`pow`] simply skips the cache rather
/// than risk conflating series with different, unhashable coefficients
/// under the same key.
fn cache_key<K, C, T>(base: &Series<K, C, T>, n: u64) -> Option<u64>
where
    K: Key,
    C: Coefficient,
{
    let mut acc = hash::mix(&n);
    for (k, c) in base.iter() {
        let ch = c.hash_contribution()?;
        let kh = hash::mix(k);
        acc = hash::combine_unordered(acc, hash::combine_unordered(kh, ch));
    }
    Some(acc)
}

/// `base ^ n` (`spec.md` §4.6), computed by repeated squaring through
/// [`mul_checked`] and memoized in the [`PowerCache`].
pub fn pow<K, C, T>(base: &Series<K, C, T>, n: u64, cache: &PowerCache) -> Result<Series<K, C, T>>
where
    K: RangeChecked,
    C: Coefficient,
    T: Tag,
{
    if n == 0 {
        let mut one = Series::with_tag(base.symbol_set().clone(), base.tag().clone());
        one.set_n_segments(0)?;
        one.add_term(K::unit(base.symbol_set()), C::one(), crate::insert::InsertFlags::unique_extend(true))?;
        return Ok(one);
    }
    if n == 1 {
        return Ok(base.clone());
    }
    if base.is_single_cf() {
        // spec.md §4.6: a single-coefficient base never needs the
        // multiplication kernel — raise its sole coefficient (or `zero()`
        // for the empty series) directly, by repeated squaring over the
        // coefficient ring itself.
        let cf = base.find(&K::unit(base.symbol_set())).cloned().unwrap_or_else(C::zero);
        let mut result_cf = C::one();
        let mut b = cf;
        let mut e = n;
        while e > 0 {
            if e & 1 == 1 {
                result_cf = result_cf.mul(&b);
            }
            e >>= 1;
            if e > 0 {
                b = b.mul(&b);
            }
        }
        let mut out = Series::with_tag(base.symbol_set().clone(), base.tag().clone());
        out.set_n_segments(0)?;
        if !result_cf.is_zero() {
            out.add_term(K::unit(base.symbol_set()), result_cf, crate::insert::InsertFlags::unique_extend(true))?;
        }
        return Ok(out);
    }

    let key = cache_key(base, n);
    if let Some(k) = key {
        if let Some(cached) = cache.get::<K, C, T>(k) {
            return Ok(cached);
        }
    }

    // Left-to-right repeated squaring over the bit pattern of `n`.
    let bits = 64 - n.leading_zeros();
    let mut result: Option<Series<K, C, T>> = None;
    for i in (0..bits).rev() {
        if let Some(r) = result.take() {
            result = Some(mul_checked(&r, &r)?);
        }
        if (n >> i) & 1 == 1 {
            result = Some(match result {
                Some(r) => mul_checked(&r, base)?,
                None => base.clone(),
            });
        }
    }
    let final_result = result.expect("n >= 1 guarantees at least one bit set");

    if let Some(k) = key {
        cache.put(k, final_result.clone());
    }
    Ok(final_result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insert::InsertFlags;
    use crate::key::ExpVecMonomial;
    use crate::symbol::SymbolSet;

    #[test]
    fn pow_matches_repeated_multiplication() {
        let ss = SymbolSet::new(["x"]);
        let mut base: Series<ExpVecMonomial, i64> = Series::new(ss.clone());
        base.add_term(ExpVecMonomial::from_exponents(vec![1]), 1, InsertFlags::accumulate()).unwrap();
        base.add_term(ExpVecMonomial::from_exponents(vec![0]), 1, InsertFlags::accumulate()).unwrap();
        // (x + 1)^3 = x^3 + 3x^2 + 3x + 1
        let cache = PowerCache::new();
        let cubed = pow(&base, 3, &cache).unwrap();
        assert_eq!(*cubed.find(&ExpVecMonomial::from_exponents(vec![3])).unwrap(), 1);
        assert_eq!(*cubed.find(&ExpVecMonomial::from_exponents(vec![2])).unwrap(), 3);
        assert_eq!(*cubed.find(&ExpVecMonomial::from_exponents(vec![1])).unwrap(), 3);
        assert_eq!(*cubed.find(&ExpVecMonomial::from_exponents(vec![0])).unwrap(), 1);
    }

    #[test]
    fn pow_zero_is_one() {
        let ss = SymbolSet::new(["x"]);
        let mut base: Series<ExpVecMonomial, i64> = Series::new(ss.clone());
        base.add_term(ExpVecMonomial::from_exponents(vec![1]), 7, InsertFlags::accumulate()).unwrap();
        let cache = PowerCache::new();
        let one = pow(&base, 0, &cache).unwrap();
        assert!(one.is_single_cf());
        assert_eq!(*one.find(&ExpVecMonomial::unit(&ss)).unwrap(), 1);
    }

    #[test]
    fn pow_of_single_coefficient_skips_the_multiplication_kernel() {
        let ss = SymbolSet::new(["x"]);
        let mut base: Series<ExpVecMonomial, i64> = Series::new(ss.clone());
        base.add_term(ExpVecMonomial::unit(&ss), 5, InsertFlags::accumulate()).unwrap();
        let cache = PowerCache::new();
        let result = pow(&base, 3, &cache).unwrap();
        assert!(result.is_single_cf());
        assert_eq!(*result.find(&ExpVecMonomial::unit(&ss)).unwrap(), 125);
    }

    #[test]
    fn pow_of_empty_base_is_zero() {
        let ss = SymbolSet::new(["x"]);
        let base: Series<ExpVecMonomial, i64> = Series::new(ss.clone());
        let cache = PowerCache::new();
        let result = pow(&base, 4, &cache).unwrap();
        assert_eq!(result.size(), 0);
    }

    #[test]
    fn cache_hits_on_repeated_call() {
        let ss = SymbolSet::new(["x"]);
        let mut base: Series<ExpVecMonomial, i64> = Series::new(ss.clone());
        base.add_term(ExpVecMonomial::from_exponents(vec![1]), 1, InsertFlags::accumulate()).unwrap();
        let cache = PowerCache::new();
        let first = pow(&base, 5, &cache).unwrap();
        let second = pow(&base, 5, &cache).unwrap();
        assert_eq!(first, second);
    }
}
