//! Exercises the `rayon`-backed parallel multiplication kernel
//! (`spec.md` §4.5 "Parallel segmented multiplication") end to end, with
//! `tracing` turned on so the `#[instrument]` span on `mul_parallel` is
//! actually observed rather than silently compiled out — the same
//! `tracing_subscriber::fmt().with_test_writer().try_init()` pattern
//! `examples/prospectorengine-prospector-btc`'s math-engine tests use.

#![cfg(feature = "parallel")]

use obake_series::insert::InsertFlags;
use obake_series::key::ExpVecMonomial;
use obake_series::mul::{mul_parallel, mul_serial};
use obake_series::symbol::SymbolSet;
use obake_series::Series;

fn dense_poly(ss: &SymbolSet, n_terms: i64) -> Series<ExpVecMonomial, i64> {
    let mut s = Series::new(ss.clone());
    for i in 0..n_terms {
        s.add_term(ExpVecMonomial::from_exponents(vec![i, n_terms - i]), i + 1, InsertFlags::accumulate())
            .unwrap();
    }
    s
}

#[test]
fn parallel_multiply_matches_serial() {
    let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).with_test_writer().try_init();

    let ss = SymbolSet::new(["x", "y"]);
    let a = dense_poly(&ss, 40);
    let b = dense_poly(&ss, 40);

    let serial = mul_serial(&a, &b).unwrap();
    let parallel = mul_parallel(&a, &b).unwrap();

    assert_eq!(serial.size(), parallel.size());
    for (k, c) in serial.iter() {
        assert_eq!(parallel.find(k), Some(c));
    }
}
