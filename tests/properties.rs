//! Property-based checks of the algebraic laws `spec.md` §8 calls out
//! ("Laws": commutativity, `a - a` empty, `a * 1 == a`, `a + 0 == a`) plus
//! the truncated-multiply agreement law. Exercised with `proptest` over
//! randomly generated small sparse polynomials in `{x, y}`, the same
//! property-testing approach `examples/prospectorengine-prospector-btc`
//! pulls `proptest` in for.

use obake_series::insert::InsertFlags;
use obake_series::key::ExpVecMonomial;
use obake_series::mul::{mul_serial, mul_truncated_total_degree};
use obake_series::symbol::SymbolSet;
use obake_series::Series;
use proptest::prelude::*;

fn symbols() -> SymbolSet {
    SymbolSet::new(["x", "y"])
}

/// A handful of `(exponent_x, exponent_y, coefficient)` triples, turned
/// into a sparse series by accumulation (so duplicate monomials collapse
/// the way real term insertion would).
fn poly_strategy() -> impl Strategy<Value = Series<ExpVecMonomial, i64>> {
    prop::collection::vec((0i64..4, 0i64..4, -6i64..6), 0..6).prop_map(|terms| {
        let ss = symbols();
        let mut s = Series::new(ss);
        for (ex, ey, c) in terms {
            s.add_term(ExpVecMonomial::from_exponents(vec![ex, ey]), c, InsertFlags::accumulate())
                .unwrap();
        }
        s
    })
}

proptest! {
    #[test]
    fn addition_is_commutative(a in poly_strategy(), b in poly_strategy()) {
        prop_assert_eq!(a.clone() + b.clone(), b + a);
    }

    #[test]
    fn multiplication_is_commutative(a in poly_strategy(), b in poly_strategy()) {
        let ab = mul_serial(&a, &b).unwrap();
        let ba = mul_serial(&b, &a).unwrap();
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn subtracting_self_is_empty(a in poly_strategy()) {
        let zero = a.clone() - a;
        prop_assert!(zero.is_empty());
    }

    #[test]
    fn adding_the_empty_series_is_identity(a in poly_strategy()) {
        let zero: Series<ExpVecMonomial, i64> = Series::new(symbols());
        prop_assert_eq!(a.clone() + zero, a);
    }

    #[test]
    fn multiplying_by_one_is_identity(a in poly_strategy()) {
        let mut one: Series<ExpVecMonomial, i64> = Series::new(symbols());
        one.add_term(ExpVecMonomial::unit(&symbols()), 1, InsertFlags::accumulate()).unwrap();
        let product = mul_serial(&a, &one).unwrap();
        prop_assert_eq!(product, a);
    }

    #[test]
    fn truncated_multiply_matches_post_hoc_truncation(
        a in poly_strategy(),
        b in poly_strategy(),
        limit in 0i64..6,
    ) {
        let full = mul_serial(&a, &b).unwrap();
        let truncated = mul_truncated_total_degree(&a, &b, limit).unwrap();

        // Post-hoc truncate `full` by dropping every term whose degree
        // exceeds `limit`, then compare term-for-term against the direct
        // truncated product (`spec.md` §8 "Truncated multiply satisfies").
        for (k, c) in truncated.iter() {
            let deg: i64 = k.clone().0.iter().sum();
            prop_assert!(deg <= limit);
            prop_assert_eq!(full.find(k), Some(c));
        }
        for (k, _) in full.iter() {
            let deg: i64 = k.clone().0.iter().sum();
            if deg <= limit {
                prop_assert!(truncated.find(k).is_some());
            }
        }
    }
}
