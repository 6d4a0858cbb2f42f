//! Sparse multivariate series over a segmented, open-addressed term table,
//! with generic monomial (`Key`) and coefficient (`Coefficient`) capability
//! traits so the same storage and arithmetic core serves polynomials,
//! Laurent/Puiseux-style series, and nested "series of series" alike.
//!
//! Start with [`series::Series`]; `crate::ops`, `crate::mul`, `crate::pow`,
//! and `crate::calc` provide the arithmetic and calculus built on top of
//! it. [`key::ExpVecMonomial`] and the three coefficient types in
//! `crate::coefficient` (`i64`, [`coefficient::RationalCf`],
//! [`coefficient::FloatCf`]) are this crate's one concrete monomial
//! representation and vocabulary of coefficient rings; bring your own of
//! either by implementing [`key::Key`] / [`coefficient::Coefficient`].
#![forbid(unsafe_code)]

pub mod calc;
pub mod coefficient;
pub mod error;
pub mod fmt;
pub mod hash;
pub mod insert;
pub mod key;
pub mod mul;
pub mod ops;
pub mod persist;
pub mod pow;
pub mod rank;
pub mod series;
pub mod symbol;
pub mod table;

pub use coefficient::{Coefficient, FloatCf, RationalCf};
pub use error::{Result, SeriesError};
pub use insert::{InsertFlags, Sign};
pub use key::{ExpVecMonomial, Key, RangeChecked};
pub use pow::PowerCache;
pub use rank::Ranked;
pub use series::{Series, Tag};
pub use symbol::{InsertionMap, SymbolSet};
pub use table::SegmentedTable;
