//! Error categories shared across the crate.
//!
//! Three kinds, matching the original library's exception hierarchy:
//! an incompatible key or missing evaluation binding is an
//! [`SeriesError::InvalidArgument`]; a capacity or range violation is an
//! [`SeriesError::Overflow`]; a segmentation request outside the allowed
//! range is an [`SeriesError::OutOfRange`]. Every variant names the
//! operation that failed so callers can build useful diagnostics without
//! re-deriving context from a bare message.

/// The single error type returned by fallible operations in this crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SeriesError {
    /// A key was incompatible with the ambient symbol set, an evaluation
    /// map omitted a required symbol, an exponent could not be converted
    /// to a non-negative integer, or a binary operator was asked to
    /// reconcile operand shapes it cannot.
    #[error("invalid argument in `{op}`: {detail}")]
    InvalidArgument {
        /// Name of the operation that rejected its input.
        op: &'static str,
        /// Human-readable detail (affected symbols, etc.).
        detail: String,
    },
    /// A sub-table capacity limit was exceeded, a monomial range-overflow
    /// pre-check failed, or a degree accumulator overflowed.
    #[error("overflow in `{op}`: {detail}")]
    Overflow {
        /// Name of the operation that overflowed.
        op: &'static str,
        /// Human-readable detail (limit, sub-table index, etc.).
        detail: String,
    },
    /// A segmentation count exceeded `Series::MAX_LOG2_SEGMENTS`.
    #[error("out of range in `{op}`: requested {requested}, limit {limit}")]
    OutOfRange {
        /// Name of the operation that rejected the value.
        op: &'static str,
        /// The limit that was exceeded.
        limit: u32,
        /// The value that was requested.
        requested: u32,
    },
}

/// Convenience alias used throughout the crate's public API.
pub type Result<T> = ::std::result::Result<T, SeriesError>;

impl SeriesError {
    pub(crate) fn invalid(op: &'static str, detail: impl Into<String>) -> Self {
        SeriesError::InvalidArgument { op, detail: detail.into() }
    }

    pub(crate) fn overflow(op: &'static str, detail: impl Into<String>) -> Self {
        SeriesError::Overflow { op, detail: detail.into() }
    }

    pub(crate) fn out_of_range(op: &'static str, limit: u32, requested: u32) -> Self {
        SeriesError::OutOfRange { op, limit, requested }
    }
}
