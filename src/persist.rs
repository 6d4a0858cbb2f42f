//! Persisted state layout (`spec.md` §6): `L`, tag, symbol set, then each
//! sub-table as `(n_i, terms...)`, encoded with `serde`/`bincode`.
//!
//! `bincode`'s fixed, order-preserving encoding of a struct's fields is
//! exactly the "ordered byte stream" the spec calls for, so [`Wire`] below
//! is laid out field-for-field in that order and the actual codec work is
//! delegated to `bincode` rather than hand-rolled — the same division of
//! labor `examples/logannye-tinyzkp` uses for its own serialized artifacts
//! (transcript and SRS blobs), which lean on `serde` rather than a custom
//! byte-pusher.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::coefficient::Coefficient;
use crate::error::{Result, SeriesError};
use crate::insert::InsertFlags;
use crate::key::Key;
use crate::series::{Series, Tag};
use crate::symbol::SymbolSet;

const OP: &str = "persist";

#[derive(Serialize, Deserialize)]
struct Wire<K, C, T> {
    log2_size: u32,
    tag: T,
    symbols: Vec<String>,
    // One entry per sub-table, each its own `(count-implied-by-Vec::len, terms)`.
    segments: Vec<Vec<(K, C)>>,
}

/// Serialize `s` to the layout of `spec.md` §6.
pub fn to_bytes<K, C, T>(s: &Series<K, C, T>) -> Result<Vec<u8>>
where
    K: Key + Serialize,
    C: Coefficient + Serialize,
    T: Tag + Serialize,
{
    let table = s.table();
    let segments: Vec<Vec<(K, C)>> = (0..table.n_segments())
        .map(|i| table.segment(i).iter().map(|(k, c)| (k.clone(), c.clone())).collect())
        .collect();
    let wire = Wire::<K, C, T> {
        log2_size: s.n_segments_log2(),
        tag: s.tag().clone(),
        symbols: s.symbol_set().iter().map(str::to_string).collect(),
        segments,
    };
    bincode::serialize(&wire).map_err(|e| SeriesError::invalid(OP, format!("encode failed: {e}")))
}

/// Deserialize a series previously written by [`to_bytes`].
///
/// Term placement is rebuilt through [`Series::add_term`] rather than by
/// forcing each term back into its originally-recorded sub-table index:
/// once `L` and the symbol set are restored, the deterministic hash mixer
/// (`crate::hash::mix`) routes every key to the same sub-table it started
/// in, so re-deriving the index is equivalent to trusting the recorded one
/// and additionally re-validates the encoded state.
pub fn from_bytes<K, C, T>(bytes: &[u8]) -> Result<Series<K, C, T>>
where
    K: Key + DeserializeOwned,
    C: Coefficient + DeserializeOwned,
    T: Tag + DeserializeOwned,
{
    let wire: Wire<K, C, T> =
        bincode::deserialize(bytes).map_err(|e| SeriesError::invalid(OP, format!("decode failed: {e}")))?;
    let symbols: SymbolSet = wire.symbols.into_iter().collect();
    let mut series: Series<K, C, T> = Series::with_tag(symbols, wire.tag);
    series.set_n_segments(wire.log2_size)?;
    for segment in wire.segments {
        for (k, c) in segment {
            series.add_term(k, c, InsertFlags::unique_extend(true))?;
        }
    }
    Ok(series)
}
