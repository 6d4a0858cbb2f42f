//! Symbol sets: the ordered, deduplicated variable-name sequences that give
//! meaning to every key stored in a [`crate::series::Series`].
//!
//! A symbol set never appears inside a key or coefficient — every key
//! operation takes the ambient symbol set as an explicit parameter (see
//! `spec.md` §2 item 2). This module owns only the set itself and the
//! *merge* algorithm that reconciles two sets before a binary operation.

use std::fmt;
use std::sync::Arc;

/// An ordered sequence of distinct variable names.
///
/// Cheaply cloneable: the name list is reference-counted, since the same
/// symbol set is shared by every term in a series and frequently by both
/// operands of a binary operation.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SymbolSet {
    names: Arc<Vec<String>>,
}

/// Describes, for one source symbol set, where the names newly introduced
/// by a merge must be inserted.
///
/// `insertions[i]` lists the names of the merged set that belong
/// immediately before position `i` of the source set; `insertions[len]`
/// (one past the last valid index) holds names inserted after the last
/// element. An empty map (all entries empty) means the source set already
/// equals the merged set.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InsertionMap {
    insertions: Vec<Vec<String>>,
}

impl InsertionMap {
    /// True iff this map performs no insertions at all, i.e. the source set
    /// the map was computed for is equal to the merged set.
    pub fn is_empty(&self) -> bool {
        self.insertions.iter().all(|v| v.is_empty())
    }

    /// Names to be inserted immediately before `position` in the source set
    /// (`position == source.len()` designates insertion after the end).
    pub fn insertions_before(&self, position: usize) -> &[String] {
        self.insertions.get(position).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Number of source positions this map covers (`source.len() + 1`).
    pub fn len(&self) -> usize {
        self.insertions.len()
    }
}

impl SymbolSet {
    /// Build a symbol set from an arbitrary iterator of names, sorting and
    /// deduplicating them.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut v: Vec<String> = names.into_iter().map(Into::into).collect();
        v.sort();
        v.dedup();
        SymbolSet { names: Arc::new(v) }
    }

    /// The empty symbol set.
    pub fn empty() -> Self {
        SymbolSet { names: Arc::new(Vec::new()) }
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True iff this set has no symbols.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The name at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|s| s.as_str())
    }

    /// Iterate over the names in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    /// Binary-search for `name`, returning its index if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|s| s.as_str().cmp(name)).ok()
    }

    /// True iff `other` is a (non-strict) subset of `self`.
    pub fn contains_set(&self, other: &SymbolSet) -> bool {
        other.iter().all(|n| self.index_of(n).is_some())
    }

    /// Merge `self` with `other`, returning the union together with the two
    /// insertion maps describing how each input is extended to reach it.
    ///
    /// This is the algorithm of `spec.md` §3 "Symbol set": `U = sort(A ∪ B)`
    /// with duplicates removed; `mA`/`mB` record, per insertion point in `A`
    /// (resp. `B`), the run of new names from `U` that land there.
    pub fn merge(&self, other: &SymbolSet) -> (SymbolSet, InsertionMap, InsertionMap) {
        let union = SymbolSet::new(self.iter().chain(other.iter()));
        let map_a = Self::build_insertion_map(self, &union);
        let map_b = Self::build_insertion_map(other, &union);
        (union, map_a, map_b)
    }

    fn build_insertion_map(source: &SymbolSet, union: &SymbolSet) -> InsertionMap {
        let mut insertions = vec![Vec::new(); source.len() + 1];
        let mut src_idx = 0usize;
        for name in union.iter() {
            // Advance src_idx past names equal to `name`; if the source
            // doesn't have it at the current position, it's a new name to
            // be inserted right before src_idx.
            if src_idx < source.len() && source.get(src_idx) == Some(name) {
                src_idx += 1;
            } else {
                insertions[src_idx].push(name.to_string());
            }
        }
        InsertionMap { insertions }
    }
}

impl fmt::Display for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.names.join(", "))
    }
}

impl<S: Into<String>> FromIterator<S> for SymbolSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        SymbolSet::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_disjoint() {
        let a = SymbolSet::new(["x"]);
        let b = SymbolSet::new(["y"]);
        let (u, ma, mb) = a.merge(&b);
        assert_eq!(u.iter().collect::<Vec<_>>(), vec!["x", "y"]);
        // x is at position 0 in U; it was already at position 0 in A, so
        // nothing is inserted before it. y is new and lands before A's
        // one-past-the-end position.
        assert!(ma.insertions_before(0).is_empty());
        assert_eq!(ma.insertions_before(1), ["y".to_string()]);
        assert_eq!(mb.insertions_before(0), ["x".to_string()]);
        assert!(!ma.is_empty());
        assert!(!mb.is_empty());
    }

    #[test]
    fn merge_identical_sets_is_empty_map() {
        let a = SymbolSet::new(["x", "y"]);
        let b = SymbolSet::new(["y", "x"]);
        let (u, ma, mb) = a.merge(&b);
        assert_eq!(u, a);
        assert!(ma.is_empty());
        assert!(mb.is_empty());
    }

    #[test]
    fn merge_subset() {
        let a = SymbolSet::new(["x", "z"]);
        let b = SymbolSet::new(["x", "y", "z"]);
        let (u, ma, mb) = a.merge(&b);
        assert_eq!(u, b);
        assert!(mb.is_empty());
        assert!(!ma.is_empty());
        assert_eq!(ma.insertions_before(1), ["y".to_string()]);
    }

    #[test]
    fn interleaved_merge() {
        let a = SymbolSet::new(["b", "d"]);
        let b = SymbolSet::new(["a", "c", "e"]);
        let (u, ma, _mb) = a.merge(&b);
        assert_eq!(u.iter().collect::<Vec<_>>(), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(ma.insertions_before(0), ["a".to_string()]);
        assert_eq!(ma.insertions_before(1), ["c".to_string()]);
        assert_eq!(ma.insertions_before(2), ["e".to_string()]);
    }
}
