//! Bijections between external ids and contiguous matrix indices.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A bijection between a set of distinct external ids and the contiguous
/// index range `[0, n)`.
///
/// Two constructions exist and both are used by the pipeline:
///
/// - [`IdIndex::from_sorted`] assigns indices by ascending id order. This is
///   the construction used by the feature builder and regression model maps.
/// - [`IdIndex::first_occurrence`] assigns indices in the order each id is
///   first seen in the input sequence. This is the construction used by the
///   sparse interaction matrix builder, and it governs matrix row/column
///   order.
///
/// An `IdIndex` is immutable after construction and owned by the block
/// execution that built it.
///
/// # Examples
///
/// ```
/// use recblocks_data::IdIndex;
///
/// let sorted = IdIndex::from_sorted([30, 10, 20, 10]);
/// assert_eq!(sorted.index_of(10), Some(0));
/// assert_eq!(sorted.index_of(30), Some(2));
///
/// let seen = IdIndex::first_occurrence([30, 10, 20, 10]);
/// assert_eq!(seen.index_of(30), Some(0));
/// assert_eq!(seen.index_of(10), Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdIndex {
    ids: Vec<i64>,
    positions: HashMap<i64, usize>,
}

impl IdIndex {
    /// Builds an index over the distinct ids in `ids`, ordered ascending.
    pub fn from_sorted(ids: impl IntoIterator<Item = i64>) -> Self {
        let mut distinct: Vec<i64> = ids.into_iter().collect();
        distinct.sort_unstable();
        distinct.dedup();
        Self::from_ordered(distinct)
    }

    /// Builds an index over the distinct ids in `ids`, ordered by first
    /// occurrence in the input sequence.
    pub fn first_occurrence(ids: impl IntoIterator<Item = i64>) -> Self {
        let mut ordered = Vec::new();
        let mut positions = HashMap::new();
        for id in ids {
            if !positions.contains_key(&id) {
                positions.insert(id, ordered.len());
                ordered.push(id);
            }
        }
        Self {
            ids: ordered,
            positions,
        }
    }

    fn from_ordered(ids: Vec<i64>) -> Self {
        let positions = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        Self { ids, positions }
    }

    /// Returns the contiguous index assigned to `id`, if present.
    pub fn index_of(&self, id: i64) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Returns the external id at contiguous index `index`, if in range.
    pub fn id_at(&self, index: usize) -> Option<i64> {
        self.ids.get(index).copied()
    }

    /// Returns the ids in index order.
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Returns the number of distinct ids in the index.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the index contains no ids.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
