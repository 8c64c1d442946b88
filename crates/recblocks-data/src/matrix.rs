//! Sparse user-item interaction matrix with coordinate accumulation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dense::DenseMatrix;
use crate::id_index::IdIndex;
use crate::interaction::Interaction;

/// A sparse, index-addressed user-item rating matrix.
///
/// Row and column order follow the FIRST-OCCURRENCE order of each user and
/// item id in the input sequence, not numeric order. This ordering is part
/// of the observable contract: similarity- and factorization-style stages
/// that consume the matrix report shapes derived from it, and re-building
/// the matrix from the same input must reproduce it bit for bit.
///
/// Duplicate `(user, item)` pairs accumulate by addition. Two identical
/// `(user, item, rating)` rows produce a cell holding twice the rating, not
/// the last value. This is an invariant callers must be aware of, not a bug.
///
/// # Examples
///
/// ```
/// use recblocks_data::{Interaction, InteractionMatrix};
///
/// let rows = vec![
///     Interaction::new(7, 100, 2.0, 0),
///     Interaction::new(7, 100, 2.0, 1),
/// ];
/// let m = InteractionMatrix::from_interactions(&rows);
/// assert_eq!(m.get(0, 0), 4.0); // accumulated, not overwritten
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionMatrix {
    user_index: IdIndex,
    item_index: IdIndex,
    entries: BTreeMap<(usize, usize), f64>,
}

impl InteractionMatrix {
    /// Builds the matrix from a sequence of interactions.
    ///
    /// An empty input produces a `0 x 0` matrix.
    pub fn from_interactions(rows: &[Interaction]) -> Self {
        let user_index = IdIndex::first_occurrence(rows.iter().map(|r| r.user_id));
        let item_index = IdIndex::first_occurrence(rows.iter().map(|r| r.item_id));

        let mut entries = BTreeMap::new();
        for row in rows {
            // Both lookups are infallible: the indexes were built from the
            // same rows being folded.
            let u = user_index.index_of(row.user_id).unwrap_or(0);
            let i = item_index.index_of(row.item_id).unwrap_or(0);
            *entries.entry((u, i)).or_insert(0.0) += row.rating;
        }

        Self {
            user_index,
            item_index,
            entries,
        }
    }

    /// Returns the `(n_users, n_items)` shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.user_index.len(), self.item_index.len())
    }

    /// Returns the accumulated rating at `(user_index, item_index)`, or
    /// `0.0` for an empty cell.
    pub fn get(&self, user_index: usize, item_index: usize) -> f64 {
        self.entries
            .get(&(user_index, item_index))
            .copied()
            .unwrap_or(0.0)
    }

    /// Returns the number of non-zero cells after accumulation.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Returns the sparsity `1 - nnz / (n_users * n_items)`, or `None` when
    /// either dimension is empty (the metric is undefined, never a division
    /// by zero).
    pub fn sparsity(&self) -> Option<f64> {
        let (n_users, n_items) = self.shape();
        if n_users == 0 || n_items == 0 {
            return None;
        }
        Some(1.0 - self.nnz() as f64 / (n_users as f64 * n_items as f64))
    }

    /// Returns the user id-to-index map (first-occurrence order).
    pub fn user_index(&self) -> &IdIndex {
        &self.user_index
    }

    /// Returns the item id-to-index map (first-occurrence order).
    pub fn item_index(&self) -> &IdIndex {
        &self.item_index
    }

    /// Iterates over `((user_index, item_index), value)` cells in
    /// row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.entries.iter().map(|(&k, &v)| (k, v))
    }

    /// Materializes the matrix as a dense `n_users x n_items` matrix.
    pub fn to_dense(&self) -> DenseMatrix {
        let (n_users, n_items) = self.shape();
        let mut dense = DenseMatrix::zeros(n_users, n_items);
        for (&(u, i), &v) in &self.entries {
            // In-bounds by construction.
            let _ = dense.set(u, i, v);
        }
        dense
    }
}
