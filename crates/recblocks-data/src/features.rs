//! Design-matrix construction for pairwise regression-style recommenders.
//!
//! The [`FeatureBuilder`] fits a [`FeatureModel`] on training interactions:
//! sorted user/item id indexes, per-group rating statistics, the global mean
//! rating, and the layout of any optional metadata columns. The model then
//! produces feature matrices under two distinct contracts:
//!
//! - [`FeatureModel::training_matrix`] joins the real grouped statistics
//!   onto every training row.
//! - [`FeatureModel::scoring_matrix`] covers arbitrary `(user, item)` index
//!   pairs for full-matrix reconstruction and fills the grouped-statistic
//!   columns with neutral placeholders (`0`, plus the training-time global
//!   mean for the global-mean column).
//!
//! The training/scoring asymmetry is a reproduced behavior of the reference
//! system, kept for output compatibility. Recomputing real statistics at
//! scoring time would change every downstream prediction. Known limitation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dense::DenseMatrix;
use crate::error::{DataError, Result};
use crate::id_index::IdIndex;
use crate::interaction::Interaction;

/// Number of base feature columns before any metadata columns:
/// `[user_index, item_index, user_mean, user_count, user_std,
/// item_mean, item_count, item_std, global_mean]`.
pub const BASE_FEATURE_COLUMNS: usize = 9;

/// Per-group rating statistics: mean, count, and sample standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Mean rating of the group.
    pub mean: f64,
    /// Number of ratings in the group.
    pub count: f64,
    /// Sample standard deviation (`ddof = 1`); `0.0` for groups of size 1.
    pub std: f64,
}

impl GroupStats {
    fn from_ratings(ratings: &[f64]) -> Self {
        let count = ratings.len() as f64;
        let mean = ratings.iter().sum::<f64>() / count;
        let std = if ratings.len() > 1 {
            let ss: f64 = ratings.iter().map(|r| (r - mean) * (r - mean)).sum();
            (ss / (count - 1.0)).sqrt()
        } else {
            0.0
        };
        Self { mean, count, std }
    }
}

/// A named numeric metadata table keyed by an external entity id.
///
/// Used for optional user/item side features that are appended to the base
/// feature columns with left-join semantics: ids absent from the table get
/// `0.0` in every metadata column.
///
/// # Examples
///
/// ```
/// use recblocks_data::FeatureTable;
///
/// let mut table = FeatureTable::new(vec!["age".into(), "region".into()]);
/// table.insert(42, vec![31.0, 2.0]).unwrap();
/// assert_eq!(table.lookup(42), Some(&[31.0, 2.0][..]));
/// assert_eq!(table.lookup(7), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: HashMap<i64, Vec<f64>>,
}

impl FeatureTable {
    /// Creates an empty table with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: HashMap::new(),
        }
    }

    /// Inserts (or replaces) the row for `id`.
    ///
    /// Returns an error if the value count does not match the column count.
    pub fn insert(&mut self, id: i64, values: Vec<f64>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(DataError::LengthMismatch {
                left: values.len(),
                right: self.columns.len(),
                context: "feature table row",
            });
        }
        self.rows.insert(id, values);
        Ok(())
    }

    /// Returns the row for `id`, if present.
    pub fn lookup(&self, id: i64) -> Option<&[f64]> {
        self.rows.get(&id).map(Vec::as_slice)
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of metadata columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns the number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Fits [`FeatureModel`]s on training interactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Fits a feature model: sorted id indexes, grouped statistics, global
    /// mean, and metadata layout.
    ///
    /// Returns an error for an empty training set (the global mean would be
    /// undefined).
    pub fn fit(
        rows: &[Interaction],
        user_meta: Option<FeatureTable>,
        item_meta: Option<FeatureTable>,
    ) -> Result<FeatureModel> {
        if rows.is_empty() {
            return Err(DataError::EmptyDataset {
                context: "feature builder fit".to_string(),
            });
        }

        let user_index = IdIndex::from_sorted(rows.iter().map(|r| r.user_id));
        let item_index = IdIndex::from_sorted(rows.iter().map(|r| r.item_id));

        let user_stats = group_stats(rows.iter().map(|r| (r.user_id, r.rating)));
        let item_stats = group_stats(rows.iter().map(|r| (r.item_id, r.rating)));
        let global_mean = rows.iter().map(|r| r.rating).sum::<f64>() / rows.len() as f64;

        Ok(FeatureModel {
            user_index,
            item_index,
            user_stats,
            item_stats,
            global_mean,
            user_meta,
            item_meta,
        })
    }
}

fn group_stats(pairs: impl Iterator<Item = (i64, f64)>) -> HashMap<i64, GroupStats> {
    let mut grouped: HashMap<i64, Vec<f64>> = HashMap::new();
    for (id, rating) in pairs {
        grouped.entry(id).or_default().push(rating);
    }
    grouped
        .into_iter()
        .map(|(id, ratings)| (id, GroupStats::from_ratings(&ratings)))
        .collect()
}

/// A fitted feature model producing fixed-order feature rows.
///
/// The column order and count are part of the trained estimator's serialized
/// contract: an estimator fitted on `n_features()` columns must always be
/// scored with the same `n_features()` columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureModel {
    user_index: IdIndex,
    item_index: IdIndex,
    user_stats: HashMap<i64, GroupStats>,
    item_stats: HashMap<i64, GroupStats>,
    global_mean: f64,
    user_meta: Option<FeatureTable>,
    item_meta: Option<FeatureTable>,
}

impl FeatureModel {
    /// Returns the sorted user id index captured at fit time.
    pub fn user_index(&self) -> &IdIndex {
        &self.user_index
    }

    /// Returns the sorted item id index captured at fit time.
    pub fn item_index(&self) -> &IdIndex {
        &self.item_index
    }

    /// Returns the dataset-wide mean rating captured at fit time.
    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    /// Returns the total feature column count (base columns plus metadata).
    pub fn n_features(&self) -> usize {
        BASE_FEATURE_COLUMNS
            + self.user_meta.as_ref().map_or(0, FeatureTable::n_columns)
            + self.item_meta.as_ref().map_or(0, FeatureTable::n_columns)
    }

    /// Builds the training design matrix and target vector, one feature row
    /// per interaction in input order.
    ///
    /// Grouped-statistic columns carry the real fitted statistics; metadata
    /// columns are left-joined with missing values filled with `0.0`.
    /// Returns an error if a row references an id outside the fitted
    /// indexes.
    pub fn training_matrix(&self, rows: &[Interaction]) -> Result<(DenseMatrix, Vec<f64>)> {
        let n_cols = self.n_features();
        let mut values = Vec::with_capacity(rows.len() * n_cols);
        let mut targets = Vec::with_capacity(rows.len());

        for row in rows {
            let u = self
                .user_index
                .index_of(row.user_id)
                .ok_or(DataError::UnknownId {
                    entity: "user",
                    id: row.user_id,
                })?;
            let i = self
                .item_index
                .index_of(row.item_id)
                .ok_or(DataError::UnknownId {
                    entity: "item",
                    id: row.item_id,
                })?;

            let us = self.user_stats.get(&row.user_id).copied().unwrap_or(GroupStats {
                mean: 0.0,
                count: 0.0,
                std: 0.0,
            });
            let is = self.item_stats.get(&row.item_id).copied().unwrap_or(GroupStats {
                mean: 0.0,
                count: 0.0,
                std: 0.0,
            });

            values.push(u as f64);
            values.push(i as f64);
            values.push(us.mean);
            values.push(us.count);
            values.push(us.std);
            values.push(is.mean);
            values.push(is.count);
            values.push(is.std);
            values.push(self.global_mean);

            if let Some(meta) = &self.user_meta {
                push_meta(&mut values, meta, row.user_id);
            }
            if let Some(meta) = &self.item_meta {
                push_meta(&mut values, meta, row.item_id);
            }

            targets.push(row.rating);
        }

        let matrix = DenseMatrix::from_values(rows.len(), n_cols, values)?;
        Ok((matrix, targets))
    }

    /// Builds the scoring feature matrix for arbitrary
    /// `(user_index, item_index)` pairs.
    ///
    /// Grouped-statistic columns are filled with `0.0` and the global-mean
    /// column with the training-time global mean; metadata columns are
    /// `0.0`. This mirrors the reference scoring path rather than
    /// recomputing real statistics per candidate.
    pub fn scoring_matrix(&self, pairs: &[(usize, usize)]) -> DenseMatrix {
        let n_cols = self.n_features();
        let mut values = Vec::with_capacity(pairs.len() * n_cols);

        for &(u, i) in pairs {
            values.push(u as f64);
            values.push(i as f64);
            // Neutral placeholders for user and item statistics.
            values.extend_from_slice(&[0.0; 6]);
            values.push(self.global_mean);
            for _ in BASE_FEATURE_COLUMNS..n_cols {
                values.push(0.0);
            }
        }

        // Length is correct by construction.
        DenseMatrix::from_values(pairs.len(), n_cols, values)
            .unwrap_or_else(|_| DenseMatrix::zeros(pairs.len(), n_cols))
    }
}

fn push_meta(values: &mut Vec<f64>, meta: &FeatureTable, id: i64) {
    match meta.lookup(id) {
        Some(row) => values.extend_from_slice(row),
        None => values.extend(std::iter::repeat(0.0).take(meta.n_columns())),
    }
}
