//! Memory-bounded reconstruction of the full user-item prediction matrix.

use rayon::prelude::*;
use recblocks_data::{DenseMatrix, FeatureModel};

use crate::error::{EvalError, Result};
use crate::estimator::Estimator;

/// Default number of `(user, item)` pairs scored per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Reconstructs a dense `n_users x n_items` prediction matrix without ever
/// holding the full candidate feature matrix in memory.
///
/// Pairs are enumerated in a fixed row-major order (all items for user 0,
/// then user 1, and so on) and scored in fixed-size chunks through the
/// external [`Estimator`]. Chunking is purely a memory/throughput
/// optimization: the output is identical for every chunk size, and
/// [`BatchedPredictor::predict_matrix_parallel`] produces the same matrix as
/// the serial path because each chunk writes a disjoint, deterministic cell
/// range.
///
/// # Examples
///
/// ```
/// use recblocks_eval::BatchedPredictor;
///
/// let predictor = BatchedPredictor::new(7);
/// assert_eq!(predictor.chunk_size(), 7);
/// assert_eq!(BatchedPredictor::default().chunk_size(), 10_000);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BatchedPredictor {
    chunk_size: usize,
}

impl Default for BatchedPredictor {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl BatchedPredictor {
    /// Creates a predictor with the given chunk size (clamped to at
    /// least 1).
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Returns the configured chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Reconstructs the full prediction matrix serially.
    ///
    /// Feature rows are built through the scoring-time feature contract
    /// (neutral statistic placeholders), so the estimator sees exactly the
    /// column layout it was fitted with.
    pub fn predict_matrix(
        &self,
        estimator: &dyn Estimator,
        features: &FeatureModel,
    ) -> Result<DenseMatrix> {
        let n_users = features.user_index().len();
        let n_items = features.item_index().len();
        let mut matrix = DenseMatrix::zeros(n_users, n_items);

        let total = n_users * n_items;
        for start in (0..total).step_by(self.chunk_size) {
            let end = (start + self.chunk_size).min(total);
            let scores = score_chunk(estimator, features, n_items, start, end)?;
            // Row-major pair order means chunk p maps straight onto the
            // row-major value buffer.
            matrix.values_mut()[start..end].copy_from_slice(&scores);
        }

        Ok(matrix)
    }

    /// Reconstructs the full prediction matrix with chunks scored in
    /// parallel.
    ///
    /// Chunks carry no cross-chunk state, so this is a pure performance
    /// optimization; results are written back in chunk order and match the
    /// serial path exactly.
    pub fn predict_matrix_parallel(
        &self,
        estimator: &dyn Estimator,
        features: &FeatureModel,
    ) -> Result<DenseMatrix> {
        let n_users = features.user_index().len();
        let n_items = features.item_index().len();
        let mut matrix = DenseMatrix::zeros(n_users, n_items);

        let total = n_users * n_items;
        let starts: Vec<usize> = (0..total).step_by(self.chunk_size).collect();
        let chunks: Vec<(usize, Vec<f64>)> = starts
            .par_iter()
            .map(|&start| {
                let end = (start + self.chunk_size).min(total);
                score_chunk(estimator, features, n_items, start, end)
                    .map(|scores| (start, scores))
            })
            .collect::<Result<_>>()?;

        for (start, scores) in chunks {
            matrix.values_mut()[start..start + scores.len()].copy_from_slice(&scores);
        }

        Ok(matrix)
    }
}

fn score_chunk(
    estimator: &dyn Estimator,
    features: &FeatureModel,
    n_items: usize,
    start: usize,
    end: usize,
) -> Result<Vec<f64>> {
    let pairs: Vec<(usize, usize)> = (start..end).map(|p| (p / n_items, p % n_items)).collect();
    let x = features.scoring_matrix(&pairs);
    let scores = estimator.predict(&x)?;
    if scores.len() != pairs.len() {
        return Err(EvalError::PredictionLength {
            expected: pairs.len(),
            actual: scores.len(),
        });
    }
    Ok(scores)
}
