//! The black-box estimator boundary.
//!
//! Concrete statistical estimators (gradient-boosted trees, random-forest
//! regression, and friends) live outside this workspace. The pipeline only
//! ever sees them through [`Estimator`]: fit on a design matrix and a target
//! vector, then batch-predict on feature matrices with the same column
//! layout. An estimator is assumed stateless with respect to call order
//! beyond its own fitted parameters.

use recblocks_data::DenseMatrix;
use thiserror::Error;

/// An error reported by an external estimator implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EstimatorError {
    /// Human-readable description of the failure.
    pub message: String,
}

impl EstimatorError {
    /// Creates an estimator error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A trainable regression capability supplied by an external collaborator.
///
/// The feature column layout used at `fit` time is a contract: `predict`
/// must always be called with matrices of the same column count.
pub trait Estimator: Send + Sync {
    /// Fits the estimator on a design matrix and parallel target vector.
    fn fit(&mut self, x: &DenseMatrix, y: &[f64]) -> Result<(), EstimatorError>;

    /// Predicts one value per row of `x`.
    fn predict(&self, x: &DenseMatrix) -> Result<Vec<f64>, EstimatorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimator_error_message() {
        let err = EstimatorError::new("fit diverged");
        assert_eq!(err.to_string(), "fit diverged");
    }
}
