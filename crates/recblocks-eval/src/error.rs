//! Error types for the recblocks-eval crate.

use thiserror::Error;

use crate::estimator::EstimatorError;

/// The main error type for evaluation and prediction operations.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The external estimator reported a failure.
    #[error("Estimator error: {0}")]
    Estimator(#[from] EstimatorError),

    /// A data-layer operation failed.
    #[error("Data error: {0}")]
    Data(#[from] recblocks_data::DataError),

    /// The estimator returned a prediction vector of the wrong length.
    #[error("Prediction length mismatch: expected {expected}, got {actual}")]
    PredictionLength {
        /// The number of feature rows submitted.
        expected: usize,
        /// The number of predictions returned.
        actual: usize,
    },

    /// An unrecognized metric name was requested.
    #[error("Unknown metric: {name}")]
    UnknownMetric {
        /// The metric name that was not recognized.
        name: String,
    },
}

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
