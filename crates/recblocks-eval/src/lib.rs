//! Metric computation and model evaluation for the recblocks pipeline.
//!
//! This crate scores recommendation models against held-out interactions.
//! It provides:
//!
//! - [`rating`] - rating-error metrics (RMSE, MAE) over parallel slices
//! - [`ranking`] - ranking metrics (precision/recall/NDCG/MAP/hit-rate at k)
//! - [`estimator`] - the black-box [`Estimator`] boundary trait
//! - [`predictor`] - memory-bounded full-matrix reconstruction
//! - [`evaluate`] - evaluation orchestration over a prediction matrix,
//!   including the placeholder fallback policy
//!
//! # Example
//!
//! ```
//! use recblocks_eval::ranking::{precision_at_k, recall_at_k};
//!
//! let relevant = [1, 3, 5, 7, 9];
//! let ranked = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
//!
//! assert_eq!(precision_at_k(&relevant, &ranked, 5), 0.6);
//! assert_eq!(recall_at_k(&relevant, &ranked, 10), 1.0);
//! ```

pub mod error;
pub mod estimator;
pub mod evaluate;
pub mod predictor;
pub mod ranking;
pub mod rating;

pub use error::{EvalError, Result};
pub use estimator::{Estimator, EstimatorError};
pub use evaluate::{EvaluationReport, MetricKind, RELEVANCE_THRESHOLD};
pub use predictor::BatchedPredictor;
