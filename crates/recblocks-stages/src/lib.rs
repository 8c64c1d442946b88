//! Stage implementations for the recblocks pipeline.
//!
//! Each module wraps one capability behind the block contract from
//! `recblocks-core`: stages implement [`recblocks_core::Stage`] and are
//! driven through a [`recblocks_core::BlockHarness`]. Wiring between
//! stages is caller-driven: take payloads from one block's output and
//! insert them into the next block's inputs.
//!
//! # Stages
//!
//! - [`source`] - caller-provided rows with optional deterministic sampling
//! - [`split`] - random or temporal train/test partitioning
//! - [`preprocess`] - rating normalization and missing-value fill
//! - [`similarity`] - collaborative filtering via a black-box scorer
//! - [`factorization`] - matrix factorization via a black-box factorizer
//! - [`regression`] - pairwise regression via a black-box estimator, with
//!   batched full-matrix prediction
//! - [`predictions`] - per-user top-k recommendation lists
//! - [`evaluation`] - rating/ranking metrics with the placeholder fallback
//!
//! # Example
//!
//! ```
//! use recblocks_core::{Block, BlockHarness, BlockStatus, Inputs, Payload};
//! use recblocks_data::Interaction;
//! use recblocks_stages::split::SplitStage;
//!
//! let rows: Vec<Interaction> = (0..50)
//!     .map(|i| Interaction::new(i % 10, i % 7, 3.0, i))
//!     .collect();
//!
//! let mut inputs = Inputs::new();
//! inputs.insert("dataframe", Payload::rows(rows));
//!
//! let mut block = BlockHarness::new("split-1", SplitStage::default());
//! let output = block.execute(&inputs);
//! assert_eq!(output.status, BlockStatus::Completed);
//! assert!(output.data.contains_key("train_data"));
//! ```

pub mod evaluation;
pub mod factorization;
pub mod predictions;
pub mod preprocess;
pub mod regression;
pub mod scorers;
pub mod similarity;
pub mod source;
pub mod split;
mod util;

pub use evaluation::EvaluationStage;
pub use factorization::FactorizationStage;
pub use predictions::PredictionsStage;
pub use preprocess::PreprocessStage;
pub use regression::RegressionStage;
pub use scorers::{Factorization, Factorizer, SimilarityKind, SimilarityScorer};
pub use similarity::SimilarityStage;
pub use source::SourceStage;
pub use split::SplitStage;
