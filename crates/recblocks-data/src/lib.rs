//! Data structures and feature construction for the recblocks pipeline.
//!
//! This crate provides the tabular building blocks shared by every pipeline
//! stage: raw [`Interaction`] rows, id-to-index bijections ([`IdIndex`]),
//! the sparse user-item [`InteractionMatrix`], the dense row-major
//! [`DenseMatrix`] used for design and prediction matrices, and the
//! [`FeatureBuilder`] that turns interactions into the fixed-order numeric
//! feature rows consumed by pairwise regression-style recommenders.
//!
//! # Overview
//!
//! ```
//! use recblocks_data::{Interaction, InteractionMatrix};
//!
//! let rows = vec![
//!     Interaction::new(10, 100, 4.0, 1),
//!     Interaction::new(10, 101, 3.0, 2),
//!     Interaction::new(11, 100, 5.0, 3),
//! ];
//!
//! let matrix = InteractionMatrix::from_interactions(&rows);
//! assert_eq!(matrix.shape(), (2, 2));
//! assert_eq!(matrix.nnz(), 3);
//! ```
//!
//! # Modules
//!
//! - [`interaction`] - The raw `(user, item, rating, timestamp)` record
//! - [`id_index`] - Bijections between external ids and contiguous indices
//! - [`matrix`] - Sparse interaction matrix with duplicate accumulation
//! - [`dense`] - Dense row-major matrix for features and predictions
//! - [`features`] - Design-matrix construction for regression recommenders

pub mod dense;
pub mod error;
pub mod features;
pub mod id_index;
pub mod interaction;
pub mod matrix;

pub use dense::DenseMatrix;
pub use error::{DataError, Result};
pub use features::{FeatureBuilder, FeatureModel, FeatureTable, GroupStats};
pub use id_index::IdIndex;
pub use interaction::Interaction;
pub use matrix::InteractionMatrix;
