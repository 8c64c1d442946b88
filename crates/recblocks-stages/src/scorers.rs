//! Black-box model capability boundaries for similarity and factorization
//! stages.
//!
//! Concrete similarity computations (cosine collaborative filtering) and
//! factorizations (truncated SVD and friends) are external collaborators.
//! The stages only hand them the sparse interaction matrix and receive a
//! dense reconstruction back.

use serde::{Deserialize, Serialize};

use recblocks_data::{DenseMatrix, InteractionMatrix};
use recblocks_eval::EstimatorError;

/// Orientation of a similarity-based collaborative filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimilarityKind {
    /// Similarities between user rows.
    UserBased,
    /// Similarities between item columns.
    ItemBased,
}

impl SimilarityKind {
    /// Parses the configuration string form.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "user-based" => Some(Self::UserBased),
            "item-based" => Some(Self::ItemBased),
            _ => None,
        }
    }

    /// Returns the configuration string form.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserBased => "user-based",
            Self::ItemBased => "item-based",
        }
    }
}

/// A black-box similarity-based collaborative filtering capability.
///
/// Given the interaction matrix, produces the dense prediction matrix over
/// the same index space.
pub trait SimilarityScorer: Send + Sync {
    /// Fits on the matrix and reconstructs predictions for every cell.
    fn fit_predict(
        &self,
        matrix: &InteractionMatrix,
        kind: SimilarityKind,
    ) -> Result<DenseMatrix, EstimatorError>;
}

/// The result of a black-box factorization.
#[derive(Debug, Clone)]
pub struct Factorization {
    /// `n_users x n_factors` user factor matrix.
    pub user_factors: DenseMatrix,
    /// `n_items x n_factors` item factor matrix.
    pub item_factors: DenseMatrix,
    /// Dense reconstruction over the full index space.
    pub predictions: DenseMatrix,
}

/// A black-box matrix factorization capability.
pub trait Factorizer: Send + Sync {
    /// Factorizes the matrix into `n_factors` latent dimensions.
    ///
    /// Callers clamp `n_factors` below the smaller matrix dimension before
    /// calling.
    fn factorize(
        &self,
        matrix: &InteractionMatrix,
        n_factors: usize,
    ) -> Result<Factorization, EstimatorError>;
}
