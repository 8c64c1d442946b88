//! Similarity-based collaborative filtering stage.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use recblocks_core::{
    parse_config, BlockSchema, Inputs, ModelArtifact, ParamMap, Payload, Stage, StageError,
    StageResult,
};
use recblocks_data::InteractionMatrix;

use crate::scorers::{SimilarityKind, SimilarityScorer};
use crate::util::training_rows;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct SimilarityConfig {
    method: String,
    k_neighbors: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            method: "user-based".to_string(),
            k_neighbors: 50,
        }
    }
}

/// Trains a similarity-based collaborative filter through a black-box
/// [`SimilarityScorer`].
///
/// The stage folds the training rows into the sparse interaction matrix,
/// hands it to the scorer, and wraps the dense reconstruction into a model
/// artifact carrying the matrix's first-occurrence id indexes.
pub struct SimilarityStage {
    scorer: Arc<dyn SimilarityScorer>,
}

impl SimilarityStage {
    /// Creates the stage around a scorer implementation.
    pub fn new(scorer: Arc<dyn SimilarityScorer>) -> Self {
        Self { scorer }
    }
}

impl Stage for SimilarityStage {
    fn block_type(&self) -> &'static str {
        "collaborative-filtering"
    }

    fn validate(&self, params: &ParamMap) -> Vec<String> {
        let config: SimilarityConfig = match parse_config(params) {
            Ok(config) => config,
            Err(msg) => return vec![msg],
        };
        let mut errors = Vec::new();
        if SimilarityKind::parse(&config.method).is_none() {
            errors.push(format!("Invalid method: {}", config.method));
        }
        if config.k_neighbors == 0 {
            errors.push("k_neighbors must be at least 1".to_string());
        }
        errors
    }

    fn run(&mut self, params: &ParamMap, inputs: &Inputs) -> Result<StageResult, StageError> {
        let config: SimilarityConfig = parse_config(params).map_err(StageError::execution)?;
        let kind = SimilarityKind::parse(&config.method)
            .ok_or_else(|| StageError::execution(format!("Invalid method: {}", config.method)))?;

        let rows = training_rows(inputs)?;
        if rows.is_empty() {
            return Err(StageError::execution("Cannot train on an empty dataset"));
        }

        let matrix = InteractionMatrix::from_interactions(&rows);
        let (n_users, n_items) = matrix.shape();
        let predictions = self.scorer.fit_predict(&matrix, kind)?;

        let artifact = ModelArtifact {
            kind: "collaborative-filtering".to_string(),
            predictions: Some(predictions),
            user_index: matrix.user_index().clone(),
            item_index: matrix.item_index().clone(),
        };

        let mut result = StageResult::new()
            .with_metric("method", kind.name())
            .with_metric("matrix_shape", json!([n_users, n_items]))
            .with_data("model", Payload::Model(Arc::new(artifact)));
        if let Some(sparsity) = matrix.sparsity() {
            result = result.with_metric("sparsity", sparsity);
        }
        Ok(result)
    }

    fn schema(&self) -> BlockSchema {
        BlockSchema::new("collaborative-filtering")
            .input("split-data", "split", false)
            .input("processed-data", "rows", false)
            .output("model", "model")
            .config_options(
                "method",
                "string",
                Some(json!("user-based")),
                vec!["user-based", "item-based"],
            )
            .config("k_neighbors", "int", Some(json!(50)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recblocks_core::{Block, BlockHarness, BlockStatus};
    use recblocks_data::{DenseMatrix, Interaction};
    use recblocks_eval::EstimatorError;

    /// Reconstructs by densifying the matrix as-is.
    struct IdentityScorer;

    impl SimilarityScorer for IdentityScorer {
        fn fit_predict(
            &self,
            matrix: &InteractionMatrix,
            _kind: SimilarityKind,
        ) -> Result<DenseMatrix, EstimatorError> {
            Ok(matrix.to_dense())
        }
    }

    struct FailingScorer;

    impl SimilarityScorer for FailingScorer {
        fn fit_predict(
            &self,
            _matrix: &InteractionMatrix,
            _kind: SimilarityKind,
        ) -> Result<DenseMatrix, EstimatorError> {
            Err(EstimatorError::new("similarity kernel diverged"))
        }
    }

    fn sample_rows() -> Vec<Interaction> {
        vec![
            Interaction::new(30, 200, 4.0, 0),
            Interaction::new(10, 100, 3.0, 1),
            Interaction::new(30, 100, 5.0, 2),
        ]
    }

    fn run_stage(
        scorer: Arc<dyn SimilarityScorer>,
        params: ParamMap,
    ) -> recblocks_core::BlockOutput {
        let mut inputs = Inputs::new();
        inputs.insert("processed-data", Payload::rows(sample_rows()));
        let mut block = BlockHarness::with_params("cf", SimilarityStage::new(scorer), params);
        block.execute(&inputs)
    }

    #[test]
    fn test_artifact_carries_first_occurrence_indexes() {
        let output = run_stage(Arc::new(IdentityScorer), ParamMap::new());
        assert_eq!(output.status, BlockStatus::Completed);
        assert_eq!(output.metrics["matrix_shape"], json!([2, 2]));

        let model = match &output.data["model"] {
            Payload::Model(model) => Arc::clone(model),
            other => panic!("unexpected payload: {}", other.kind()),
        };
        assert_eq!(model.kind, "collaborative-filtering");
        assert_eq!(model.user_index.ids(), &[30, 10]);
        assert_eq!(model.item_index.ids(), &[200, 100]);
        let predictions = model.predictions.as_ref().unwrap();
        assert_eq!(predictions.get(0, 0), Some(4.0));
    }

    #[test]
    fn test_invalid_method_fails_validation() {
        let mut params = ParamMap::new();
        params.insert("method".into(), json!("graph-based"));
        let output = run_stage(Arc::new(IdentityScorer), params);
        assert_eq!(output.status, BlockStatus::Failed);
        assert_eq!(output.errors, vec!["Invalid method: graph-based".to_string()]);
    }

    #[test]
    fn test_scorer_error_fails_block() {
        let output = run_stage(Arc::new(FailingScorer), ParamMap::new());
        assert_eq!(output.status, BlockStatus::Failed);
        assert!(output.errors[0].contains("similarity kernel diverged"));
    }

    #[test]
    fn test_missing_training_data() {
        let mut block = BlockHarness::new("cf", SimilarityStage::new(Arc::new(IdentityScorer)));
        let output = block.execute(&Inputs::new());
        assert_eq!(output.status, BlockStatus::Failed);
        assert_eq!(output.errors, vec!["Missing training data".to_string()]);
    }
}
