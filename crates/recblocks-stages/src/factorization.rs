//! Matrix factorization stage.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use recblocks_core::{
    parse_config, BlockSchema, Inputs, ModelArtifact, ParamMap, Payload, Stage, StageError,
    StageResult,
};
use recblocks_data::InteractionMatrix;

use crate::scorers::Factorizer;
use crate::util::training_rows;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct FactorizationConfig {
    method: String,
    n_factors: usize,
}

impl Default for FactorizationConfig {
    fn default() -> Self {
        Self {
            method: "svd".to_string(),
            n_factors: 100,
        }
    }
}

/// Trains a latent-factor model through a black-box [`Factorizer`].
///
/// The requested factor count is clamped below the smaller matrix dimension
/// before the factorizer runs; a matrix too small to carry even one factor
/// is an execution error.
pub struct FactorizationStage {
    factorizer: Arc<dyn Factorizer>,
}

impl FactorizationStage {
    /// Creates the stage around a factorizer implementation.
    pub fn new(factorizer: Arc<dyn Factorizer>) -> Self {
        Self { factorizer }
    }
}

impl Stage for FactorizationStage {
    fn block_type(&self) -> &'static str {
        "matrix-factorization"
    }

    fn validate(&self, params: &ParamMap) -> Vec<String> {
        let config: FactorizationConfig = match parse_config(params) {
            Ok(config) => config,
            Err(msg) => return vec![msg],
        };
        let mut errors = Vec::new();
        if config.n_factors == 0 {
            errors.push("n_factors must be at least 1".to_string());
        }
        if config.method.is_empty() {
            errors.push("method must not be empty".to_string());
        }
        errors
    }

    fn run(&mut self, params: &ParamMap, inputs: &Inputs) -> Result<StageResult, StageError> {
        let config: FactorizationConfig = parse_config(params).map_err(StageError::execution)?;

        let rows = training_rows(inputs)?;
        if rows.is_empty() {
            return Err(StageError::execution("Cannot train on an empty dataset"));
        }

        let matrix = InteractionMatrix::from_interactions(&rows);
        let (n_users, n_items) = matrix.shape();
        let max_rank = n_users.min(n_items).saturating_sub(1);
        if max_rank == 0 {
            return Err(StageError::execution(format!(
                "Matrix {n_users}x{n_items} is too small to factorize"
            )));
        }
        let n_factors = config.n_factors.min(max_rank);

        let factorization = self.factorizer.factorize(&matrix, n_factors)?;

        let artifact = ModelArtifact {
            kind: "matrix-factorization".to_string(),
            predictions: Some(factorization.predictions),
            user_index: matrix.user_index().clone(),
            item_index: matrix.item_index().clone(),
        };

        Ok(StageResult::new()
            .with_metric("method", config.method)
            .with_metric("n_factors", n_factors)
            .with_metric(
                "user_factors_shape",
                json!([
                    factorization.user_factors.n_rows(),
                    factorization.user_factors.n_cols()
                ]),
            )
            .with_metric(
                "item_factors_shape",
                json!([
                    factorization.item_factors.n_rows(),
                    factorization.item_factors.n_cols()
                ]),
            )
            .with_data("model", Payload::Model(Arc::new(artifact))))
    }

    fn schema(&self) -> BlockSchema {
        BlockSchema::new("matrix-factorization")
            .input("split-data", "split", false)
            .input("processed-data", "rows", false)
            .output("model", "model")
            .config("method", "string", Some(json!("svd")))
            .config("n_factors", "int", Some(json!(100)))
    }
}
