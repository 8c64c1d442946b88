//! Pairwise regression stage with batched full-matrix prediction.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use recblocks_core::{
    parse_config, BlockSchema, Inputs, ModelArtifact, ParamMap, Payload, Stage, StageError,
    StageResult,
};
use recblocks_data::FeatureBuilder;
use recblocks_eval::{BatchedPredictor, Estimator};

use crate::util::training_rows;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RegressionConfig {
    chunk_size: usize,
    parallel: bool,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            chunk_size: recblocks_eval::predictor::DEFAULT_CHUNK_SIZE,
            parallel: false,
        }
    }
}

/// Trains a black-box [`Estimator`] on engineered feature rows, then
/// reconstructs the full prediction matrix in memory-bounded chunks.
///
/// Optional `user-features` and `item-features` table inputs are appended
/// to the base feature columns with left-join semantics. The artifact
/// carries the feature model's sorted id indexes, so the prediction matrix
/// rows follow sorted user order, not first-occurrence order.
pub struct RegressionStage {
    estimator: Box<dyn Estimator>,
}

impl RegressionStage {
    /// Creates the stage around an estimator implementation.
    pub fn new(estimator: Box<dyn Estimator>) -> Self {
        Self { estimator }
    }
}

impl Stage for RegressionStage {
    fn block_type(&self) -> &'static str {
        "regression"
    }

    fn validate(&self, params: &ParamMap) -> Vec<String> {
        let config: RegressionConfig = match parse_config(params) {
            Ok(config) => config,
            Err(msg) => return vec![msg],
        };
        if config.chunk_size == 0 {
            vec!["chunk_size must be at least 1".to_string()]
        } else {
            Vec::new()
        }
    }

    fn run(&mut self, params: &ParamMap, inputs: &Inputs) -> Result<StageResult, StageError> {
        let config: RegressionConfig = parse_config(params).map_err(StageError::execution)?;

        let rows = training_rows(inputs)?;
        let user_meta = inputs.get_table("user-features").map(|t| t.as_ref().clone());
        let item_meta = inputs.get_table("item-features").map(|t| t.as_ref().clone());

        let features = FeatureBuilder::fit(&rows, user_meta, item_meta)?;
        let (x, y) = features.training_matrix(&rows)?;
        self.estimator.fit(&x, &y)?;

        let predictor = BatchedPredictor::new(config.chunk_size);
        let predictions = if config.parallel {
            predictor.predict_matrix_parallel(self.estimator.as_ref(), &features)?
        } else {
            predictor.predict_matrix(self.estimator.as_ref(), &features)?
        };

        let n_users = features.user_index().len();
        let n_items = features.item_index().len();
        let artifact = ModelArtifact {
            kind: "regression".to_string(),
            predictions: Some(predictions),
            user_index: features.user_index().clone(),
            item_index: features.item_index().clone(),
        };

        Ok(StageResult::new()
            .with_metric("n_users", n_users)
            .with_metric("n_items", n_items)
            .with_metric("n_training_samples", rows.len())
            .with_metric("n_features", features.n_features())
            .with_metric("predictions_shape", json!([n_users, n_items]))
            .with_metric("chunk_size", config.chunk_size)
            .with_data("model", Payload::Model(Arc::new(artifact))))
    }

    fn schema(&self) -> BlockSchema {
        BlockSchema::new("regression")
            .input("split-data", "split", false)
            .input("processed-data", "rows", false)
            .input("user-features", "table", false)
            .input("item-features", "table", false)
            .output("model", "model")
            .config(
                "chunk_size",
                "int",
                Some(json!(recblocks_eval::predictor::DEFAULT_CHUNK_SIZE)),
            )
            .config("parallel", "bool", Some(json!(false)))
    }
}
