//! Per-user top-k recommendation lists from a trained model.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use recblocks_core::{
    parse_config, BlockSchema, Inputs, ParamMap, Payload, Recommendations, Stage, StageError,
    StageResult,
};
use recblocks_eval::evaluate::top_k_indices;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct PredictionsConfig {
    top_k: usize,
}

impl Default for PredictionsConfig {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

/// Extracts each user's `top_k` highest-scored items from the model's
/// prediction matrix.
///
/// Lists are keyed by external user id and hold `(item_id, score)` pairs in
/// descending score order, ties broken by ascending matrix column. A model
/// without a prediction matrix yields an empty recommendation map and a
/// warning rather than a failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionsStage;

impl Stage for PredictionsStage {
    fn block_type(&self) -> &'static str {
        "predictions"
    }

    fn validate(&self, params: &ParamMap) -> Vec<String> {
        let config: PredictionsConfig = match parse_config(params) {
            Ok(config) => config,
            Err(msg) => return vec![msg],
        };
        if config.top_k == 0 {
            vec!["top_k must be at least 1".to_string()]
        } else {
            Vec::new()
        }
    }

    fn run(&mut self, params: &ParamMap, inputs: &Inputs) -> Result<StageResult, StageError> {
        let config: PredictionsConfig = parse_config(params).map_err(StageError::execution)?;
        let model = inputs.require_model("model")?;

        let Some(predictions) = &model.predictions else {
            warn!(model_kind = %model.kind, "model has no prediction matrix");
            return Ok(StageResult::new()
                .with_metric("n_users", 0)
                .with_metric("top_k", config.top_k)
                .with_warning("Model carries no prediction matrix; no recommendations generated")
                .with_data(
                    "recommendations",
                    Payload::Recommendations(Arc::new(Recommendations::new())),
                ));
        };

        let mut recommendations = Recommendations::new();
        for (u, user_id) in model.user_index.ids().iter().enumerate() {
            let Some(row) = predictions.row(u) else {
                continue;
            };
            let ranked: Vec<(i64, f64)> = top_k_indices(row, config.top_k)
                .into_iter()
                .filter_map(|i| model.item_index.id_at(i).map(|item_id| (item_id, row[i])))
                .collect();
            recommendations.insert(*user_id, ranked);
        }

        let n_users = recommendations.len();
        Ok(StageResult::new()
            .with_metric("n_users", n_users)
            .with_metric("top_k", config.top_k)
            .with_data(
                "recommendations",
                Payload::Recommendations(Arc::new(recommendations)),
            ))
    }

    fn schema(&self) -> BlockSchema {
        BlockSchema::new("predictions")
            .input("model", "model", true)
            .output("recommendations", "recommendations")
            .config("top_k", "int", Some(json!(10)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recblocks_core::{Block, BlockHarness, BlockStatus, ModelArtifact};
    use recblocks_data::{DenseMatrix, IdIndex};

    fn artifact(predictions: Option<DenseMatrix>) -> ModelArtifact {
        ModelArtifact {
            kind: "collaborative-filtering".to_string(),
            predictions,
            user_index: IdIndex::from_sorted([7, 9]),
            item_index: IdIndex::from_sorted([100, 200, 300]),
        }
    }

    fn run_stage(artifact: ModelArtifact, params: ParamMap) -> recblocks_core::BlockOutput {
        let mut inputs = Inputs::new();
        inputs.insert("model", Payload::Model(Arc::new(artifact)));
        let mut block = BlockHarness::with_params("pred", PredictionsStage, params);
        block.execute(&inputs)
    }

    fn recommendations(output: &recblocks_core::BlockOutput) -> Recommendations {
        match &output.data["recommendations"] {
            Payload::Recommendations(recs) => recs.as_ref().clone(),
            other => panic!("unexpected payload: {}", other.kind()),
        }
    }

    #[test]
    fn test_top_k_per_user_external_ids() {
        let matrix =
            DenseMatrix::from_rows(vec![vec![1.0, 3.0, 2.0], vec![5.0, 4.0, 0.5]]).unwrap();
        let mut params = ParamMap::new();
        params.insert("top_k".into(), json!(2));
        let output = run_stage(artifact(Some(matrix)), params);
        assert_eq!(output.status, BlockStatus::Completed);
        assert_eq!(output.metrics["n_users"], json!(2));

        let recs = recommendations(&output);
        assert_eq!(recs[&7], vec![(200, 3.0), (300, 2.0)]);
        assert_eq!(recs[&9], vec![(100, 5.0), (200, 4.0)]);
    }

    #[test]
    fn test_ties_break_by_item_order() {
        let matrix = DenseMatrix::from_rows(vec![vec![2.0, 2.0, 2.0], vec![0.0, 0.0, 0.0]]).unwrap();
        let mut params = ParamMap::new();
        params.insert("top_k".into(), json!(2));
        let output = run_stage(artifact(Some(matrix)), params);
        let recs = recommendations(&output);
        assert_eq!(recs[&7], vec![(100, 2.0), (200, 2.0)]);
    }

    #[test]
    fn test_top_k_larger_than_catalog() {
        let matrix = DenseMatrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]]).unwrap();
        let mut params = ParamMap::new();
        params.insert("top_k".into(), json!(50));
        let output = run_stage(artifact(Some(matrix)), params);
        let recs = recommendations(&output);
        assert_eq!(recs[&7].len(), 3);
    }

    #[test]
    fn test_matrixless_model_warns_with_empty_output() {
        let output = run_stage(artifact(None), ParamMap::new());
        assert_eq!(output.status, BlockStatus::Completed);
        assert_eq!(output.metrics["n_users"], json!(0));
        assert_eq!(output.warnings.len(), 1);
        assert!(recommendations(&output).is_empty());
    }

    #[test]
    fn test_zero_top_k_fails_validation() {
        let mut params = ParamMap::new();
        params.insert("top_k".into(), json!(0));
        let output = run_stage(artifact(None), params);
        assert_eq!(output.status, BlockStatus::Failed);
        assert_eq!(output.errors, vec!["top_k must be at least 1".to_string()]);
    }

    #[test]
    fn test_missing_model_fails() {
        let mut block = BlockHarness::new("pred", PredictionsStage);
        let output = block.execute(&Inputs::new());
        assert_eq!(output.status, BlockStatus::Failed);
        assert_eq!(output.errors, vec!["Missing required input: model".to_string()]);
    }
}
