//! Model evaluation stage with the placeholder fallback policy.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use recblocks_core::{
    parse_config, BlockSchema, Inputs, ParamMap, Payload, Stage, StageError, StageResult,
};
use recblocks_eval::evaluate::{evaluate_model, placeholder_report};
use recblocks_eval::MetricKind;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct EvaluationConfig {
    metrics: Vec<String>,
    k_values: Vec<usize>,
    seed: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            metrics: ["rmse", "mae", "precision", "recall", "ndcg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            k_values: vec![5, 10, 20],
            seed: None,
        }
    }
}

impl EvaluationConfig {
    fn metric_kinds(&self) -> Result<Vec<MetricKind>, String> {
        self.metrics
            .iter()
            .map(|name| {
                MetricKind::parse(name).ok_or_else(|| format!("Unknown metric: {name}"))
            })
            .collect()
    }
}

/// Scores a trained model against held-out test rows.
///
/// When the model carries a prediction matrix and `test_data` rows are
/// supplied, real metrics are computed. Otherwise the stage emits a
/// placeholder report drawn from documented plausible ranges, flagged as
/// such and accompanied by a warning, so downstream consumers always
/// receive the full metrics shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationStage;

impl Stage for EvaluationStage {
    fn block_type(&self) -> &'static str {
        "evaluation"
    }

    fn validate(&self, params: &ParamMap) -> Vec<String> {
        let config: EvaluationConfig = match parse_config(params) {
            Ok(config) => config,
            Err(msg) => return vec![msg],
        };
        let mut errors = Vec::new();
        if let Err(msg) = config.metric_kinds() {
            errors.push(msg);
        }
        if config.metrics.is_empty() {
            errors.push("metrics must not be empty".to_string());
        }
        errors
    }

    fn run(&mut self, params: &ParamMap, inputs: &Inputs) -> Result<StageResult, StageError> {
        let config: EvaluationConfig = parse_config(params).map_err(StageError::execution)?;
        let metrics = config.metric_kinds().map_err(StageError::execution)?;
        let model = inputs.require_model("model")?;
        let test_rows = inputs.get_rows("test_data");

        let (report, fallback_reason) = match (&model.predictions, &test_rows) {
            (Some(predictions), Some(test_rows)) if !test_rows.is_empty() => {
                let report = evaluate_model(
                    predictions,
                    &model.user_index,
                    &model.item_index,
                    test_rows,
                    &metrics,
                    &config.k_values,
                );
                (report, None)
            }
            (None, _) => (
                self.fallback(&config, &metrics),
                Some("model carries no prediction matrix"),
            ),
            _ => (
                self.fallback(&config, &metrics),
                Some("no test data supplied"),
            ),
        };

        let mut result = StageResult::new();
        for (name, value) in &report.values {
            result = result.with_metric(name.clone(), *value);
        }
        result = result.with_metric("placeholder", report.placeholder);
        if let Some(reason) = fallback_reason {
            warn!(reason, "falling back to placeholder evaluation");
            result = result.with_warning(format!("Evaluated with placeholder metrics: {reason}"));
        }
        Ok(result.with_data("metrics", Payload::Report(report)))
    }

    fn schema(&self) -> BlockSchema {
        BlockSchema::new("evaluation")
            .input("model", "model", true)
            .input("test_data", "rows", false)
            .output("metrics", "report")
            .config(
                "metrics",
                "list",
                Some(json!(["rmse", "mae", "precision", "recall", "ndcg"])),
            )
            .config("k_values", "list", Some(json!([5, 10, 20])))
            .config("seed", "int", None)
    }
}

impl EvaluationStage {
    fn fallback(
        &self,
        config: &EvaluationConfig,
        metrics: &[MetricKind],
    ) -> recblocks_eval::EvaluationReport {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        placeholder_report(metrics, &config.k_values, &mut rng)
    }
}
