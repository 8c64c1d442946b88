//! Train/test partitioning of interaction rows.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use recblocks_core::{
    parse_config, BlockSchema, Inputs, ParamMap, Payload, Stage, StageError, StageResult,
};
use recblocks_data::Interaction;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct SplitConfig {
    test_size: f64,
    method: String,
    seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            method: "random".to_string(),
            seed: 42,
        }
    }
}

/// Partitions the `dataframe` input into train and test row sets.
///
/// Two methods: `random` shuffles with a seeded generator before cutting,
/// `temporal` sorts by timestamp (stable, so equal timestamps keep input
/// order) and holds out the newest rows as test.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitStage;

impl Stage for SplitStage {
    fn block_type(&self) -> &'static str {
        "split"
    }

    fn validate(&self, params: &ParamMap) -> Vec<String> {
        let config: SplitConfig = match parse_config(params) {
            Ok(config) => config,
            Err(msg) => return vec![msg],
        };
        let mut errors = Vec::new();
        if !(config.test_size > 0.0 && config.test_size < 1.0) {
            errors.push(format!(
                "test_size must be between 0 and 1, got {}",
                config.test_size
            ));
        }
        if config.method != "random" && config.method != "temporal" {
            errors.push(format!("Invalid method: {}", config.method));
        }
        errors
    }

    fn run(&mut self, params: &ParamMap, inputs: &Inputs) -> Result<StageResult, StageError> {
        let config: SplitConfig = parse_config(params).map_err(StageError::execution)?;
        let rows = inputs.require_rows("dataframe")?;
        if rows.is_empty() {
            return Err(StageError::execution("Cannot split an empty dataset"));
        }

        let mut ordered: Vec<Interaction> = rows.as_ref().clone();
        match config.method.as_str() {
            "temporal" => ordered.sort_by_key(|r| r.timestamp),
            _ => {
                let mut rng = StdRng::seed_from_u64(config.seed);
                ordered.shuffle(&mut rng);
            }
        }

        // The test share is rounded down; at least one row always remains
        // on each side for non-trivial inputs.
        let n_test = ((ordered.len() as f64) * config.test_size) as usize;
        let n_train = ordered.len() - n_test;
        let test = ordered.split_off(n_train);
        let train = ordered;

        let split_ratio = test.len() as f64 / rows.len() as f64;
        let train = Arc::new(train);
        let test = Arc::new(test);

        Ok(StageResult::new()
            .with_metric("train_size", train.len())
            .with_metric("test_size", test.len())
            .with_metric("split_ratio", split_ratio)
            .with_data("train_data", Payload::Rows(Arc::clone(&train)))
            .with_data("test_data", Payload::Rows(Arc::clone(&test)))
            .with_data("split-data", Payload::Split { train, test }))
    }

    fn schema(&self) -> BlockSchema {
        BlockSchema::new("split")
            .input("dataframe", "rows", true)
            .output("train_data", "rows")
            .output("test_data", "rows")
            .output("split-data", "split")
            .config("test_size", "float", Some(json!(0.2)))
            .config_options(
                "method",
                "string",
                Some(json!("random")),
                vec!["random", "temporal"],
            )
            .config("seed", "int", Some(json!(42)))
    }
}
