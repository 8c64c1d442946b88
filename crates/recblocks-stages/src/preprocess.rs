//! Rating normalization and missing-value handling.

use serde::Deserialize;
use serde_json::json;

use recblocks_core::{
    parse_config, BlockSchema, Inputs, ParamMap, Payload, Stage, StageError, StageResult,
};
use recblocks_data::Interaction;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct PreprocessConfig {
    normalize: bool,
    fill_missing: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            fill_missing: true,
        }
    }
}

/// Cleans the `dataframe` input into `processed-data`.
///
/// `fill_missing` replaces non-finite ratings (NaN, infinities) with the
/// mean of the finite ratings. `normalize` then z-scores the ratings; a
/// small epsilon keeps constant-rating datasets from dividing by zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreprocessStage;

const STD_EPSILON: f64 = 1e-8;

impl Stage for PreprocessStage {
    fn block_type(&self) -> &'static str {
        "preprocessor"
    }

    fn validate(&self, params: &ParamMap) -> Vec<String> {
        match parse_config::<PreprocessConfig>(params) {
            Err(msg) => vec![msg],
            Ok(_) => Vec::new(),
        }
    }

    fn run(&mut self, params: &ParamMap, inputs: &Inputs) -> Result<StageResult, StageError> {
        let config: PreprocessConfig = parse_config(params).map_err(StageError::execution)?;
        let rows = inputs.require_rows("dataframe")?;
        let mut rows: Vec<Interaction> = rows.as_ref().clone();

        let finite: Vec<f64> = rows
            .iter()
            .map(|r| r.rating)
            .filter(|r| r.is_finite())
            .collect();
        let mean = if finite.is_empty() {
            0.0
        } else {
            finite.iter().sum::<f64>() / finite.len() as f64
        };

        if config.fill_missing {
            for row in &mut rows {
                if !row.rating.is_finite() {
                    row.rating = mean;
                }
            }
        }

        if config.normalize && !finite.is_empty() {
            let variance = finite.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>()
                / finite.len() as f64;
            let std = variance.sqrt() + STD_EPSILON;
            for row in &mut rows {
                if row.rating.is_finite() {
                    row.rating = (row.rating - mean) / std;
                }
            }
        }

        Ok(StageResult::new()
            .with_metric("n_rows", rows.len())
            .with_data("processed-data", Payload::rows(rows)))
    }

    fn schema(&self) -> BlockSchema {
        BlockSchema::new("preprocessor")
            .input("dataframe", "rows", true)
            .output("processed-data", "rows")
            .config("normalize", "bool", Some(json!(true)))
            .config("fill_missing", "bool", Some(json!(true)))
    }
}
