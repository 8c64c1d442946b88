//! Source stage: caller-provided interaction rows.
//!
//! Dataset acquisition (synthetic generators, downloads, CSV ingestion)
//! lives outside this workspace; this stage accepts rows the caller already
//! holds, optionally subsamples them deterministically, and reports dataset
//! shape metrics for downstream stages.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::json;

use recblocks_core::{
    parse_config, BlockSchema, Inputs, ParamMap, Payload, Stage, StageError, StageResult,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct SourceConfig {
    /// Keep at most this many rows (0 keeps all).
    sample_size: usize,
    /// Seed for the deterministic subsample.
    seed: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sample_size: 0,
            seed: 42,
        }
    }
}

/// Passes caller-provided rows into the pipeline under the `dataframe` key.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceStage;

impl Stage for SourceStage {
    fn block_type(&self) -> &'static str {
        "data-source"
    }

    fn validate(&self, params: &ParamMap) -> Vec<String> {
        match parse_config::<SourceConfig>(params) {
            Err(msg) => vec![msg],
            Ok(_) => Vec::new(),
        }
    }

    fn run(&mut self, params: &ParamMap, inputs: &Inputs) -> Result<StageResult, StageError> {
        let config: SourceConfig =
            parse_config(params).map_err(StageError::execution)?;
        let rows = inputs.require_rows("rows")?;

        let rows = if config.sample_size > 0 && rows.len() > config.sample_size {
            let mut rng = StdRng::seed_from_u64(config.seed);
            let mut indices: Vec<usize> = (0..rows.len()).collect();
            indices.shuffle(&mut rng);
            indices.truncate(config.sample_size);
            // Sampled rows keep their original dataset order.
            indices.sort_unstable();
            indices.into_iter().map(|i| rows[i]).collect()
        } else {
            rows.as_ref().clone()
        };

        let n_users = rows.iter().map(|r| r.user_id).collect::<HashSet<_>>().len();
        let n_items = rows.iter().map(|r| r.item_id).collect::<HashSet<_>>().len();

        let mut result = StageResult::new()
            .with_metric("n_rows", rows.len())
            .with_metric("n_users", n_users)
            .with_metric("n_items", n_items);
        if n_users > 0 && n_items > 0 {
            let sparsity = 1.0 - rows.len() as f64 / (n_users as f64 * n_items as f64);
            result = result.with_metric("sparsity", sparsity);
        }

        Ok(result.with_data("dataframe", Payload::rows(rows)))
    }

    fn schema(&self) -> BlockSchema {
        BlockSchema::new("data-source")
            .input("rows", "rows", true)
            .output("dataframe", "rows")
            .config("sample_size", "int", Some(json!(0)))
            .config("seed", "int", Some(json!(42)))
    }
}
