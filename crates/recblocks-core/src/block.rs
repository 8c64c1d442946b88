//! Block lifecycle: status state machine, outputs, and the stage harness.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::error::StageError;
use crate::payload::{Inputs, Payload};
use crate::schema::BlockSchema;

/// A block's parameter bag: string keys, arbitrary JSON values. Unknown
/// keys are accepted silently for forward compatibility.
pub type ParamMap = serde_json::Map<String, Value>;

/// Block execution status.
///
/// `NotConfigured -> Configured -> Running -> {Completed, Failed}`.
/// Re-configuration is always allowed, including after `Completed` or
/// `Failed`; `reset()` returns to `NotConfigured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    /// Freshly constructed or reset; no parameters applied yet.
    NotConfigured,
    /// Parameters have been merged at least once.
    Configured,
    /// `execute` is in progress.
    Running,
    /// The last execution produced a successful output.
    Completed,
    /// The last execution failed validation or stage logic.
    Failed,
}

/// The output of one block execution.
///
/// Produced exactly once per `execute` call, replacing any prior output on
/// the block.
#[derive(Debug, Clone, Serialize)]
pub struct BlockOutput {
    /// The id of the block that produced this output.
    pub block_id: String,
    /// Terminal status of the execution.
    pub status: BlockStatus,
    /// Named result payloads for downstream blocks.
    pub data: BTreeMap<String, Payload>,
    /// Summary metrics describing the execution.
    pub metrics: BTreeMap<String, Value>,
    /// Errors, in occurrence order; non-empty exactly when `status` is
    /// `Failed`.
    pub errors: Vec<String>,
    /// Non-fatal warnings, in occurrence order.
    pub warnings: Vec<String>,
}

impl BlockOutput {
    fn completed(block_id: &str, result: StageResult) -> Self {
        Self {
            block_id: block_id.to_string(),
            status: BlockStatus::Completed,
            data: result.data,
            metrics: result.metrics,
            errors: Vec::new(),
            warnings: result.warnings,
        }
    }

    fn failed(block_id: &str, errors: Vec<String>) -> Self {
        Self {
            block_id: block_id.to_string(),
            status: BlockStatus::Failed,
            data: BTreeMap::new(),
            metrics: BTreeMap::new(),
            errors,
            warnings: Vec::new(),
        }
    }
}

/// The successful result of a stage's `run`, before the harness wraps it
/// into a [`BlockOutput`].
#[derive(Debug, Clone, Default)]
pub struct StageResult {
    /// Named result payloads.
    pub data: BTreeMap<String, Payload>,
    /// Summary metrics.
    pub metrics: BTreeMap<String, Value>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl StageResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named payload.
    pub fn with_data(mut self, key: impl Into<String>, payload: Payload) -> Self {
        self.data.insert(key.into(), payload);
        self
    }

    /// Adds a metric value.
    pub fn with_metric(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metrics.insert(key.into(), value.into());
        self
    }

    /// Adds a warning.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Type-specific stage logic, wrapped by [`BlockHarness`].
///
/// Implementations hold whatever fitted state they need between calls, but
/// all lifecycle bookkeeping lives in the harness. `run` returns a
/// `Result`; returning `Err` is the one and only failure path (the
/// exceptions-as-control-flow pattern of the reference system is replaced
/// by explicit error values, preserving the contract that `execute` never
/// raises).
pub trait Stage: Send {
    /// The stage type tag, e.g. `"split"` or `"evaluation"`.
    fn block_type(&self) -> &'static str;

    /// Validates the parameter bag without mutating anything.
    ///
    /// Returns human-readable error strings; empty means valid. Callable
    /// in any lifecycle state.
    fn validate(&self, params: &ParamMap) -> Vec<String>;

    /// Executes the stage logic.
    fn run(&mut self, params: &ParamMap, inputs: &Inputs) -> Result<StageResult, StageError>;

    /// Returns the stage's self-description. Must stay synchronized with
    /// the actual `run` behavior.
    fn schema(&self) -> BlockSchema;
}

/// The uniform block surface consumed by pipeline callers.
///
/// Object-safe so that heterogeneous pipelines can hold
/// `Vec<Box<dyn Block>>`.
pub trait Block: Send {
    /// The block's unique instance id.
    fn block_id(&self) -> &str;

    /// The stage type tag.
    fn block_type(&self) -> &'static str;

    /// Current lifecycle status.
    fn status(&self) -> BlockStatus;

    /// Merges `params` into the parameter bag and marks the block
    /// `Configured`. Always allowed, in any state.
    fn configure(&mut self, params: ParamMap);

    /// Validates the current configuration without mutating state.
    fn validate_config(&self) -> Vec<String>;

    /// Runs the block. Never panics by contract: validation errors and
    /// stage failures both produce a `Failed` output.
    fn execute(&mut self, inputs: &Inputs) -> BlockOutput;

    /// Returns the block's self-description.
    fn schema(&self) -> BlockSchema;

    /// Returns to `NotConfigured` and discards the stored output. The
    /// parameter bag is kept; re-running requires a fresh `configure` only
    /// to re-enter the `Configured` state.
    fn reset(&mut self);

    /// The output of the last execution, if any.
    fn output(&self) -> Option<&BlockOutput>;
}

/// Wraps a [`Stage`] with the block lifecycle and failure boundary.
///
/// The harness owns the id, the parameter bag, the status, and the last
/// output, so the lifecycle logic exists exactly once for every stage
/// type.
#[derive(Debug)]
pub struct BlockHarness<S: Stage> {
    block_id: String,
    params: ParamMap,
    status: BlockStatus,
    last_output: Option<BlockOutput>,
    stage: S,
}

impl<S: Stage> BlockHarness<S> {
    /// Creates a block in the `NotConfigured` state.
    pub fn new(block_id: impl Into<String>, stage: S) -> Self {
        Self {
            block_id: block_id.into(),
            params: ParamMap::new(),
            status: BlockStatus::NotConfigured,
            last_output: None,
            stage,
        }
    }

    /// Creates a block and applies an initial configuration.
    pub fn with_params(block_id: impl Into<String>, stage: S, params: ParamMap) -> Self {
        let mut block = Self::new(block_id, stage);
        block.configure(params);
        block
    }

    /// Returns the current parameter bag.
    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    /// Returns the wrapped stage.
    pub fn stage(&self) -> &S {
        &self.stage
    }
}

impl<S: Stage> Block for BlockHarness<S> {
    fn block_id(&self) -> &str {
        &self.block_id
    }

    fn block_type(&self) -> &'static str {
        self.stage.block_type()
    }

    fn status(&self) -> BlockStatus {
        self.status
    }

    fn configure(&mut self, params: ParamMap) {
        for (key, value) in params {
            self.params.insert(key, value);
        }
        self.status = BlockStatus::Configured;
    }

    fn validate_config(&self) -> Vec<String> {
        self.stage.validate(&self.params)
    }

    fn execute(&mut self, inputs: &Inputs) -> BlockOutput {
        self.status = BlockStatus::Running;
        info!(
            block_id = %self.block_id,
            block_type = self.stage.block_type(),
            "executing block"
        );

        let validation_errors = self.stage.validate(&self.params);
        let output = if !validation_errors.is_empty() {
            BlockOutput::failed(&self.block_id, validation_errors)
        } else {
            match self.stage.run(&self.params, inputs) {
                Ok(result) => BlockOutput::completed(&self.block_id, result),
                Err(err) => BlockOutput::failed(&self.block_id, vec![err.to_string()]),
            }
        };

        self.status = output.status;
        if output.status == BlockStatus::Failed {
            error!(
                block_id = %self.block_id,
                errors = ?output.errors,
                "block execution failed"
            );
        }
        self.last_output = Some(output.clone());
        output
    }

    fn schema(&self) -> BlockSchema {
        self.stage.schema()
    }

    fn reset(&mut self) {
        self.status = BlockStatus::NotConfigured;
        self.last_output = None;
        info!(block_id = %self.block_id, "block reset");
    }

    fn output(&self) -> Option<&BlockOutput> {
        self.last_output.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A stage that fails validation when `must_fail` is set and otherwise
    /// echoes a metric.
    struct EchoStage;

    impl Stage for EchoStage {
        fn block_type(&self) -> &'static str {
            "echo"
        }

        fn validate(&self, params: &ParamMap) -> Vec<String> {
            if params.get("must_fail").and_then(Value::as_bool) == Some(true) {
                vec!["must_fail is set".to_string()]
            } else {
                Vec::new()
            }
        }

        fn run(&mut self, params: &ParamMap, _inputs: &Inputs) -> Result<StageResult, StageError> {
            if params.get("explode").and_then(Value::as_bool) == Some(true) {
                return Err(StageError::execution("stage exploded"));
            }
            Ok(StageResult::new().with_metric("ran", true))
        }

        fn schema(&self) -> BlockSchema {
            BlockSchema::new("echo")
        }
    }

    #[test]
    fn test_fresh_block_not_configured() {
        let block = BlockHarness::new("b1", EchoStage);
        assert_eq!(block.status(), BlockStatus::NotConfigured);
        assert!(block.output().is_none());
    }

    #[test]
    fn test_configure_merges_and_sets_configured() {
        let mut block = BlockHarness::new("b1", EchoStage);
        let mut first = ParamMap::new();
        first.insert("a".into(), json!(1));
        block.configure(first);
        assert_eq!(block.status(), BlockStatus::Configured);

        let mut second = ParamMap::new();
        second.insert("b".into(), json!(2));
        block.configure(second);
        assert_eq!(block.params().len(), 2);
        assert_eq!(block.params()["a"], json!(1));
    }

    #[test]
    fn test_execute_with_defaults_completes() {
        // Executing before configure is legal when defaults suffice.
        let mut block = BlockHarness::new("b1", EchoStage);
        let output = block.execute(&Inputs::new());
        assert_eq!(output.status, BlockStatus::Completed);
        assert_eq!(block.status(), BlockStatus::Completed);
        assert_eq!(output.metrics["ran"], json!(true));
        assert!(output.errors.is_empty());
    }

    #[test]
    fn test_validation_short_circuits_execute() {
        let mut params = ParamMap::new();
        params.insert("must_fail".into(), json!(true));
        let mut block = BlockHarness::with_params("b1", EchoStage, params);

        let output = block.execute(&Inputs::new());
        assert_eq!(output.status, BlockStatus::Failed);
        assert_eq!(output.errors, vec!["must_fail is set".to_string()]);
        assert!(output.data.is_empty());
    }

    #[test]
    fn test_stage_error_becomes_failed_output() {
        let mut params = ParamMap::new();
        params.insert("explode".into(), json!(true));
        let mut block = BlockHarness::with_params("b1", EchoStage, params);

        let output = block.execute(&Inputs::new());
        assert_eq!(output.status, BlockStatus::Failed);
        assert_eq!(output.errors, vec!["stage exploded".to_string()]);
        assert_eq!(block.status(), BlockStatus::Failed);
    }

    #[test]
    fn test_reconfigure_after_failure_allowed() {
        let mut params = ParamMap::new();
        params.insert("must_fail".into(), json!(true));
        let mut block = BlockHarness::with_params("b1", EchoStage, params);
        block.execute(&Inputs::new());
        assert_eq!(block.status(), BlockStatus::Failed);

        let mut fix = ParamMap::new();
        fix.insert("must_fail".into(), json!(false));
        block.configure(fix);
        assert_eq!(block.status(), BlockStatus::Configured);
        let output = block.execute(&Inputs::new());
        assert_eq!(output.status, BlockStatus::Completed);
    }

    #[test]
    fn test_reset_clears_output_keeps_params() {
        let mut params = ParamMap::new();
        params.insert("a".into(), json!(1));
        let mut block = BlockHarness::with_params("b1", EchoStage, params);
        block.execute(&Inputs::new());
        assert!(block.output().is_some());

        block.reset();
        assert_eq!(block.status(), BlockStatus::NotConfigured);
        assert!(block.output().is_none());
        assert_eq!(block.params().len(), 1);
    }

    #[test]
    fn test_validate_config_does_not_mutate_state() {
        let block = BlockHarness::new("b1", EchoStage);
        assert!(block.validate_config().is_empty());
        assert_eq!(block.status(), BlockStatus::NotConfigured);
    }

    #[test]
    fn test_new_execute_replaces_output() {
        let mut block = BlockHarness::new("b1", EchoStage);
        block.execute(&Inputs::new());

        let mut params = ParamMap::new();
        params.insert("explode".into(), json!(true));
        block.configure(params);
        block.execute(&Inputs::new());

        let stored = block.output().unwrap();
        assert_eq!(stored.status, BlockStatus::Failed);
    }
}
