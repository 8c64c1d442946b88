//! The block execution contract for the recblocks pipeline.
//!
//! Every pipeline stage, from data splitting to model evaluation, is a
//! "block": a configurable, independently testable unit with a uniform
//! lifecycle. This crate defines that contract and the plumbing shared by
//! all stages:
//!
//! - [`block`] - the [`BlockStatus`] state machine, [`BlockOutput`], the
//!   [`Stage`] trait implemented by each stage, and the [`BlockHarness`]
//!   that wraps a stage with the lifecycle and failure boundary
//! - [`payload`] - the closed set of values blocks exchange, plus the
//!   [`Inputs`] map handed to `execute`
//! - [`schema`] - self-description types returned by `get_schema`
//! - [`config`] - typed configuration parsing from parameter bags
//! - [`registry`] - the [`PipelineStore`] keyed repository of pipeline state
//!
//! # Lifecycle
//!
//! `NotConfigured -> Configured -> Running -> {Completed, Failed}`, with
//! `reset()` returning to `NotConfigured`. `execute` never panics by
//! contract: validation failures and stage errors both surface as a
//! `Failed` output carrying human-readable error strings.
//!
//! ```
//! use recblocks_core::{Block, BlockStatus, Inputs};
//! # use recblocks_core::{BlockHarness, BlockSchema, ParamMap, StageResult, Stage, StageError};
//! # struct Noop;
//! # impl Stage for Noop {
//! #     fn block_type(&self) -> &'static str { "noop" }
//! #     fn validate(&self, _p: &ParamMap) -> Vec<String> { vec![] }
//! #     fn run(&mut self, _p: &ParamMap, _i: &Inputs) -> Result<StageResult, StageError> {
//! #         Ok(StageResult::new())
//! #     }
//! #     fn schema(&self) -> BlockSchema { BlockSchema::new("noop") }
//! # }
//! let mut block = BlockHarness::new("demo", Noop);
//! assert_eq!(block.status(), BlockStatus::NotConfigured);
//!
//! let output = block.execute(&Inputs::new());
//! assert_eq!(output.status, BlockStatus::Completed);
//!
//! block.reset();
//! assert_eq!(block.status(), BlockStatus::NotConfigured);
//! assert!(block.output().is_none());
//! ```

pub mod block;
pub mod config;
pub mod error;
pub mod payload;
pub mod registry;
pub mod schema;

pub use block::{Block, BlockHarness, BlockOutput, BlockStatus, ParamMap, Stage, StageResult};
pub use config::parse_config;
pub use error::StageError;
pub use payload::{Inputs, ModelArtifact, Payload, Recommendations};
pub use registry::{PipelineEntry, PipelineStore};
pub use schema::{BlockSchema, ConfigSpec, FieldSpec};
