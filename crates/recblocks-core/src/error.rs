//! Error types for block execution.

use thiserror::Error;

/// Errors raised by stage logic inside `execute`'s failure boundary.
///
/// A `StageError` never escapes a block: the [`crate::BlockHarness`]
/// converts it into a `Failed` output with a single-element error list.
#[derive(Debug, Error)]
pub enum StageError {
    /// A required input key was absent from the inputs map.
    #[error("Missing required input: {key}")]
    MissingInput {
        /// The missing key.
        key: String,
    },

    /// An input was present but carried an unexpected payload type.
    #[error("Input '{key}' has unexpected type: expected {expected}, got {actual}")]
    InputType {
        /// The input key.
        key: String,
        /// The expected payload kind.
        expected: &'static str,
        /// The payload kind that was actually supplied.
        actual: &'static str,
    },

    /// A data-layer operation failed.
    #[error(transparent)]
    Data(#[from] recblocks_data::DataError),

    /// An evaluation or prediction operation failed.
    #[error(transparent)]
    Eval(#[from] recblocks_eval::EvalError),

    /// An external collaborator (estimator, scorer, factorizer) failed.
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] recblocks_eval::EstimatorError),

    /// A pipeline id was not found in the store.
    #[error("Unknown pipeline id: {id}")]
    UnknownPipeline {
        /// The id that was looked up.
        id: String,
    },

    /// Any other stage-specific execution failure.
    #[error("{message}")]
    Execution {
        /// Human-readable description of the failure.
        message: String,
    },
}

impl StageError {
    /// Creates a generic execution error with the given message.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }
}
