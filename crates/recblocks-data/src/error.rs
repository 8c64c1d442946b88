//! Error types for the recblocks-data crate.

use thiserror::Error;

/// The main error type for data-layer operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// A dataset was empty where at least one row is required.
    #[error("Empty dataset: {context}")]
    EmptyDataset {
        /// What was being computed when the empty dataset was encountered.
        context: String,
    },

    /// An id was not present in the index it was looked up in.
    #[error("Unknown {entity} id: {id}")]
    UnknownId {
        /// Which entity space the id belongs to ("user" or "item").
        entity: &'static str,
        /// The id that was not found.
        id: i64,
    },

    /// An index was outside the bounds of a matrix dimension.
    #[error("Index out of bounds: {index} >= {len} ({dimension})")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The dimension length.
        len: usize,
        /// Which dimension was indexed.
        dimension: &'static str,
    },

    /// Two parallel inputs had mismatched lengths.
    #[error("Length mismatch: {left} vs {right} ({context})")]
    LengthMismatch {
        /// Length of the first input.
        left: usize,
        /// Length of the second input.
        right: usize,
        /// What was being compared.
        context: &'static str,
    },
}

/// Result type for data-layer operations.
pub type Result<T> = std::result::Result<T, DataError>;
