//! The closed set of values exchanged between blocks.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use recblocks_data::{DenseMatrix, FeatureTable, IdIndex, Interaction};
use recblocks_eval::EvaluationReport;

use crate::error::StageError;

/// Per-user ranked recommendations: external user id to a descending list
/// of `(item_id, score)` pairs.
pub type Recommendations = BTreeMap<i64, Vec<(i64, f64)>>;

/// The artifact produced by a model stage.
///
/// `predictions` is the dense prediction matrix covering the full id-index
/// space captured at training time. It is optional at the type level so
/// that downstream consumers (evaluation, predictions) can apply their
/// documented fallback behavior when a model carries no matrix.
#[derive(Debug, Clone, Serialize)]
pub struct ModelArtifact {
    /// Which stage family produced the artifact.
    pub kind: String,
    /// Full `n_users x n_items` prediction matrix, when available.
    pub predictions: Option<DenseMatrix>,
    /// User id-to-index map captured at training time.
    pub user_index: IdIndex,
    /// Item id-to-index map captured at training time.
    pub item_index: IdIndex,
}

/// A value flowing between blocks.
///
/// Blocks exchange a mapping of named payloads; this enum is the closed set
/// of payload types (the tagged-variant redesign of the reference system's
/// untyped dictionaries). Row sets are shared by `Arc` so that forwarding
/// an upstream output to several downstream blocks never copies the data.
#[derive(Debug, Clone, Serialize)]
pub enum Payload {
    /// A sequence of raw interactions.
    Rows(Arc<Vec<Interaction>>),
    /// A train/test partition of interactions.
    Split {
        /// Training rows.
        train: Arc<Vec<Interaction>>,
        /// Held-out test rows.
        test: Arc<Vec<Interaction>>,
    },
    /// A user/item metadata feature table.
    Table(Arc<FeatureTable>),
    /// A trained model artifact.
    Model(Arc<ModelArtifact>),
    /// Per-user recommendation lists.
    Recommendations(Arc<Recommendations>),
    /// An evaluation report.
    Report(EvaluationReport),
}

impl Payload {
    /// Wraps a row set.
    pub fn rows(rows: Vec<Interaction>) -> Self {
        Self::Rows(Arc::new(rows))
    }

    /// Returns the payload kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rows(_) => "rows",
            Self::Split { .. } => "split",
            Self::Table(_) => "table",
            Self::Model(_) => "model",
            Self::Recommendations(_) => "recommendations",
            Self::Report(_) => "report",
        }
    }
}

/// The named inputs handed to a block's `execute`.
///
/// Wiring is caller-driven: there is no implicit graph resolution. A caller
/// takes payloads from upstream [`crate::BlockOutput`]s and inserts them
/// under the keys the downstream block's schema expects.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    entries: BTreeMap<String, Payload>,
}

impl Inputs {
    /// Creates an empty inputs map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a payload under `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, payload: Payload) -> &mut Self {
        self.entries.insert(key.into(), payload);
        self
    }

    /// Copies every entry of an upstream output's data map into this inputs
    /// map. Payloads are `Arc`-backed, so this is cheap.
    pub fn extend_from(&mut self, data: &BTreeMap<String, Payload>) -> &mut Self {
        for (key, payload) in data {
            self.entries.insert(key.clone(), payload.clone());
        }
        self
    }

    /// Returns the payload under `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Payload> {
        self.entries.get(key)
    }

    /// Returns the payload under `key` or a missing-input error.
    pub fn require(&self, key: &str) -> Result<&Payload, StageError> {
        self.get(key).ok_or_else(|| StageError::MissingInput {
            key: key.to_string(),
        })
    }

    /// Returns the row set under `key`, if present and of row type.
    pub fn get_rows(&self, key: &str) -> Option<Arc<Vec<Interaction>>> {
        match self.get(key) {
            Some(Payload::Rows(rows)) => Some(Arc::clone(rows)),
            _ => None,
        }
    }

    /// Returns the row set under `key` or an error.
    pub fn require_rows(&self, key: &str) -> Result<Arc<Vec<Interaction>>, StageError> {
        match self.require(key)? {
            Payload::Rows(rows) => Ok(Arc::clone(rows)),
            other => Err(StageError::InputType {
                key: key.to_string(),
                expected: "rows",
                actual: other.kind(),
            }),
        }
    }

    /// Returns the `(train, test)` split under `key`, if present.
    pub fn get_split(&self, key: &str) -> Option<(Arc<Vec<Interaction>>, Arc<Vec<Interaction>>)> {
        match self.get(key) {
            Some(Payload::Split { train, test }) => Some((Arc::clone(train), Arc::clone(test))),
            _ => None,
        }
    }

    /// Returns the feature table under `key`, if present and of table type.
    pub fn get_table(&self, key: &str) -> Option<Arc<FeatureTable>> {
        match self.get(key) {
            Some(Payload::Table(table)) => Some(Arc::clone(table)),
            _ => None,
        }
    }

    /// Returns the model artifact under `key` or an error.
    pub fn require_model(&self, key: &str) -> Result<Arc<ModelArtifact>, StageError> {
        match self.require(key)? {
            Payload::Model(model) => Ok(Arc::clone(model)),
            other => Err(StageError::InputType {
                key: key.to_string(),
                expected: "model",
                actual: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_row() -> Vec<Interaction> {
        vec![Interaction::new(1, 2, 3.0, 4)]
    }

    #[test]
    fn test_require_missing() {
        let inputs = Inputs::new();
        let err = inputs.require("dataframe").unwrap_err();
        assert_eq!(err.to_string(), "Missing required input: dataframe");
    }

    #[test]
    fn test_require_rows_wrong_type() {
        let mut inputs = Inputs::new();
        inputs.insert(
            "dataframe",
            Payload::Split {
                train: Arc::new(one_row()),
                test: Arc::new(vec![]),
            },
        );
        let err = inputs.require_rows("dataframe").unwrap_err();
        assert!(err.to_string().contains("expected rows, got split"));
    }

    #[test]
    fn test_extend_from_shares_rows() {
        let mut data = BTreeMap::new();
        data.insert("dataframe".to_string(), Payload::rows(one_row()));

        let mut inputs = Inputs::new();
        inputs.extend_from(&data);
        let rows = inputs.require_rows("dataframe").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_payload_kind_names() {
        assert_eq!(Payload::rows(vec![]).kind(), "rows");
        assert_eq!(
            Payload::Report(EvaluationReport::default()).kind(),
            "report"
        );
    }
}
