//! Keyed repository of pipeline state.
//!
//! The reference system kept pipelines in a process-global mutable mapping.
//! Here the store is an explicit object handed to callers, with a per-entry
//! lock so that concurrent writers to the same pipeline id serialize
//! instead of racing. Entry lifetime is the store's lifetime unless
//! explicitly removed or cleared.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::info;

use recblocks_data::Interaction;
use recblocks_eval::EvaluationReport;

use crate::error::StageError;
use crate::payload::ModelArtifact;

/// One pipeline's accumulated state.
#[derive(Debug, Clone, Default)]
pub struct PipelineEntry {
    /// Training rows captured at pipeline creation.
    pub train: Arc<Vec<Interaction>>,
    /// Held-out test rows captured at pipeline creation.
    pub test: Arc<Vec<Interaction>>,
    /// Free-form metadata supplied by the caller.
    pub metadata: BTreeMap<String, Value>,
    /// The fitted model, once a model stage has run.
    pub model: Option<Arc<ModelArtifact>>,
    /// The latest evaluation result, once an evaluation stage has run.
    pub evaluation: Option<EvaluationReport>,
}

/// An in-memory, concurrency-safe store of pipelines keyed by generated id.
///
/// # Examples
///
/// ```
/// use recblocks_core::PipelineStore;
/// use recblocks_data::Interaction;
///
/// let store = PipelineStore::new();
/// let id = store.create(
///     vec![Interaction::new(1, 1, 5.0, 0)],
///     vec![],
///     Default::default(),
/// );
/// assert_eq!(id, "pipeline_1");
/// assert_eq!(store.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct PipelineStore {
    entries: RwLock<BTreeMap<String, Arc<Mutex<PipelineEntry>>>>,
    next_id: AtomicU64,
}

impl PipelineStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pipeline entry and returns its generated id.
    ///
    /// Ids are `pipeline_{n}` with a monotone counter, so ids are never
    /// reused within one store even after removals.
    pub fn create(
        &self,
        train: Vec<Interaction>,
        test: Vec<Interaction>,
        metadata: BTreeMap<String, Value>,
    ) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("pipeline_{n}");
        let entry = PipelineEntry {
            train: Arc::new(train),
            test: Arc::new(test),
            metadata,
            model: None,
            evaluation: None,
        };
        self.entries
            .write()
            .insert(id.clone(), Arc::new(Mutex::new(entry)));
        info!(pipeline_id = %id, "pipeline created");
        id
    }

    /// Returns the handle for `id`, if present. The per-entry mutex makes
    /// read-modify-write sequences on one pipeline atomic.
    pub fn get(&self, id: &str) -> Option<Arc<Mutex<PipelineEntry>>> {
        self.entries.read().get(id).cloned()
    }

    /// Runs `f` on the entry for `id`.
    pub fn with_entry<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut PipelineEntry) -> T,
    ) -> Result<T, StageError> {
        let entry = self.get(id).ok_or_else(|| StageError::UnknownPipeline {
            id: id.to_string(),
        })?;
        let mut guard = entry.lock();
        Ok(f(&mut guard))
    }

    /// Stores the fitted model for `id`.
    pub fn set_model(&self, id: &str, model: Arc<ModelArtifact>) -> Result<(), StageError> {
        self.with_entry(id, |entry| entry.model = Some(model))
    }

    /// Stores the latest evaluation result for `id`.
    pub fn set_evaluation(&self, id: &str, report: EvaluationReport) -> Result<(), StageError> {
        self.with_entry(id, |entry| entry.evaluation = Some(report))
    }

    /// Returns all pipeline ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns the number of pipelines.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` when the store holds no pipelines.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Removes the pipeline for `id`; returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.entries.write().remove(id).is_some()
    }

    /// Removes every pipeline. The id counter is not reset.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
