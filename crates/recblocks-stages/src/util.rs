//! Shared helpers for stage implementations.

use std::sync::Arc;

use recblocks_core::{Inputs, StageError};
use recblocks_data::Interaction;

/// Resolves the training rows for a model stage: prefer the train side of
/// `split-data`, fall back to `processed-data`.
pub(crate) fn training_rows(inputs: &Inputs) -> Result<Arc<Vec<Interaction>>, StageError> {
    if let Some((train, _)) = inputs.get_split("split-data") {
        return Ok(train);
    }
    if let Some(rows) = inputs.get_rows("processed-data") {
        return Ok(rows);
    }
    Err(StageError::execution("Missing training data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use recblocks_core::Payload;

    #[test]
    fn test_prefers_split_over_processed() {
        let train = vec![Interaction::new(1, 1, 5.0, 0)];
        let processed = vec![Interaction::new(2, 2, 1.0, 0)];

        let mut inputs = Inputs::new();
        inputs.insert(
            "split-data",
            Payload::Split {
                train: Arc::new(train),
                test: Arc::new(vec![]),
            },
        );
        inputs.insert("processed-data", Payload::rows(processed));

        let rows = training_rows(&inputs).unwrap();
        assert_eq!(rows[0].user_id, 1);
    }

    #[test]
    fn test_falls_back_to_processed() {
        let mut inputs = Inputs::new();
        inputs.insert("processed-data", Payload::rows(vec![Interaction::new(2, 2, 1.0, 0)]));
        assert!(training_rows(&inputs).is_ok());
    }

    #[test]
    fn test_missing_training_data() {
        let err = training_rows(&Inputs::new()).unwrap_err();
        assert_eq!(err.to_string(), "Missing training data");
    }
}
