//! Full pipeline walks: source through evaluation, wiring block outputs
//! into downstream block inputs by hand the way a pipeline runner would.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use recblocks_core::{
    Block, BlockHarness, BlockStatus, Inputs, ParamMap, Payload, PipelineStore,
};
use recblocks_data::{DenseMatrix, Interaction, InteractionMatrix};
use recblocks_eval::estimator::{Estimator, EstimatorError};
use recblocks_stages::{
    EvaluationStage, PredictionsStage, PreprocessStage, RegressionStage, SimilarityKind,
    SimilarityScorer, SimilarityStage, SourceStage, SplitStage,
};

/// Densifies the interaction matrix as the "reconstruction".
struct IdentityScorer;

impl SimilarityScorer for IdentityScorer {
    fn fit_predict(
        &self,
        matrix: &InteractionMatrix,
        _kind: SimilarityKind,
    ) -> Result<DenseMatrix, EstimatorError> {
        Ok(matrix.to_dense())
    }
}

/// Predicts the global-mean feature column.
struct GlobalMeanEstimator;

impl Estimator for GlobalMeanEstimator {
    fn fit(&mut self, _x: &DenseMatrix, _y: &[f64]) -> Result<(), EstimatorError> {
        Ok(())
    }

    fn predict(&self, x: &DenseMatrix) -> Result<Vec<f64>, EstimatorError> {
        Ok((0..x.n_rows())
            .map(|r| x.row(r).map(|row| row[8]).unwrap_or(0.0))
            .collect())
    }
}

fn movie_rows() -> Vec<Interaction> {
    // 8 users x 6 items, ratings cycling 1..=5, timestamps increasing.
    let mut rows = Vec::new();
    let mut t = 0;
    for u in 0..8 {
        for i in 0..6 {
            let rating = 1.0 + ((u * 6 + i + u) % 5) as f64;
            rows.push(Interaction::new(u, 100 + i, rating, t));
            t += 1;
        }
    }
    rows
}

fn params(entries: &[(&str, serde_json::Value)]) -> ParamMap {
    let mut map = ParamMap::new();
    for (key, value) in entries {
        map.insert((*key).to_string(), value.clone());
    }
    map
}

#[test]
fn collaborative_filtering_pipeline() {
    let mut inputs = Inputs::new();
    inputs.insert("rows", Payload::rows(movie_rows()));

    let mut source = BlockHarness::new("source", SourceStage);
    let source_out = source.execute(&inputs);
    assert_eq!(source_out.status, BlockStatus::Completed);

    let mut split_inputs = Inputs::new();
    split_inputs.extend_from(&source_out.data);
    let mut split = BlockHarness::with_params(
        "split",
        SplitStage,
        params(&[("method", json!("temporal")), ("test_size", json!(0.25))]),
    );
    let split_out = split.execute(&split_inputs);
    assert_eq!(split_out.status, BlockStatus::Completed);
    assert_eq!(split_out.metrics["train_size"], json!(36));
    assert_eq!(split_out.metrics["test_size"], json!(12));

    let mut cf_inputs = Inputs::new();
    cf_inputs.extend_from(&split_out.data);
    let mut cf = BlockHarness::new("cf", SimilarityStage::new(Arc::new(IdentityScorer)));
    let cf_out = cf.execute(&cf_inputs);
    assert_eq!(cf_out.status, BlockStatus::Completed);
    assert_eq!(cf_out.metrics["method"], json!("user-based"));

    let mut pred_inputs = Inputs::new();
    pred_inputs.extend_from(&cf_out.data);
    let mut predictions = BlockHarness::with_params(
        "predictions",
        PredictionsStage,
        params(&[("top_k", json!(3))]),
    );
    let pred_out = predictions.execute(&pred_inputs);
    assert_eq!(pred_out.status, BlockStatus::Completed);
    let recs = match &pred_out.data["recommendations"] {
        Payload::Recommendations(recs) => Arc::clone(recs),
        other => panic!("unexpected payload: {}", other.kind()),
    };
    // Temporal split keeps the first 6 users in training.
    assert_eq!(recs.len(), 6);
    for list in recs.values() {
        assert_eq!(list.len(), 3);
        assert!(list.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    let mut eval_inputs = Inputs::new();
    eval_inputs.extend_from(&cf_out.data);
    eval_inputs.extend_from(&split_out.data);
    let mut evaluation = BlockHarness::new("evaluation", EvaluationStage);
    let eval_out = evaluation.execute(&eval_inputs);
    assert_eq!(eval_out.status, BlockStatus::Completed);
    assert!(eval_out.warnings.is_empty());
    let report = match &eval_out.data["metrics"] {
        Payload::Report(report) => report.clone(),
        other => panic!("unexpected payload: {}", other.kind()),
    };
    assert!(!report.placeholder);
    assert!(report.values.contains_key("rmse"));
    assert!(report.values.contains_key("ndcg@10"));
}

#[test]
fn regression_pipeline_with_preprocessing() {
    let mut inputs = Inputs::new();
    inputs.insert("dataframe", Payload::rows(movie_rows()));

    let mut preprocess = BlockHarness::with_params(
        "preprocess",
        PreprocessStage,
        params(&[("normalize", json!(false))]),
    );
    let prep_out = preprocess.execute(&inputs);
    assert_eq!(prep_out.status, BlockStatus::Completed);

    let mut reg_inputs = Inputs::new();
    reg_inputs.extend_from(&prep_out.data);
    let mut regression = BlockHarness::with_params(
        "regression",
        RegressionStage::new(Box::new(GlobalMeanEstimator)),
        params(&[("chunk_size", json!(7))]),
    );
    let reg_out = regression.execute(&reg_inputs);
    assert_eq!(reg_out.status, BlockStatus::Completed);
    assert_eq!(reg_out.metrics["predictions_shape"], json!([8, 6]));
    assert_eq!(reg_out.metrics["n_features"], json!(9));

    let model = match &reg_out.data["model"] {
        Payload::Model(model) => Arc::clone(model),
        other => panic!("unexpected payload: {}", other.kind()),
    };
    assert_eq!(model.kind, "regression");
    // Sorted index maps over every training id.
    assert_eq!(model.user_index.ids(), &[0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(model.item_index.ids(), &[100, 101, 102, 103, 104, 105]);

    // The global-mean estimator paints every cell with the same value.
    let predictions = model.predictions.as_ref().unwrap();
    let first = predictions.get(0, 0).unwrap();
    assert!(predictions.values().iter().all(|v| (v - first).abs() < 1e-12));
}

#[test]
fn evaluation_without_test_data_is_placeholder() {
    let mut reg_inputs = Inputs::new();
    reg_inputs.insert("processed-data", Payload::rows(movie_rows()));
    let mut regression =
        BlockHarness::new("regression", RegressionStage::new(Box::new(GlobalMeanEstimator)));
    let reg_out = regression.execute(&reg_inputs);

    let mut eval_inputs = Inputs::new();
    eval_inputs.extend_from(&reg_out.data);
    let mut evaluation = BlockHarness::with_params(
        "evaluation",
        EvaluationStage,
        params(&[("seed", json!(5))]),
    );
    let eval_out = evaluation.execute(&eval_inputs);
    assert_eq!(eval_out.status, BlockStatus::Completed);
    assert_eq!(eval_out.warnings.len(), 1);
    assert_eq!(eval_out.metrics["placeholder"], json!(true));
}

#[test]
fn lifecycle_across_pipeline_runs() {
    let mut inputs = Inputs::new();
    inputs.insert("dataframe", Payload::rows(movie_rows()));

    let mut split = BlockHarness::new("split", SplitStage);
    assert_eq!(split.status(), BlockStatus::NotConfigured);

    split.configure(params(&[("test_size", json!(0.5))]));
    assert_eq!(split.status(), BlockStatus::Configured);

    let output = split.execute(&inputs);
    assert_eq!(split.status(), BlockStatus::Completed);
    assert_eq!(output.metrics["test_size"], json!(24));

    split.reset();
    assert_eq!(split.status(), BlockStatus::NotConfigured);
    assert!(split.output().is_none());

    // The parameter bag survives the reset.
    let rerun = split.execute(&inputs);
    assert_eq!(rerun.metrics["test_size"], json!(24));
}

#[test]
fn pipeline_store_captures_run_results() {
    let store = PipelineStore::new();

    let mut split_inputs = Inputs::new();
    split_inputs.insert("dataframe", Payload::rows(movie_rows()));
    let mut split = BlockHarness::new("split", SplitStage);
    let split_out = split.execute(&split_inputs);
    let (train, test) = match &split_out.data["split-data"] {
        Payload::Split { train, test } => (train.as_ref().clone(), test.as_ref().clone()),
        other => panic!("unexpected payload: {}", other.kind()),
    };

    let mut metadata = BTreeMap::new();
    metadata.insert("dataset".to_string(), json!("synthetic"));
    let id = store.create(train, test, metadata);
    assert_eq!(id, "pipeline_1");

    let mut cf_inputs = Inputs::new();
    cf_inputs.extend_from(&split_out.data);
    let mut cf = BlockHarness::new("cf", SimilarityStage::new(Arc::new(IdentityScorer)));
    let cf_out = cf.execute(&cf_inputs);
    let model = match &cf_out.data["model"] {
        Payload::Model(model) => Arc::clone(model),
        other => panic!("unexpected payload: {}", other.kind()),
    };
    store.set_model(&id, model).unwrap();

    let mut eval_inputs = Inputs::new();
    eval_inputs.extend_from(&cf_out.data);
    eval_inputs.extend_from(&split_out.data);
    let mut evaluation = BlockHarness::new("evaluation", EvaluationStage);
    let eval_out = evaluation.execute(&eval_inputs);
    let report = match &eval_out.data["metrics"] {
        Payload::Report(report) => report.clone(),
        other => panic!("unexpected payload: {}", other.kind()),
    };
    store.set_evaluation(&id, report).unwrap();

    let entry = store.get(&id).unwrap();
    let entry = entry.lock();
    assert!(entry.model.is_some());
    assert!(entry.evaluation.as_ref().is_some_and(|r| !r.placeholder));
    assert_eq!(entry.metadata["dataset"], json!("synthetic"));
}
