//! Evaluation orchestration over a prediction matrix and held-out rows.
//!
//! Given a fully reconstructed prediction matrix, its training-time id
//! indexes, and held-out test interactions, [`evaluate_model`] computes the
//! requested rating and ranking metrics. When no prediction matrix or no
//! test rows are available, [`placeholder_report`] still returns a
//! well-formed report populated from fixed, documented plausible ranges;
//! callers depend on receiving the full metrics shape even when no real
//! signal exists. Placeholder reports are flagged as such and must never be
//! presented as real scores.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use recblocks_data::{DenseMatrix, IdIndex, Interaction};

use crate::ranking;
use crate::rating;

/// Minimum true rating for a test-set item to count as relevant.
pub const RELEVANCE_THRESHOLD: f64 = 4.0;

/// The metrics the engine can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Root mean squared rating error.
    Rmse,
    /// Mean absolute rating error.
    Mae,
    /// Precision at k.
    Precision,
    /// Recall at k.
    Recall,
    /// Normalized discounted cumulative gain at k.
    Ndcg,
    /// Mean average precision at k.
    Map,
    /// Hit rate at k.
    HitRate,
}

impl MetricKind {
    /// Parses a metric name as used in block configuration.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "rmse" => Some(Self::Rmse),
            "mae" => Some(Self::Mae),
            "precision" => Some(Self::Precision),
            "recall" => Some(Self::Recall),
            "ndcg" => Some(Self::Ndcg),
            "map" => Some(Self::Map),
            "hit_rate" => Some(Self::HitRate),
            _ => None,
        }
    }

    /// Returns the configuration name of the metric.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rmse => "rmse",
            Self::Mae => "mae",
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::Ndcg => "ndcg",
            Self::Map => "map",
            Self::HitRate => "hit_rate",
        }
    }

    /// Returns `true` for the rating-error metrics that are not evaluated
    /// at a cutoff.
    pub fn is_rating_metric(&self) -> bool {
        matches!(self, Self::Rmse | Self::Mae)
    }
}

/// A computed (or placeholder) set of metric values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Metric values keyed by `name` or `name@k`.
    pub values: BTreeMap<String, f64>,
    /// `true` when the values are placeholders drawn from documented
    /// ranges rather than computed from real predictions.
    pub placeholder: bool,
}

/// Collects the per-user relevant item lists from held-out rows.
///
/// A test row defines a relevant item when its rating meets
/// [`RELEVANCE_THRESHOLD`]. Item order follows appearance order in the test
/// rows. Users without any relevant item get no entry and therefore
/// contribute no term to metric averages.
pub fn relevant_items(test_rows: &[Interaction]) -> BTreeMap<i64, Vec<i64>> {
    let mut by_user: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    for row in test_rows {
        if row.rating >= RELEVANCE_THRESHOLD {
            by_user.entry(row.user_id).or_default().push(row.item_id);
        }
    }
    by_user
}

/// Returns the indices of the `k` highest values in `row`, descending, with
/// ties broken by ascending index (stable sort, indices only increase).
pub fn top_k_indices(row: &[f64], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..row.len()).collect();
    indices.sort_by(|&a, &b| {
        row[b]
            .partial_cmp(&row[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices.truncate(k);
    indices
}

/// Computes the requested metrics over a prediction matrix and test rows.
///
/// Rating metrics compare each test row's true rating with the matrix cell
/// addressed by the training-time indexes; rows referencing unseen users or
/// items are skipped. Ranking metrics evaluate each user's
/// top-`max(k_values)` recommendation list against that user's relevant
/// items and are averaged over users with at least one relevant item.
pub fn evaluate_model(
    predictions: &DenseMatrix,
    user_index: &IdIndex,
    item_index: &IdIndex,
    test_rows: &[Interaction],
    metrics: &[MetricKind],
    k_values: &[usize],
) -> EvaluationReport {
    let mut values = BTreeMap::new();

    let (truth, predicted) = rating_pairs(predictions, user_index, item_index, test_rows);
    for metric in metrics {
        match metric {
            MetricKind::Rmse => {
                values.insert("rmse".to_string(), rating::rmse(&truth, &predicted));
            }
            MetricKind::Mae => {
                values.insert("mae".to_string(), rating::mae(&truth, &predicted));
            }
            _ => {}
        }
    }

    let ranking_metrics: Vec<MetricKind> = metrics
        .iter()
        .copied()
        .filter(|m| !m.is_rating_metric())
        .collect();
    if !ranking_metrics.is_empty() && !k_values.is_empty() {
        let max_k = k_values.iter().copied().max().unwrap_or(0);
        let relevant = relevant_items(test_rows);

        // Per-user recommendation lists, computed once at the largest
        // cutoff and sliced per k.
        let mut per_user: Vec<(&Vec<i64>, Vec<i64>)> = Vec::new();
        for (user_id, items) in &relevant {
            let Some(u) = user_index.index_of(*user_id) else {
                continue;
            };
            let Some(row) = predictions.row(u) else {
                continue;
            };
            let ranked: Vec<i64> = top_k_indices(row, max_k)
                .into_iter()
                .filter_map(|i| item_index.id_at(i))
                .collect();
            per_user.push((items, ranked));
        }

        for metric in &ranking_metrics {
            for &k in k_values {
                let key = format!("{}@{}", metric.name(), k);
                let score = mean_over_users(&per_user, |items, ranked| match metric {
                    MetricKind::Precision => ranking::precision_at_k(items, ranked, k),
                    MetricKind::Recall => ranking::recall_at_k(items, ranked, k),
                    MetricKind::Ndcg => ranking::ndcg_at_k(items, ranked, k),
                    MetricKind::Map => ranking::map_at_k(items, ranked, k),
                    MetricKind::HitRate => ranking::hit_rate_at_k(items, ranked, k),
                    MetricKind::Rmse | MetricKind::Mae => 0.0,
                });
                values.insert(key, score);
            }
        }
    }

    EvaluationReport {
        values,
        placeholder: false,
    }
}

fn rating_pairs(
    predictions: &DenseMatrix,
    user_index: &IdIndex,
    item_index: &IdIndex,
    test_rows: &[Interaction],
) -> (Vec<f64>, Vec<f64>) {
    let mut truth = Vec::new();
    let mut predicted = Vec::new();
    for row in test_rows {
        let (Some(u), Some(i)) = (
            user_index.index_of(row.user_id),
            item_index.index_of(row.item_id),
        ) else {
            continue;
        };
        if let Some(score) = predictions.get(u, i) {
            truth.push(row.rating);
            predicted.push(score);
        }
    }
    (truth, predicted)
}

fn mean_over_users(
    per_user: &[(&Vec<i64>, Vec<i64>)],
    score: impl Fn(&[i64], &[i64]) -> f64,
) -> f64 {
    if per_user.is_empty() {
        return 0.0;
    }
    let total: f64 = per_user
        .iter()
        .map(|(items, ranked)| score(items, ranked))
        .sum();
    total / per_user.len() as f64
}

/// Placeholder value ranges, `(base, spread)`: values are drawn uniformly
/// from `[base, base + spread)`.
fn placeholder_range(metric: MetricKind) -> (f64, f64) {
    match metric {
        MetricKind::Rmse => (0.95, 0.1),
        MetricKind::Mae => (0.75, 0.1),
        MetricKind::Precision => (0.30, 0.1),
        MetricKind::Recall => (0.25, 0.1),
        MetricKind::Ndcg => (0.35, 0.1),
        MetricKind::Map => (0.20, 0.1),
        MetricKind::HitRate => (0.50, 0.1),
    }
}

/// Produces a well-formed report with placeholder values when no real
/// signal (prediction matrix and test rows) is available.
///
/// The report is flagged `placeholder = true`; callers surface that flag
/// instead of treating the values as real scores.
pub fn placeholder_report(
    metrics: &[MetricKind],
    k_values: &[usize],
    rng: &mut impl Rng,
) -> EvaluationReport {
    warn!("evaluation fallback: emitting placeholder metric values");
    let mut values = BTreeMap::new();
    for metric in metrics {
        let (base, spread) = placeholder_range(*metric);
        if metric.is_rating_metric() {
            values.insert(metric.name().to_string(), base + rng.gen::<f64>() * spread);
        } else {
            for &k in k_values {
                values.insert(
                    format!("{}@{}", metric.name(), k),
                    base + rng.gen::<f64>() * spread,
                );
            }
        }
    }
    EvaluationReport {
        values,
        placeholder: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn identity_index(n: i64) -> IdIndex {
        IdIndex::from_sorted(0..n)
    }

    #[test]
    fn test_relevant_items_threshold() {
        let rows = vec![
            Interaction::new(1, 10, 4.0, 0),
            Interaction::new(1, 11, 3.9, 0),
            Interaction::new(2, 12, 5.0, 0),
            Interaction::new(3, 13, 1.0, 0),
        ];
        let relevant = relevant_items(&rows);
        assert_eq!(relevant.get(&1), Some(&vec![10]));
        assert_eq!(relevant.get(&2), Some(&vec![12]));
        assert_eq!(relevant.get(&3), None);
    }

    #[test]
    fn test_top_k_stable_ties() {
        // Equal scores keep ascending index order.
        let row = [1.0, 3.0, 3.0, 2.0];
        assert_eq!(top_k_indices(&row, 3), vec![1, 2, 3]);
    }

    #[test]
    fn test_evaluate_perfect_model() {
        // User 0 rated items 0 and 1 highly; the matrix ranks them first.
        let predictions =
            DenseMatrix::from_rows(vec![vec![5.0, 4.5, 0.1], vec![0.1, 0.2, 4.8]]).unwrap();
        let users = identity_index(2);
        let items = identity_index(3);
        let test_rows = vec![
            Interaction::new(0, 0, 5.0, 0),
            Interaction::new(0, 1, 4.5, 0),
            Interaction::new(1, 2, 4.8, 0),
        ];

        let report = evaluate_model(
            &predictions,
            &users,
            &items,
            &test_rows,
            &[MetricKind::Rmse, MetricKind::Precision, MetricKind::Ndcg],
            &[2],
        );
        assert!(!report.placeholder);
        // Predictions equal true ratings exactly.
        assert_eq!(report.values["rmse"], 0.0);
        // User 0: both top-2 relevant; user 1: one of top-2 relevant.
        assert!((report.values["precision@2"] - 0.75).abs() < 1e-12);
        assert!((report.values["ndcg@2"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_users_without_relevant_items_excluded() {
        let predictions = DenseMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let users = identity_index(2);
        let items = identity_index(2);
        // Only user 0 has a relevant test item; user 1's low rating must
        // not drag the average down with a zero term.
        let test_rows = vec![
            Interaction::new(0, 0, 5.0, 0),
            Interaction::new(1, 0, 1.0, 0),
        ];
        let report = evaluate_model(
            &predictions,
            &users,
            &items,
            &test_rows,
            &[MetricKind::HitRate],
            &[1],
        );
        assert_eq!(report.values["hit_rate@1"], 1.0);
    }

    #[test]
    fn test_unseen_ids_skipped_in_rating_metrics() {
        let predictions = DenseMatrix::from_rows(vec![vec![3.0]]).unwrap();
        let users = identity_index(1);
        let items = identity_index(1);
        let test_rows = vec![
            Interaction::new(0, 0, 3.0, 0),
            Interaction::new(99, 0, 1.0, 0),
        ];
        let report = evaluate_model(
            &predictions,
            &users,
            &items,
            &test_rows,
            &[MetricKind::Rmse, MetricKind::Mae],
            &[],
        );
        assert_eq!(report.values["rmse"], 0.0);
        assert_eq!(report.values["mae"], 0.0);
    }

    #[test]
    fn test_placeholder_report_shape_and_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let metrics = [MetricKind::Rmse, MetricKind::Precision, MetricKind::Recall];
        let report = placeholder_report(&metrics, &[5, 10], &mut rng);

        assert!(report.placeholder);
        assert_eq!(report.values.len(), 5);
        let rmse = report.values["rmse"];
        assert!((0.95..1.05).contains(&rmse));
        for k in [5, 10] {
            let p = report.values[&format!("precision@{k}")];
            assert!((0.30..0.40).contains(&p));
            let r = report.values[&format!("recall@{k}")];
            assert!((0.25..0.35).contains(&r));
        }
    }
}
