//! Ranking metrics over relevant-item and recommended-item id lists.
//!
//! All functions take the ground-truth relevant item ids for one user and a
//! ranked recommendation list, evaluated at cutoff `k`. Relevance is binary:
//! an item either is in the relevant set or it is not. Degenerate inputs
//! resolve to `0.0` rather than failing: `precision@0`, an empty relevant
//! set for recall/MAP, and a zero ideal DCG for NDCG.

use std::collections::HashSet;

/// Precision@K: the fraction of the top-k recommendations that are
/// relevant.
///
/// Defined as `0.0` when `k == 0`.
///
/// # Examples
///
/// ```
/// use recblocks_eval::ranking::precision_at_k;
///
/// let relevant = [1, 3, 5, 7, 9];
/// let ranked = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
/// assert_eq!(precision_at_k(&relevant, &ranked, 5), 0.6);
/// assert_eq!(precision_at_k(&relevant, &ranked, 0), 0.0);
/// ```
#[must_use]
pub fn precision_at_k(relevant: &[i64], ranked: &[i64], k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let relevant_set: HashSet<i64> = relevant.iter().copied().collect();
    let hits = ranked
        .iter()
        .take(k)
        .filter(|item| relevant_set.contains(item))
        .count();
    hits as f64 / k as f64
}

/// Recall@K: the fraction of relevant items retrieved in the top-k.
///
/// Defined as `0.0` when the relevant set is empty.
///
/// # Examples
///
/// ```
/// use recblocks_eval::ranking::recall_at_k;
///
/// let relevant = [1, 3, 5, 7, 9];
/// let ranked = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
/// assert_eq!(recall_at_k(&relevant, &ranked, 10), 1.0);
/// ```
#[must_use]
pub fn recall_at_k(relevant: &[i64], ranked: &[i64], k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let relevant_set: HashSet<i64> = relevant.iter().copied().collect();
    let hits = ranked
        .iter()
        .take(k)
        .filter(|item| relevant_set.contains(item))
        .count();
    hits as f64 / relevant_set.len() as f64
}

/// Discounted cumulative gain at K with binary relevance and 1-indexed
/// positions: `sum over i of rel(item_i) / log2(i + 1)`.
#[must_use]
pub fn dcg_at_k(relevant: &[i64], ranked: &[i64], k: usize) -> f64 {
    let relevant_set: HashSet<i64> = relevant.iter().copied().collect();
    ranked
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, item)| relevant_set.contains(item))
        .map(|(i, _)| 1.0 / ((i + 2) as f64).log2())
        .sum()
}

/// Normalized DCG at K: the DCG of the ranking divided by the DCG of the
/// best achievable ranking (`relevant[..k]`).
///
/// Defined as `0.0` when the ideal DCG is `0`.
///
/// # Examples
///
/// ```
/// use recblocks_eval::ranking::ndcg_at_k;
///
/// let relevant = [1, 3, 5];
/// // Ranking the relevant items first achieves NDCG of exactly 1.
/// assert!((ndcg_at_k(&relevant, &relevant, 3) - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn ndcg_at_k(relevant: &[i64], ranked: &[i64], k: usize) -> f64 {
    let dcg = dcg_at_k(relevant, ranked, k);
    let ideal: Vec<i64> = relevant.iter().take(k).copied().collect();
    let idcg = dcg_at_k(relevant, &ideal, k);
    if idcg == 0.0 {
        return 0.0;
    }
    dcg / idcg
}

/// Average precision at K: each relevant hit at 1-indexed position `i`
/// contributes `hits_so_far / i`; the sum is normalized by
/// `min(|relevant|, k)`.
///
/// Defined as `0.0` when the relevant set is empty.
#[must_use]
pub fn map_at_k(relevant: &[i64], ranked: &[i64], k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let relevant_set: HashSet<i64> = relevant.iter().copied().collect();

    let mut hits = 0.0;
    let mut score = 0.0;
    for (i, item) in ranked.iter().take(k).enumerate() {
        if relevant_set.contains(item) {
            hits += 1.0;
            score += hits / (i + 1) as f64;
        }
    }
    score / relevant.len().min(k) as f64
}

/// Hit rate at K: `1.0` if any relevant item appears in the top-k,
/// `0.0` otherwise.
#[must_use]
pub fn hit_rate_at_k(relevant: &[i64], ranked: &[i64], k: usize) -> f64 {
    let relevant_set: HashSet<i64> = relevant.iter().copied().collect();
    if ranked.iter().take(k).any(|item| relevant_set.contains(item)) {
        1.0
    } else {
        0.0
    }
}
