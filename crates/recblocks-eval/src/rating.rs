//! Rating-error metrics over parallel true/predicted slices.

/// Root mean squared error between true and predicted ratings.
///
/// Returns `0.0` for empty input. Callers are responsible for passing
/// equal-length slices; extra elements on either side are ignored.
///
/// # Examples
///
/// ```
/// use recblocks_eval::rating::rmse;
///
/// let truth = [4.0, 3.5, 5.0, 2.0, 4.5];
/// let pred = [3.8, 3.7, 4.8, 2.5, 4.2];
/// // sqrt(0.46 / 5)
/// assert!((rmse(&truth, &pred) - 0.3033).abs() < 1e-4);
/// ```
#[must_use]
pub fn rmse(truth: &[f64], pred: &[f64]) -> f64 {
    let n = truth.len().min(pred.len());
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = truth
        .iter()
        .zip(pred.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum();
    (sum_sq / n as f64).sqrt()
}

/// Mean absolute error between true and predicted ratings.
///
/// Returns `0.0` for empty input.
///
/// # Examples
///
/// ```
/// use recblocks_eval::rating::mae;
///
/// let truth = [4.0, 3.5, 5.0, 2.0, 4.5];
/// let pred = [3.8, 3.7, 4.8, 2.5, 4.2];
/// // 1.4 / 5
/// assert!((mae(&truth, &pred) - 0.28).abs() < 1e-10);
/// ```
#[must_use]
pub fn mae(truth: &[f64], pred: &[f64]) -> f64 {
    let n = truth.len().min(pred.len());
    if n == 0 {
        return 0.0;
    }
    let sum_abs: f64 = truth
        .iter()
        .zip(pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum();
    sum_abs / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rmse_reference_values() {
        let truth = [4.0, 3.5, 5.0, 2.0, 4.5];
        let pred = [3.8, 3.7, 4.8, 2.5, 4.2];
        assert!((rmse(&truth, &pred) - 0.303_315_018).abs() < 1e-6);
    }

    #[test]
    fn test_mae_reference_values() {
        let truth = [4.0, 3.5, 5.0, 2.0, 4.5];
        let pred = [3.8, 3.7, 4.8, 2.5, 4.2];
        assert!((mae(&truth, &pred) - 0.28).abs() < 1e-10);
    }

    #[test]
    fn test_perfect_predictions() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(rmse(&values, &values), 0.0);
        assert_eq!(mae(&values, &values), 0.0);
    }

    #[test]
    fn test_empty() {
        assert_eq!(rmse(&[], &[]), 0.0);
        assert_eq!(mae(&[], &[]), 0.0);
    }
}
