//! The raw user-item interaction record.

use serde::{Deserialize, Serialize};

/// One observed `(user, item, rating, timestamp)` record.
///
/// A dataset is an ordered `Vec<Interaction>`. Uniqueness of
/// `(user_id, item_id)` is NOT enforced: duplicate pairs are legal, and when
/// folded into a sparse matrix their ratings accumulate by addition. Callers
/// that need last-write-wins semantics must deduplicate upstream.
///
/// # Examples
///
/// ```
/// use recblocks_data::Interaction;
///
/// let row = Interaction::new(42, 7, 4.5, 1_700_000_000);
/// assert_eq!(row.user_id, 42);
/// assert_eq!(row.rating, 4.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// External user identifier.
    pub user_id: i64,
    /// External item identifier.
    pub item_id: i64,
    /// Observed rating value.
    pub rating: f64,
    /// Observation timestamp (seconds or any monotone unit).
    pub timestamp: i64,
}

impl Interaction {
    /// Creates a new interaction record.
    pub fn new(user_id: i64, item_id: i64, rating: f64, timestamp: i64) -> Self {
        Self {
            user_id,
            item_id,
            rating,
            timestamp,
        }
    }
}

/// Returns the mean rating over a slice of interactions, or `None` when the
/// slice is empty.
pub fn mean_rating(rows: &[Interaction]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    Some(rows.iter().map(|r| r.rating).sum::<f64>() / rows.len() as f64)
}
