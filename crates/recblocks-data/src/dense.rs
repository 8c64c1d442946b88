//! Dense row-major matrix used for design matrices and prediction matrices.

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// A dense row-major `f64` matrix.
///
/// Used both for the feature design matrix fed to an estimator and for the
/// fully reconstructed `n_users x n_items` prediction matrix. A prediction
/// matrix is always synthesized in full; there is no partially-computed
/// state.
///
/// # Examples
///
/// ```
/// use recblocks_data::DenseMatrix;
///
/// let mut m = DenseMatrix::zeros(2, 3);
/// m.set(1, 2, 5.0).unwrap();
/// assert_eq!(m.get(1, 2), Some(5.0));
/// assert_eq!(m.row(1).unwrap(), &[0.0, 0.0, 5.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    n_rows: usize,
    n_cols: usize,
    values: Vec<f64>,
}

impl DenseMatrix {
    /// Creates a matrix of the given shape filled with zeros.
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            values: vec![0.0; n_rows * n_cols],
        }
    }

    /// Creates a matrix from row-major values.
    ///
    /// Returns an error if `values.len() != n_rows * n_cols`.
    pub fn from_values(n_rows: usize, n_cols: usize, values: Vec<f64>) -> Result<Self> {
        if values.len() != n_rows * n_cols {
            return Err(DataError::LengthMismatch {
                left: values.len(),
                right: n_rows * n_cols,
                context: "dense matrix values",
            });
        }
        Ok(Self {
            n_rows,
            n_cols,
            values,
        })
    }

    /// Creates a matrix from equal-length rows.
    ///
    /// An empty row set produces a `0 x 0` matrix.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(DataError::LengthMismatch {
                    left: row.len(),
                    right: n_cols,
                    context: "dense matrix row widths",
                });
            }
            values.extend(row);
        }
        Ok(Self {
            n_rows,
            n_cols,
            values,
        })
    }

    /// Returns the `(n_rows, n_cols)` shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Returns the number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Returns the number of columns.
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Returns the value at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.n_rows && col < self.n_cols {
            Some(self.values[row * self.n_cols + col])
        } else {
            None
        }
    }

    /// Sets the value at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.n_rows {
            return Err(DataError::IndexOutOfBounds {
                index: row,
                len: self.n_rows,
                dimension: "row",
            });
        }
        if col >= self.n_cols {
            return Err(DataError::IndexOutOfBounds {
                index: col,
                len: self.n_cols,
                dimension: "col",
            });
        }
        self.values[row * self.n_cols + col] = value;
        Ok(())
    }

    /// Returns row `row` as a slice, or `None` when out of bounds.
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row < self.n_rows {
            let start = row * self.n_cols;
            Some(&self.values[start..start + self.n_cols])
        } else {
            None
        }
    }

    /// Returns the underlying row-major values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns a mutable view of the underlying row-major values.
    ///
    /// Intended for bulk writes where the caller guarantees the layout, such
    /// as the batched predictor writing disjoint cell ranges.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_shape() {
        let m = DenseMatrix::zeros(3, 4);
        assert_eq!(m.shape(), (3, 4));
        assert!(m.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_get_set() {
        let mut m = DenseMatrix::zeros(2, 2);
        m.set(0, 1, 1.5).unwrap();
        assert_eq!(m.get(0, 1), Some(1.5));
        assert_eq!(m.get(2, 0), None);
        assert!(m.set(2, 0, 1.0).is_err());
        assert!(m.set(0, 2, 1.0).is_err());
    }

    #[test]
    fn test_from_rows() {
        let m = DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.row(0).unwrap(), &[1.0, 2.0]);
        assert_eq!(m.row(1).unwrap(), &[3.0, 4.0]);
        assert_eq!(m.row(2), None);
    }

    #[test]
    fn test_from_rows_ragged() {
        assert!(DenseMatrix::from_rows(vec![vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_from_values_length_checked() {
        assert!(DenseMatrix::from_values(2, 2, vec![0.0; 3]).is_err());
        assert!(DenseMatrix::from_values(2, 2, vec![0.0; 4]).is_ok());
    }
}
