//! Sparse matrix-vector products for the explicit transient loop.

use faer::sparse::SparseColMat;

use crate::error::{Error, Result};
use crate::linear::build_matrix;

/// Conductance matrix in CSC form, applied as `y = G·x`.
///
/// Built once per assembly; each transient step only needs the product.
pub struct SparseOperator {
    matrix: SparseColMat<usize, f64>,
    diagonal: Vec<f64>,
}

impl SparseOperator {
    /// Wrap an already built conductance matrix.
    pub fn from_matrix(matrix: SparseColMat<usize, f64>) -> Self {
        let diagonal = extract_diagonal(&matrix);
        Self { matrix, diagonal }
    }

    /// Create from triplets (row, col, value). Duplicate entries are summed.
    pub fn from_triplets(size: usize, triplets: &[(usize, usize, f64)]) -> Result<Self> {
        build_matrix(size, triplets).map(Self::from_matrix)
    }

    /// The CSC matrix.
    pub fn matrix(&self) -> &SparseColMat<usize, f64> {
        &self.matrix
    }

    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Stored diagonal `A[i,i]`.
    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    /// `y = A·x`.
    pub fn apply(&self, x: &[f64], y: &mut [f64]) -> Result<()> {
        let n = self.dim();
        for len in [x.len(), y.len()] {
            if len != n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    actual: len,
                });
            }
        }

        y.iter_mut().for_each(|yi| *yi = 0.0);

        // Scatter each column: y += G[:, j] * x[j].
        let mat_ref = self.matrix.as_ref();
        let col_ptrs = mat_ref.col_ptr();
        let row_indices = mat_ref.row_idx();
        let values = mat_ref.val();

        for (j, &xj) in x.iter().enumerate() {
            for idx in col_ptrs[j]..col_ptrs[j + 1] {
                y[row_indices[idx]] += values[idx] * xj;
            }
        }
        Ok(())
    }
}

fn extract_diagonal(matrix: &SparseColMat<usize, f64>) -> Vec<f64> {
    let mat_ref = matrix.as_ref();
    let col_ptrs = mat_ref.col_ptr();
    let row_indices = mat_ref.row_idx();
    let values = mat_ref.val();
    let n = matrix.nrows().min(matrix.ncols());

    (0..n)
        .map(|j| {
            (col_ptrs[j]..col_ptrs[j + 1])
                .filter(|&idx| row_indices[idx] == j)
                .map(|idx| values[idx])
                .sum()
        })
        .collect()
}

impl std::fmt::Debug for SparseOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseOperator")
            .field("dim", &self.dim())
            .field("nnz", &self.matrix.as_ref().row_idx().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_matches_dense() {
        // [ 3 -1  0 ]
        // [-1  3 -1 ]
        // [ 0 -2  3 ]
        let triplets = vec![
            (0, 0, 3.0),
            (0, 1, -1.0),
            (1, 0, -1.0),
            (1, 1, 3.0),
            (1, 2, -1.0),
            (2, 1, -2.0),
            (2, 2, 3.0),
        ];
        let op = SparseOperator::from_triplets(3, &triplets).unwrap();
        let mut y = vec![0.0; 3];
        op.apply(&[1.0, 2.0, 3.0], &mut y).unwrap();
        assert_eq!(y, vec![1.0, 2.0, 5.0]);
        assert_eq!(op.diagonal(), &[3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_apply_dimension_mismatch() {
        let op = SparseOperator::from_triplets(2, &[(0, 0, 1.0), (1, 1, 1.0)]).unwrap();
        let mut y = vec![0.0; 2];
        assert!(matches!(
            op.apply(&[1.0], &mut y),
            Err(Error::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }
}
