//! Sparse LU solves for assembled conductance systems.

use std::sync::{Arc, PoisonError, RwLock};

use faer::prelude::*;
use faer::sparse::linalg::solvers::{Lu, SymbolicLu};
use faer::sparse::{SparseColMat, Triplet};
use log::debug;
use nalgebra::DVector;

use crate::error::{Error, Result};

/// Build a faer CSC matrix from `(row, col, value)` triplets.
///
/// Duplicate positions are summed. Explicit zeros are kept so the pattern
/// depends only on the positions supplied.
pub(crate) fn build_matrix(
    size: usize,
    triplets: &[(usize, usize, f64)],
) -> Result<SparseColMat<usize, f64>> {
    let faer_triplets: Vec<_> = triplets
        .iter()
        .map(|&(r, c, v)| Triplet::new(r, c, v))
        .collect();

    SparseColMat::<usize, f64>::try_new_from_triplets(size, size, &faer_triplets)
        .map_err(|e| Error::SolverDiverged(format!("failed to build sparse matrix: {e:?}")))
}

fn check_rhs(size: usize, rhs: &DVector<f64>) -> Result<()> {
    if size != rhs.len() {
        return Err(Error::DimensionMismatch {
            expected: size,
            actual: rhs.len(),
        });
    }
    Ok(())
}

fn finite_solution(x: &Col<f64>) -> Result<DVector<f64>> {
    let n = x.nrows();
    if let Some(i) = (0..n).find(|&i| !x[i].is_finite()) {
        return Err(Error::SolverDiverged(format!(
            "non-finite value {} in solution at index {i}",
            x[i]
        )));
    }
    Ok(DVector::from_fn(n, |i, _| x[i]))
}

/// One-shot sparse LU solve of `G·x = b`; the solution must be finite.
pub fn solve_sparse(
    size: usize,
    triplets: &[(usize, usize, f64)],
    rhs: &DVector<f64>,
) -> Result<DVector<f64>> {
    check_rhs(size, rhs)?;

    let sparse_mat = build_matrix(size, triplets)?;
    let lu = sparse_mat
        .sp_lu()
        .map_err(|e| Error::SolverDiverged(format!("LU factorization failed: {e:?}")))?;

    let faer_rhs = Col::<f64>::from_fn(size, |i| rhs[i]);
    let faer_x = lu.solve(&faer_rhs);

    finite_solution(&faer_x)
}

/// Sparse LU that keeps the symbolic factorization between solves.
///
/// Conductance systems assembled on the same grid share one sparsity
/// pattern, so only the numeric factorization is redone per solve. A
/// solve with a different pattern recomputes and replaces the cache.
///
/// The cache sits behind a `RwLock`, so one instance can be shared across
/// threads during a sweep.
#[derive(Default)]
pub struct CachedSparseLu {
    cached: RwLock<Option<CachedSymbolic>>,
}

#[derive(Clone)]
struct CachedSymbolic {
    symbolic: Arc<SymbolicLu<usize>>,
    col_ptr: Arc<[usize]>,
    row_idx: Arc<[usize]>,
}

impl CachedSymbolic {
    fn matches(&self, mat: &SparseColMat<usize, f64>) -> bool {
        let mat = mat.as_ref();
        *self.col_ptr == *mat.col_ptr() && *self.row_idx == *mat.row_idx()
    }
}

impl CachedSparseLu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached symbolic factorization.
    pub fn reset(&self) {
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// True once a symbolic factorization has been computed.
    pub fn has_symbolic(&self) -> bool {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn symbolic_for(&self, mat: &SparseColMat<usize, f64>) -> Result<Arc<SymbolicLu<usize>>> {
        {
            let cache = self.cached.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = cache.as_ref().filter(|entry| entry.matches(mat)) {
                return Ok(entry.symbolic.clone());
            }
        }

        debug!(
            "computing symbolic LU for {}x{} pattern with {} entries",
            mat.nrows(),
            mat.ncols(),
            mat.as_ref().row_idx().len()
        );
        let symbolic = Arc::new(
            SymbolicLu::try_new(mat.symbolic())
                .map_err(|e| Error::SolverDiverged(format!("symbolic factorization failed: {e:?}")))?,
        );
        let entry = CachedSymbolic {
            symbolic: symbolic.clone(),
            col_ptr: mat.as_ref().col_ptr().into(),
            row_idx: mat.as_ref().row_idx().into(),
        };
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(entry);
        Ok(symbolic)
    }

    /// Solve `A·x = b`, reusing the symbolic factorization when the pattern matches.
    pub fn solve(
        &self,
        size: usize,
        triplets: &[(usize, usize, f64)],
        rhs: &DVector<f64>,
    ) -> Result<DVector<f64>> {
        check_rhs(size, rhs)?;

        let sparse_mat = build_matrix(size, triplets)?;
        let symbolic = self.symbolic_for(&sparse_mat)?;
        let lu = Lu::try_new_with_symbolic((*symbolic).clone(), sparse_mat.as_ref())
            .map_err(|e| Error::SolverDiverged(format!("numeric factorization failed: {e:?}")))?;

        let b = Col::<f64>::from_fn(size, |i| rhs[i]);
        let x = lu.solve(&b);

        finite_solution(&x)
    }
}

impl std::fmt::Debug for CachedSparseLu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedSparseLu")
            .field("has_symbolic", &self.has_symbolic())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, dvector};
    use thermovox_core::{
        AssemblerConfig, BoundaryPolicy, ConductanceAssembler, InterfaceModel, MaterialField,
        SourceField, VoxelGrid,
    };

    #[test]
    fn test_two_node_chain_to_ambient() {
        // P = 10 into node 0, g = 2 between nodes, g_b = 4 from node 1 to 25.
        let triplets = vec![(0, 0, 2.0), (0, 1, -2.0), (1, 0, -2.0), (1, 1, 6.0)];
        let x = solve_sparse(2, &triplets, &dvector![10.0, 100.0]).unwrap();
        assert!((x[1] - 27.5).abs() < 1e-10, "T1 = {}", x[1]);
        assert!((x[0] - 32.5).abs() < 1e-10, "T0 = {}", x[0]);
    }

    #[test]
    fn test_duplicates_are_summed() {
        let triplets = vec![(0, 0, 1.0), (0, 0, 1.0), (1, 1, 4.0), (0, 1, 0.0), (1, 0, 0.0)];
        let x = solve_sparse(2, &triplets, &dvector![2.0, 8.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_assembled_stack_matches_dense_lu() {
        let grid = VoxelGrid::square(4, 3, 50.0, 20.0).unwrap();
        let system = ConductanceAssembler::new(grid)
            .with_config(AssemblerConfig::thermal().with_interface(InterfaceModel::Harmonic))
            .assemble(
                &MaterialField::per_layer([150.0, 60.0, 0.5]),
                &SourceField::point(&grid, 0, 1, 2, 30.0),
                &BoundaryPolicy::default(),
            )
            .unwrap();

        let dense: DMatrix<f64> = system.to_dense_matrix();
        let expected = dense.lu().solve(system.rhs()).unwrap();
        let x = solve_sparse(system.size(), &system.triplets, system.rhs()).unwrap();
        for (i, (a, b)) in x.iter().zip(expected.iter()).enumerate() {
            assert!((a - b).abs() < 1e-9 * b.abs(), "voxel {i}: sparse {a}, dense {b}");
        }
    }

    #[test]
    fn test_rhs_length_checked() {
        let result = solve_sparse(1, &[(0, 0, 1.0)], &dvector![1.0, 2.0]);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_singular_is_diverged() {
        // Row 2 = 2 * row 1.
        let triplets = vec![(0, 0, 1.0), (0, 1, 2.0), (1, 0, 2.0), (1, 1, 4.0)];
        let result = solve_sparse(2, &triplets, &dvector![1.0, 2.0]);
        assert!(matches!(result, Err(Error::SolverDiverged(_))));
    }

    #[test]
    fn test_cached_lu_reuses_symbolic() {
        let lu = CachedSparseLu::new();
        assert!(!lu.has_symbolic());

        let a = vec![(0, 0, 2.0), (0, 1, -1.0), (1, 0, -1.0), (1, 1, 2.0)];
        let x = lu.solve(2, &a, &dvector![1.0, 1.0]).unwrap();
        assert!(lu.has_symbolic());
        assert!((x[0] - 1.0).abs() < 1e-12 && (x[1] - 1.0).abs() < 1e-12);

        // Same pattern, new values.
        let b = vec![(0, 0, 4.0), (0, 1, -1.0), (1, 0, -1.0), (1, 1, 4.0)];
        let x = lu.solve(2, &b, &dvector![3.0, 3.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12 && (x[1] - 1.0).abs() < 1e-12);

        // Different pattern falls back to a fresh symbolic factorization.
        let c = vec![(0, 0, 2.0), (1, 1, 4.0)];
        let x = lu.solve(2, &c, &dvector![2.0, 2.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12 && (x[1] - 0.5).abs() < 1e-12);

        lu.reset();
        assert!(!lu.has_symbolic());
    }
}
