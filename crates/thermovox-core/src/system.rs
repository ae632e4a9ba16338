//! Assembled conductance system `G·x = b` in triplet form.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};

use crate::boundary::{BoundaryPolicy, Discretization};
use crate::error::Result;
use crate::field::SourceField;
use crate::grid::VoxelGrid;

/// Sparse conductance matrix plus right-hand side for one voxel problem.
///
/// Triplets may repeat a position; duplicates are summed when the matrix is
/// materialized. The constant boundary term (`g_b · reference`) is kept
/// separately from the source contribution so the transient integrator can
/// combine it with a time-varying source.
#[derive(Debug, Clone)]
pub struct SparseSystem {
    grid: VoxelGrid,
    policy: BoundaryPolicy,
    /// (row, col, value) entries of `G`.
    pub triplets: Vec<(usize, usize, f64)>,
    diagonal: Vec<f64>,
    boundary_conductance: Vec<f64>,
    boundary_offset: DVector<f64>,
    rhs: DVector<f64>,
}

impl SparseSystem {
    pub(crate) fn new(
        grid: VoxelGrid,
        policy: BoundaryPolicy,
        triplets: Vec<(usize, usize, f64)>,
        diagonal: Vec<f64>,
        boundary_conductance: Vec<f64>,
    ) -> Self {
        let reference = policy.reference();
        let boundary_offset =
            DVector::from_iterator(grid.len(), boundary_conductance.iter().map(|g| g * reference));
        let rhs = boundary_offset.clone();
        Self {
            grid,
            policy,
            triplets,
            diagonal,
            boundary_conductance,
            boundary_offset,
            rhs,
        }
    }

    /// Number of unknowns (voxel count).
    pub fn size(&self) -> usize {
        self.grid.len()
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn policy(&self) -> &BoundaryPolicy {
        &self.policy
    }

    pub fn discretization(&self) -> Discretization {
        Discretization::of(&self.grid, &self.policy)
    }

    /// `G[i,i]`: total conductance incident to each voxel, boundary included.
    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    /// Per-voxel conductance to the boundary reference (zero off the boundary).
    pub fn boundary_conductance(&self) -> &[f64] {
        &self.boundary_conductance
    }

    /// Sum of all boundary conductances.
    pub fn total_boundary_conductance(&self) -> f64 {
        self.boundary_conductance.iter().sum()
    }

    /// Constant right-hand-side term `g_b · reference`.
    pub fn boundary_offset(&self) -> &DVector<f64> {
        &self.boundary_offset
    }

    /// Right-hand side `b`.
    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    /// Right-hand side for `sources` against this matrix, without modifying it.
    pub fn rhs_for(&self, sources: &SourceField) -> Result<DVector<f64>> {
        sources.validate(&self.grid)?;
        let sign = self.policy.source_sign();
        Ok(DVector::from_iterator(
            self.size(),
            self.boundary_offset
                .iter()
                .zip(sources.values())
                .map(|(offset, s)| offset + sign * s),
        ))
    }

    /// Replace the right-hand side with the one for `sources`.
    pub fn set_sources(&mut self, sources: &SourceField) -> Result<()> {
        self.rhs = self.rhs_for(sources)?;
        Ok(())
    }

    /// Net flux leaving through the boundary for a solved field `x`:
    /// `Σ g_b,i · (x_i − reference)`.
    pub fn boundary_flux(&self, x: &[f64]) -> f64 {
        let reference = self.policy.reference();
        self.boundary_conductance
            .iter()
            .zip(x)
            .map(|(g, xi)| g * (xi - reference))
            .sum()
    }

    /// `G·x` computed directly from the triplets.
    pub fn apply(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.size()];
        for &(r, c, v) in &self.triplets {
            y[r] += v * x[c];
        }
        y
    }

    /// True if `G[i,j] == G[j,i]` within `tol` for every stored position.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        let mut entries: HashMap<(usize, usize), f64> = HashMap::with_capacity(self.triplets.len());
        for &(r, c, v) in &self.triplets {
            *entries.entry((r, c)).or_insert(0.0) += v;
        }
        entries.iter().all(|(&(r, c), &v)| {
            let t = entries.get(&(c, r)).copied().unwrap_or(0.0);
            (v - t).abs() <= tol * v.abs().max(t.abs()).max(1.0)
        })
    }

    /// Dense copy of `G`. Intended for small systems and tests.
    pub fn to_dense_matrix(&self) -> DMatrix<f64> {
        let n = self.size();
        let mut m = DMatrix::zeros(n, n);
        for &(r, c, v) in &self.triplets {
            m[(r, c)] += v;
        }
        m
    }
}
