//! Steady-state solve of an assembled conductance network.

use log::{debug, info};
use thermovox_core::{
    AssemblerConfig, BoundaryPolicy, ConductanceAssembler, MaterialField, ScalarField,
    SourceField, SparseSystem, VoxelGrid,
};

use crate::error::Result;
use crate::linear::solve_sparse;

/// Solves `G·x = b` once per call with a sparse LU factorization.
#[derive(Debug, Clone)]
pub struct SteadyStateSolver {
    assembler: ConductanceAssembler,
}

impl SteadyStateSolver {
    /// Thermal solver with default assembly options.
    pub fn new(grid: VoxelGrid) -> Self {
        Self {
            assembler: ConductanceAssembler::new(grid),
        }
    }

    pub fn with_config(mut self, config: AssemblerConfig) -> Self {
        self.assembler = self.assembler.with_config(config);
        self
    }

    pub fn grid(&self) -> &VoxelGrid {
        self.assembler.grid()
    }

    pub fn assembler(&self) -> &ConductanceAssembler {
        &self.assembler
    }

    /// Assemble and solve for the field driven by `sources`.
    pub fn solve(
        &self,
        materials: &MaterialField,
        sources: &SourceField,
        boundary: &BoundaryPolicy,
    ) -> Result<ScalarField> {
        let system = self.assembler.assemble(materials, sources, boundary)?;
        let field = Self::solve_system(&system)?;
        info!(
            "{} solve: {} voxels, total source {:.4}, peak {:.4}",
            system.discretization(),
            system.size(),
            sources.total(),
            field.max()
        );
        Ok(field)
    }

    /// Solve an already assembled system.
    pub fn solve_system(system: &SparseSystem) -> Result<ScalarField> {
        debug!(
            "factoring {} system with {} triplets",
            system.discretization(),
            system.triplets.len()
        );
        let x = solve_sparse(system.size(), &system.triplets, system.rhs())?;
        Ok(ScalarField::new(*system.grid(), x.as_slice().to_vec())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_unpowered_grid_sits_at_ambient() {
        let grid = VoxelGrid::square(4, 3, 50.0, 20.0).unwrap();
        let field = SteadyStateSolver::new(grid)
            .solve(
                &MaterialField::per_layer([150.0, 60.0, 0.5]),
                &SourceField::zeros(&grid),
                &BoundaryPolicy::convective(40.0),
            )
            .unwrap();
        for &t in field.values() {
            assert!((t - 40.0).abs() < 1e-9, "T = {t}");
        }
    }

    #[test]
    fn test_single_voxel_analytic() {
        // One voxel: g_amb = k*1e-3 * dxy^2/dz * coupling = 0.1 * 2500/20 * 10 = 125 mW/K.
        let grid = VoxelGrid::planar(1, 1, 50.0, 20.0).unwrap();
        let field = SteadyStateSolver::new(grid)
            .solve(
                &MaterialField::uniform(&grid, 100.0),
                &SourceField::new(vec![250.0]),
                &BoundaryPolicy::default(),
            )
            .unwrap();
        assert!((field.get(0) - 27.0).abs() < 1e-10);
    }

    #[test]
    fn test_heat_flows_downhill_from_source() {
        let grid = VoxelGrid::square(8, 3, 50.0, 20.0).unwrap();
        let sources = SourceField::point(&grid, 0, 4, 4, 100.0);
        let field = SteadyStateSolver::new(grid)
            .solve(
                &MaterialField::per_layer([150.0, 60.0, 0.5]),
                &sources,
                &BoundaryPolicy::default(),
            )
            .unwrap();
        let (idx, peak) = field.argmax();
        assert_eq!(idx, grid.index(0, 4, 4));
        assert!(peak > 25.0);
        assert!(field.min() >= 25.0 - 1e-9);
    }

    #[test]
    fn test_errors_propagate_from_assembly() {
        let grid = VoxelGrid::planar(2, 2, 50.0, 20.0).unwrap();
        let err = SteadyStateSolver::new(grid)
            .solve(
                &MaterialField::uniform(&grid, 0.0),
                &SourceField::zeros(&grid),
                &BoundaryPolicy::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Core(thermovox_core::Error::UnderconstrainedSystem(_))
        ));
    }
}
