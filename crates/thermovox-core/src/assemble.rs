//! Conductance matrix assembly from grid, materials, sources and boundary policy.
//!
//! For each voxel `i` with local conductivity `k_i` (after unit scaling):
//!
//! ```text
//! g_lat  = k_i * pitch_z
//! g_vert = k_i * pitch_xy^2 / pitch_z
//! ```
//!
//! Every neighbour edge stamps `-g` off the diagonal and `+g` on it. Voxels
//! touched by the boundary policy add their boundary conductance to the
//! diagonal and `g_b * reference` to the right-hand side.

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::boundary::{BoundaryPolicy, InterfaceModel};
use crate::error::{Error, Result};
use crate::field::{MaterialField, SourceField};
use crate::grid::{Axis, VoxelGrid};
use crate::system::SparseSystem;

/// W/(m·K) to mW/(µm·K).
pub const THERMAL_CONDUCTIVITY_SCALE: f64 = 1e-3;

/// Assembly options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Edge conductance rule at material interfaces.
    pub interface: InterfaceModel,
    /// Factor converting material values into conductance per µm.
    pub conductivity_scale: f64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self::thermal()
    }
}

impl AssemblerConfig {
    /// Conductivities in W/(m·K), conductances in mW/K.
    pub fn thermal() -> Self {
        Self {
            interface: InterfaceModel::Nodal,
            conductivity_scale: THERMAL_CONDUCTIVITY_SCALE,
        }
    }

    /// Conductivities in S/µm, conductances in S.
    pub fn electrical() -> Self {
        Self {
            interface: InterfaceModel::Nodal,
            conductivity_scale: 1.0,
        }
    }

    pub fn with_interface(mut self, interface: InterfaceModel) -> Self {
        self.interface = interface;
        self
    }

    pub fn with_conductivity_scale(mut self, scale: f64) -> Self {
        self.conductivity_scale = scale;
        self
    }
}

/// Matrix entries contributed by one voxel row.
#[derive(Debug, Clone, Copy, Default)]
struct VoxelStamp {
    off_diagonal: [(usize, f64); 6],
    len: usize,
    diagonal: f64,
    boundary: f64,
}

/// Builds [`SparseSystem`]s for a fixed grid.
#[derive(Debug, Clone)]
pub struct ConductanceAssembler {
    grid: VoxelGrid,
    config: AssemblerConfig,
}

impl ConductanceAssembler {
    /// Assembler with the thermal configuration.
    pub fn new(grid: VoxelGrid) -> Self {
        Self {
            grid,
            config: AssemblerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AssemblerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Assemble `G` and `b` for the given sources.
    pub fn assemble(
        &self,
        materials: &MaterialField,
        sources: &SourceField,
        boundary: &BoundaryPolicy,
    ) -> Result<SparseSystem> {
        sources.validate(&self.grid)?;
        let mut system = self.assemble_conductance(materials, boundary)?;
        system.set_sources(sources)?;
        Ok(system)
    }

    /// Assemble `G` with a right-hand side holding only the boundary term.
    pub fn assemble_conductance(
        &self,
        materials: &MaterialField,
        boundary: &BoundaryPolicy,
    ) -> Result<SparseSystem> {
        if !self.config.conductivity_scale.is_finite() || self.config.conductivity_scale <= 0.0 {
            return Err(Error::InvalidMaterial {
                field: "conductivity scale",
                index: 0,
                value: self.config.conductivity_scale,
            });
        }
        materials.validate(&self.grid)?;
        boundary.validate()?;

        let n = self.grid.len();
        #[cfg(feature = "parallel")]
        let stamps: Vec<VoxelStamp> = (0..n)
            .into_par_iter()
            .map(|idx| self.stamp_voxel(materials, boundary, idx))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let stamps: Vec<VoxelStamp> = (0..n)
            .map(|idx| self.stamp_voxel(materials, boundary, idx))
            .collect();

        let mut triplets = Vec::with_capacity(stamps.iter().map(|s| s.len + 1).sum());
        let mut diagonal = Vec::with_capacity(n);
        let mut boundary_conductance = Vec::with_capacity(n);
        for (idx, stamp) in stamps.iter().enumerate() {
            for &(col, g) in &stamp.off_diagonal[..stamp.len] {
                triplets.push((idx, col, -g));
            }
            triplets.push((idx, idx, stamp.diagonal));
            diagonal.push(stamp.diagonal);
            boundary_conductance.push(stamp.boundary);
        }

        let total_boundary: f64 = boundary_conductance.iter().sum();
        if total_boundary <= 0.0 {
            return Err(Error::UnderconstrainedSystem(format!(
                "no boundary conductance anywhere in the {} grid",
                crate::boundary::Discretization::of(&self.grid, boundary)
            )));
        }
        if let Some(idx) = diagonal.iter().position(|&d| d <= 0.0) {
            let (layer, row, col) = self.grid.coords(idx);
            return Err(Error::UnderconstrainedSystem(format!(
                "voxel ({layer}, {row}, {col}) has no conductance to any neighbour or boundary"
            )));
        }

        debug!(
            "assembled {} system: {} voxels, {} triplets, boundary conductance {:.4e}",
            crate::boundary::Discretization::of(&self.grid, boundary),
            n,
            triplets.len(),
            total_boundary
        );

        Ok(SparseSystem::new(
            self.grid,
            *boundary,
            triplets,
            diagonal,
            boundary_conductance,
        ))
    }

    /// Lateral and vertical conductance of voxel `idx` from its own material.
    #[inline]
    fn local_conductances(&self, materials: &MaterialField, idx: usize) -> (f64, f64) {
        let k = materials.value(&self.grid, idx) * self.config.conductivity_scale;
        let dz = self.grid.pitch_z();
        let dxy = self.grid.pitch_xy();
        (k * dz, k * dxy * dxy / dz)
    }

    fn edge_conductance(&self, materials: &MaterialField, idx: usize, nb: usize, axis: Axis) -> f64 {
        let pick = |(lat, vert): (f64, f64)| match axis {
            Axis::Lateral => lat,
            Axis::Vertical => vert,
        };
        let own = pick(self.local_conductances(materials, idx));
        match self.config.interface {
            InterfaceModel::Nodal => own,
            InterfaceModel::Harmonic => {
                let other = pick(self.local_conductances(materials, nb));
                if own + other > 0.0 {
                    2.0 * own * other / (own + other)
                } else {
                    0.0
                }
            }
        }
    }

    fn stamp_voxel(&self, materials: &MaterialField, boundary: &BoundaryPolicy, idx: usize) -> VoxelStamp {
        let mut stamp = VoxelStamp::default();
        for (nb, axis) in self.grid.neighbours(idx).iter() {
            let g = self.edge_conductance(materials, idx, nb, axis);
            stamp.off_diagonal[stamp.len] = (nb, g);
            stamp.len += 1;
            stamp.diagonal += g;
        }
        if boundary.applies_to(&self.grid, idx) {
            stamp.boundary = match *boundary {
                BoundaryPolicy::Convective { coupling, .. } => {
                    self.local_conductances(materials, idx).1 * coupling
                }
                BoundaryPolicy::FixedPotential { conductance, .. } => conductance,
            };
            stamp.diagonal += stamp.boundary;
        }
        stamp
    }
}
