//! Voxel grids, fields and conductance assembly for Thermovox.
//!
//! This crate provides:
//! - `VoxelGrid`: lattice topology, flat indexing and neighbour enumeration
//! - Material, source, capacity and solved scalar fields
//! - Boundary policies (convective ambient, fixed potential)
//! - `ConductanceAssembler`, producing a `SparseSystem` in triplet form

pub mod assemble;
pub mod boundary;
pub mod error;
pub mod field;
pub mod grid;
pub mod system;

pub use assemble::{AssemblerConfig, ConductanceAssembler, THERMAL_CONDUCTIVITY_SCALE};
pub use boundary::{BoundaryPolicy, Discretization, InterfaceModel};
pub use error::{Error, Result};
pub use field::{HeatCapacityField, MaterialField, ScalarField, SourceField};
pub use grid::{Axis, Neighbours, VoxelGrid};
pub use system::SparseSystem;
