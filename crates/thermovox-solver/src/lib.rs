//! Solvers for Thermovox voxel conductance networks.
//!
//! This crate provides:
//! - Sparse LU solves, with optional symbolic-factorization reuse
//! - `SteadyStateSolver` for `G·x = b`
//! - Forward-Euler transient integration with pluggable samplers
//! - `ElectricalMeshSolver` for temperature-aware IR drop

pub mod electrical;
pub mod error;
pub mod linear;
pub mod sparse_operator;
pub mod steady;
pub mod transient;

pub use electrical::{ElectricalMeshSolver, IrDropParams, IrDropResult};
pub use error::{Error, Result};
pub use linear::{CachedSparseLu, solve_sparse};
pub use sparse_operator::SparseOperator;
pub use steady::SteadyStateSolver;
pub use transient::{
    BurstPower, ConstantPower, PowerSource, Sampler, TransientIntegrator, TransientParams,
    TransientResult, TransientStatus, solve_transient,
};
