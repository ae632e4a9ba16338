//! Explicit transient integration.
//!
//! Advances a voxel state with forward Euler, `T += dt/C · (P(t) + b − G·T)`,
//! reusing one assembled conductance matrix for every step. The step is
//! checked against `dt_max = min C_i / G_ii` before any stepping starts.
//!
//! # Module Structure
//!
//! - [`types`] - Parameters and run status
//! - [`power`] - Time-varying power sources
//! - [`sampler`] - Reductions recorded while stepping
//! - [`result`] - Sampled output with interpolation
//! - [`integrator`] - The stepping loop

pub mod integrator;
pub mod power;
pub mod result;
pub mod sampler;
pub mod types;

pub use integrator::{TransientIntegrator, solve_transient, stability_bound};
pub use power::{BurstPower, ConstantPower, PowerSource};
pub use result::TransientResult;
pub use sampler::{FullField, LayerPeaks, PeakValue, RunningPeak, Sampler};
pub use types::{
    DEFAULT_DIVERGENCE_CEILING, DEFAULT_SAMPLE_EVERY, TransientParams, TransientStatus,
};
