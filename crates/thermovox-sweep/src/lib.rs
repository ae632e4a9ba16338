//! Batched parameter and corner sweeps for Thermovox.
//!
//! Every case in a sweep shares the grid and boundary policy, so the
//! symbolic LU factorization is computed once and reused. With the
//! `parallel` feature cases are solved on the rayon pool.

pub mod corner;
pub mod error;
pub mod sweep;

pub use corner::{Corner, corner_cases, standard_corners};
pub use error::{Result, SweepError};
pub use sweep::{SweepCase, SweepConfig, SweepResult, SweepStatistics, ThermalSweep};
