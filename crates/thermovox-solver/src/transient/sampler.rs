//! Reductions recorded from the transient state.
//!
//! Only samples are retained; the full per-step state is overwritten in place.

use thermovox_core::{ScalarField, VoxelGrid};

/// Turns the current state into a recorded sample.
pub trait Sampler {
    type Sample;

    fn sample(&mut self, grid: &VoxelGrid, state: &[f64]) -> Self::Sample;
}

/// Copy of the whole field.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullField;

impl Sampler for FullField {
    type Sample = ScalarField;

    fn sample(&mut self, grid: &VoxelGrid, state: &[f64]) -> ScalarField {
        let mut field = ScalarField::uniform(*grid, 0.0);
        field.values_mut().copy_from_slice(state);
        field
    }
}

/// Instantaneous maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakValue;

impl Sampler for PeakValue {
    type Sample = f64;

    fn sample(&mut self, _grid: &VoxelGrid, state: &[f64]) -> f64 {
        state.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Maximum seen so far across all samples.
#[derive(Debug, Clone, Copy)]
pub struct RunningPeak {
    peak: f64,
}

impl Default for RunningPeak {
    fn default() -> Self {
        Self {
            peak: f64::NEG_INFINITY,
        }
    }
}

impl RunningPeak {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }
}

impl Sampler for RunningPeak {
    type Sample = f64;

    fn sample(&mut self, grid: &VoxelGrid, state: &[f64]) -> f64 {
        self.peak = self.peak.max(PeakValue.sample(grid, state));
        self.peak
    }
}

/// Maximum of each layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerPeaks;

impl Sampler for LayerPeaks {
    type Sample = Vec<f64>;

    fn sample(&mut self, grid: &VoxelGrid, state: &[f64]) -> Vec<f64> {
        state
            .chunks(grid.layer_len())
            .map(|layer| layer.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect()
    }
}
