//! Type definitions for transient integration.

use crate::error::{Error, Result};

/// Default number of steps between samples.
pub const DEFAULT_SAMPLE_EVERY: usize = 10;

/// Default magnitude beyond which a run is treated as diverged.
pub const DEFAULT_DIVERGENCE_CEILING: f64 = 1000.0;

/// Transient integration parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TransientParams {
    /// Simulated duration (s).
    pub duration: f64,
    /// Fixed forward-Euler step (s).
    pub dt: f64,
    /// Record a sample every this many steps.
    pub sample_every: usize,
    /// Stop as diverged once any |value| exceeds this.
    pub divergence_ceiling: f64,
}

impl Default for TransientParams {
    fn default() -> Self {
        Self {
            duration: 1e-3,
            dt: 1e-6,
            sample_every: DEFAULT_SAMPLE_EVERY,
            divergence_ceiling: DEFAULT_DIVERGENCE_CEILING,
        }
    }
}

impl TransientParams {
    /// Parameters for a run of `duration` seconds in steps of `dt`.
    pub fn new(duration: f64, dt: f64) -> Self {
        Self {
            duration,
            dt,
            ..Default::default()
        }
    }

    pub fn with_sample_every(mut self, sample_every: usize) -> Self {
        self.sample_every = sample_every;
        self
    }

    pub fn with_divergence_ceiling(mut self, ceiling: f64) -> Self {
        self.divergence_ceiling = ceiling;
        self
    }

    /// Number of steps needed to cover `duration`.
    ///
    /// A trailing fraction smaller than one part in 1e9 of a step is ignored.
    pub fn num_steps(&self) -> usize {
        let ratio = self.duration / self.dt;
        (ratio - 1e-9).ceil().max(0.0) as usize
    }

    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "dt must be > 0, got {}",
                self.dt
            )));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "duration must be >= 0, got {}",
                self.duration
            )));
        }
        if self.sample_every == 0 {
            return Err(Error::InvalidParameter("sample_every must be >= 1".into()));
        }
        if self.divergence_ceiling.is_nan() || self.divergence_ceiling <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "divergence ceiling must be > 0, got {}",
                self.divergence_ceiling
            )));
        }
        Ok(())
    }
}

/// Integrator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TransientStatus {
    /// Not yet started.
    #[default]
    Idle,
    /// Currently advancing.
    Stepping,
    /// Reached the requested duration.
    Completed,
    /// A value became non-finite or exceeded the divergence ceiling.
    Diverged { step: usize, time: f64, peak: f64 },
    /// The control callback asked to stop.
    Cancelled { step: usize, time: f64 },
}

impl TransientStatus {
    /// True for `Completed`, `Diverged` and `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Idle | Self::Stepping)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_steps_rounds_up_partial_step() {
        assert_eq!(TransientParams::new(1e-3, 1e-4).num_steps(), 10);
        assert_eq!(TransientParams::new(1.05e-3, 1e-4).num_steps(), 11);
        assert_eq!(TransientParams::new(0.0, 1e-4).num_steps(), 0);
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert!(TransientParams::new(1.0, 0.0).validate().is_err());
        assert!(TransientParams::new(-1.0, 1e-3).validate().is_err());
        assert!(TransientParams::new(1.0, f64::NAN).validate().is_err());
        assert!(
            TransientParams::new(1.0, 1e-3)
                .with_sample_every(0)
                .validate()
                .is_err()
        );
        assert!(TransientParams::default().validate().is_ok());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TransientStatus::Idle.is_terminal());
        assert!(!TransientStatus::Stepping.is_terminal());
        assert!(TransientStatus::Completed.is_terminal());
        assert!(
            TransientStatus::Cancelled {
                step: 3,
                time: 0.1
            }
            .is_terminal()
        );
    }
}
