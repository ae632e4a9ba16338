//! Result types for transient integration.

use thermovox_core::ScalarField;

use super::types::TransientStatus;

/// Samples recorded during a transient run.
#[derive(Debug, Clone)]
pub struct TransientResult<S> {
    /// Sample times (s), starting at 0.
    pub times: Vec<f64>,
    /// One sample per entry of `times`.
    pub samples: Vec<S>,
    /// How the run ended.
    pub status: TransientStatus,
    /// Steps actually taken.
    pub steps_taken: usize,
    /// Explicit stability bound of the system (s).
    pub dt_max: f64,
    /// State after the last step taken.
    pub final_field: ScalarField,
}

impl<S> TransientResult<S> {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True if the run reached its requested duration.
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// `(time, sample)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &S)> + '_ {
        self.times.iter().copied().zip(&self.samples)
    }

    /// Last recorded sample.
    pub fn last(&self) -> Option<(f64, &S)> {
        self.iter().last()
    }
}

impl TransientResult<f64> {
    /// `(time, value)` pairs.
    pub fn waveform(&self) -> Vec<(f64, f64)> {
        self.iter().map(|(t, &v)| (t, v)).collect()
    }

    /// Largest sample and the time it was recorded.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.iter()
            .map(|(t, &v)| (t, v))
            .fold(None, |best, (t, v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((t, v)),
            })
    }

    /// Linear interpolation between neighbouring samples.
    ///
    /// Times outside the sampled range clamp to the first or last sample.
    pub fn value_at(&self, time: f64) -> Option<f64> {
        let first = *self.samples.first()?;
        let last = *self.samples.last()?;
        if time <= self.times[0] {
            return Some(first);
        }
        if time >= *self.times.last()? {
            return Some(last);
        }

        self.times
            .windows(2)
            .zip(self.samples.windows(2))
            .find(|(t, _)| time >= t[0] && time <= t[1])
            .map(|(t, v)| {
                let alpha = (time - t[0]) / (t[1] - t[0]);
                v[0] * (1.0 - alpha) + v[1] * alpha
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermovox_core::VoxelGrid;

    fn result(times: Vec<f64>, samples: Vec<f64>) -> TransientResult<f64> {
        let grid = VoxelGrid::planar(1, 1, 50.0, 20.0).unwrap();
        TransientResult {
            times,
            samples,
            status: TransientStatus::Completed,
            steps_taken: 0,
            dt_max: 1.0,
            final_field: ScalarField::uniform(grid, 0.0),
        }
    }

    #[test]
    fn test_value_at_interpolates() {
        let r = result(vec![0.0, 1.0, 2.0], vec![10.0, 20.0, 40.0]);
        assert_eq!(r.value_at(-1.0), Some(10.0));
        assert_eq!(r.value_at(0.5), Some(15.0));
        assert_eq!(r.value_at(1.5), Some(30.0));
        assert_eq!(r.value_at(5.0), Some(40.0));
    }

    #[test]
    fn test_peak_and_waveform() {
        let r = result(vec![0.0, 1.0, 2.0], vec![10.0, 40.0, 30.0]);
        assert_eq!(r.peak(), Some((1.0, 40.0)));
        assert_eq!(r.waveform().len(), 3);
        assert_eq!(r.last().map(|(t, _)| t), Some(2.0));
        assert_eq!(result(vec![], vec![]).peak(), None);
    }
}
