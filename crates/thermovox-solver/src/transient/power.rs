//! Time-varying power sources for transient runs.

use std::borrow::Cow;

use thermovox_core::SourceField;

/// Power injected per voxel as a function of time (s).
pub trait PowerSource {
    /// Source field active at `time`.
    fn power_at(&self, time: f64) -> Cow<'_, SourceField>;
}

impl<F> PowerSource for F
where
    F: Fn(f64) -> SourceField,
{
    fn power_at(&self, time: f64) -> Cow<'_, SourceField> {
        Cow::Owned(self(time))
    }
}

/// The same field at every instant.
#[derive(Debug, Clone)]
pub struct ConstantPower(pub SourceField);

impl PowerSource for ConstantPower {
    fn power_at(&self, _time: f64) -> Cow<'_, SourceField> {
        Cow::Borrowed(&self.0)
    }
}

/// A baseline field replaced by a burst field on `[start, end]` (inclusive).
#[derive(Debug, Clone)]
pub struct BurstPower {
    pub baseline: SourceField,
    pub burst: SourceField,
    pub start: f64,
    pub end: f64,
}

impl BurstPower {
    pub fn new(baseline: SourceField, burst: SourceField, start: f64, end: f64) -> Self {
        Self {
            baseline,
            burst,
            start,
            end,
        }
    }

    pub fn is_active(&self, time: f64) -> bool {
        (self.start..=self.end).contains(&time)
    }
}

impl PowerSource for BurstPower {
    fn power_at(&self, time: f64) -> Cow<'_, SourceField> {
        if self.is_active(time) {
            Cow::Borrowed(&self.burst)
        } else {
            Cow::Borrowed(&self.baseline)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_window_is_inclusive() {
        let p = BurstPower::new(
            SourceField::new(vec![1.0]),
            SourceField::new(vec![8.0]),
            0.01,
            0.03,
        );
        assert_eq!(p.power_at(0.0).values(), &[1.0]);
        assert_eq!(p.power_at(0.01).values(), &[8.0]);
        assert_eq!(p.power_at(0.03).values(), &[8.0]);
        assert_eq!(p.power_at(0.031).values(), &[1.0]);
    }

    #[test]
    fn test_closure_source() {
        let ramp = |t: f64| SourceField::new(vec![t * 2.0]);
        assert_eq!(ramp.power_at(1.5).values(), &[3.0]);
    }
}
