//! Forward-Euler integration of `C·dT/dt = P(t) + b_boundary − G·T`.

use std::ops::ControlFlow;

use log::{info, warn};
use thermovox_core::{
    BoundaryPolicy, ConductanceAssembler, HeatCapacityField, MaterialField, ScalarField,
    SparseSystem, VoxelGrid,
};

use super::power::PowerSource;
use super::result::TransientResult;
use super::sampler::Sampler;
use super::types::{TransientParams, TransientStatus};
use crate::error::{Error, Result};
use crate::sparse_operator::SparseOperator;

/// Largest stable forward-Euler step: `min_i C_i / G_ii`.
///
/// Rows with a non-positive diagonal are ignored.
pub fn stability_bound(capacities: &[f64], diagonal: &[f64]) -> f64 {
    capacities
        .iter()
        .zip(diagonal)
        .filter(|&(_, &g)| g > 0.0)
        .map(|(&c, &g)| c / g)
        .fold(f64::INFINITY, f64::min)
}

/// Explicit time stepper bound to one assembled conductance system.
///
/// The conductance matrix and stability bound are computed once in
/// [`TransientIntegrator::new`]; every run reuses them.
#[derive(Debug)]
pub struct TransientIntegrator {
    system: SparseSystem,
    operator: SparseOperator,
    capacities: Vec<f64>,
    dt_max: f64,
    status: TransientStatus,
}

impl TransientIntegrator {
    pub fn new(system: SparseSystem, capacities: &HeatCapacityField) -> Result<Self> {
        capacities.validate(system.grid())?;
        let operator = SparseOperator::from_triplets(system.size(), &system.triplets)?;
        let dt_max = stability_bound(capacities.values(), system.diagonal());
        Ok(Self {
            system,
            operator,
            capacities: capacities.values().to_vec(),
            dt_max,
            status: TransientStatus::Idle,
        })
    }

    /// Stability bound of the assembled system (s).
    pub fn dt_max(&self) -> f64 {
        self.dt_max
    }

    pub fn status(&self) -> TransientStatus {
        self.status
    }

    pub fn system(&self) -> &SparseSystem {
        &self.system
    }

    /// Run to completion (or divergence) from `initial`, or from the
    /// boundary reference when `initial` is `None`.
    pub fn run<P, S>(
        &mut self,
        power: &P,
        sampler: &mut S,
        params: &TransientParams,
        initial: Option<&ScalarField>,
    ) -> Result<TransientResult<S::Sample>>
    where
        P: PowerSource + ?Sized,
        S: Sampler,
    {
        self.run_with_control(power, sampler, params, initial, |_, _, _| {
            ControlFlow::Continue(())
        })
    }

    /// Like [`run`](Self::run), calling `control(step, time, state)` after
    /// every step. Returning `ControlFlow::Break` cancels the run; samples
    /// recorded so far are kept.
    pub fn run_with_control<P, S, C>(
        &mut self,
        power: &P,
        sampler: &mut S,
        params: &TransientParams,
        initial: Option<&ScalarField>,
        mut control: C,
    ) -> Result<TransientResult<S::Sample>>
    where
        P: PowerSource + ?Sized,
        S: Sampler,
        C: FnMut(usize, f64, &[f64]) -> ControlFlow<()>,
    {
        params.validate()?;
        if params.dt > self.dt_max {
            return Err(Error::UnstableStep {
                dt: params.dt,
                dt_max: self.dt_max,
            });
        }

        let grid = *self.system.grid();
        let n = grid.len();
        let mut state = match initial {
            Some(field) if field.values().len() != n => {
                return Err(thermovox_core::Error::ShapeMismatch {
                    field: "initial field",
                    expected: n,
                    actual: field.values().len(),
                }
                .into());
            }
            Some(field) => field.values().to_vec(),
            None => vec![self.system.policy().reference(); n],
        };

        self.status = TransientStatus::Stepping;
        let outcome = self.step_loop(power, sampler, params, &grid, &mut state, &mut control);
        let (times, samples, status, steps_taken) = match outcome {
            Ok(done) => done,
            Err(e) => {
                self.status = TransientStatus::Idle;
                return Err(e);
            }
        };
        self.status = status;

        match status {
            TransientStatus::Diverged { step, time, peak } => warn!(
                "transient diverged at step {step} (t = {time:.4e} s, peak {peak:.4e})"
            ),
            TransientStatus::Cancelled { step, time } => {
                warn!("transient cancelled at step {step} (t = {time:.4e} s)")
            }
            _ => {}
        }
        info!(
            "transient {}: {} of {} steps, dt {:.3e} s (bound {:.3e} s), {} samples",
            self.system.discretization(),
            steps_taken,
            params.num_steps(),
            params.dt,
            self.dt_max,
            samples.len()
        );

        Ok(TransientResult {
            times,
            samples,
            status,
            steps_taken,
            dt_max: self.dt_max,
            final_field: ScalarField::new(grid, state)?,
        })
    }

    #[allow(clippy::type_complexity)]
    fn step_loop<P, S, C>(
        &self,
        power: &P,
        sampler: &mut S,
        params: &TransientParams,
        grid: &VoxelGrid,
        state: &mut [f64],
        control: &mut C,
    ) -> Result<(Vec<f64>, Vec<S::Sample>, TransientStatus, usize)>
    where
        P: PowerSource + ?Sized,
        S: Sampler,
        C: FnMut(usize, f64, &[f64]) -> ControlFlow<()>,
    {
        let n_steps = params.num_steps();
        let dt = params.dt;
        let sign = self.system.policy().source_sign();
        let offset = self.system.boundary_offset();
        let mut g_t = vec![0.0; state.len()];

        let mut times = vec![0.0];
        let mut samples = vec![sampler.sample(grid, state)];
        let mut status = TransientStatus::Completed;
        let mut steps_taken = 0;

        for step in 1..=n_steps {
            let start = (step - 1) as f64 * dt;
            let sources = power.power_at(start);
            sources.validate(grid)?;
            self.operator.apply(state, &mut g_t)?;

            let mut peak = 0.0_f64;
            let mut non_finite = None;
            for (i, ((t, &p), &c)) in state
                .iter_mut()
                .zip(sources.values())
                .zip(&self.capacities)
                .enumerate()
            {
                let flux = sign * p + offset[i] - g_t[i];
                *t += dt / c * flux;
                if !t.is_finite() {
                    non_finite.get_or_insert(*t);
                }
                peak = peak.max(t.abs());
            }

            steps_taken = step;
            let time = step as f64 * dt;
            if let Some(bad) = non_finite {
                status = TransientStatus::Diverged {
                    step,
                    time,
                    peak: bad,
                };
                break;
            }
            if peak > params.divergence_ceiling {
                status = TransientStatus::Diverged { step, time, peak };
                break;
            }

            if step % params.sample_every == 0 || step == n_steps {
                times.push(time);
                samples.push(sampler.sample(grid, state));
            }

            if control(step, time, state).is_break() {
                status = TransientStatus::Cancelled { step, time };
                break;
            }
        }

        Ok((times, samples, status, steps_taken))
    }
}

/// Assemble the thermal system for `materials` and integrate it from ambient.
pub fn solve_transient<P, S>(
    grid: VoxelGrid,
    materials: &MaterialField,
    capacities: &HeatCapacityField,
    boundary: &BoundaryPolicy,
    power: &P,
    sampler: &mut S,
    params: &TransientParams,
) -> Result<TransientResult<S::Sample>>
where
    P: PowerSource + ?Sized,
    S: Sampler,
{
    let system = ConductanceAssembler::new(grid).assemble_conductance(materials, boundary)?;
    TransientIntegrator::new(system, capacities)?.run(power, sampler, params, None)
}
