//! Batched steady-state solves over many material/source cases on one grid.
//!
//! All cases share the grid and boundary policy, so every assembled matrix
//! has the same sparsity pattern. The symbolic LU is computed for the first
//! case and only the numeric factorization is redone per case.

use log::{debug, info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use thermovox_core::{
    AssemblerConfig, BoundaryPolicy, ConductanceAssembler, MaterialField, ScalarField,
    SourceField, VoxelGrid,
};
use thermovox_solver::CachedSparseLu;

use crate::error::{Result, SweepError};

/// One problem instance in a sweep.
#[derive(Debug, Clone)]
pub struct SweepCase {
    pub label: String,
    pub materials: MaterialField,
    pub sources: SourceField,
}

impl SweepCase {
    pub fn new(label: impl Into<String>, materials: MaterialField, sources: SourceField) -> Self {
        Self {
            label: label.into(),
            materials,
            sources,
        }
    }
}

/// Sweep options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepConfig {
    pub assembler: AssemblerConfig,
    /// Solve cases on the rayon pool (only with the `parallel` feature).
    pub parallel: bool,
    /// Below this many cases the sweep stays sequential.
    pub min_parallel_cases: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            assembler: AssemblerConfig::thermal(),
            parallel: true,
            min_parallel_cases: 4,
        }
    }
}

impl SweepConfig {
    pub fn with_assembler(mut self, assembler: AssemblerConfig) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Summary statistics over per-case peaks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepStatistics {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl SweepStatistics {
    /// Statistics of `samples`, or `None` when empty.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let count = samples.len();
        let mean = samples.iter().sum::<f64>() / count as f64;
        let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        Some(Self {
            count,
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

/// Outcome of a sweep: one result per case, in input order.
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub labels: Vec<String>,
    pub outcomes: Vec<Result<ScalarField>>,
}

impl SweepResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Solved field of case `index`, if it succeeded.
    pub fn field(&self, index: usize) -> Option<&ScalarField> {
        self.outcomes.get(index)?.as_ref().ok()
    }

    /// Error of case `index`, if it failed.
    pub fn error(&self, index: usize) -> Option<&SweepError> {
        self.outcomes.get(index)?.as_ref().err()
    }

    /// Indices of cases that failed.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_err())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn converged_count(&self) -> usize {
        self.outcomes.iter().filter(|r| r.is_ok()).count()
    }

    /// Peak value per case (`None` for failed cases).
    pub fn peaks(&self) -> Vec<Option<f64>> {
        self.outcomes
            .iter()
            .map(|r| r.as_ref().ok().map(ScalarField::max))
            .collect()
    }

    /// Peak of `layer` per case (`None` for failed cases).
    pub fn layer_peaks(&self, layer: usize) -> Vec<Option<f64>> {
        self.outcomes
            .iter()
            .map(|r| r.as_ref().ok().map(|f| f.layer_max(layer)))
            .collect()
    }

    /// Statistics over the peaks of successful cases.
    pub fn peak_statistics(&self) -> Option<SweepStatistics> {
        let peaks: Vec<f64> = self.peaks().into_iter().flatten().collect();
        SweepStatistics::from_samples(&peaks)
    }
}

/// Repeated steady-state solves sharing one grid and boundary policy.
#[derive(Debug)]
pub struct ThermalSweep {
    assembler: ConductanceAssembler,
    boundary: BoundaryPolicy,
    config: SweepConfig,
    lu: CachedSparseLu,
}

impl ThermalSweep {
    pub fn new(grid: VoxelGrid, boundary: BoundaryPolicy) -> Result<Self> {
        boundary.validate()?;
        Ok(Self {
            assembler: ConductanceAssembler::new(grid),
            boundary,
            config: SweepConfig::default(),
            lu: CachedSparseLu::new(),
        })
    }

    pub fn with_config(mut self, config: SweepConfig) -> Self {
        self.assembler = self.assembler.with_config(config.assembler);
        self.config = config;
        self
    }

    pub fn grid(&self) -> &VoxelGrid {
        self.assembler.grid()
    }

    pub fn boundary(&self) -> &BoundaryPolicy {
        &self.boundary
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// True once a symbolic factorization is cached for this grid.
    pub fn has_cached_symbolic(&self) -> bool {
        self.lu.has_symbolic()
    }

    /// Solve a single case through the shared factorization cache.
    pub fn solve_case(&self, case: &SweepCase) -> Result<ScalarField> {
        let system = self
            .assembler
            .assemble(&case.materials, &case.sources, &self.boundary)?;
        let x = self.lu.solve(system.size(), &system.triplets, system.rhs())?;
        Ok(ScalarField::new(*self.grid(), x.as_slice().to_vec())?)
    }

    /// Solve every case. Failures are recorded per case and never replaced.
    pub fn solve(&self, cases: &[SweepCase]) -> SweepResult {
        let labels = cases.iter().map(|c| c.label.clone()).collect();
        let outcomes = self.solve_all(cases);

        let result = SweepResult { labels, outcomes };
        for i in result.failed_indices() {
            if let Some(e) = result.error(i) {
                warn!("sweep case {i} ({}) failed: {e}", result.labels[i]);
            }
        }
        info!(
            "sweep: {}/{} cases solved on {}x{}x{} grid",
            result.converged_count(),
            result.len(),
            self.grid().rows(),
            self.grid().cols(),
            self.grid().layers()
        );
        result
    }

    #[cfg(feature = "parallel")]
    fn solve_all(&self, cases: &[SweepCase]) -> Vec<Result<ScalarField>> {
        if self.config.parallel && cases.len() >= self.config.min_parallel_cases {
            debug!("solving {} sweep cases in parallel", cases.len());
            // Seed the symbolic cache so workers only refactor numerically.
            let (first, rest) = match cases.split_first() {
                Some(split) => split,
                None => return Vec::new(),
            };
            let mut outcomes = vec![self.solve_case(first)];
            outcomes.par_extend(rest.par_iter().map(|case| self.solve_case(case)));
            return outcomes;
        }
        self.solve_sequential(cases)
    }

    #[cfg(not(feature = "parallel"))]
    fn solve_all(&self, cases: &[SweepCase]) -> Vec<Result<ScalarField>> {
        self.solve_sequential(cases)
    }

    fn solve_sequential(&self, cases: &[SweepCase]) -> Vec<Result<ScalarField>> {
        debug!("solving {} sweep cases sequentially", cases.len());
        cases.iter().map(|case| self.solve_case(case)).collect()
    }
}
