//! IR-drop analysis of a planar power-delivery mesh.
//!
//! Each node is tied to its lateral neighbours through the sheet conductance
//! of the metal, derated by temperature:
//!
//! ```text
//! sigma(T) = sigma_0 / (1 + alpha (T - T_ref)),   sigma_0 = 1 / (R_sheet t_metal)
//! ```
//!
//! Perimeter nodes connect to an ideal `V_dd` ring, and every node draws
//! `I = P / V_nominal` as a load.

use log::info;
use thermovox_core::{
    AssemblerConfig, BoundaryPolicy, ConductanceAssembler, MaterialField, ScalarField,
    SourceField, VoxelGrid,
};

use crate::error::{Error, Result};
use crate::linear::solve_sparse;

/// Temperature coefficient of resistance of copper (1/°C).
pub const COPPER_TCR: f64 = 0.004;

/// IR-drop mesh parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct IrDropParams {
    /// Nodes per side of the square mesh.
    pub grid_size: usize,
    /// Node spacing (µm).
    pub pitch_um: f64,
    /// Metal thickness (µm).
    pub metal_thickness_um: f64,
    /// Supply voltage at the ring (V).
    pub vdd: f64,
    /// Voltage used to convert load power to current (V).
    pub nominal_voltage: f64,
    /// Sheet resistance at `reference_temp` (Ω/sq).
    pub sheet_resistance: f64,
    /// Temperature coefficient of resistance (1/°C).
    pub alpha: f64,
    /// Temperature at which `sheet_resistance` is specified (°C).
    pub reference_temp: f64,
    /// Conductance from each perimeter node to the supply ring (S).
    pub tie_conductance: f64,
}

impl Default for IrDropParams {
    fn default() -> Self {
        Self {
            grid_size: 64,
            pitch_um: 31.25,
            metal_thickness_um: 1.0,
            vdd: 1.0,
            nominal_voltage: 1.0,
            sheet_resistance: 0.1,
            alpha: COPPER_TCR,
            reference_temp: 25.0,
            tie_conductance: thermovox_core::boundary::DEFAULT_TIE_CONDUCTANCE,
        }
    }
}

impl IrDropParams {
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Set the supply and the load-conversion voltage together.
    pub fn with_vdd(mut self, vdd: f64) -> Self {
        self.vdd = vdd;
        self.nominal_voltage = vdd;
        self
    }

    pub fn with_sheet_resistance(mut self, sheet_resistance: f64) -> Self {
        self.sheet_resistance = sheet_resistance;
        self
    }

    pub fn with_tie_conductance(mut self, conductance: f64) -> Self {
        self.tie_conductance = conductance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("pitch_um", self.pitch_um),
            ("metal_thickness_um", self.metal_thickness_um),
            ("vdd", self.vdd),
            ("nominal_voltage", self.nominal_voltage),
            ("sheet_resistance", self.sheet_resistance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidParameter(format!("{name} must be > 0, got {value}")));
            }
        }
        if self.grid_size == 0 {
            return Err(Error::InvalidParameter("grid_size must be >= 1".into()));
        }
        if !self.alpha.is_finite() || !self.reference_temp.is_finite() {
            return Err(Error::InvalidParameter(
                "alpha and reference_temp must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Conductivity at the reference temperature (S/µm).
    pub fn base_conductivity(&self) -> f64 {
        1.0 / (self.sheet_resistance * self.metal_thickness_um)
    }
}

/// Solved supply voltage map.
#[derive(Debug, Clone)]
pub struct IrDropResult {
    /// Node voltages (V).
    pub voltage: ScalarField,
    /// Lowest node voltage (V).
    pub min_voltage: f64,
    /// `vdd - min_voltage` (V).
    pub worst_drop: f64,
    /// Supply voltage (V).
    pub vdd: f64,
    /// Total load current (A).
    pub total_current: f64,
}

impl IrDropResult {
    /// Worst drop as a percentage of `vdd`.
    pub fn worst_drop_percent(&self) -> f64 {
        100.0 * self.worst_drop / self.vdd
    }

    /// Per-node drop `vdd - V` (V).
    pub fn drop_map(&self) -> Vec<f64> {
        self.voltage.values().iter().map(|v| self.vdd - v).collect()
    }
}

/// Resistive mesh solver for DC supply voltage under current loads.
#[derive(Debug, Clone)]
pub struct ElectricalMeshSolver {
    params: IrDropParams,
    grid: VoxelGrid,
}

impl ElectricalMeshSolver {
    pub fn new(params: IrDropParams) -> Result<Self> {
        params.validate()?;
        let grid = VoxelGrid::planar(
            params.grid_size,
            params.grid_size,
            params.pitch_um,
            params.metal_thickness_um,
        )?;
        Ok(Self { params, grid })
    }

    pub fn params(&self) -> &IrDropParams {
        &self.params
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    /// Temperature-derated conductivity per node (S/µm).
    ///
    /// `None` uses the reference temperature everywhere.
    pub fn conductivity_field(&self, temperature: Option<&[f64]>) -> Result<MaterialField> {
        let sigma0 = self.params.base_conductivity();
        let Some(temps) = temperature else {
            return Ok(MaterialField::uniform(&self.grid, sigma0));
        };
        if temps.len() != self.grid.len() {
            return Err(thermovox_core::Error::ShapeMismatch {
                field: "temperature map",
                expected: self.grid.len(),
                actual: temps.len(),
            }
            .into());
        }

        let mut sigma = Vec::with_capacity(temps.len());
        for (index, &t) in temps.iter().enumerate() {
            let derate = 1.0 + self.params.alpha * (t - self.params.reference_temp);
            if !derate.is_finite() || derate <= 0.0 {
                return Err(thermovox_core::Error::InvalidMaterial {
                    field: "temperature derating",
                    index,
                    value: derate,
                }
                .into());
            }
            sigma.push(sigma0 / derate);
        }
        Ok(MaterialField::per_voxel(sigma))
    }

    /// Load currents (A) from per-node power (mW).
    pub fn load_currents(&self, power_mw: &[f64]) -> Result<SourceField> {
        if power_mw.len() != self.grid.len() {
            return Err(thermovox_core::Error::ShapeMismatch {
                field: "load power map",
                expected: self.grid.len(),
                actual: power_mw.len(),
            }
            .into());
        }
        if let Some((i, p)) = power_mw
            .iter()
            .enumerate()
            .find(|&(_, p)| !p.is_finite() || *p < 0.0)
        {
            return Err(Error::InvalidParameter(format!(
                "load power at node {i} must be finite and >= 0, got {p}"
            )));
        }
        // mW / V = mA.
        let scale = 1e-3 / self.params.nominal_voltage;
        Ok(SourceField::new(
            power_mw.iter().map(|p| p * scale).collect::<Vec<_>>(),
        ))
    }

    /// Solve node voltages for `power_mw` loads at the given temperatures.
    pub fn solve(&self, power_mw: &[f64], temperature: Option<&[f64]>) -> Result<IrDropResult> {
        let materials = self.conductivity_field(temperature)?;
        let loads = self.load_currents(power_mw)?;
        let boundary = BoundaryPolicy::fixed_potential(self.params.vdd)
            .with_strength(self.params.tie_conductance);

        let system = ConductanceAssembler::new(self.grid)
            .with_config(AssemblerConfig::electrical())
            .assemble(&materials, &loads, &boundary)?;
        let x = solve_sparse(system.size(), &system.triplets, system.rhs())?;

        let vdd = self.params.vdd;
        let tol = 1e-9 * vdd;
        if let Some((index, &value)) = x
            .iter()
            .enumerate()
            .find(|&(_, &v)| v < -tol || v > vdd + tol)
        {
            return Err(Error::NonPhysicalSolution {
                index,
                value,
                min: 0.0,
                max: vdd,
            });
        }

        let voltage = ScalarField::new(self.grid, x.as_slice().to_vec())?;
        let min_voltage = voltage.min();
        let result = IrDropResult {
            min_voltage,
            worst_drop: vdd - min_voltage,
            vdd,
            total_current: loads.total(),
            voltage,
        };
        info!(
            "IR drop on {0}x{0} mesh: {1:.3} A load, min {2:.4} V, worst drop {3:.2} mV",
            self.params.grid_size,
            result.total_current,
            result.min_voltage,
            result.worst_drop * 1e3
        );
        Ok(result)
    }
}
