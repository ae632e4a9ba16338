//! Temperature-coupled IR-drop report.

use anyhow::{Context, Result};
use clap::Args;
use log::warn;
use thermovox_solver::{ElectricalMeshSolver, IrDropParams, SteadyStateSolver};

use crate::model::{ModelArgs, ThermalModel};
use crate::output::print_header;

#[derive(Args, Debug)]
pub struct IrDropArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Sheet resistance of the supply metal [Ω/sq]
    #[arg(long, default_value_t = 0.1)]
    pub sheet_res: f64,

    /// Supply voltage [V]
    #[arg(long, default_value_t = 1.0)]
    pub vdd: f64,

    /// Metal temperature [°C] to use everywhere instead of solving the thermal model
    #[arg(long, conflicts_with = "fallback_temp")]
    pub uniform_temp: Option<f64>,

    /// Metal temperature [°C] to assume if the thermal solve fails
    #[arg(long)]
    pub fallback_temp: Option<f64>,
}

/// Die-layer temperatures on the mesh, honoring the fallback policy.
fn metal_temperature(args: &IrDropArgs, model: &ThermalModel) -> Result<Vec<f64>> {
    let n = model.grid.layer_len();
    if let Some(t) = args.uniform_temp {
        return Ok(vec![t; n]);
    }
    let solved = SteadyStateSolver::new(model.grid)
        .with_config(model.assembler)
        .solve(&model.materials, &model.sources, &model.boundary);
    match (solved, args.fallback_temp) {
        (Ok(field), _) => Ok(field.layer(0).to_vec()),
        (Err(e), Some(t)) => {
            warn!("thermal solve failed ({e}); assuming {t} °C metal temperature");
            Ok(vec![t; n])
        }
        (Err(e), None) => Err(e).context("thermal solve for metal temperature"),
    }
}

pub fn execute(args: IrDropArgs) -> Result<()> {
    let model = args.model.load()?;
    let temperature = metal_temperature(&args, &model)?;
    let load = model.design.rasterize(model.grid.rows(), None)?;

    let params = IrDropParams {
        pitch_um: model.grid.pitch_xy(),
        ..IrDropParams::default()
    }
    .with_grid_size(model.grid.rows())
    .with_sheet_resistance(args.sheet_res)
    .with_vdd(args.vdd);
    let solver = ElectricalMeshSolver::new(params)?;
    let result = solver
        .solve(&load, Some(&temperature))
        .context("IR-drop solve")?;

    let t_max = temperature.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    print_header(&format!(
        "IR Drop ({0}x{0} mesh, Vdd = {1} V, {2} Ω/sq)",
        model.grid.rows(),
        args.vdd,
        args.sheet_res
    ));
    println!("  Metal temperature (max): {t_max:.3} °C");
    println!("  Total load current:      {:.6} A", result.total_current);
    println!("  Minimum voltage:         {:.6} V", result.min_voltage);
    println!(
        "  Worst drop:              {:.3} mV ({:.3} %)",
        result.worst_drop * 1e3,
        result.worst_drop_percent()
    );
    let (idx, _) = result
        .drop_map()
        .into_iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, d)| if d > best.1 { (i, d) } else { best });
    let (_, row, col) = solver.grid().coords(idx);
    println!("  Worst node:              cell ({row}, {col})");
    println!();
    Ok(())
}
