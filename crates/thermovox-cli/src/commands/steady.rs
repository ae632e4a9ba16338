//! Steady-state thermal report.

use anyhow::{Context, Result};
use clap::Args;
use thermovox_solver::SteadyStateSolver;

use crate::model::ModelArgs;
use crate::output::{print_header, print_hotspot, print_layer_table};

#[derive(Args, Debug)]
pub struct SteadyArgs {
    #[command(flatten)]
    pub model: ModelArgs,
}

pub fn execute(args: SteadyArgs) -> Result<()> {
    let model = args.model.load()?;
    let field = SteadyStateSolver::new(model.grid)
        .with_config(model.assembler)
        .solve(&model.materials, &model.sources, &model.boundary)
        .context("steady-state thermal solve")?;

    print_header(&format!(
        "Steady-State Thermal ({} blocks, {:.3} mW, ambient {} °C)",
        model.design.blocks.len(),
        model.sources.total(),
        model.boundary.reference()
    ));
    print_layer_table(&model, &field);
    print_hotspot(&field);
    println!(
        "Rise over ambient: {:.3} K",
        field.max() - model.boundary.reference()
    );
    println!();
    Ok(())
}
