//! Peak temperature across standard operating corners.

use anyhow::{Context, Result};
use clap::Args;
use thermovox_sweep::{SweepConfig, ThermalSweep, corner_cases, standard_corners};

use crate::model::ModelArgs;
use crate::output::print_header;

#[derive(Args, Debug)]
pub struct CornersArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Solve corners one at a time
    #[arg(long)]
    pub sequential: bool,
}

pub fn execute(args: CornersArgs) -> Result<()> {
    let model = args.model.load()?;
    let corners = standard_corners();
    let cases = corner_cases(&corners, &model.materials, &model.sources);

    let sweep = ThermalSweep::new(model.grid, model.boundary)
        .context("setting up corner sweep")?
        .with_config(
            SweepConfig::default()
                .with_assembler(model.assembler)
                .with_parallel(!args.sequential),
        );
    let result = sweep.solve(&cases);

    print_header(&format!("Corner Analysis ({} corners)", corners.len()));
    println!(
        "{:<20}{:>10}{:>10}{:>14}{:>14}",
        "Corner", "Power x", "k x", "Peak [°C]", "vs nominal"
    );
    println!("{}", "-".repeat(68));

    let peaks = result.peaks();
    let nominal = peaks.first().copied().flatten();
    for (i, corner) in corners.iter().enumerate() {
        let peak = match peaks[i] {
            Some(p) => format!("{p:.3}"),
            None => "failed".to_string(),
        };
        let delta = match (peaks[i], nominal) {
            (Some(p), Some(n)) => format!("{:+.3}", p - n),
            _ => "-".to_string(),
        };
        println!(
            "{:<20}{:>10.3}{:>10.2}{:>14}{:>14}",
            corner.name,
            corner.power_factor(),
            corner.conductivity_scale,
            peak,
            delta
        );
    }
    println!();

    for i in result.failed_indices() {
        if let Some(e) = result.error(i) {
            println!("  {}: {e}", result.labels[i]);
        }
    }
    if let Some(stats) = result.peak_statistics() {
        println!(
            "Peak range {:.3} .. {:.3} °C (mean {:.3}, σ {:.3}) over {} corners",
            stats.min, stats.max, stats.mean, stats.std_dev, stats.count
        );
    }
    println!();
    Ok(())
}
