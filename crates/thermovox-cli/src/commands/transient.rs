//! Transient thermal report.

use anyhow::{Context, Result};
use clap::Args;
use thermovox_core::ConductanceAssembler;
use thermovox_solver::transient::{DEFAULT_SAMPLE_EVERY, PeakValue};
use thermovox_solver::{
    BurstPower, ConstantPower, PowerSource, TransientIntegrator, TransientParams, TransientStatus,
};

use crate::model::ModelArgs;
use crate::output::print_header;

#[derive(Args, Debug)]
pub struct TransientArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Simulated time [s]
    #[arg(long)]
    pub duration: f64,

    /// Time step [s]; defaults to half the stability bound
    #[arg(long)]
    pub dt: Option<f64>,

    /// Record a sample every N steps
    #[arg(long, default_value_t = DEFAULT_SAMPLE_EVERY)]
    pub sample_every: usize,

    /// Start of the power burst [s]
    #[arg(long, requires = "burst_end")]
    pub burst_start: Option<f64>,

    /// End of the power burst [s]
    #[arg(long, requires = "burst_start")]
    pub burst_end: Option<f64>,

    /// Power multiplier during the burst
    #[arg(long, default_value_t = 2.0)]
    pub burst_scale: f64,
}

pub fn execute(args: TransientArgs) -> Result<()> {
    let model = args.model.load()?;
    let capacities = model.stack.heat_capacity(&model.grid)?;
    let system = ConductanceAssembler::new(model.grid)
        .with_config(model.assembler)
        .assemble_conductance(&model.materials, &model.boundary)?;
    let mut integrator = TransientIntegrator::new(system, &capacities)?;

    let dt = args.dt.unwrap_or(0.5 * integrator.dt_max());
    let params = TransientParams::new(args.duration, dt).with_sample_every(args.sample_every);

    let power: Box<dyn PowerSource> = match (args.burst_start, args.burst_end) {
        (Some(start), Some(end)) => Box::new(BurstPower::new(
            model.sources.clone(),
            model.sources.scaled(args.burst_scale),
            start,
            end,
        )),
        _ => Box::new(ConstantPower(model.sources.clone())),
    };

    print_header(&format!(
        "Transient Thermal ({} s, dt = {:.3e} s, dt_max = {:.3e} s)",
        args.duration,
        dt,
        integrator.dt_max()
    ));

    let result = integrator
        .run(power.as_ref(), &mut PeakValue, &params, None)
        .context("transient thermal run")?;

    println!("{:>14}{:>14}", "Time [s]", "Peak [°C]");
    println!("{}", "-".repeat(28));
    for (t, peak) in result.waveform() {
        println!("{t:>14.6e}{peak:>14.4}");
    }
    println!();

    match result.status {
        TransientStatus::Diverged { step, time, peak } => println!(
            "Diverged at step {step} (t = {time:.6e} s, |T| = {peak:.3e}) after {} samples.",
            result.len()
        ),
        _ => println!(
            "Transient complete ({} steps, {} samples).",
            result.steps_taken,
            result.len()
        ),
    }
    if let Some((t, peak)) = result.peak() {
        println!("Maximum peak: {peak:.4} °C at t = {t:.6e} s");
    }
    println!();
    Ok(())
}
