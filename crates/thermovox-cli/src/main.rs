//! Thermovox command-line interface.
//!
//! Loads a JSON block design, builds the voxel model and prints thermal,
//! transient, IR-drop or corner reports.

mod commands;
mod model;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

/// Voxel thermal and IR-drop solver
#[derive(Parser)]
#[command(name = "thermovox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Voxel field solver for thermal and IR-drop analysis", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Steady-state temperature of a design
    Steady(commands::steady::SteadyArgs),
    /// Temperature over time, optionally with a power burst
    Transient(commands::transient::TransientArgs),
    /// Supply voltage drop with temperature-derated metal
    IrDrop(commands::ir_drop::IrDropArgs),
    /// Peak temperature across operating corners
    Corners(commands::corners::CornersArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::WARN,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))?;

    match cli.command {
        Commands::Steady(args) => commands::steady::execute(args),
        Commands::Transient(args) => commands::transient::execute(args),
        Commands::IrDrop(args) => commands::ir_drop::execute(args),
        Commands::Corners(args) => commands::corners::execute(args),
    }
}
