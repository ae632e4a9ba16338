//! Design loading shared by all commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use log::info;
use thermovox_core::boundary::{DEFAULT_AMBIENT, DEFAULT_AMBIENT_COUPLING};
use thermovox_core::{
    AssemblerConfig, BoundaryPolicy, InterfaceModel, MaterialField, SourceField, VoxelGrid,
};
use thermovox_layout::{CANONICAL_LAYERS, CanonicalStack, Design, load_itf};

/// Inputs describing the thermal model.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Design file (JSON blocks and optional stackup)
    pub design: PathBuf,

    /// Technology file (ITF); replaces the design's stackup
    #[arg(long)]
    pub itf: Option<PathBuf>,

    /// Cells per side of the lateral grid
    #[arg(short = 'n', long, default_value_t = 16)]
    pub size: usize,

    /// Spacing between layers [µm]
    #[arg(long, default_value_t = 20.0)]
    pub pitch_z: f64,

    /// Ambient temperature [°C]
    #[arg(long, default_value_t = DEFAULT_AMBIENT)]
    pub ambient: f64,

    /// Heat-sink coupling factor on the bottom layer
    #[arg(long, default_value_t = DEFAULT_AMBIENT_COUPLING)]
    pub coupling: f64,

    /// Use harmonic-mean conductance across material interfaces
    #[arg(long)]
    pub harmonic: bool,
}

/// A design turned into solver inputs.
#[derive(Debug, Clone)]
pub struct ThermalModel {
    pub design: Design,
    pub stack: CanonicalStack,
    pub grid: VoxelGrid,
    pub materials: MaterialField,
    pub sources: SourceField,
    pub boundary: BoundaryPolicy,
    pub assembler: AssemblerConfig,
}

impl ModelArgs {
    pub fn load(&self) -> Result<ThermalModel> {
        let mut design = Design::from_path(&self.design)
            .with_context(|| format!("loading design {}", self.design.display()))?;
        if let Some(itf) = &self.itf {
            design.stackup =
                load_itf(itf).with_context(|| format!("reading technology file {}", itf.display()))?;
        }
        let stack = design.canonical_stack()?;

        anyhow::ensure!(self.size > 0, "--size must be at least 1");
        let pitch_xy = design.die_width_um / self.size as f64;
        let grid = VoxelGrid::new(self.size, self.size, CANONICAL_LAYERS, pitch_xy, self.pitch_z)?;
        let sources = design.source_field(&grid, None)?;

        let boundary = BoundaryPolicy::convective(self.ambient).with_strength(self.coupling);
        boundary.validate()?;
        let interface = if self.harmonic {
            InterfaceModel::Harmonic
        } else {
            InterfaceModel::Nodal
        };

        info!(
            "model: {}x{}x{} voxels, pitch {:.2} x {:.2} µm, {:.3} mW",
            grid.rows(),
            grid.cols(),
            grid.layers(),
            pitch_xy,
            self.pitch_z,
            sources.total()
        );
        Ok(ThermalModel {
            materials: stack.material_field(),
            design,
            stack,
            grid,
            sources,
            boundary,
            assembler: AssemblerConfig::thermal().with_interface(interface),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(design: PathBuf) -> ModelArgs {
        ModelArgs {
            design,
            itf: None,
            size: 8,
            pitch_z: 20.0,
            ambient: DEFAULT_AMBIENT,
            coupling: DEFAULT_AMBIENT_COUPLING,
            harmonic: false,
        }
    }

    #[test]
    fn test_load_builds_consistent_model() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"die_width_um": 800, "blocks": [{{"x": 0, "y": 0, "w": 800, "h": 1000, "power_mw": 16}}]}}"#
        )
        .unwrap();

        let model = args(file.path().to_path_buf()).load().unwrap();
        assert_eq!(model.grid.len(), 8 * 8 * CANONICAL_LAYERS);
        assert!((model.grid.pitch_xy() - 100.0).abs() < 1e-12);
        assert!((model.sources.total() - 16.0).abs() < 1e-9);
        model.materials.validate(&model.grid).unwrap();
        assert_eq!(model.assembler.interface, InterfaceModel::Nodal);
    }

    #[test]
    fn test_missing_design_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = args(dir.path().join("none.json")).load().unwrap_err();
        assert!(format!("{err:#}").contains("loading design"));
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"blocks": []}}"#).unwrap();
        let mut a = args(file.path().to_path_buf());
        a.size = 0;
        assert!(a.load().is_err());
    }
}
