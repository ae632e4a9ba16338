//! JSON block-level designs and their rasterization to power maps.

use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thermovox_core::{SourceField, VoxelGrid};

use crate::error::{LayoutError, Result};
use crate::stackup::{CanonicalStack, StackLayer, collapse_stack};

/// Die extent (µm) when a design does not give one.
pub const DEFAULT_DIE_EXTENT_UM: f64 = 1000.0;

fn default_die_extent() -> f64 {
    DEFAULT_DIE_EXTENT_UM
}

/// A rectangular power block. Coordinates are in µm from the die origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub power_mw: f64,
}

impl Block {
    pub fn new(name: impl Into<String>, x: f64, y: f64, w: f64, h: f64, power_mw: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            w,
            h,
            power_mw,
        }
    }

    fn validate(&self, index: usize) -> Result<()> {
        let finite = [self.x, self.y, self.w, self.h, self.power_mw]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.w < 0.0 || self.h < 0.0 || self.power_mw < 0.0 {
            return Err(LayoutError::InvalidDesign(format!(
                "block {index} ({}) has invalid geometry or power",
                self.name
            )));
        }
        Ok(())
    }
}

/// Rectangular viewport (µm) mapped onto the raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Roi {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    fn validate(&self) -> Result<()> {
        let w = self.width();
        let h = self.height();
        if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
            return Err(LayoutError::InvalidDesign(format!(
                "region of interest must have positive extent, got {w} x {h}"
            )));
        }
        Ok(())
    }

    fn overlaps(&self, block: &Block) -> bool {
        block.x <= self.x_max
            && block.x + block.w >= self.x_min
            && block.y <= self.y_max
            && block.y + block.h >= self.y_min
    }
}

/// Cell span `[start, end)` covering `[lo, hi]` on an axis of `n` cells of
/// size `cell`, measured from the viewport origin. Always at least one cell.
fn cell_span(lo: f64, hi: f64, cell: f64, n: usize) -> (usize, usize) {
    let start = ((lo / cell).floor().max(0.0) as usize).min(n - 1);
    let end = ((hi / cell).ceil().max(0.0) as usize).min(n);
    (start, end.max(start + 1))
}

/// A block-level floorplan with an optional technology stackup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    #[serde(default = "default_die_extent")]
    pub die_width_um: f64,
    #[serde(default = "default_die_extent")]
    pub die_height_um: f64,
    #[serde(default)]
    pub stackup: Vec<StackLayer>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Default for Design {
    fn default() -> Self {
        Self {
            die_width_um: DEFAULT_DIE_EXTENT_UM,
            die_height_um: DEFAULT_DIE_EXTENT_UM,
            stackup: Vec::new(),
            blocks: Vec::new(),
        }
    }
}

impl Design {
    /// Load and validate a design from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let design = Self::from_json_str(&text)?;
        info!(
            "loaded {}: {} blocks, {:.3} mW, {} stack layers",
            path.display(),
            design.blocks.len(),
            design.total_power(),
            design.stackup.len()
        );
        Ok(design)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let design: Design = serde_json::from_str(text)?;
        design.validate()?;
        Ok(design)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.die_roi().validate()?;
        for (i, block) in self.blocks.iter().enumerate() {
            block.validate(i)?;
        }
        Ok(())
    }

    pub fn total_power(&self) -> f64 {
        self.blocks.iter().map(|b| b.power_mw).sum()
    }

    /// The whole die as a viewport.
    pub fn die_roi(&self) -> Roi {
        Roi::new(0.0, 0.0, self.die_width_um, self.die_height_um)
    }

    pub fn canonical_stack(&self) -> Result<CanonicalStack> {
        collapse_stack(&self.stackup)
    }

    /// Power map (mW) of `grid_size × grid_size` cells, row-major with rows
    /// along `y`.
    pub fn rasterize(&self, grid_size: usize, roi: Option<Roi>) -> Result<Vec<f64>> {
        self.rasterize_grid(grid_size, grid_size, roi)
    }

    /// Power map (mW) of `rows × cols` cells over `roi` (the die by default).
    ///
    /// Each overlapping block spreads its full power evenly over the cells
    /// its clipped footprint touches. Blocks outside the viewport are
    /// skipped, so only those contribute nothing.
    pub fn rasterize_grid(&self, rows: usize, cols: usize, roi: Option<Roi>) -> Result<Vec<f64>> {
        if rows == 0 || cols == 0 {
            return Err(LayoutError::InvalidDesign(format!(
                "raster must have at least one cell, got {rows} x {cols}"
            )));
        }
        let roi = roi.unwrap_or_else(|| self.die_roi());
        roi.validate()?;

        let dx = roi.width() / cols as f64;
        let dy = roi.height() / rows as f64;
        let mut map = vec![0.0; rows * cols];
        let mut skipped = 0usize;

        for block in &self.blocks {
            if !roi.overlaps(block) {
                skipped += 1;
                continue;
            }
            let (c0, c1) = cell_span(
                block.x.max(roi.x_min) - roi.x_min,
                (block.x + block.w).min(roi.x_max) - roi.x_min,
                dx,
                cols,
            );
            let (r0, r1) = cell_span(
                block.y.max(roi.y_min) - roi.y_min,
                (block.y + block.h).min(roi.y_max) - roi.y_min,
                dy,
                rows,
            );
            let density = block.power_mw / ((r1 - r0) * (c1 - c0)) as f64;
            for r in r0..r1 {
                for cell in &mut map[r * cols + c0..r * cols + c1] {
                    *cell += density;
                }
            }
        }

        debug!(
            "rasterized {} blocks onto {rows}x{cols} ({skipped} outside viewport)",
            self.blocks.len() - skipped
        );
        Ok(map)
    }

    /// Power map of the grid's footprint placed on layer 0.
    pub fn source_field(&self, grid: &VoxelGrid, roi: Option<Roi>) -> Result<SourceField> {
        let map = self.rasterize_grid(grid.rows(), grid.cols(), roi)?;
        Ok(SourceField::from_layer_map(grid, 0, &map)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(blocks: Vec<Block>) -> Design {
        Design {
            blocks,
            ..Design::default()
        }
    }

    #[test]
    fn test_block_inside_die_conserves_power() {
        let d = design(vec![
            Block::new("cpu", 100.0, 200.0, 300.0, 150.0, 40.0),
            Block::new("gpu", 600.0, 600.0, 250.0, 250.0, 60.0),
        ]);
        let map = d.rasterize(16, None).unwrap();
        let total: f64 = map.iter().sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_block_covers_overlapping_cells() {
        // 10x10 cells of 100 µm. Block spans x 150..350, y 0..100.
        let d = design(vec![Block::new("b", 150.0, 0.0, 200.0, 100.0, 3.0)]);
        let map = d.rasterize(10, None).unwrap();
        let covered: Vec<usize> = (0..100).filter(|&i| map[i] > 0.0).collect();
        assert_eq!(covered, vec![1, 2, 3]);
        assert!(covered.iter().all(|&i| (map[i] - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_tiny_block_gets_one_cell() {
        let d = design(vec![Block::new("via", 999.0, 999.0, 0.0, 0.0, 2.0)]);
        let map = d.rasterize(4, None).unwrap();
        assert_eq!(map[15], 2.0);
        assert_eq!(map.iter().sum::<f64>(), 2.0);
    }

    #[test]
    fn test_roi_clips_and_skips() {
        let d = design(vec![
            Block::new("inside", 10.0, 10.0, 20.0, 20.0, 1.0),
            Block::new("straddle", 80.0, 0.0, 40.0, 10.0, 5.0),
            Block::new("outside", 500.0, 500.0, 10.0, 10.0, 100.0),
        ]);
        let map = d
            .rasterize(10, Some(Roi::new(0.0, 0.0, 100.0, 100.0)))
            .unwrap();
        // Straddling block keeps its full power inside the viewport.
        assert!((map.iter().sum::<f64>() - 6.0).abs() < 1e-12);
        assert!((map[8] + map[9] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_json_defaults() {
        let d = Design::from_json_str(
            r#"{"blocks": [{"name": "a", "x": 0, "y": 0, "w": 10, "h": 10, "power_mw": 1.5}]}"#,
        )
        .unwrap();
        assert_eq!(d.die_width_um, DEFAULT_DIE_EXTENT_UM);
        assert_eq!(d.die_height_um, DEFAULT_DIE_EXTENT_UM);
        assert!(d.stackup.is_empty());
        assert_eq!(d.total_power(), 1.5);
    }

    #[test]
    fn test_invalid_designs() {
        assert!(matches!(
            Design::from_json_str(r#"{"die_width_um": 0, "blocks": []}"#),
            Err(LayoutError::InvalidDesign(_))
        ));
        assert!(matches!(
            Design::from_json_str(
                r#"{"blocks": [{"x": 0, "y": 0, "w": 1, "h": 1, "power_mw": -1}]}"#
            ),
            Err(LayoutError::InvalidDesign(_))
        ));
        assert!(matches!(
            Design::from_json_str("{ not json"),
            Err(LayoutError::Json(_))
        ));
        assert!(design(vec![]).rasterize(0, None).is_err());
    }

    #[test]
    fn test_source_field_on_top_layer() {
        let grid = VoxelGrid::square(8, 5, 125.0, 20.0).unwrap();
        let d = design(vec![Block::new("b", 0.0, 0.0, 1000.0, 1000.0, 64.0)]);
        let sources = d.source_field(&grid, None).unwrap();
        assert_eq!(sources.len(), grid.len());
        assert!((sources.total() - 64.0).abs() < 1e-9);
        assert!(sources.values()[..64].iter().all(|&p| (p - 1.0).abs() < 1e-12));
        assert!(sources.values()[64..].iter().all(|&p| p == 0.0));
    }
}
