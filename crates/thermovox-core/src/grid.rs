//! Voxel lattice topology and index arithmetic.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Direction of an edge between two adjacent voxels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    /// Same layer, neighbouring row or column.
    #[default]
    Lateral,
    /// Same row and column, neighbouring layer.
    Vertical,
}

/// A uniform `layers × rows × cols` lattice with physical pitch in µm.
///
/// Voxels are addressed by a flat index `layer * rows * cols + row * cols + col`.
/// A grid with a single layer is planar (4-connected); otherwise every voxel
/// has up to 6 neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridSpec")]
pub struct VoxelGrid {
    rows: usize,
    cols: usize,
    layers: usize,
    pitch_xy: f64,
    pitch_z: f64,
}

impl VoxelGrid {
    /// Create a grid, validating dimensions and pitches.
    pub fn new(rows: usize, cols: usize, layers: usize, pitch_xy: f64, pitch_z: f64) -> Result<Self> {
        if rows == 0 || cols == 0 || layers == 0 {
            return Err(Error::InvalidGrid(format!(
                "dimensions must be >= 1, got {rows}x{cols}x{layers}"
            )));
        }
        for (name, pitch) in [("pitch_xy", pitch_xy), ("pitch_z", pitch_z)] {
            if !pitch.is_finite() || pitch <= 0.0 {
                return Err(Error::InvalidGrid(format!("{name} must be > 0, got {pitch}")));
            }
        }
        Ok(Self {
            rows,
            cols,
            layers,
            pitch_xy,
            pitch_z,
        })
    }

    /// Square `size × size` grid with `layers` layers.
    pub fn square(size: usize, layers: usize, pitch_xy: f64, pitch_z: f64) -> Result<Self> {
        Self::new(size, size, layers, pitch_xy, pitch_z)
    }

    /// Single-layer grid.
    pub fn planar(rows: usize, cols: usize, pitch_xy: f64, pitch_z: f64) -> Result<Self> {
        Self::new(rows, cols, 1, pitch_xy, pitch_z)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Lateral spacing (µm).
    pub fn pitch_xy(&self) -> f64 {
        self.pitch_xy
    }

    /// Inter-layer spacing (µm).
    pub fn pitch_z(&self) -> f64 {
        self.pitch_z
    }

    /// Voxels per layer.
    #[inline]
    pub fn layer_len(&self) -> usize {
        self.rows * self.cols
    }

    /// Total voxel count.
    #[inline]
    pub fn len(&self) -> usize {
        self.layer_len() * self.layers
    }

    /// Always false; a valid grid holds at least one voxel.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for single-layer grids.
    pub fn is_planar(&self) -> bool {
        self.layers == 1
    }

    /// Voxel volume in m³.
    pub fn voxel_volume_m3(&self) -> f64 {
        let dx = self.pitch_xy * 1e-6;
        let dz = self.pitch_z * 1e-6;
        dx * dx * dz
    }

    /// Flat index of `(layer, row, col)`.
    #[inline]
    pub fn index(&self, layer: usize, row: usize, col: usize) -> usize {
        debug_assert!(layer < self.layers && row < self.rows && col < self.cols);
        layer * self.layer_len() + row * self.cols + col
    }

    /// Inverse of [`VoxelGrid::index`].
    #[inline]
    pub fn coords(&self, idx: usize) -> (usize, usize, usize) {
        let layer = idx / self.layer_len();
        let rem = idx % self.layer_len();
        (layer, rem / self.cols, rem % self.cols)
    }

    /// Layer of a flat index.
    #[inline]
    pub fn layer_of(&self, idx: usize) -> usize {
        idx / self.layer_len()
    }

    /// Index of the voxel nearest the lateral centre of `layer`.
    pub fn center(&self, layer: usize) -> usize {
        self.index(layer, self.rows / 2, self.cols / 2)
    }

    /// True if the voxel lies in the last layer.
    pub fn is_terminal_layer(&self, idx: usize) -> bool {
        self.layer_of(idx) == self.layers - 1
    }

    /// True if the voxel lies on the lateral perimeter of its layer.
    pub fn is_perimeter(&self, idx: usize) -> bool {
        let (_, row, col) = self.coords(idx);
        row == 0 || col == 0 || row == self.rows - 1 || col == self.cols - 1
    }

    /// Neighbours of `idx` with the axis of each connecting edge.
    ///
    /// Order is fixed: row-1, row+1, col-1, col+1, layer-1, layer+1.
    pub fn neighbours(&self, idx: usize) -> Neighbours {
        let (layer, row, col) = self.coords(idx);
        let mut out = Neighbours::default();
        if row > 0 {
            out.push(idx - self.cols, Axis::Lateral);
        }
        if row + 1 < self.rows {
            out.push(idx + self.cols, Axis::Lateral);
        }
        if col > 0 {
            out.push(idx - 1, Axis::Lateral);
        }
        if col + 1 < self.cols {
            out.push(idx + 1, Axis::Lateral);
        }
        if layer > 0 {
            out.push(idx - self.layer_len(), Axis::Vertical);
        }
        if layer + 1 < self.layers {
            out.push(idx + self.layer_len(), Axis::Vertical);
        }
        out
    }

    /// Index of the voxel mirrored across the vertical centre line (col -> cols-1-col).
    pub fn mirror_cols(&self, idx: usize) -> usize {
        let (layer, row, col) = self.coords(idx);
        self.index(layer, row, self.cols - 1 - col)
    }

    /// Index of the voxel mirrored across the horizontal centre line (row -> rows-1-row).
    pub fn mirror_rows(&self, idx: usize) -> usize {
        let (layer, row, col) = self.coords(idx);
        self.index(layer, self.rows - 1 - row, col)
    }
}

/// Unvalidated grid description as it appears in configuration files.
#[derive(Deserialize)]
struct GridSpec {
    rows: usize,
    cols: usize,
    layers: usize,
    pitch_xy: f64,
    pitch_z: f64,
}

impl TryFrom<GridSpec> for VoxelGrid {
    type Error = Error;

    fn try_from(spec: GridSpec) -> Result<Self> {
        VoxelGrid::new(spec.rows, spec.cols, spec.layers, spec.pitch_xy, spec.pitch_z)
    }
}

/// Fixed-capacity neighbour list (at most 6 entries).
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighbours {
    items: [(usize, Axis); 6],
    len: usize,
}

impl Neighbours {
    fn push(&mut self, idx: usize, axis: Axis) {
        self.items[self.len] = (idx, axis);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[(usize, Axis)] {
        &self.items[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Axis)> + '_ {
        self.as_slice().iter().copied()
    }
}
