//! Per-voxel scalar fields: material, source, capacity and solved output.

use crate::error::{Error, Result};
use crate::grid::VoxelGrid;

/// Joules to millijoules, so capacities pair with power in mW and time in s.
const J_TO_MJ: f64 = 1000.0;

fn check_len(field: &'static str, grid: &VoxelGrid, actual: usize) -> Result<()> {
    if actual != grid.len() {
        return Err(Error::ShapeMismatch {
            field,
            expected: grid.len(),
            actual,
        });
    }
    Ok(())
}

/// Per-voxel conductivity, either one value per layer or one per voxel.
///
/// Units are chosen by the caller and reconciled by the assembler's
/// conductivity scale (W/(m·K) for thermal, S/µm for electrical).
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialField {
    /// One value per layer, broadcast over the layer.
    PerLayer(Vec<f64>),
    /// One value per voxel in flat index order.
    PerVoxel(Vec<f64>),
}

impl MaterialField {
    pub fn per_layer(values: impl Into<Vec<f64>>) -> Self {
        Self::PerLayer(values.into())
    }

    pub fn per_voxel(values: impl Into<Vec<f64>>) -> Self {
        Self::PerVoxel(values.into())
    }

    /// Same conductivity everywhere.
    pub fn uniform(grid: &VoxelGrid, value: f64) -> Self {
        Self::PerLayer(vec![value; grid.layers()])
    }

    /// Check shape against `grid` and that every value is finite and non-negative.
    pub fn validate(&self, grid: &VoxelGrid) -> Result<()> {
        let values = match self {
            Self::PerLayer(values) => {
                if values.len() != grid.layers() {
                    return Err(Error::ShapeMismatch {
                        field: "conductivity layers",
                        expected: grid.layers(),
                        actual: values.len(),
                    });
                }
                values
            }
            Self::PerVoxel(values) => {
                check_len("conductivity", grid, values.len())?;
                values
            }
        };
        match values.iter().position(|&k| !k.is_finite() || k < 0.0) {
            Some(index) => Err(Error::InvalidMaterial {
                field: "conductivity",
                index,
                value: values[index],
            }),
            None => Ok(()),
        }
    }

    /// Conductivity of voxel `idx`. The field must have been validated against `grid`.
    #[inline]
    pub fn value(&self, grid: &VoxelGrid, idx: usize) -> f64 {
        match self {
            Self::PerLayer(values) => values[grid.layer_of(idx)],
            Self::PerVoxel(values) => values[idx],
        }
    }

    /// Expand to one value per voxel.
    pub fn to_voxels(&self, grid: &VoxelGrid) -> Vec<f64> {
        (0..grid.len()).map(|idx| self.value(grid, idx)).collect()
    }

    /// Multiply every value by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        match self {
            Self::PerLayer(values) => Self::PerLayer(values.iter().map(|k| k * factor).collect()),
            Self::PerVoxel(values) => Self::PerVoxel(values.iter().map(|k| k * factor).collect()),
        }
    }
}

/// Per-voxel injected quantity: power (mW) or current.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceField {
    values: Vec<f64>,
}

impl SourceField {
    /// Wrap raw values. Shape is checked when the field meets a grid.
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn zeros(grid: &VoxelGrid) -> Self {
        Self {
            values: vec![0.0; grid.len()],
        }
    }

    /// A single source of `value` at `(layer, row, col)`.
    pub fn point(grid: &VoxelGrid, layer: usize, row: usize, col: usize, value: f64) -> Self {
        let mut field = Self::zeros(grid);
        field.values[grid.index(layer, row, col)] = value;
        field
    }

    /// Place a `rows × cols` map on `layer`, zero elsewhere.
    pub fn from_layer_map(grid: &VoxelGrid, layer: usize, map: &[f64]) -> Result<Self> {
        if map.len() != grid.layer_len() {
            return Err(Error::ShapeMismatch {
                field: "layer source map",
                expected: grid.layer_len(),
                actual: map.len(),
            });
        }
        if layer >= grid.layers() {
            return Err(Error::InvalidGrid(format!(
                "layer {layer} out of range for {} layers",
                grid.layers()
            )));
        }
        let mut field = Self::zeros(grid);
        let start = grid.index(layer, 0, 0);
        field.values[start..start + map.len()].copy_from_slice(map);
        Ok(field)
    }

    /// Check shape against `grid` and that every value is finite.
    pub fn validate(&self, grid: &VoxelGrid) -> Result<()> {
        check_len("source", grid, self.values.len())?;
        match self.values.iter().position(|v| !v.is_finite()) {
            Some(index) => Err(Error::InvalidSource {
                index,
                value: self.values[index],
            }),
            None => Ok(()),
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all injections.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }
}

/// Per-voxel thermal mass in mJ/K. Every value is strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatCapacityField {
    values: Vec<f64>,
}

impl HeatCapacityField {
    /// Per-voxel capacities (mJ/K), validated against `grid`.
    pub fn per_voxel(grid: &VoxelGrid, values: impl Into<Vec<f64>>) -> Result<Self> {
        let field = Self {
            values: values.into(),
        };
        field.validate(grid)?;
        Ok(field)
    }

    /// Derive capacities from volumetric heat capacity per layer (J/(m³·K)).
    ///
    /// `C = cv · voxel_volume · 1000`, so the result is in mJ/K.
    pub fn from_volumetric_layers(grid: &VoxelGrid, cv_layers: &[f64]) -> Result<Self> {
        if cv_layers.len() != grid.layers() {
            return Err(Error::ShapeMismatch {
                field: "heat capacity layers",
                expected: grid.layers(),
                actual: cv_layers.len(),
            });
        }
        let volume = grid.voxel_volume_m3();
        let values = (0..grid.len())
            .map(|idx| cv_layers[grid.layer_of(idx)] * volume * J_TO_MJ)
            .collect::<Vec<_>>();
        Self::per_voxel(grid, values)
    }

    pub fn validate(&self, grid: &VoxelGrid) -> Result<()> {
        check_len("heat capacity", grid, self.values.len())?;
        match self.values.iter().position(|&c| !c.is_finite() || c <= 0.0) {
            Some(index) => Err(Error::InvalidMaterial {
                field: "heat capacity",
                index,
                value: self.values[index],
            }),
            None => Ok(()),
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Solved field (temperature in °C or voltage in V) shaped like its grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    grid: VoxelGrid,
    values: Vec<f64>,
}

impl ScalarField {
    pub fn new(grid: VoxelGrid, values: Vec<f64>) -> Result<Self> {
        check_len("scalar field", &grid, values.len())?;
        Ok(Self { grid, values })
    }

    /// Same value everywhere.
    pub fn uniform(grid: VoxelGrid, value: f64) -> Self {
        Self {
            values: vec![value; grid.len()],
            grid,
        }
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    #[inline]
    pub fn get(&self, idx: usize) -> f64 {
        self.values[idx]
    }

    pub fn at(&self, layer: usize, row: usize, col: usize) -> f64 {
        self.values[self.grid.index(layer, row, col)]
    }

    /// Values of one layer in row-major order.
    pub fn layer(&self, layer: usize) -> &[f64] {
        let start = self.grid.index(layer, 0, 0);
        &self.values[start..start + self.grid.layer_len()]
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Flat index and value of the maximum.
    pub fn argmax(&self) -> (usize, f64) {
        self.values
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best })
    }

    pub fn layer_max(&self, layer: usize) -> f64 {
        self.layer(layer).iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn layer_min(&self, layer: usize) -> f64 {
        self.layer(layer).iter().copied().fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> VoxelGrid {
        VoxelGrid::square(4, 3, 50.0, 20.0).unwrap()
    }

    #[test]
    fn material_per_layer_broadcasts() {
        let grid = grid();
        let field = MaterialField::per_layer([150.0, 400.0, 0.5]);
        field.validate(&grid).unwrap();
        assert_eq!(field.value(&grid, grid.index(1, 3, 2)), 400.0);
        assert_eq!(field.to_voxels(&grid).len(), grid.len());
    }

    #[test]
    fn material_shape_mismatch() {
        let grid = grid();
        let err = MaterialField::per_layer([150.0, 400.0]).validate(&grid).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 3, actual: 2, .. }));

        let err = MaterialField::per_voxel(vec![1.0; 10]).validate(&grid).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 48, actual: 10, .. }));
    }

    #[test]
    fn material_rejects_negative_and_nan() {
        let grid = grid();
        let err = MaterialField::per_layer([150.0, -1.0, 0.5]).validate(&grid).unwrap_err();
        assert!(matches!(err, Error::InvalidMaterial { index: 1, .. }));

        let err = MaterialField::per_layer([f64::NAN, 1.0, 0.5]).validate(&grid).unwrap_err();
        assert!(matches!(err, Error::InvalidMaterial { index: 0, .. }));

        // Perfect insulators are allowed here.
        MaterialField::per_layer([0.0, 1.0, 0.5]).validate(&grid).unwrap();
    }

    #[test]
    fn source_point_and_layer_map() {
        let grid = grid();
        let p = SourceField::point(&grid, 0, 2, 2, 100.0);
        assert_eq!(p.total(), 100.0);
        assert_eq!(p.values()[grid.index(0, 2, 2)], 100.0);

        let map = vec![1.0; 16];
        let s = SourceField::from_layer_map(&grid, 2, &map).unwrap();
        assert_eq!(s.total(), 16.0);
        assert_eq!(s.values()[grid.index(2, 0, 0)], 1.0);
        assert_eq!(s.values()[grid.index(0, 0, 0)], 0.0);

        assert!(SourceField::from_layer_map(&grid, 0, &[1.0; 3]).is_err());
        assert!(SourceField::from_layer_map(&grid, 3, &map).is_err());
    }

    #[test]
    fn source_rejects_infinite() {
        let grid = grid();
        let mut s = SourceField::zeros(&grid);
        s.values_mut()[5] = f64::INFINITY;
        assert!(matches!(s.validate(&grid), Err(Error::InvalidSource { index: 5, .. })));
    }

    #[test]
    fn capacity_from_volumetric() {
        let grid = VoxelGrid::square(2, 2, 50.0, 20.0).unwrap();
        let cap = HeatCapacityField::from_volumetric_layers(&grid, &[1.6e6, 2.0e6]).unwrap();
        // 1.6e6 J/m^3K * 5e-14 m^3 * 1000 = 8e-5 mJ/K
        assert!((cap.values()[0] - 8.0e-5).abs() < 1e-15);
        assert!((cap.values()[grid.index(1, 0, 0)] - 1.0e-4).abs() < 1e-15);
    }

    #[test]
    fn capacity_must_be_positive() {
        let grid = VoxelGrid::square(2, 1, 50.0, 20.0).unwrap();
        let err = HeatCapacityField::per_voxel(&grid, vec![1.0, 1.0, 0.0, 1.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidMaterial { index: 2, .. }));
    }

    #[test]
    fn scalar_field_queries() {
        let grid = VoxelGrid::square(2, 2, 50.0, 20.0).unwrap();
        let field = ScalarField::new(grid, vec![1.0, 5.0, 2.0, 3.0, 0.5, 0.0, 4.0, 1.0]).unwrap();
        assert_eq!(field.max(), 5.0);
        assert_eq!(field.min(), 0.0);
        assert_eq!(field.argmax(), (1, 5.0));
        assert_eq!(field.layer_max(1), 4.0);
        assert_eq!(field.layer(1), &[0.5, 0.0, 4.0, 1.0]);
        assert_eq!(field.at(1, 1, 0), 4.0);
        assert!((field.mean() - 2.0625).abs() < 1e-12);
        assert!(ScalarField::new(grid, vec![0.0; 3]).is_err());
    }
}
