//! Process/voltage/temperature corners as sweep cases.
//!
//! Power scales with `voltage_scale² · load_scale`; conductivity scales with
//! `conductivity_scale`.

use thermovox_core::{MaterialField, SourceField};

use crate::sweep::SweepCase;

/// One operating corner relative to a nominal design.
#[derive(Debug, Clone, PartialEq)]
pub struct Corner {
    pub name: String,
    pub voltage_scale: f64,
    pub conductivity_scale: f64,
    pub load_scale: f64,
}

impl Corner {
    pub fn new(
        name: impl Into<String>,
        voltage_scale: f64,
        conductivity_scale: f64,
        load_scale: f64,
    ) -> Self {
        Self {
            name: name.into(),
            voltage_scale,
            conductivity_scale,
            load_scale,
        }
    }

    /// Factor applied to every source value.
    pub fn power_factor(&self) -> f64 {
        self.voltage_scale * self.voltage_scale * self.load_scale
    }

    /// Nominal inputs transformed to this corner.
    pub fn case(&self, materials: &MaterialField, sources: &SourceField) -> SweepCase {
        SweepCase::new(
            self.name.clone(),
            materials.scaled(self.conductivity_scale),
            sources.scaled(self.power_factor()),
        )
    }
}

/// Nominal plus six standard stress corners.
pub fn standard_corners() -> Vec<Corner> {
    vec![
        Corner::new("Nominal", 1.00, 1.00, 1.00),
        Corner::new("FF (fast/hot)", 1.05, 1.20, 1.20),
        Corner::new("SS (slow/cool)", 0.95, 0.80, 0.80),
        Corner::new("High load (+50%)", 1.00, 1.00, 1.50),
        Corner::new("Low load (-50%)", 1.00, 1.00, 0.50),
        Corner::new("Voltage (+5%)", 1.05, 1.00, 1.00),
        Corner::new("Material defect", 1.00, 0.50, 1.00),
    ]
}

/// One sweep case per corner.
pub fn corner_cases(
    corners: &[Corner],
    materials: &MaterialField,
    sources: &SourceField,
) -> Vec<SweepCase> {
    corners.iter().map(|c| c.case(materials, sources)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::ThermalSweep;
    use thermovox_core::{BoundaryPolicy, VoxelGrid};

    #[test]
    fn test_power_factor() {
        let ff = Corner::new("ff", 1.05, 1.2, 1.2);
        assert!((ff.power_factor() - 1.05 * 1.05 * 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_corner_case_scales_inputs() {
        let grid = VoxelGrid::square(2, 2, 50.0, 20.0).unwrap();
        let case = Corner::new("defect", 1.0, 0.5, 2.0).case(
            &MaterialField::per_layer([100.0, 10.0]),
            &SourceField::point(&grid, 0, 0, 0, 3.0),
        );
        assert_eq!(case.label, "defect");
        assert_eq!(case.materials, MaterialField::per_layer([50.0, 5.0]));
        assert_eq!(case.sources.total(), 6.0);
    }

    #[test]
    fn test_standard_corners_order_by_stress() {
        let grid = VoxelGrid::square(8, 5, 50.0, 20.0).unwrap();
        let materials = MaterialField::per_layer([150.0, 400.0, 60.0, 10.0, 0.5]);
        let sources = SourceField::point(&grid, 0, 4, 4, 50.0);
        let corners = standard_corners();
        let result = ThermalSweep::new(grid, BoundaryPolicy::default())
            .unwrap()
            .solve(&corner_cases(&corners, &materials, &sources));

        assert_eq!(result.converged_count(), corners.len());
        let peaks: Vec<f64> = result.peaks().into_iter().flatten().collect();
        let nominal = peaks[0];
        assert!(peaks[3] > nominal, "high load");
        assert!(peaks[4] < nominal, "low load");
        assert!(peaks[6] > nominal, "material defect");
    }
}
