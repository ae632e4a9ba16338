//! Boundary policies anchoring the conductance network to a reference value.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::VoxelGrid;

/// Default ambient temperature (°C).
pub const DEFAULT_AMBIENT: f64 = 25.0;

/// Default ratio of ambient conductance to the local vertical conductance.
pub const DEFAULT_AMBIENT_COUPLING: f64 = 10.0;

/// Default conductance (S) tying perimeter nodes to the supply.
pub const DEFAULT_TIE_CONDUCTANCE: f64 = 10.0;

/// How the otherwise floating network is tied to a reference value.
///
/// Exactly one policy applies per solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Terminal-layer voxels lose flux to `ambient` through
    /// `g_amb = g_vert_local * coupling`. Sources are injected power.
    Convective { ambient: f64, coupling: f64 },
    /// Lateral-perimeter voxels are tied to `potential` through `conductance`.
    /// Sources are loads drawn from the mesh.
    FixedPotential { potential: f64, conductance: f64 },
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        Self::convective(DEFAULT_AMBIENT)
    }
}

impl BoundaryPolicy {
    /// Convective policy with the default coupling factor.
    pub fn convective(ambient: f64) -> Self {
        Self::Convective {
            ambient,
            coupling: DEFAULT_AMBIENT_COUPLING,
        }
    }

    /// Fixed-potential policy with the default tie conductance.
    pub fn fixed_potential(potential: f64) -> Self {
        Self::FixedPotential {
            potential,
            conductance: DEFAULT_TIE_CONDUCTANCE,
        }
    }

    /// Replace the boundary strength (coupling factor or tie conductance).
    pub fn with_strength(self, strength: f64) -> Self {
        match self {
            Self::Convective { ambient, .. } => Self::Convective {
                ambient,
                coupling: strength,
            },
            Self::FixedPotential { potential, .. } => Self::FixedPotential {
                potential,
                conductance: strength,
            },
        }
    }

    /// The value the field relaxes towards (ambient or supply).
    pub fn reference(&self) -> f64 {
        match *self {
            Self::Convective { ambient, .. } => ambient,
            Self::FixedPotential { potential, .. } => potential,
        }
    }

    /// Sign applied to source values when they enter the right-hand side.
    pub fn source_sign(&self) -> f64 {
        match self {
            Self::Convective { .. } => 1.0,
            Self::FixedPotential { .. } => -1.0,
        }
    }

    /// Reject zero, negative or non-finite boundary strengths and references.
    pub fn validate(&self) -> Result<()> {
        let (name, strength) = match *self {
            Self::Convective { coupling, .. } => ("ambient coupling", coupling),
            Self::FixedPotential { conductance, .. } => ("tie conductance", conductance),
        };
        if !strength.is_finite() || strength <= 0.0 {
            return Err(Error::InvalidBoundary(format!(
                "{name} must be > 0, got {strength}"
            )));
        }
        if !self.reference().is_finite() {
            return Err(Error::InvalidBoundary(format!(
                "reference value must be finite, got {}",
                self.reference()
            )));
        }
        Ok(())
    }

    /// True if voxel `idx` receives a boundary conductance under this policy.
    pub fn applies_to(&self, grid: &VoxelGrid, idx: usize) -> bool {
        match self {
            Self::Convective { .. } => grid.is_terminal_layer(idx),
            Self::FixedPotential { .. } => grid.is_perimeter(idx),
        }
    }
}

/// How the conductance of an edge between two voxels is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceModel {
    /// Each voxel uses its own conductivity for all of its edges.
    ///
    /// First-order accurate at material interfaces, and the matrix is only
    /// symmetric where neighbouring conductivities agree.
    #[default]
    Nodal,
    /// Harmonic mean of the two local edge conductances (series resistance).
    Harmonic,
}

/// The discretization a (grid, policy) pair resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discretization {
    PlanarConvective,
    VolumetricConvective,
    FixedPotential,
}

impl Discretization {
    pub fn of(grid: &VoxelGrid, policy: &BoundaryPolicy) -> Self {
        match policy {
            BoundaryPolicy::FixedPotential { .. } => Self::FixedPotential,
            BoundaryPolicy::Convective { .. } if grid.is_planar() => Self::PlanarConvective,
            BoundaryPolicy::Convective { .. } => Self::VolumetricConvective,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PlanarConvective => "2D convective",
            Self::VolumetricConvective => "3D convective",
            Self::FixedPotential => "fixed potential",
        }
    }
}

impl std::fmt::Display for Discretization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let policy = BoundaryPolicy::default();
        assert_eq!(
            policy,
            BoundaryPolicy::Convective {
                ambient: 25.0,
                coupling: 10.0
            }
        );
        assert_eq!(policy.reference(), 25.0);
        assert_eq!(policy.source_sign(), 1.0);
        assert_eq!(BoundaryPolicy::fixed_potential(1.0).source_sign(), -1.0);
    }

    #[test]
    fn zero_strength_is_configuration_error() {
        let policy = BoundaryPolicy::convective(25.0).with_strength(0.0);
        assert!(matches!(policy.validate(), Err(Error::InvalidBoundary(_))));

        let policy = BoundaryPolicy::fixed_potential(1.0).with_strength(-3.0);
        assert!(matches!(policy.validate(), Err(Error::InvalidBoundary(_))));

        let policy = BoundaryPolicy::convective(f64::NAN);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn applies_to_terminal_layer_or_perimeter() {
        let grid = VoxelGrid::square(3, 2, 50.0, 20.0).unwrap();
        let conv = BoundaryPolicy::default();
        assert!(conv.applies_to(&grid, grid.index(1, 1, 1)));
        assert!(!conv.applies_to(&grid, grid.index(0, 0, 0)));

        let fixed = BoundaryPolicy::fixed_potential(1.0);
        assert!(fixed.applies_to(&grid, grid.index(0, 0, 1)));
        assert!(!fixed.applies_to(&grid, grid.index(0, 1, 1)));
    }

    #[test]
    fn discretization_tag() {
        let planar = VoxelGrid::planar(4, 4, 50.0, 20.0).unwrap();
        let volume = VoxelGrid::square(4, 5, 50.0, 20.0).unwrap();
        let conv = BoundaryPolicy::default();
        assert_eq!(Discretization::of(&planar, &conv), Discretization::PlanarConvective);
        assert_eq!(Discretization::of(&volume, &conv), Discretization::VolumetricConvective);
        assert_eq!(
            Discretization::of(&volume, &BoundaryPolicy::fixed_potential(1.0)).to_string(),
            "fixed potential"
        );
    }

    #[test]
    fn policy_json_shape() {
        let json = serde_json::to_string(&BoundaryPolicy::default()).unwrap();
        assert_eq!(json, r#"{"kind":"convective","ambient":25.0,"coupling":10.0}"#);
        let back: BoundaryPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BoundaryPolicy::default());
    }
}
