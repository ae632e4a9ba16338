//! Collapse of an arbitrary technology stackup into the five canonical
//! solver layers.
//!
//! Each source layer is routed to a bucket by its [`LayerKind`], and the
//! layers of one bucket are combined as thermal resistors in series:
//!
//! ```text
//! k_eff = sum(t_i) / sum(t_i / k_i)
//! ```

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thermovox_core::{HeatCapacityField, MaterialField, VoxelGrid};

use crate::error::{LayoutError, Result};

/// Number of layers in a collapsed stack.
pub const CANONICAL_LAYERS: usize = 5;

/// Bucket names, top (heat source) to bottom (ambient).
pub const CANONICAL_LAYER_NAMES: [&str; CANONICAL_LAYERS] =
    ["Die", "BEOL", "Interconnect", "Package", "Board"];

/// Conductivities (W/m·K) used when no stackup is given.
pub const DEFAULT_STACK_CONDUCTIVITY: [f64; CANONICAL_LAYERS] = [150.0, 400.0, 60.0, 10.0, 0.5];

/// Conductivities (W/m·K) substituted for buckets no layer maps to.
pub const FALLBACK_BUCKET_CONDUCTIVITY: [f64; CANONICAL_LAYERS] = [150.0, 200.0, 50.0, 5.0, 0.5];

/// Volumetric heat capacities (J/m³·K) of the canonical layers.
pub const DEFAULT_VOLUMETRIC_HEAT_CAPACITY: [f64; CANONICAL_LAYERS] =
    [1.6e6, 3.4e6, 2.0e6, 2.0e6, 2.0e6];

/// Role of a stack layer. Unrecognized kinds are treated as package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum LayerKind {
    #[serde(rename = "die")]
    Die,
    #[serde(rename = "metal")]
    Metal,
    #[serde(rename = "bump")]
    Bump,
    #[default]
    #[serde(rename = "pkg")]
    Package,
    #[serde(rename = "board")]
    Board,
}

impl LayerKind {
    /// Canonical bucket this kind collapses into.
    pub fn bucket(self) -> usize {
        match self {
            LayerKind::Die => 0,
            LayerKind::Metal => 1,
            LayerKind::Bump => 2,
            LayerKind::Package => 3,
            LayerKind::Board => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Die => "die",
            LayerKind::Metal => "metal",
            LayerKind::Bump => "bump",
            LayerKind::Package => "pkg",
            LayerKind::Board => "board",
        }
    }
}

impl From<&str> for LayerKind {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "die" => LayerKind::Die,
            "metal" => LayerKind::Metal,
            "bump" => LayerKind::Bump,
            "board" => LayerKind::Board,
            _ => LayerKind::Package,
        }
    }
}

impl From<String> for LayerKind {
    fn from(s: String) -> Self {
        LayerKind::from(s.as_str())
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physical layer of a technology stackup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackLayer {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: LayerKind,
    /// Thickness (µm).
    #[serde(rename = "thickness")]
    pub thickness_um: f64,
    /// Thermal conductivity (W/m·K).
    #[serde(rename = "k")]
    pub conductivity: f64,
}

impl StackLayer {
    pub fn new(
        name: impl Into<String>,
        kind: LayerKind,
        thickness_um: f64,
        conductivity: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            thickness_um,
            conductivity,
        }
    }

    fn validate(&self, index: usize) -> Result<()> {
        if !self.thickness_um.is_finite() || self.thickness_um <= 0.0 {
            return Err(LayoutError::InvalidStack(format!(
                "layer {index} ({}) has thickness {}",
                self.name, self.thickness_um
            )));
        }
        if !self.conductivity.is_finite() || self.conductivity <= 0.0 {
            return Err(LayoutError::InvalidStack(format!(
                "layer {index} ({}) has conductivity {}",
                self.name, self.conductivity
            )));
        }
        Ok(())
    }
}

/// A stack reduced to the five canonical layers.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalStack {
    conductivity: [f64; CANONICAL_LAYERS],
    layer_counts: [usize; CANONICAL_LAYERS],
}

impl Default for CanonicalStack {
    fn default() -> Self {
        Self {
            conductivity: DEFAULT_STACK_CONDUCTIVITY,
            layer_counts: [0; CANONICAL_LAYERS],
        }
    }
}

impl CanonicalStack {
    /// Effective conductivity per canonical layer (W/m·K).
    pub fn conductivity(&self) -> &[f64; CANONICAL_LAYERS] {
        &self.conductivity
    }

    /// Number of source layers collapsed into each bucket.
    pub fn layer_counts(&self) -> &[usize; CANONICAL_LAYERS] {
        &self.layer_counts
    }

    /// True when bucket `layer` had no source layers.
    pub fn is_fallback(&self, layer: usize) -> bool {
        self.layer_counts.get(layer).is_some_and(|&n| n == 0)
    }

    pub fn material_field(&self) -> MaterialField {
        MaterialField::per_layer(self.conductivity.to_vec())
    }

    /// Heat capacities from the default volumetric values of each layer.
    pub fn heat_capacity(&self, grid: &VoxelGrid) -> Result<HeatCapacityField> {
        Ok(HeatCapacityField::from_volumetric_layers(
            grid,
            &DEFAULT_VOLUMETRIC_HEAT_CAPACITY,
        )?)
    }
}

/// Collapse `layers` into the canonical five-layer stack.
pub fn collapse_stack(layers: &[StackLayer]) -> Result<CanonicalStack> {
    if layers.is_empty() {
        debug!("empty stackup, using default canonical stack");
        return Ok(CanonicalStack::default());
    }

    let mut thickness = [0.0; CANONICAL_LAYERS];
    let mut resistance = [0.0; CANONICAL_LAYERS];
    let mut layer_counts = [0; CANONICAL_LAYERS];
    for (i, layer) in layers.iter().enumerate() {
        layer.validate(i)?;
        let b = layer.kind.bucket();
        thickness[b] += layer.thickness_um;
        resistance[b] += layer.thickness_um / layer.conductivity;
        layer_counts[b] += 1;
    }

    let mut conductivity = FALLBACK_BUCKET_CONDUCTIVITY;
    for b in 0..CANONICAL_LAYERS {
        if layer_counts[b] == 0 {
            warn!(
                "no stack layers map to {}; using fallback k = {}",
                CANONICAL_LAYER_NAMES[b], FALLBACK_BUCKET_CONDUCTIVITY[b]
            );
            continue;
        }
        conductivity[b] = thickness[b] / resistance[b];
    }

    debug!(
        "collapsed {} stack layers into k = {:?}",
        layers.len(),
        conductivity
    );
    Ok(CanonicalStack {
        conductivity,
        layer_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stack_uses_defaults() {
        let stack = collapse_stack(&[]).unwrap();
        assert_eq!(stack.conductivity(), &DEFAULT_STACK_CONDUCTIVITY);
    }

    #[test]
    fn test_series_combination() {
        // 1 µm at k=400 and 1 µm at k=100: 2 / (1/400 + 1/100) = 160.
        let layers = [
            StackLayer::new("die", LayerKind::Die, 50.0, 150.0),
            StackLayer::new("m1", LayerKind::Metal, 1.0, 400.0),
            StackLayer::new("m2", LayerKind::Metal, 1.0, 100.0),
            StackLayer::new("c4", LayerKind::Bump, 50.0, 60.0),
            StackLayer::new("sub", LayerKind::Package, 500.0, 20.0),
            StackLayer::new("pcb", LayerKind::Board, 1000.0, 0.5),
        ];
        let stack = collapse_stack(&layers).unwrap();
        let k = stack.conductivity();
        assert!((k[1] - 160.0).abs() < 1e-9);
        assert_eq!(k[0], 150.0);
        assert_eq!(k[4], 0.5);
        assert_eq!(stack.layer_counts(), &[1, 2, 1, 1, 1]);
        assert!((0..CANONICAL_LAYERS).all(|b| !stack.is_fallback(b)));
    }

    #[test]
    fn test_empty_buckets_fall_back() {
        let stack = collapse_stack(&[StackLayer::new("m1", LayerKind::Metal, 0.5, 400.0)]).unwrap();
        let k = stack.conductivity();
        assert_eq!(k[1], 400.0);
        assert_eq!(k[0], FALLBACK_BUCKET_CONDUCTIVITY[0]);
        assert_eq!(k[3], FALLBACK_BUCKET_CONDUCTIVITY[3]);
        assert!(stack.is_fallback(0));
        assert!(!stack.is_fallback(1));
    }

    #[test]
    fn test_invalid_layers_rejected() {
        let zero_t = [StackLayer::new("m1", LayerKind::Metal, 0.0, 400.0)];
        assert!(matches!(
            collapse_stack(&zero_t),
            Err(LayoutError::InvalidStack(_))
        ));
        let zero_k = [StackLayer::new("m1", LayerKind::Metal, 1.0, 0.0)];
        assert!(matches!(
            collapse_stack(&zero_k),
            Err(LayoutError::InvalidStack(_))
        ));
    }

    #[test]
    fn test_kind_deserialization() {
        let layer: StackLayer =
            serde_json::from_str(r#"{"name": "x", "type": "Metal", "thickness": 1, "k": 2}"#)
                .unwrap();
        assert_eq!(layer.kind, LayerKind::Metal);

        let unknown: StackLayer =
            serde_json::from_str(r#"{"type": "underfill", "thickness": 1, "k": 2}"#).unwrap();
        assert_eq!(unknown.kind, LayerKind::Package);

        let missing: StackLayer = serde_json::from_str(r#"{"thickness": 1, "k": 2}"#).unwrap();
        assert_eq!(missing.kind, LayerKind::Package);
    }

    #[test]
    fn test_material_field_has_five_layers() {
        let grid = VoxelGrid::square(4, CANONICAL_LAYERS, 50.0, 20.0).unwrap();
        let stack = CanonicalStack::default();
        stack.material_field().validate(&grid).unwrap();
        assert!(stack.heat_capacity(&grid).is_ok());
    }
}
