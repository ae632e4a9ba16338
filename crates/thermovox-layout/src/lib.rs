//! Solver input producers for Thermovox.
//!
//! - Technology stack collapse into the five canonical layers
//!   (`collapse_stack`), from JSON stackups or ITF conductor blocks
//! - JSON block-level designs rasterized to power maps (`Design`)

pub mod design;
pub mod error;
pub mod itf;
pub mod stackup;

pub use design::{Block, DEFAULT_DIE_EXTENT_UM, Design, Roi};
pub use error::{LayoutError, Result};
pub use itf::{ItfConductor, load_itf, parse_itf};
pub use stackup::{
    CANONICAL_LAYER_NAMES, CANONICAL_LAYERS, CanonicalStack, DEFAULT_VOLUMETRIC_HEAT_CAPACITY,
    LayerKind, StackLayer, collapse_stack,
};
