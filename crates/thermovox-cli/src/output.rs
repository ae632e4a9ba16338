//! Report formatting.

use thermovox_core::ScalarField;
use thermovox_layout::CANONICAL_LAYER_NAMES;

use crate::model::ThermalModel;

/// Print a title with an underline.
pub fn print_header(title: &str) {
    println!("{title}");
    println!("{}", "=".repeat(title.chars().count().max(42)));
    println!();
}

/// Per-layer conductivity and temperature range.
pub fn print_layer_table(model: &ThermalModel, field: &ScalarField) {
    println!(
        "{:<14}{:>12}{:>14}{:>14}{:>14}",
        "Layer", "k [W/mK]", "Peak [°C]", "Mean [°C]", "Min [°C]"
    );
    println!("{}", "-".repeat(68));
    let k = model.stack.conductivity();
    let grid = field.grid();
    for layer in 0..grid.layers() {
        let values = field.layer(layer);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let name = CANONICAL_LAYER_NAMES.get(layer).copied().unwrap_or("?");
        let marker = if model.stack.is_fallback(layer) { "*" } else { "" };
        println!(
            "{:<14}{:>12.3}{:>14.3}{:>14.3}{:>14.3}",
            format!("{name}{marker}"),
            k[layer],
            field.layer_max(layer),
            mean,
            field.layer_min(layer)
        );
    }
    if (0..grid.layers()).any(|l| model.stack.is_fallback(l)) {
        println!("  * no stack layers; fallback conductivity");
    }
    println!();
}

/// Location and value of the hottest voxel.
pub fn print_hotspot(field: &ScalarField) {
    let grid = field.grid();
    let (idx, peak) = field.argmax();
    let (layer, row, col) = grid.coords(idx);
    let pitch = grid.pitch_xy();
    println!(
        "Hotspot: {peak:.3} °C at layer {layer}, cell ({row}, {col}), ~({:.1}, {:.1}) µm",
        (col as f64 + 0.5) * pitch,
        (row as f64 + 0.5) * pitch
    );
}
