//! Terminal rendering of tensors
//!
//! Each depth plane is drawn as a framed grid of `██` blocks, one per
//! element, colored by the element's magnitude.

use colored::*;
use tensorviz_core::Tensor;

/// Block drawn for one element
pub const BLOCK: &str = "██";

/// Twelve-color palette, indexed by `|value|` in [0, 1]
pub const PALETTE: [(u8, u8, u8); 12] = [
    (0xFF, 0x00, 0x00),
    (0x00, 0xFF, 0x00),
    (0x00, 0x00, 0xFF),
    (0xFF, 0xFF, 0x00),
    (0xFF, 0x00, 0xFF),
    (0x00, 0xFF, 0xFF),
    (0xFF, 0xA5, 0x00),
    (0x80, 0x00, 0x80),
    (0x00, 0x80, 0x00),
    (0xFF, 0xC0, 0xCB),
    (0x80, 0x00, 0x00),
    (0x00, 0x80, 0x80),
];

/// Palette slot for `value`
///
/// Magnitudes are clamped to [0, 1] and scaled by `len - 1`, so every input
/// (including values above 1 after `matrix_power`, and NaN) maps to a valid slot.
pub fn palette_index(value: f64) -> usize {
    let last = PALETTE.len() - 1;
    let magnitude = value.abs();
    if magnitude.is_nan() {
        return 0;
    }
    let index = (magnitude.min(1.0) * last as f64).floor() as usize;
    index.min(last)
}

/// Colored block for one element
pub fn block(value: f64) -> ColoredString {
    let (r, g, b) = PALETTE[palette_index(value)];
    BLOCK.truecolor(r, g, b)
}

/// Render every depth plane of `tensor`
pub fn render_tensor(tensor: &Tensor) -> String {
    let shape = tensor.shape();
    let border = format!("+{}+", "-".repeat(shape.cols() * 2));
    let mut out = String::new();

    for (d, plane) in tensor.planes().enumerate() {
        out.push_str(&format!("{} {}/{}\n", "plane".dimmed(), d + 1, shape.depth()));
        out.push_str(&border);
        out.push('\n');
        for r in 0..plane.rows() {
            out.push('|');
            for c in 0..plane.cols() {
                out.push_str(&block(plane.get(r, c)).to_string());
            }
            out.push_str("|\n");
        }
        out.push_str(&border);
        out.push('\n');
    }

    out
}

/// One line mapping palette slots to magnitude ranges
pub fn render_legend() -> String {
    let last = (PALETTE.len() - 1) as f64;
    let mut out = format!("{} ", "|v|".bold());
    for (i, &(r, g, b)) in PALETTE.iter().enumerate() {
        out.push_str(&format!("{}{:.2} ", BLOCK.truecolor(r, g, b), i as f64 / last));
    }
    out
}
