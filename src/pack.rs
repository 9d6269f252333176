//! # Glyph Packing
//!
//! Converts a cell-height bitmap into column-major bitplanes. For each column,
//! left to right, `ceil(height / 8)` bytes are emitted top to bottom; bit `b`
//! of byte `k` holds the pixel at row `k * 8 + b`, so bit 0 is the top of
//! its 8-row group. This is the page layout SSD1306/SH1106 controllers use.

use log::debug;

use crate::glyph::{Placement, RasterGlyph};
use crate::model::{bytes_per_column, Bitmap};

/// Pack the leftmost `width` columns of a bitmap with exactly `max_height` rows.
///
/// Always returns `width × ceil(max_height / 8)` bytes. Rows at or beyond
/// `max_height` are never read.
pub fn pack(bitmap: &Bitmap, width: usize, max_height: usize) -> Vec<u8> {
    let per_column = bytes_per_column(max_height);
    let mut out = Vec::with_capacity(width * per_column);
    for x in 0..width {
        for group in 0..per_column {
            let mut byte = 0u8;
            for bit in 0..8 {
                let y = group * 8 + bit;
                if y < max_height && bitmap.get(x, y) {
                    byte |= 1 << bit;
                }
            }
            out.push(byte);
        }
    }
    out
}

/// Reverse of `pack`: rebuild a `width × height` bitmap from column bytes.
/// Missing trailing bytes read as empty columns.
pub fn unpack(bytes: &[u8], width: usize, height: usize) -> Bitmap {
    let per_column = bytes_per_column(height);
    let mut bitmap = Bitmap::new(width, height);
    for x in 0..width {
        for group in 0..per_column {
            let byte = bytes.get(x * per_column + group).copied().unwrap_or(0);
            if byte == 0 {
                continue;
            }
            for bit in 0..8 {
                let y = group * 8 + bit;
                if y < height && byte & (1 << bit) != 0 {
                    bitmap.set(x, y, true);
                }
            }
        }
    }
    bitmap
}

/// Baseline row used when true ascender metrics are not available.
pub fn baseline_row(max_height: usize) -> usize {
    max_height * 3 / 4
}

/// Top row of a glyph inside a `max_height` cell.
///
/// `top_offset` is how many rows the glyph's top sits above the baseline. The
/// result is clamped to `[0, max_height - glyph_height]`; a glyph taller than
/// the cell is pinned to row 0 and its bottom rows are cropped.
pub fn top_row(glyph_height: usize, top_offset: i32, max_height: usize) -> usize {
    let row = baseline_row(max_height) as i64 - top_offset as i64;
    let lowest = max_height.saturating_sub(glyph_height) as i64;
    row.clamp(0, lowest) as usize
}

/// Position a glyph in a `max_height` cell, keeping its own width.
pub fn place(glyph: &RasterGlyph, max_height: usize) -> Bitmap {
    let mut cell = Bitmap::new(glyph.width(), max_height);
    let row = match glyph.placement {
        Placement::Top => 0,
        Placement::Baseline { top } => top_row(glyph.height(), top, max_height),
    };
    if glyph.height() > max_height {
        debug!(
            "glyph is {} rows tall, cropping to a {}-row cell",
            glyph.height(),
            max_height
        );
    }
    glyph.bitmap.blit_into(&mut cell, 0, row as i32);
    cell
}
