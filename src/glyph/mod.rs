//! # Glyph Sources
//!
//! Anything that can turn a character code into a monochrome bitmap feeds the
//! assembler through the `GlyphSource` trait. Two sources ship with the
//! crate: `OutlineRasterizer` for TrueType/OpenType outlines and
//! `TemplateDir` (in `crate::template`) for hand-drawn grids.

pub mod outline;

pub use outline::{FaceMetrics, OutlineRasterizer};

use crate::error::GlyphError;
use crate::model::Bitmap;

/// Code point of the space character, which never contributes to the cell size.
pub const SPACE: u16 = 0x20;

/// How a source positions its bitmap vertically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The bitmap's top row sits `top` rows above the baseline.
    Baseline { top: i32 },
    /// The bitmap is already aligned to the top of the font cell.
    Top,
}

/// A rasterized glyph as delivered by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterGlyph {
    pub bitmap: Bitmap,
    /// Horizontal cursor advance in pixels.
    pub advance: u32,
    pub placement: Placement,
}

impl RasterGlyph {
    pub fn width(&self) -> usize {
        self.bitmap.width()
    }

    pub fn height(&self) -> usize {
        self.bitmap.height()
    }
}

/// A provider of glyph bitmaps at a fixed pixel size.
pub trait GlyphSource {
    /// Rasterize one code.
    fn rasterize(&self, code: u16) -> Result<RasterGlyph, GlyphError>;

    /// Width written for glyphs this source failed to produce. `None` lets the
    /// assembler derive one from the font's maximum width.
    fn fallback_width(&self) -> Option<u8> {
        None
    }

    /// Fixed cell height in rows. Sources with a known grid return it so the
    /// header never depends on which glyphs happened to parse. `None` sizes
    /// the cell from the tallest glyph plus the height margin.
    fn cell_height(&self) -> Option<usize> {
        None
    }

    /// Human readable origin, used in the generated listing.
    fn describe(&self) -> String;
}

impl<S: GlyphSource + ?Sized> GlyphSource for &S {
    fn rasterize(&self, code: u16) -> Result<RasterGlyph, GlyphError> {
        (**self).rasterize(code)
    }

    fn fallback_width(&self) -> Option<u8> {
        (**self).fallback_width()
    }

    fn cell_height(&self) -> Option<usize> {
        (**self).cell_height()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
