//! TrueType/OpenType outline rasterizer.
//!
//! `fontdue` produces an 8-bit coverage bitmap per glyph, which is thresholded
//! to 1bpp. `ttf-parser` reads the face-wide metadata once at load time.
//! The bitmap's top row is reported relative to the baseline.

use std::path::Path;

use fontdue::{Font, FontSettings};
use ttf_parser::{name_id, Face};

use super::{GlyphSource, Placement, RasterGlyph};
use crate::error::{FontError, GlyphError};
use crate::model::Bitmap;

/// Coverage at or above which a pixel is lit.
pub const COVERAGE_THRESHOLD: u8 = 128;

/// Face-wide information, vertical metrics scaled to the pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMetrics {
    pub family: Option<String>,
    pub glyph_count: u16,
    pub units_per_em: u16,
    pub ascender_px: f32,
    pub descender_px: f32,
    pub line_gap_px: f32,
}

impl FaceMetrics {
    fn read(face: &Face<'_>, size: u32) -> Self {
        let scale = size as f32 / face.units_per_em() as f32;
        let family = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::FAMILY)
            .find_map(|name| name.to_string());
        FaceMetrics {
            family,
            glyph_count: face.number_of_glyphs(),
            units_per_em: face.units_per_em(),
            ascender_px: face.ascender() as f32 * scale,
            descender_px: face.descender() as f32 * scale,
            line_gap_px: face.line_gap() as f32 * scale,
        }
    }

    /// Recommended distance between baselines.
    pub fn line_height_px(&self) -> f32 {
        self.ascender_px - self.descender_px + self.line_gap_px
    }
}

/// Rasterizes glyphs of one font face at a fixed pixel size.
pub struct OutlineRasterizer {
    font: Font,
    metrics: FaceMetrics,
    size: u32,
    label: String,
}

impl std::fmt::Debug for OutlineRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineRasterizer")
            .field("label", &self.label)
            .field("size", &self.size)
            .field("glyphs", &self.metrics.glyph_count)
            .finish()
    }
}

impl OutlineRasterizer {
    /// Load a font file. Fails if it cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>, size: u32) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| FontError::unavailable(path, e))?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(data, size, label)
    }

    /// Wrap in-memory font data.
    pub fn from_bytes(data: Vec<u8>, size: u32, label: impl Into<String>) -> Result<Self, FontError> {
        let label = label.into();
        if size == 0 {
            return Err(FontError::unavailable(&label, "pixel size must be positive"));
        }
        let face = Face::parse(&data, 0).map_err(|e| FontError::unavailable(&label, e))?;
        let metrics = FaceMetrics::read(&face, size);
        let font = Font::from_bytes(data.as_slice(), FontSettings::default())
            .map_err(|e| FontError::unavailable(&label, e))?;
        Ok(Self {
            font,
            metrics,
            size,
            label,
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Face-wide metrics at this pixel size.
    pub fn metrics(&self) -> &FaceMetrics {
        &self.metrics
    }
}

impl GlyphSource for OutlineRasterizer {
    fn rasterize(&self, code: u16) -> Result<RasterGlyph, GlyphError> {
        let ch = char::from_u32(code as u32).ok_or(GlyphError::Unsupported(code))?;
        let index = self.font.lookup_glyph_index(ch);
        if index == 0 {
            return Err(GlyphError::Unsupported(code));
        }

        let (metrics, coverage) = self.font.rasterize_indexed(index, self.size as f32);
        let advance = metrics.advance_width.round().max(0.0) as u32;
        if metrics.width == 0 || metrics.height == 0 {
            // No outline, e.g. space.
            return Ok(RasterGlyph {
                bitmap: Bitmap::new(0, 0),
                advance,
                placement: Placement::Baseline { top: 0 },
            });
        }

        Ok(RasterGlyph {
            bitmap: threshold(&coverage, metrics.width, metrics.height),
            advance,
            placement: Placement::Baseline {
                top: metrics.ymin + metrics.height as i32,
            },
        })
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Reduce a row-major coverage map to 1bpp.
///
/// Strokes thinner than half a pixel never reach `COVERAGE_THRESHOLD`. When
/// nothing does, pixels with at least half the peak coverage are lit instead,
/// so hairlines stay visible at small sizes.
fn threshold(coverage: &[u8], width: usize, height: usize) -> Bitmap {
    let peak = coverage.iter().copied().max().unwrap_or(0);
    let cut = if peak >= COVERAGE_THRESHOLD {
        COVERAGE_THRESHOLD
    } else {
        (peak / 2).max(1)
    };

    let mut bitmap = Bitmap::new(width, height);
    for (i, &value) in coverage.iter().enumerate().take(width * height) {
        if value >= cut {
            bitmap.set(i % width, i / width, true);
        }
    }
    bitmap
}
