//! # oledfont
//!
//! Packs glyphs into compact column-major bitmap fonts for monochrome OLED
//! controllers (SSD1306, SH1106 and friends).
//!
//! A display driver on a microcontroller wants to find a glyph in O(1) once it
//! knows the glyph's table position, and to blit it column by column straight
//! into the controller's page memory. This crate produces exactly that blob:
//! a small header, a character table, a jump table of `offset, size, width`
//! rows and the concatenated glyph columns.
//!
//! ## Architecture
//!
//! ```text
//! CharSet (codes)
//!       ↓
//!   [glyph]     : GlyphSource: TrueType outlines or [template] grids
//!       ↓
//!   [assemble]  : sizing pass, placement, overflow policy, prefix-sum offsets
//!       ↓          using [pack] for column-major bitplanes
//!   [model]     : FontBlob: validated header + tables + data
//!       ↓
//!   [encode]    : raw bytes, C array listing
//!       ↓
//!   [decode]    : FontView: the firmware's lookup protocol, for previews
//! ```

pub mod assemble;
pub mod charset;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod glyph;
pub mod model;
pub mod pack;
pub mod template;

use std::path::Path;

use log::info;

pub use assemble::{AssembleOptions, FontAssembler, GlyphObserver, GlyphReport, NoObserver, OverflowPolicy};
pub use charset::{CharSet, CharSetSpec};
pub use config::FontConfig;
pub use decode::{FontView, GlyphRef};
pub use encode::{to_bytes, to_c_source, ListingInfo};
pub use error::{FontError, GlyphError};
pub use glyph::{FaceMetrics, GlyphSource, OutlineRasterizer, Placement, RasterGlyph};
pub use model::{Bitmap, BlobLayout, FontBlob, FontMetadata, JumpEntry};
pub use template::TemplateDir;

/// An assembled font together with the description used for its listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFont {
    pub blob: FontBlob,
    pub info: ListingInfo,
}

impl PackedFont {
    /// The raw blob.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode::to_bytes(&self.blob)
    }

    /// The blob as a C header.
    pub fn to_c_source(&self) -> String {
        encode::to_c_source(&self.blob, &self.info)
    }
}

/// Rasterize a TrueType/OpenType font and pack the configured character set.
pub fn convert_font(path: impl AsRef<Path>, config: &FontConfig) -> Result<PackedFont, FontError> {
    convert_font_observed(path, config, &mut NoObserver)
}

/// `convert_font`, reporting every glyph to `observer`.
pub fn convert_font_observed(
    path: impl AsRef<Path>,
    config: &FontConfig,
    observer: &mut dyn GlyphObserver,
) -> Result<PackedFont, FontError> {
    let path = path.as_ref();
    let font = OutlineRasterizer::open(path, config.font_size)?;
    let charset = config.charset.resolve()?;
    info!("Converting {} at {}px: {}", font.describe(), config.font_size, charset);

    let assembler = FontAssembler::new(&font, config.to_options());
    let blob = assembler.assemble_observed(&charset, observer)?;
    let name = config
        .name
        .clone()
        .unwrap_or_else(|| default_name(path.file_stem(), config.font_size));
    Ok(PackedFont {
        blob,
        info: ListingInfo {
            name,
            font_size: config.font_size,
            source: font.describe(),
        },
    })
}

/// Pack a directory of pixel templates.
///
/// The cell is always `font_size` rows, the grid height, even when some
/// templates fail to parse. No height margin is added. Only codes that have a
/// template file and belong to the configured character set are packed.
pub fn build_from_templates(dir: impl AsRef<Path>, config: &FontConfig) -> Result<PackedFont, FontError> {
    build_from_templates_observed(dir, config, &mut NoObserver)
}

/// `build_from_templates`, reporting every glyph to `observer`.
pub fn build_from_templates_observed(
    dir: impl AsRef<Path>,
    config: &FontConfig,
    observer: &mut dyn GlyphObserver,
) -> Result<PackedFont, FontError> {
    let dir = dir.as_ref();
    let source = TemplateDir::open(dir, config.font_size as usize)?.with_lit_symbol(config.lit_symbol);
    let wanted = config.charset.resolve()?;
    let charset = CharSet::from_codes(
        source
            .codes()?
            .into_iter()
            .filter(|code| wanted.codes().contains(code))
            .map(u32::from),
    )?;
    info!("Building {} from templates in {}", charset, dir.display());

    let blob = FontAssembler::new(&source, config.to_options()).assemble_observed(&charset, observer)?;
    let name = config
        .name
        .clone()
        .unwrap_or_else(|| default_name(dir.file_name(), config.font_size));
    Ok(PackedFont {
        blob,
        info: ListingInfo {
            name,
            font_size: config.font_size,
            source: source.describe(),
        },
    })
}

/// `<stem>_<size>`, the array name firmware includes expect. A stem that
/// already ends in `_<size>` is kept as is.
fn default_name(stem: Option<&std::ffi::OsStr>, font_size: u32) -> String {
    let stem = stem
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "font".to_string());
    let suffix = format!("_{}", font_size);
    if stem.ends_with(&suffix) {
        stem
    } else {
        stem + &suffix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_default_name_appends_size() {
        assert_eq!(default_name(Some(OsStr::new("oled")), 10), "oled_10");
        assert_eq!(default_name(Some(OsStr::new("status_10")), 10), "status_10");
        assert_eq!(default_name(Some(OsStr::new("status_10")), 12), "status_10_12");
        assert_eq!(default_name(None, 8), "font_8");
    }
}
