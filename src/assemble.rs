//! # Font Assembly
//!
//! Drives a `GlyphSource` across a character set and produces a `FontBlob`.
//!
//! ## Passes
//!
//! 1. **Sizing**: rasterize every code once and track the widest and tallest
//!    bitmaps. Space and failed glyphs do not count.
//! 2. **Resolve**: take the source's fixed cell height, or add the height
//!    margin to the tallest glyph, and derive bytes per column.
//! 3. **Packing**: place and pack each glyph on its own, producing a size per
//!    glyph.
//! 4. **Offsets**: a prefix sum over the sizes gives each glyph's offset into
//!    the data section. Sentinel entries take no space.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::charset::CharSet;
use crate::error::{FontError, GlyphError};
use crate::glyph::{GlyphSource, RasterGlyph, SPACE};
use crate::model::{bytes_per_column, check_legacy_codes, Bitmap, BlobLayout, FontBlob, FontMetadata, JumpEntry};
use crate::pack::{pack, place};

/// Largest data section whose offsets stay clear of the sentinel.
pub const MAX_DATA_LEN: usize = 0xFFFE;

/// What to do with a glyph whose packed size exceeds the one-byte size field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Keep as many leading columns as fit in 255 bytes.
    #[default]
    Crop,
    /// Abort with `FontError::GlyphTooLarge`.
    Fail,
}

/// Recommended inter-glyph spacing for a pixel size.
pub fn default_spacing(font_size: u32) -> u8 {
    let spacing = if font_size <= 10 {
        1
    } else if font_size <= 40 {
        2
    } else {
        2 + (font_size - 40) / 10 + 1
    };
    spacing.min(u8::MAX as u32) as u8
}

/// Tunables for one assembly run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleOptions {
    /// Nominal pixel size, used for the default spacing.
    pub font_size: u32,
    /// Explicit spacing; `None` derives it from `font_size`.
    pub spacing: Option<u8>,
    /// Rows added below the tallest glyph.
    pub height_margin: u8,
    pub layout: BlobLayout,
    pub overflow: OverflowPolicy,
}

impl AssembleOptions {
    pub fn new(font_size: u32) -> Self {
        Self {
            font_size,
            spacing: None,
            height_margin: 1,
            layout: BlobLayout::Indexed,
            overflow: OverflowPolicy::Crop,
        }
    }

    pub fn with_spacing(mut self, spacing: u8) -> Self {
        self.spacing = Some(spacing);
        self
    }

    pub fn with_height_margin(mut self, margin: u8) -> Self {
        self.height_margin = margin;
        self
    }

    pub fn with_layout(mut self, layout: BlobLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn resolved_spacing(&self) -> u8 {
        self.spacing.unwrap_or_else(|| default_spacing(self.font_size))
    }
}

/// What the assembler did with one glyph, handed to observers.
#[derive(Debug)]
pub struct GlyphReport<'a> {
    pub code: u16,
    pub entry: JumpEntry,
    /// The glyph placed in its cell, when it had any columns.
    pub cell: Option<&'a Bitmap>,
    pub packed: &'a [u8],
    pub failure: Option<&'a GlyphError>,
}

/// Per-glyph callback for diagnostics. Never affects the output.
pub trait GlyphObserver {
    fn observe(&mut self, report: &GlyphReport<'_>);
}

impl<F: FnMut(&GlyphReport<'_>)> GlyphObserver for F {
    fn observe(&mut self, report: &GlyphReport<'_>) {
        self(report)
    }
}

/// Observer that ignores everything.
pub struct NoObserver;

impl GlyphObserver for NoObserver {
    fn observe(&mut self, _report: &GlyphReport<'_>) {}
}

/// One glyph after packing, before offsets are assigned.
struct PackedGlyph {
    code: u16,
    bytes: Vec<u8>,
    width: u8,
    sentinel: bool,
}

/// Builds a `FontBlob` from a glyph source.
pub struct FontAssembler<S> {
    source: S,
    options: AssembleOptions,
}

impl<S: GlyphSource> FontAssembler<S> {
    pub fn new(source: S, options: AssembleOptions) -> Self {
        Self { source, options }
    }

    /// Assemble a font for every code in the set.
    pub fn assemble(&self, charset: &CharSet) -> Result<FontBlob, FontError> {
        self.assemble_observed(charset, &mut NoObserver)
    }

    /// Assemble, reporting each glyph to `observer` as it is packed.
    pub fn assemble_observed(
        &self,
        charset: &CharSet,
        observer: &mut dyn GlyphObserver,
    ) -> Result<FontBlob, FontError> {
        let codes = table_codes(charset);
        if self.options.layout == BlobLayout::Legacy {
            check_legacy_codes(&codes)?;
        }

        // Sizing pass.
        let rasterized: Vec<Result<RasterGlyph, GlyphError>> =
            codes.iter().map(|&code| self.source.rasterize(code)).collect();
        let (widest, tallest) = codes
            .iter()
            .zip(&rasterized)
            .filter(|&(&code, _)| code != SPACE)
            .filter_map(|(_, glyph)| glyph.as_ref().ok())
            .fold((0usize, 0usize), |(w, h), g| (w.max(g.width()), h.max(g.height())));

        // Resolve.
        let max_height = match self.source.cell_height() {
            Some(cell) => cell.max(tallest),
            None => tallest + self.options.height_margin as usize,
        };
        if max_height > u8::MAX as usize {
            return Err(FontError::FontTooLarge {
                what: "height",
                value: max_height,
            });
        }
        if widest > u8::MAX as usize {
            return Err(FontError::FontTooLarge {
                what: "width",
                value: widest,
            });
        }
        let max_width = widest as u8;
        debug!(
            "Resolved cell {}x{}, {} bytes per column",
            max_width,
            max_height,
            bytes_per_column(max_height)
        );

        // Packing pass.
        let mut packed = Vec::with_capacity(codes.len());
        for (&code, glyph) in codes.iter().zip(rasterized) {
            let glyph = self.pack_one(code, glyph, max_width, max_height, observer)?;
            packed.push(glyph);
        }

        // Offsets.
        let total: usize = packed.iter().map(|g| g.bytes.len()).sum();
        if total > MAX_DATA_LEN {
            return Err(FontError::DataOverflow(total));
        }
        let mut data = Vec::with_capacity(total);
        let mut jump_table = Vec::with_capacity(packed.len());
        for glyph in &packed {
            if glyph.sentinel {
                jump_table.push(JumpEntry::sentinel(glyph.width));
                continue;
            }
            jump_table.push(JumpEntry {
                offset: data.len() as u16,
                size: glyph.bytes.len() as u8,
                width: glyph.width,
            });
            data.extend_from_slice(&glyph.bytes);
        }

        let failed = packed.iter().filter(|g| g.sentinel).count();
        let metadata = FontMetadata {
            max_width,
            max_height: max_height as u8,
            char_count: codes.len() as u16,
            spacing: self.options.resolved_spacing(),
        };
        info!(
            "Assembled {} glyphs ({} unsupported), cell {}x{}, {} data bytes",
            codes.len(),
            failed,
            metadata.max_width,
            metadata.max_height,
            data.len()
        );

        let codes = packed.iter().map(|g| g.code).collect();
        FontBlob::new(metadata, self.options.layout, codes, jump_table, data)
    }

    fn pack_one(
        &self,
        code: u16,
        glyph: Result<RasterGlyph, GlyphError>,
        max_width: u8,
        max_height: usize,
        observer: &mut dyn GlyphObserver,
    ) -> Result<PackedGlyph, FontError> {
        let glyph = match glyph {
            Ok(glyph) => glyph,
            Err(err) => {
                let width = self.source.fallback_width().unwrap_or(max_width / 2);
                warn!("{}, using a blank placeholder {} px wide", err, width);
                let entry = JumpEntry::sentinel(width);
                observer.observe(&GlyphReport {
                    code,
                    entry,
                    cell: None,
                    packed: &[],
                    failure: Some(&err),
                });
                return Ok(PackedGlyph {
                    code,
                    bytes: Vec::new(),
                    width,
                    sentinel: true,
                });
            }
        };

        let advance = clamp_advance(code, glyph.advance);

        if code == SPACE || glyph.width() == 0 {
            let width = if code != SPACE && advance == 0 {
                max_width / 4
            } else {
                advance
            };
            let entry = JumpEntry {
                offset: 0,
                size: 0,
                width,
            };
            observer.observe(&GlyphReport {
                code,
                entry,
                cell: None,
                packed: &[],
                failure: None,
            });
            return Ok(PackedGlyph {
                code,
                bytes: Vec::new(),
                width,
                sentinel: false,
            });
        }

        let mut cell = place(&glyph, max_height);
        let mut bytes = pack(&cell, cell.width(), max_height);
        if bytes.len() > u8::MAX as usize {
            match self.options.overflow {
                OverflowPolicy::Fail => {
                    return Err(FontError::GlyphTooLarge {
                        code,
                        size: bytes.len(),
                    })
                }
                OverflowPolicy::Crop => {
                    let columns = u8::MAX as usize / bytes_per_column(max_height);
                    warn!(
                        "Glyph 0x{:04X} packs to {} bytes, cropping to {} columns",
                        code,
                        bytes.len(),
                        columns
                    );
                    cell = cell.crop_width(columns);
                    bytes = pack(&cell, cell.width(), max_height);
                }
            }
        }

        let entry = JumpEntry {
            offset: 0,
            size: bytes.len() as u8,
            width: advance,
        };
        observer.observe(&GlyphReport {
            code,
            entry,
            cell: Some(&cell),
            packed: &bytes,
            failure: None,
        });
        Ok(PackedGlyph {
            code,
            bytes,
            width: advance,
            sentinel: false,
        })
    }
}

/// Codes that fit the one-byte character table, in order.
fn table_codes(charset: &CharSet) -> Vec<u16> {
    let (kept, dropped): (Vec<u16>, Vec<u16>) = charset.codes().iter().partition(|&&c| c <= 0xFF);
    if !dropped.is_empty() {
        warn!(
            "Dropping {} codes above 0xFF (first 0x{:04X}): the character table stores one byte per code",
            dropped.len(),
            dropped[0]
        );
    }
    kept
}

fn clamp_advance(code: u16, advance: u32) -> u8 {
    u8::try_from(advance).unwrap_or_else(|_| {
        warn!(
            "Advance of glyph 0x{:04X} is {} px, storing 255",
            code, advance
        );
        u8::MAX
    })
}
