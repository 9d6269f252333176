//! # Font Model
//!
//! The in-memory shape of a packed bitmap font. A `FontBlob` is the assembled
//! result: header fields, the ordered character table, the parallel jump
//! table and the concatenated column-major glyph data.
//!
//! ```text
//! [ metadata ][ char table ][ jump table ][ glyph data ]
//!   5 bytes     N bytes        4N bytes     Σ size[i]
//! ```
//!
//! The character table and jump table are parallel arrays: the glyph for the
//! code at position `i` is described by jump entry `i`. Nothing else links a
//! code to its data.

pub mod bitmap;

pub use bitmap::Bitmap;

use serde::{Deserialize, Serialize};

use crate::error::FontError;

/// Offset value marking a glyph that failed to rasterize.
pub const SENTINEL_OFFSET: u16 = 0xFFFF;

/// Header size of the indexed layout: width, height, count MSB, count LSB, spacing.
pub const INDEXED_HEADER_LEN: usize = 5;

/// Header size of the legacy layout: width, height, first char, count.
pub const LEGACY_HEADER_LEN: usize = 4;

/// Bytes per jump table entry.
pub const JUMP_ENTRY_LEN: usize = 4;

/// Number of bytes needed to cover `height` pixels vertically, 8 per byte.
pub fn bytes_per_column(height: usize) -> usize {
    height.div_ceil(8)
}

/// Which header variant the blob uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobLayout {
    /// 5-byte header with spacing, followed by an explicit character table.
    #[default]
    Indexed,
    /// 4-byte header `width, height, first_char, count` for a contiguous
    /// range, without character table or spacing.
    Legacy,
}

impl BlobLayout {
    pub fn header_len(&self) -> usize {
        match self {
            BlobLayout::Indexed => INDEXED_HEADER_LEN,
            BlobLayout::Legacy => LEGACY_HEADER_LEN,
        }
    }
}

/// Global header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetadata {
    /// Widest glyph bitmap in pixels (not advance width).
    pub max_width: u8,
    /// Tallest glyph bitmap plus the safety margin.
    pub max_height: u8,
    pub char_count: u16,
    /// Recommended pixels between glyphs.
    pub spacing: u8,
}

impl FontMetadata {
    pub fn bytes_per_column(&self) -> usize {
        bytes_per_column(self.max_height as usize)
    }
}

/// A character table position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterEntry {
    pub code: u16,
    pub order_index: usize,
}

/// One jump table row, parallel to the character table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpEntry {
    /// Byte offset into the data section, or `SENTINEL_OFFSET`.
    pub offset: u16,
    /// Packed bytes: pixel width × bytes per column.
    pub size: u8,
    /// Advance width in pixels.
    pub width: u8,
}

impl JumpEntry {
    /// Entry for a glyph that could not be produced, rendered blank.
    pub fn sentinel(fallback_width: u8) -> Self {
        Self {
            offset: SENTINEL_OFFSET,
            size: 0,
            width: fallback_width,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.offset == SENTINEL_OFFSET
    }

    /// Wire form: offset MSB, offset LSB, size, width.
    pub fn to_bytes(&self) -> [u8; JUMP_ENTRY_LEN] {
        let [msb, lsb] = self.offset.to_be_bytes();
        [msb, lsb, self.size, self.width]
    }

    pub fn from_bytes(bytes: [u8; JUMP_ENTRY_LEN]) -> Self {
        Self {
            offset: u16::from_be_bytes([bytes[0], bytes[1]]),
            size: bytes[2],
            width: bytes[3],
        }
    }
}

/// A fully assembled font, ready for encoding. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontBlob {
    metadata: FontMetadata,
    layout: BlobLayout,
    codes: Vec<u16>,
    jump_table: Vec<JumpEntry>,
    data: Vec<u8>,
}

impl FontBlob {
    /// Validate and freeze the assembled parts.
    ///
    /// Checks that the parallel tables agree with the header count, that every
    /// non-sentinel offset equals the sum of the sizes before it and that the
    /// data section holds exactly those bytes.
    pub fn new(
        metadata: FontMetadata,
        layout: BlobLayout,
        codes: Vec<u16>,
        jump_table: Vec<JumpEntry>,
        data: Vec<u8>,
    ) -> Result<Self, FontError> {
        if codes.len() != jump_table.len() || codes.len() != metadata.char_count as usize {
            return Err(FontError::MalformedBlob(format!(
                "character table has {} codes, jump table {} entries, header count {}",
                codes.len(),
                jump_table.len(),
                metadata.char_count
            )));
        }
        if let Some(code) = codes.iter().find(|&&c| c > 0xFF) {
            return Err(FontError::LayoutMismatch(format!(
                "code 0x{:04X} does not fit the one-byte character table",
                code
            )));
        }

        let mut expected = 0usize;
        for (code, entry) in codes.iter().zip(&jump_table) {
            if entry.is_sentinel() {
                if entry.size != 0 {
                    return Err(FontError::MalformedBlob(format!(
                        "sentinel entry for 0x{:04X} declares {} bytes",
                        code, entry.size
                    )));
                }
                continue;
            }
            if entry.offset as usize != expected {
                return Err(FontError::MalformedBlob(format!(
                    "glyph 0x{:04X} starts at {}, expected {}",
                    code, entry.offset, expected
                )));
            }
            expected += entry.size as usize;
        }
        if expected != data.len() {
            return Err(FontError::MalformedBlob(format!(
                "jump table covers {} bytes, data section has {}",
                expected,
                data.len()
            )));
        }

        if layout == BlobLayout::Legacy {
            check_legacy_codes(&codes)?;
        }

        Ok(Self {
            metadata,
            layout,
            codes,
            jump_table,
            data,
        })
    }

    pub fn metadata(&self) -> &FontMetadata {
        &self.metadata
    }

    pub fn layout(&self) -> BlobLayout {
        self.layout
    }

    pub fn codes(&self) -> &[u16] {
        &self.codes
    }

    pub fn jump_table(&self) -> &[JumpEntry] {
        &self.jump_table
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_per_column(&self) -> usize {
        self.metadata.bytes_per_column()
    }

    /// Character table in order.
    pub fn characters(&self) -> impl Iterator<Item = CharacterEntry> + '_ {
        self.codes
            .iter()
            .enumerate()
            .map(|(order_index, &code)| CharacterEntry { code, order_index })
    }

    /// Total encoded length in bytes.
    pub fn encoded_len(&self) -> usize {
        let table = match self.layout {
            BlobLayout::Indexed => self.codes.len(),
            BlobLayout::Legacy => 0,
        };
        self.layout.header_len() + table + self.jump_table.len() * JUMP_ENTRY_LEN + self.data.len()
    }
}

/// The legacy header can only describe a contiguous run of byte codes.
pub(crate) fn check_legacy_codes(codes: &[u16]) -> Result<(), FontError> {
    if codes.len() > 0xFF {
        return Err(FontError::LayoutMismatch(format!(
            "legacy layout holds at most 255 characters, got {}",
            codes.len()
        )));
    }
    for pair in codes.windows(2) {
        if pair[1] != pair[0] + 1 {
            return Err(FontError::LayoutMismatch(format!(
                "legacy layout needs a contiguous ascending range, 0x{:04X} is followed by 0x{:04X}",
                pair[0], pair[1]
            )));
        }
    }
    Ok(())
}
