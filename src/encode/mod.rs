//! # Binary Layout Encoder
//!
//! Serializes a `FontBlob` into the byte stream the display firmware reads,
//! and into a C array listing of the same bytes.
//!
//! ## Indexed layout
//!
//! ```text
//! offset 0   max width
//!        1   max height
//!        2   char count MSB
//!        3   char count LSB
//!        4   spacing
//!        5   character table, 1 byte per code
//!    5 + N   jump table, 4 bytes per code: offset MSB, offset LSB, size, width
//!   5 + 5N   glyph data
//! ```
//!
//! The legacy layout replaces the first five bytes with `width, height,
//! first char, count` and drops the character table.
//!
//! Sections follow each other with no padding or separators.

pub mod listing;

pub use listing::{extract_bytes, to_c_source, ListingInfo};

use crate::model::{BlobLayout, FontBlob};

/// Header bytes for the blob's layout.
pub fn header_bytes(blob: &FontBlob) -> Vec<u8> {
    let meta = blob.metadata();
    match blob.layout() {
        BlobLayout::Indexed => {
            let [count_msb, count_lsb] = meta.char_count.to_be_bytes();
            vec![meta.max_width, meta.max_height, count_msb, count_lsb, meta.spacing]
        }
        BlobLayout::Legacy => {
            let first = blob.codes().first().copied().unwrap_or(0) as u8;
            vec![meta.max_width, meta.max_height, first, meta.char_count as u8]
        }
    }
}

/// Character table bytes; empty for the legacy layout.
pub fn char_table_bytes(blob: &FontBlob) -> Vec<u8> {
    match blob.layout() {
        BlobLayout::Indexed => blob.codes().iter().map(|&c| c as u8).collect(),
        BlobLayout::Legacy => Vec::new(),
    }
}

/// Jump table bytes in table order.
pub fn jump_table_bytes(blob: &FontBlob) -> Vec<u8> {
    blob.jump_table().iter().flat_map(|e| e.to_bytes()).collect()
}

/// The complete blob: header ++ character table ++ jump table ++ data.
pub fn to_bytes(blob: &FontBlob) -> Vec<u8> {
    let mut out = Vec::with_capacity(blob.encoded_len());
    out.extend(header_bytes(blob));
    out.extend(char_table_bytes(blob));
    out.extend(jump_table_bytes(blob));
    out.extend_from_slice(blob.data());
    out
}
