//! # Consumer-Side Decoder
//!
//! Reads a packed blob the way display firmware does: parse the header, scan
//! the character table for a code, follow its jump entry into the data
//! section and draw `size / bytes_per_column` columns. Used by the CLI
//! preview and by tests to check that an encoded font renders what went in.

use crate::error::FontError;
use crate::model::{
    bytes_per_column, Bitmap, BlobLayout, FontBlob, FontMetadata, JumpEntry, JUMP_ENTRY_LEN,
};
use crate::pack::unpack;

/// Inter-glyph spacing assumed for legacy blobs, whose header has no spacing byte.
pub const LEGACY_SPACING: u8 = 1;

/// A resolved jump table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphRef {
    pub offset: u16,
    pub size: u8,
    pub width: u8,
    /// False for sentinel entries: the code is listed but has no bitmap.
    pub is_defined: bool,
}

/// A borrowed, bounds-checked view over an encoded font.
#[derive(Debug, Clone)]
pub struct FontView<'a> {
    metadata: FontMetadata,
    layout: BlobLayout,
    codes: Vec<u16>,
    jump: &'a [u8],
    data: &'a [u8],
}

impl<'a> FontView<'a> {
    /// Parse an indexed-layout blob.
    pub fn new(bytes: &'a [u8]) -> Result<Self, FontError> {
        Self::parse(bytes, BlobLayout::Indexed)
    }

    /// Parse a blob of the given layout, checking every section bound and
    /// every jump entry against the data section.
    pub fn parse(bytes: &'a [u8], layout: BlobLayout) -> Result<Self, FontError> {
        let header_len = layout.header_len();
        if bytes.len() < header_len {
            return Err(FontError::MalformedBlob(format!(
                "{} bytes is shorter than the {}-byte header",
                bytes.len(),
                header_len
            )));
        }

        let (metadata, codes, table_len) = match layout {
            BlobLayout::Indexed => {
                let count = u16::from_be_bytes([bytes[2], bytes[3]]);
                let table = bytes
                    .get(header_len..header_len + count as usize)
                    .ok_or_else(|| truncated("character table", bytes.len()))?;
                let meta = FontMetadata {
                    max_width: bytes[0],
                    max_height: bytes[1],
                    char_count: count,
                    spacing: bytes[4],
                };
                (meta, table.iter().map(|&b| b as u16).collect::<Vec<_>>(), count as usize)
            }
            BlobLayout::Legacy => {
                let first = bytes[2] as u16;
                let count = bytes[3] as u16;
                let meta = FontMetadata {
                    max_width: bytes[0],
                    max_height: bytes[1],
                    char_count: count,
                    spacing: LEGACY_SPACING,
                };
                (meta, (first..first + count).collect(), 0)
            }
        };

        let jump_start = header_len + table_len;
        let jump_end = jump_start + codes.len() * JUMP_ENTRY_LEN;
        let jump = bytes
            .get(jump_start..jump_end)
            .ok_or_else(|| truncated("jump table", bytes.len()))?;
        let data = &bytes[jump_end..];

        let view = Self {
            metadata,
            layout,
            codes,
            jump,
            data,
        };
        view.check_entries()?;
        Ok(view)
    }

    fn check_entries(&self) -> Result<(), FontError> {
        let bpc = self.metadata.bytes_per_column();
        for (i, entry) in self.entries().enumerate() {
            if entry.is_sentinel() {
                continue;
            }
            let end = entry.offset as usize + entry.size as usize;
            if end > self.data.len() {
                return Err(FontError::MalformedBlob(format!(
                    "glyph {} ends at byte {}, data section has {}",
                    i,
                    end,
                    self.data.len()
                )));
            }
            if entry.size > 0 && (bpc == 0 || entry.size as usize % bpc != 0) {
                return Err(FontError::MalformedBlob(format!(
                    "glyph {} size {} is not a whole number of {}-byte columns",
                    i, entry.size, bpc
                )));
            }
        }
        Ok(())
    }

    fn entries(&self) -> impl Iterator<Item = JumpEntry> + '_ {
        self.jump.chunks_exact(JUMP_ENTRY_LEN).map(|chunk| {
            JumpEntry::from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
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

    /// Linear scan of the character table.
    pub fn lookup(&self, code: u16) -> Option<GlyphRef> {
        let index = self.codes.iter().position(|&c| c == code)?;
        let at = index * JUMP_ENTRY_LEN;
        let entry = JumpEntry::from_bytes([
            self.jump[at],
            self.jump[at + 1],
            self.jump[at + 2],
            self.jump[at + 3],
        ]);
        Some(GlyphRef {
            offset: entry.offset,
            size: entry.size,
            width: entry.width,
            is_defined: !entry.is_sentinel(),
        })
    }

    /// Packed bytes of a glyph; empty for sentinel entries.
    pub fn glyph_bytes(&self, code: u16) -> Option<&'a [u8]> {
        let glyph = self.lookup(code)?;
        if !glyph.is_defined {
            return Some(&[]);
        }
        let start = glyph.offset as usize;
        self.data.get(start..start + glyph.size as usize)
    }

    /// The glyph's cell: `size / bytes_per_column` columns of `max_height` rows.
    pub fn glyph_bitmap(&self, code: u16) -> Option<Bitmap> {
        let bytes = self.glyph_bytes(code)?;
        let height = self.metadata.max_height as usize;
        let columns = match bytes_per_column(height) {
            0 => 0,
            bpc => bytes.len() / bpc,
        };
        Some(unpack(bytes, columns, height))
    }

    /// Cursor advance of one code, excluding spacing. Codes missing from the
    /// table advance by half the maximum width.
    pub fn advance(&self, code: u16) -> u32 {
        match self.lookup(code) {
            Some(glyph) => glyph.width as u32,
            None => self.metadata.max_width as u32 / 2,
        }
    }

    /// Pixel width of the first line of `text`, without trailing spacing.
    pub fn measure(&self, text: &str) -> u32 {
        let spacing = self.metadata.spacing as u32;
        let mut total = 0u32;
        let mut any = false;
        for ch in text.chars().take_while(|&c| c != '\n') {
            total += self.advance(char_code(ch)) + spacing;
            any = true;
        }
        if any {
            total.saturating_sub(spacing)
        } else {
            0
        }
    }

    /// Draw `text` onto a fresh `canvas_w × canvas_h` canvas starting at the
    /// top-left corner, wrapping at the right edge and stopping at the bottom.
    pub fn render_text(&self, text: &str, canvas_w: usize, canvas_h: usize) -> Bitmap {
        let mut canvas = Bitmap::new(canvas_w, canvas_h);
        let height = self.metadata.max_height as usize;
        let line_step = height + self.metadata.spacing as usize;
        let spacing = self.metadata.spacing as usize;
        let (mut x, mut y) = (0usize, 0usize);

        for ch in text.chars() {
            if ch == '\n' {
                x = 0;
                y += line_step;
                continue;
            }
            let code = char_code(ch);
            let width = self.advance(code) as usize;
            if x + width > canvas_w {
                x = 0;
                y += line_step;
                if y + height > canvas_h {
                    break;
                }
            }
            if y >= canvas_h {
                x += width + spacing;
                continue;
            }
            if let Some(glyph) = self.glyph_bitmap(code) {
                glyph.blit_into(&mut canvas, x as i32, y as i32);
            }
            x += width + spacing;
        }
        canvas
    }

    /// Rebuild an owned, validated `FontBlob` from the view.
    pub fn to_blob(&self) -> Result<FontBlob, FontError> {
        FontBlob::new(
            self.metadata,
            self.layout,
            self.codes.clone(),
            self.entries().collect(),
            self.data.to_vec(),
        )
    }
}

fn truncated(section: &str, len: usize) -> FontError {
    FontError::MalformedBlob(format!("{} runs past the end of a {}-byte blob", section, len))
}

/// Codes outside the 16-bit table range never match.
fn char_code(ch: char) -> u16 {
    u16::try_from(ch as u32).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::to_bytes;

    /// 'A' = 2 columns, 'B' = sentinel, 'C' = 1 column, 9-row cells.
    fn blob() -> FontBlob {
        FontBlob::new(
            FontMetadata {
                max_width: 2,
                max_height: 9,
                char_count: 3,
                spacing: 1,
            },
            BlobLayout::Indexed,
            vec![65, 66, 67],
            vec![
                JumpEntry { offset: 0, size: 4, width: 3 },
                JumpEntry::sentinel(2),
                JumpEntry { offset: 4, size: 2, width: 1 },
            ],
            vec![0x01, 0x00, 0xFF, 0x01, 0x80, 0x00],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_reads_header() {
        let bytes = to_bytes(&blob());
        let view = FontView::new(&bytes).unwrap();
        assert_eq!(view.metadata(), blob().metadata());
        assert_eq!(view.codes(), &[65, 66, 67]);
    }

    #[test]
    fn test_lookup_and_sentinel() {
        let bytes = to_bytes(&blob());
        let view = FontView::new(&bytes).unwrap();
        assert_eq!(
            view.lookup(67),
            Some(GlyphRef { offset: 4, size: 2, width: 1, is_defined: true })
        );
        let b = view.lookup(66).unwrap();
        assert!(!b.is_defined);
        assert_eq!(b.width, 2);
        assert_eq!(view.glyph_bytes(66), Some(&[][..]));
        assert_eq!(view.lookup(68), None);
    }

    #[test]
    fn test_glyph_bitmap_columns() {
        let bytes = to_bytes(&blob());
        let view = FontView::new(&bytes).unwrap();
        let a = view.glyph_bitmap(65).unwrap();
        assert_eq!((a.width(), a.height()), (2, 9));
        assert!(a.get(0, 0));
        assert!((0..9).all(|y| a.get(1, y)));
        assert!(!a.get(0, 1));
    }

    #[test]
    fn test_round_trip_to_blob() {
        let original = blob();
        let bytes = to_bytes(&original);
        assert_eq!(FontView::new(&bytes).unwrap().to_blob().unwrap(), original);
    }

    #[test]
    fn test_truncated_blob_is_malformed() {
        let bytes = to_bytes(&blob());
        for cut in [3, 7, 12] {
            let err = FontView::new(&bytes[..cut]).unwrap_err();
            assert!(matches!(err, FontError::MalformedBlob(_)), "cut at {cut}");
        }
        // Data section one byte short.
        let err = FontView::new(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, FontError::MalformedBlob(_)));
    }

    #[test]
    fn test_measure_and_advance() {
        let bytes = to_bytes(&blob());
        let view = FontView::new(&bytes).unwrap();
        assert_eq!(view.advance(65), 3);
        // Unknown code: half the max width.
        assert_eq!(view.advance(90), 1);
        // 3 + 1 + 2 + 1 + 1 = 8
        assert_eq!(view.measure("ABC"), 8);
        assert_eq!(view.measure("A\nBBBB"), 3);
        assert_eq!(view.measure(""), 0);
    }

    #[test]
    fn test_render_text_wraps_and_stops() {
        let bytes = to_bytes(&blob());
        let view = FontView::new(&bytes).unwrap();
        // Line step is 10 rows; the second 'A' wraps to row 10.
        let canvas = view.render_text("AA", 5, 20);
        assert!(canvas.get(0, 0));
        assert!(canvas.get(0, 10));
        // Third line would start at row 20: outside the canvas, nothing drawn.
        let canvas = view.render_text("A\nA\nA", 5, 19);
        assert!(canvas.get(1, 0) && canvas.get(1, 10));
    }

    #[test]
    fn test_legacy_view() {
        let legacy = FontBlob::new(
            *blob().metadata(),
            BlobLayout::Legacy,
            vec![65, 66, 67],
            blob().jump_table().to_vec(),
            blob().data().to_vec(),
        )
        .unwrap();
        let bytes = to_bytes(&legacy);
        let view = FontView::parse(&bytes, BlobLayout::Legacy).unwrap();
        assert_eq!(view.codes(), &[65, 66, 67]);
        assert_eq!(view.metadata().spacing, LEGACY_SPACING);
        assert_eq!(view.glyph_bitmap(67).unwrap().width(), 1);
    }
}
