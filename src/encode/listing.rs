//! C array listing of an encoded font.
//!
//! The listing is presentation only: stripping comments and reading the
//! `0xHH` literals between the braces yields exactly `to_bytes(blob)`. It
//! carries no timestamp, so the same blob always renders the same text.

use std::fmt::Write as FmtWrite;

use super::{char_table_bytes, header_bytes};
use crate::error::FontError;
use crate::model::{BlobLayout, FontBlob};

/// Data bytes per line in the listing.
const DATA_BYTES_PER_LINE: usize = 10;

/// Descriptive fields for the preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingInfo {
    /// Array name; sanitized into a C identifier.
    pub name: String,
    pub font_size: u32,
    /// Where the glyphs came from (font file name or "Template").
    pub source: String,
}

/// Render the blob as a C header declaring a `PROGMEM` byte array.
pub fn to_c_source(blob: &FontBlob, info: &ListingInfo) -> String {
    let ident = c_identifier(&info.name);
    let guard = format!("{}_H", ident.to_uppercase());
    let meta = blob.metadata();
    let total = blob.encoded_len();
    let mut out = String::new();

    write_preamble(&mut out, blob, info, total);

    let _ = writeln!(out, "#ifndef {}", guard);
    let _ = writeln!(out, "#define {}\n", guard);
    let _ = writeln!(out, "const char {}[] PROGMEM = {{", ident);

    let header = header_bytes(blob);
    let _ = writeln!(out, "\t0x{:02X}, // Width: {} (maximum)", header[0], meta.max_width);
    let _ = writeln!(out, "\t0x{:02X}, // Height: {}", header[1], meta.max_height);
    match blob.layout() {
        BlobLayout::Indexed => {
            let _ = writeln!(out, "\t0x{:02X}, // Number of Chars MSB", header[2]);
            let _ = writeln!(
                out,
                "\t0x{:02X}, // Number of Chars LSB: {}",
                header[3], meta.char_count
            );
            let _ = writeln!(
                out,
                "\t0x{:02X}, // Character Spacing: {} pixels\n",
                header[4], meta.spacing
            );

            let _ = writeln!(out, "\t// Character Table: List of character codes in this font");
            for (character, byte) in blob.characters().zip(char_table_bytes(blob)) {
                let _ = writeln!(
                    out,
                    "\t0x{:02X}, // {}: {}",
                    byte,
                    character.order_index,
                    char_label(character.code)
                );
            }
            out.push('\n');
        }
        BlobLayout::Legacy => {
            let _ = writeln!(out, "\t0x{:02X}, // First Char: {}", header[2], header[2]);
            let _ = writeln!(out, "\t0x{:02X}, // Number of Chars: {}\n", header[3], header[3]);
        }
    }

    let _ = writeln!(out, "\t// Jump Table: Format is [MSB, LSB, size, width]");
    for (character, entry) in blob.characters().zip(blob.jump_table()) {
        let [msb, lsb, size, width] = entry.to_bytes();
        let code = character.code;
        let mut comment = format!("{}:{}", code, entry.offset);
        if (0x20..=0x7E).contains(&code) {
            let _ = write!(comment, " {}", char_label(code));
        }
        let _ = write!(comment, " width:{}px", width);
        let _ = writeln!(
            out,
            "\t0x{:02X}, 0x{:02X}, 0x{:02X}, 0x{:02X},  // {}",
            msb, lsb, size, width, comment
        );
    }

    let _ = writeln!(out, "\n\t// Font Data:");
    for (i, chunk) in blob.data().chunks(DATA_BYTES_PER_LINE).enumerate() {
        let last_line = (i + 1) * DATA_BYTES_PER_LINE >= blob.data().len();
        let line: Vec<String> = chunk.iter().map(|b| format!("0x{:02X}", b)).collect();
        let _ = writeln!(out, "\t{}{}", line.join(", "), if last_line { "" } else { "," });
    }
    out.push_str("};\n\n");
    let _ = writeln!(out, "#endif // {}", guard);
    out
}

fn write_preamble(out: &mut String, blob: &FontBlob, info: &ListingInfo, total: usize) {
    let meta = blob.metadata();
    let bpc = blob.bytes_per_column();
    out.push_str("/*\n");
    let _ = writeln!(out, " * Font Name: {}", info.name);
    let _ = writeln!(out, " * Font Size: {}", info.font_size);
    let _ = writeln!(out, " * Font Width: {} (maximum width of any character)", meta.max_width);
    let _ = writeln!(out, " * Font Height: {}", meta.max_height);
    let _ = writeln!(out, " * Character Set: Custom ({} characters)", meta.char_count);
    if blob.layout() == BlobLayout::Indexed {
        let _ = writeln!(out, " * Character Spacing: {} pixels", meta.spacing);
    }
    let _ = writeln!(out, " * Data Size: {} bytes", total);
    let _ = writeln!(out, " * Source Font: {}", info.source);
    let _ = writeln!(out, " * Bytes per Column: {}", bpc);
    out.push_str(" *\n * Font Data Format:\n");
    match blob.layout() {
        BlobLayout::Indexed => {
            out.push_str(" * - First 5 bytes: max width, height, char count MSB, char count LSB, spacing\n");
            out.push_str(" * - Character Table: N bytes listing the codes of included characters\n");
        }
        BlobLayout::Legacy => {
            out.push_str(" * - First 4 bytes: max width, height, first char, char count\n");
        }
    }
    out.push_str(" * - Jump Table: 4 bytes per character\n");
    out.push_str(" *   - byte 0-1: MSB & LSB of offset in data array (0xFFFF = not available)\n");
    out.push_str(" *   - byte 2: Size in bytes of this character's bitmap\n");
    out.push_str(" *   - byte 3: Width of character in pixels\n");
    out.push_str(" * - Font Data: Bitmap data for all characters, column by column,\n");
    let _ = writeln!(out, " *   {} byte(s) per column, bit 0 = top pixel of each byte", bpc);
    out.push_str(" *\n");
    if blob.layout() == BlobLayout::Indexed {
        out.push_str(" * To render character 'X':\n");
        out.push_str(" * 1. Read max width, height from bytes 0-1, character count N from\n");
        out.push_str(" *    (byte 2 << 8) | byte 3 and spacing from byte 4\n");
        out.push_str(" * 2. Search for the code of 'X' in bytes 5 to 5+N-1\n");
        out.push_str(" * 3. If found at position i, its jump entry is at (5 + N) + i * 4\n");
        out.push_str(" * 4. offset = (entry[0] << 8) | entry[1], size = entry[2], width = entry[3]\n");
        out.push_str(" * 5. Read size bytes at (5 + 5N) + offset and draw size / bytes_per_column columns\n");
        out.push_str(" * 6. Advance the cursor by width + spacing\n");
        out.push_str(" *\n");
    }
    out.push_str(" * Generated by oledfont\n */\n\n");
}

/// Recover the byte stream from a listing produced by `to_c_source`.
pub fn extract_bytes(listing: &str) -> Result<Vec<u8>, FontError> {
    let stripped = strip_comments(listing);
    let open = stripped
        .find('{')
        .ok_or_else(|| FontError::MalformedBlob("listing has no '{'".to_string()))?;
    let close = stripped[open..]
        .find('}')
        .map(|i| open + i)
        .ok_or_else(|| FontError::MalformedBlob("listing has no '}'".to_string()))?;

    stripped[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|token| {
            let hex = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .ok_or_else(|| FontError::MalformedBlob(format!("unexpected token '{}'", token)))?;
            u8::from_str_radix(hex, 16)
                .map_err(|_| FontError::MalformedBlob(format!("bad byte literal '{}'", token)))
        })
        .collect()
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = [rest.find("//"), rest.find("/*")].into_iter().flatten().min() {
        out.push_str(&rest[..start]);
        let body = &rest[start + 2..];
        rest = if rest[start..].starts_with("//") {
            body.find('\n').map_or("", |nl| &body[nl..])
        } else {
            body.find("*/").map_or("", |end| &body[end + 2..])
        };
    }
    out.push_str(rest);
    out
}

/// C identifier from a free-form name.
fn c_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// Comment-safe label for a code.
fn char_label(code: u16) -> String {
    match code {
        0x5C => "backslash".to_string(),
        0x27 => "quote".to_string(),
        0x20..=0x7E => format!("'{}'", code as u8 as char),
        _ => format!("0x{:02X}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::to_bytes;
    use crate::model::{FontMetadata, JumpEntry};
    use pretty_assertions::assert_eq;

    fn sample(layout: BlobLayout) -> FontBlob {
        let data: Vec<u8> = (0..23).collect();
        FontBlob::new(
            FontMetadata {
                max_width: 5,
                max_height: 8,
                char_count: 3,
                spacing: 1,
            },
            layout,
            vec![0x5B, 0x5C, 0x5D],
            vec![
                JumpEntry { offset: 0, size: 20, width: 5 },
                JumpEntry::sentinel(2),
                JumpEntry { offset: 20, size: 3, width: 3 },
            ],
            data,
        )
        .unwrap()
    }

    fn info() -> ListingInfo {
        ListingInfo {
            name: "my-font 8".to_string(),
            font_size: 8,
            source: "test.ttf".to_string(),
        }
    }

    #[test]
    fn test_listing_round_trips_bytes() {
        for layout in [BlobLayout::Indexed, BlobLayout::Legacy] {
            let blob = sample(layout);
            let text = to_c_source(&blob, &info());
            assert_eq!(extract_bytes(&text).unwrap(), to_bytes(&blob));
        }
    }

    #[test]
    fn test_listing_identifier_and_guard() {
        let text = to_c_source(&sample(BlobLayout::Indexed), &info());
        assert!(text.contains("const char my_font_8[] PROGMEM = {"));
        assert!(text.contains("#ifndef MY_FONT_8_H"));
        assert!(text.contains("#endif // MY_FONT_8_H"));
    }

    #[test]
    fn test_listing_comments() {
        let text = to_c_source(&sample(BlobLayout::Indexed), &info());
        assert!(text.contains("0x5C, // 1: backslash"));
        assert!(text.contains("0xFF, 0xFF, 0x00, 0x02,  // 92:65535 backslash width:2px"));
        assert!(text.contains(" * Bytes per Column: 1"));
        assert!(text.contains(" * Data Size: 43 bytes"));
    }

    #[test]
    fn test_data_wraps_at_ten_per_line() {
        let text = to_c_source(&sample(BlobLayout::Indexed), &info());
        let data_lines: Vec<&str> = text
            .lines()
            .skip_while(|l| !l.contains("// Font Data:"))
            .skip(1)
            .take_while(|l| !l.starts_with("};"))
            .collect();
        assert_eq!(data_lines.len(), 3);
        assert!(data_lines[0].ends_with("0x09,"));
        assert!(data_lines[2].ends_with("0x16"));
    }

    #[test]
    fn test_listing_is_deterministic() {
        let blob = sample(BlobLayout::Indexed);
        assert_eq!(to_c_source(&blob, &info()), to_c_source(&blob, &info()));
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert!(extract_bytes("no array here").is_err());
        assert!(extract_bytes("x = { 0x01, banana };").is_err());
    }

    #[test]
    fn test_identifier_sanitizing() {
        assert_eq!(c_identifier("8bit"), "_8bit");
        assert_eq!(c_identifier("Arial-Bold 10"), "Arial_Bold_10");
    }
}
