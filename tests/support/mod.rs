//! Builds a tiny TrueType font in memory so the outline pipeline can be tested
//! without shipping a font file.
//!
//! Every glyph is a single axis-aligned rectangle. Units per em is 1000, so at
//! 10 px one pixel is 100 font units.

#![allow(dead_code)]

/// One glyph of the synthetic font.
pub struct TestGlyph {
    pub code: Option<u16>,
    pub advance: u16,
    /// `(x_min, y_min, x_max, y_max)` in font units; `None` for no outline.
    pub rect: Option<(i16, i16, i16, i16)>,
}

pub const UNITS_PER_EM: u16 = 1000;

/// Glyphs: `.notdef`, space (3 px advance at 10 px), `!` (2×8 px bar,
/// 4 px advance), `"` (4×3 px bar, 6 px advance). Nothing else is mapped.
pub fn sample_glyphs() -> Vec<TestGlyph> {
    vec![
        TestGlyph { code: None, advance: 500, rect: None },
        TestGlyph { code: Some(0x20), advance: 300, rect: None },
        TestGlyph { code: Some(0x21), advance: 400, rect: Some((100, 0, 300, 800)) },
        TestGlyph { code: Some(0x22), advance: 600, rect: Some((100, 500, 500, 800)) },
    ]
}

pub fn sample_font() -> Vec<u8> {
    build_font(&sample_glyphs())
}

pub fn build_font(glyphs: &[TestGlyph]) -> Vec<u8> {
    let num_glyphs = glyphs.len() as u16;

    let mut glyf = Vec::new();
    let mut offsets = Vec::with_capacity(glyphs.len() + 1);
    for glyph in glyphs {
        offsets.push(glyf.len() as u32);
        if let Some(rect) = glyph.rect {
            glyf.extend(build_rect_glyph(rect));
        }
    }
    offsets.push(glyf.len() as u32);

    let mut hmtx = Vec::new();
    for glyph in glyphs {
        hmtx.extend_from_slice(&glyph.advance.to_be_bytes());
        let lsb = glyph.rect.map(|r| r.0).unwrap_or(0);
        hmtx.extend_from_slice(&lsb.to_be_bytes());
    }

    let mapping: Vec<(u16, u16)> = glyphs
        .iter()
        .enumerate()
        .filter_map(|(gid, g)| g.code.map(|c| (c, gid as u16)))
        .collect();

    // Tables in tag order.
    let mut tables = vec![
        (tag_u32(b"cmap"), build_cmap_format4(&mapping)),
        (tag_u32(b"glyf"), glyf),
        (tag_u32(b"head"), build_head()),
        (tag_u32(b"hhea"), build_hhea(num_glyphs)),
        (tag_u32(b"hmtx"), hmtx),
        (tag_u32(b"loca"), build_loca(&offsets)),
        (tag_u32(b"maxp"), build_maxp(num_glyphs)),
    ];
    write_ttf_file(&mut tables)
}

/// A simple glyph with one clockwise rectangular contour of on-curve points.
fn build_rect_glyph((x_min, y_min, x_max, y_max): (i16, i16, i16, i16)) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&1i16.to_be_bytes()); // numberOfContours
    for v in [x_min, y_min, x_max, y_max] {
        data.extend_from_slice(&v.to_be_bytes());
    }
    data.extend_from_slice(&3u16.to_be_bytes()); // endPtsOfContours
    data.extend_from_slice(&0u16.to_be_bytes()); // instructionLength
    data.extend_from_slice(&[0x01; 4]); // on-curve, 16-bit deltas

    let points = [(x_min, y_min), (x_min, y_max), (x_max, y_max), (x_max, y_min)];
    let mut prev = 0i16;
    for &(x, _) in &points {
        data.extend_from_slice(&(x - prev).to_be_bytes());
        prev = x;
    }
    prev = 0;
    for &(_, y) in &points {
        data.extend_from_slice(&(y - prev).to_be_bytes());
        prev = y;
    }
    // Short loca offsets must stay even.
    if data.len() % 2 != 0 {
        data.push(0);
    }
    data
}

fn build_head() -> Vec<u8> {
    let mut data = vec![0u8; 54];
    write_u32(&mut data, 0, 0x00010000); // version
    write_u32(&mut data, 4, 0x00010000); // fontRevision
    write_u32(&mut data, 12, 0x5F0F3CF5); // magicNumber
    write_u16(&mut data, 18, UNITS_PER_EM);
    write_i16(&mut data, 36, 0); // xMin
    write_i16(&mut data, 38, -200); // yMin
    write_i16(&mut data, 40, 1000); // xMax
    write_i16(&mut data, 42, 800); // yMax
    write_u16(&mut data, 46, 8); // lowestRecPPEM
    write_i16(&mut data, 48, 2); // fontDirectionHint
    write_i16(&mut data, 50, 0); // indexToLocFormat: short
    data
}

fn build_hhea(num_glyphs: u16) -> Vec<u8> {
    let mut data = vec![0u8; 36];
    write_u32(&mut data, 0, 0x00010000);
    write_i16(&mut data, 4, 800); // ascender
    write_i16(&mut data, 6, -200); // descender
    write_i16(&mut data, 8, 0); // lineGap
    write_u16(&mut data, 10, 600); // advanceWidthMax
    write_i16(&mut data, 32, 0); // metricDataFormat
    write_u16(&mut data, 34, num_glyphs); // numberOfHMetrics
    data
}

fn build_loca(offsets: &[u32]) -> Vec<u8> {
    let mut data = Vec::new();
    for &offset in offsets {
        data.extend_from_slice(&((offset / 2) as u16).to_be_bytes());
    }
    data
}

fn build_maxp(num_glyphs: u16) -> Vec<u8> {
    let mut data = vec![0u8; 32];
    write_u32(&mut data, 0, 0x00010000);
    write_u16(&mut data, 4, num_glyphs);
    write_u16(&mut data, 6, 4); // maxPoints
    write_u16(&mut data, 8, 1); // maxContours
    write_u16(&mut data, 14, 1); // maxZones
    data
}

fn build_cmap_format4(char_to_gid: &[(u16, u16)]) -> Vec<u8> {
    let mut sorted = char_to_gid.to_vec();
    sorted.sort_by_key(|(ch, _)| *ch);

    // One segment per code keeps every mapping on idDelta.
    let mut segments: Vec<(u16, u16)> = sorted;
    segments.push((0xFFFF, 0));

    let seg_count = segments.len() as u16;
    let seg_count_x2 = seg_count * 2;
    let entry_selector = (seg_count as f64).log2().floor() as u16;
    let search_range = (1u16 << entry_selector) * 2;
    let range_shift = seg_count_x2.saturating_sub(search_range);

    let subtable_len = 16 + seg_count as usize * 8;
    let mut subtable = Vec::new();
    subtable.extend_from_slice(&4u16.to_be_bytes()); // format
    subtable.extend_from_slice(&(subtable_len as u16).to_be_bytes());
    subtable.extend_from_slice(&0u16.to_be_bytes()); // language
    subtable.extend_from_slice(&seg_count_x2.to_be_bytes());
    subtable.extend_from_slice(&search_range.to_be_bytes());
    subtable.extend_from_slice(&entry_selector.to_be_bytes());
    subtable.extend_from_slice(&range_shift.to_be_bytes());
    for &(code, _) in &segments {
        subtable.extend_from_slice(&code.to_be_bytes()); // endCode
    }
    subtable.extend_from_slice(&0u16.to_be_bytes()); // reservedPad
    for &(code, _) in &segments {
        subtable.extend_from_slice(&code.to_be_bytes()); // startCode
    }
    for &(code, gid) in &segments {
        let delta = if code == 0xFFFF { 1 } else { gid.wrapping_sub(code) };
        subtable.extend_from_slice(&delta.to_be_bytes()); // idDelta
    }
    for _ in &segments {
        subtable.extend_from_slice(&0u16.to_be_bytes()); // idRangeOffset
    }

    let mut cmap = Vec::new();
    cmap.extend_from_slice(&0u16.to_be_bytes()); // version
    cmap.extend_from_slice(&1u16.to_be_bytes()); // numTables
    cmap.extend_from_slice(&3u16.to_be_bytes()); // platformID: Windows
    cmap.extend_from_slice(&1u16.to_be_bytes()); // encodingID: Unicode BMP
    cmap.extend_from_slice(&12u32.to_be_bytes()); // subtable offset
    cmap.extend_from_slice(&subtable);
    cmap
}

fn write_ttf_file(tables: &mut [(u32, Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = (num_tables as f64).log2().floor() as u16;
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = (num_tables * 16).saturating_sub(search_range);

    let mut output = Vec::new();
    output.extend_from_slice(&0x00010000u32.to_be_bytes()); // sfVersion
    output.extend_from_slice(&num_tables.to_be_bytes());
    output.extend_from_slice(&search_range.to_be_bytes());
    output.extend_from_slice(&entry_selector.to_be_bytes());
    output.extend_from_slice(&range_shift.to_be_bytes());

    let mut table_offset = 12 + num_tables as usize * 16;
    for (tag, data) in tables.iter_mut() {
        let length = data.len();
        while data.len() % 4 != 0 {
            data.push(0);
        }
        output.extend_from_slice(&tag.to_be_bytes());
        output.extend_from_slice(&calc_table_checksum(data).to_be_bytes());
        output.extend_from_slice(&(table_offset as u32).to_be_bytes());
        output.extend_from_slice(&(length as u32).to_be_bytes());
        table_offset += data.len();
    }
    for (_, data) in tables.iter() {
        output.extend_from_slice(data);
    }
    output
}

fn calc_table_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

// ─── Byte Helpers ───────────────────────────────────────────────

fn write_u16(data: &mut [u8], offset: usize, val: u16) {
    data[offset..offset + 2].copy_from_slice(&val.to_be_bytes());
}

fn write_i16(data: &mut [u8], offset: usize, val: i16) {
    data[offset..offset + 2].copy_from_slice(&val.to_be_bytes());
}

fn write_u32(data: &mut [u8], offset: usize, val: u32) {
    data[offset..offset + 4].copy_from_slice(&val.to_be_bytes());
}

fn tag_u32(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}
