//! # Pixel Templates
//!
//! Hand-editable text grids, one file per character, named `<code>.txt`:
//!
//! ```text
//! A            <- line 1: the character
//! OOXOO        <- `height` grid rows, `X` = lit
//! OXOXO
//! XOOOX
//! ...
//! ```
//!
//! Trailing whitespace on a row is ignored and short or missing rows are
//! padded unlit, so the parsed bitmap is always `height` rows tall and as wide
//! as its longest row.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::charset::CharSet;
use crate::error::{FontError, GlyphError};
use crate::glyph::{GlyphSource, OutlineRasterizer, Placement, RasterGlyph};
use crate::model::Bitmap;
use crate::pack::place;

/// Default symbol for a lit pixel.
pub const LIT: char = 'X';

/// Symbol written for unlit pixels.
pub const UNLIT: char = 'O';

/// Width of a blank template, 60% of the height rounded up.
pub fn template_width(height: usize) -> usize {
    (height * 3).div_ceil(5)
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// The character named on line 1.
    pub ch: char,
    pub bitmap: Bitmap,
}

/// Parse template text. `code` only labels the error.
pub fn parse_template(code: u16, text: &str, height: usize, lit: char) -> Result<Template, GlyphError> {
    let malformed = |reason: &str| GlyphError::Malformed {
        code,
        reason: reason.to_string(),
    };

    let mut lines = text.lines();
    let ch = lines
        .next()
        .and_then(|line| line.chars().next())
        .ok_or_else(|| malformed("missing character line"))?;

    let rows: Vec<&str> = lines.take(height).map(str::trim_end).collect();
    if rows.iter().all(|r| r.is_empty()) {
        return Err(malformed("empty pixel grid"));
    }

    let parsed = Bitmap::from_rows(&rows, lit);
    let mut bitmap = Bitmap::new(parsed.width(), height);
    parsed.blit_into(&mut bitmap, 0, 0);
    Ok(Template { ch, bitmap })
}

/// Write a bitmap back out in template form.
pub fn render_template(ch: char, bitmap: &Bitmap, lit: char, unlit: char) -> String {
    let mut out = String::new();
    out.push(ch);
    out.push('\n');
    for row in bitmap.to_rows(lit, unlit) {
        out.push_str(&row);
        out.push('\n');
    }
    out.push('\n');
    out
}

/// An unlit template of the default width.
pub fn blank_template(ch: char, height: usize) -> String {
    render_template(ch, &Bitmap::new(template_width(height), height), LIT, UNLIT)
}

/// A directory of `<code>.txt` templates acting as a glyph source.
#[derive(Debug, Clone)]
pub struct TemplateDir {
    dir: PathBuf,
    height: usize,
    lit: char,
}

impl TemplateDir {
    /// Open a template directory for cells of `height` rows.
    pub fn open(dir: impl AsRef<Path>, height: usize) -> Result<Self, FontError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(FontError::unavailable(dir, "template directory does not exist"));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            height,
            lit: LIT,
        })
    }

    pub fn with_lit_symbol(mut self, lit: char) -> Self {
        self.lit = lit;
        self
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, code: u16) -> PathBuf {
        self.dir.join(format!("{}.txt", code))
    }

    /// Codes that have a template file, ascending.
    pub fn codes(&self) -> Result<Vec<u16>, FontError> {
        let mut codes = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            if let Some(code) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u16>().ok())
            {
                codes.push(code);
            }
        }
        codes.sort_unstable();
        Ok(codes)
    }

    /// The codes present, as a character set.
    pub fn charset(&self) -> Result<CharSet, FontError> {
        CharSet::from_codes(self.codes()?.into_iter().map(u32::from))
    }
}

impl GlyphSource for TemplateDir {
    fn rasterize(&self, code: u16) -> Result<RasterGlyph, GlyphError> {
        let path = self.file_for(code);
        let text = fs::read_to_string(&path).map_err(|e| {
            debug!("cannot read {}: {}", path.display(), e);
            GlyphError::Unsupported(code)
        })?;
        let template = parse_template(code, &text, self.height, self.lit)?;
        if u32::from(template.ch) != u32::from(code) {
            warn!(
                "{} declares '{}' but is stored as code {}",
                path.display(),
                template.ch,
                code
            );
        }
        let advance = template.bitmap.width() as u32;
        Ok(RasterGlyph {
            bitmap: template.bitmap,
            advance,
            placement: Placement::Top,
        })
    }

    fn fallback_width(&self) -> Option<u8> {
        Some(template_width(self.height).min(u8::MAX as usize) as u8)
    }

    fn cell_height(&self) -> Option<usize> {
        Some(self.height)
    }

    fn describe(&self) -> String {
        "Template".to_string()
    }
}

/// Write one template per code of `charset` into `dir`, creating it if
/// needed. With a `seed` font each grid starts from the rasterized glyph,
/// otherwise it is blank. Returns the number of files written.
pub fn generate_templates(
    dir: impl AsRef<Path>,
    charset: &CharSet,
    height: usize,
    seed: Option<&OutlineRasterizer>,
) -> Result<usize, FontError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = 0;
    for &code in charset.codes() {
        let Some(ch) = char::from_u32(code as u32).filter(|c| !c.is_control()) else {
            warn!("Skipping template for non-printable code {}", code);
            continue;
        };
        let text = match seed.map(|font| font.rasterize(code)) {
            Some(Ok(glyph)) if glyph.width() > 0 => {
                render_template(ch, &place(&glyph, height), LIT, UNLIT)
            }
            Some(Err(e)) => {
                debug!("{}, writing a blank template", e);
                blank_template(ch, height)
            }
            _ => blank_template(ch, height),
        };
        fs::write(dir.join(format!("{}.txt", code)), text)?;
        written += 1;
    }
    debug!("wrote {} templates to {}", written, dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pads_to_height() {
        let t = parse_template(65, "A\nOXO\nXOX  \n", 4, LIT).unwrap();
        assert_eq!(t.ch, 'A');
        assert_eq!((t.bitmap.width(), t.bitmap.height()), (3, 4));
        assert!(t.bitmap.get(1, 0));
        assert!(t.bitmap.get(2, 1));
        assert!((0..3).all(|x| !t.bitmap.get(x, 3)));
    }

    #[test]
    fn test_rows_beyond_height_ignored() {
        let t = parse_template(65, "A\nX\nX\nXXXXXX\n", 2, LIT).unwrap();
        assert_eq!(t.bitmap.width(), 1);
        assert_eq!(t.bitmap.height(), 2);
    }

    #[test]
    fn test_space_character_line() {
        let t = parse_template(32, " \nOO\nOO\n", 2, LIT).unwrap();
        assert_eq!(t.ch, ' ');
        assert!(!t.bitmap.has_ink());
    }

    #[test]
    fn test_malformed_templates() {
        assert!(matches!(
            parse_template(65, "", 5, LIT),
            Err(GlyphError::Malformed { code: 65, .. })
        ));
        assert!(matches!(
            parse_template(65, "A\n\n   \n", 5, LIT),
            Err(GlyphError::Malformed { .. })
        ));
    }

    #[test]
    fn test_custom_lit_symbol() {
        let t = parse_template(65, "A\n#X#\n", 1, '#').unwrap();
        assert!(t.bitmap.get(0, 0) && !t.bitmap.get(1, 0) && t.bitmap.get(2, 0));
    }

    #[test]
    fn test_blank_template_shape() {
        let text = blank_template('B', 10);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "B");
        assert_eq!(lines[1], "OOOOOO");
        assert_eq!(lines.len(), 1 + 10 + 1);
        assert_eq!(template_width(5), 3);
        assert_eq!(template_width(16), 10);
    }

    #[test]
    fn test_render_then_parse() {
        let bm = Bitmap::from_rows(&["XOX", "OXO"], 'X');
        let text = render_template('v', &bm, LIT, UNLIT);
        let t = parse_template(118, &text, 2, LIT).unwrap();
        assert_eq!(t.bitmap, bm);
    }

    #[test]
    fn test_missing_directory_is_unavailable() {
        let err = TemplateDir::open("/nonexistent/templates", 8).unwrap_err();
        assert!(matches!(err, FontError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_template_dir_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("66.txt"), "B\nXX\nXO\n").unwrap();
        fs::write(dir.path().join("65.txt"), "A\n\n").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let source = TemplateDir::open(dir.path(), 3).unwrap();
        assert_eq!(source.codes().unwrap(), vec![65, 66]);

        let b = source.rasterize(66).unwrap();
        assert_eq!(b.advance, 2);
        assert_eq!(b.height(), 3);
        assert_eq!(b.placement, Placement::Top);

        assert!(matches!(source.rasterize(65), Err(GlyphError::Malformed { .. })));
        assert_eq!(source.rasterize(67), Err(GlyphError::Unsupported(67)));
        assert_eq!(source.fallback_width(), Some(2));
        assert_eq!(source.cell_height(), Some(3));
    }

    #[test]
    fn test_generate_blank_templates() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("font_8");
        let charset = CharSet::range(65, 67).unwrap();
        assert_eq!(generate_templates(&target, &charset, 8, None).unwrap(), 3);
        let text = fs::read_to_string(target.join("66.txt")).unwrap();
        assert!(text.starts_with("B\nOOOOO\n"));
    }
}
