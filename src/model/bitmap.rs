//! Monochrome pixel matrix shared by glyph sources, the packer and the decoder.

use std::fmt;

/// A `width × height` grid of on/off pixels, stored row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl Bitmap {
    /// Create an all-off bitmap.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; width * height],
        }
    }

    /// Build a bitmap from rows of text, where `lit` marks an on pixel.
    /// Rows shorter than the longest one are padded with off pixels.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], lit: char) -> Self {
        let width = rows
            .iter()
            .map(|r| r.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        let mut bitmap = Self::new(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.as_ref().chars().enumerate() {
                if c == lit {
                    bitmap.set(x, y, true);
                }
            }
        }
        bitmap
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel at (x, y). Out-of-range reads are off.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x]
    }

    /// Set pixel at (x, y). Out-of-range writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = on;
        }
    }

    /// Whether any pixel is on.
    pub fn has_ink(&self) -> bool {
        self.pixels.iter().any(|&p| p)
    }

    /// Number of lit pixels.
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    /// Copy this bitmap into `target` with its top-left corner at (x, y).
    /// Pixels falling outside the target are cropped.
    pub fn blit_into(&self, target: &mut Bitmap, x: i32, y: i32) {
        for sy in 0..self.height {
            let ty = y + sy as i32;
            if ty < 0 || ty as usize >= target.height {
                continue;
            }
            for sx in 0..self.width {
                let tx = x + sx as i32;
                if tx < 0 || tx as usize >= target.width {
                    continue;
                }
                if self.get(sx, sy) {
                    target.set(tx as usize, ty as usize, true);
                }
            }
        }
    }

    /// Keep only the leftmost `width` columns.
    pub fn crop_width(&self, width: usize) -> Bitmap {
        let width = width.min(self.width);
        let mut out = Bitmap::new(width, self.height);
        self.blit_into(&mut out, 0, 0);
        out
    }

    /// Render as text rows using the given symbols.
    pub fn to_rows(&self, lit: char, unlit: char) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| if self.get(x, y) { lit } else { unlit })
                    .collect()
            })
            .collect()
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bitmap {}x{}", self.width, self.height)?;
        for row in self.to_rows('#', '.') {
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}
