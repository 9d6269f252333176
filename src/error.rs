//! Structured error types for the font packer.
//!
//! `FontError` covers failures that abort a run. `GlyphError` covers a single
//! glyph that could not be produced; the assembler recovers from those by
//! writing a sentinel jump-table entry.

use thiserror::Error;

/// The unified error type returned by all public oledfont API functions.
#[derive(Debug, Error)]
pub enum FontError {
    /// The font file or template directory cannot be opened or parsed.
    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    /// The requested character set could not be parsed.
    #[error("Invalid character set '{0}'. Use a range like 32-126 or an explicit list")]
    InvalidCharset(String),

    /// The resolved font cell does not fit the one-byte header fields.
    #[error("Font too large: {what} is {value} pixels, the header stores at most 255")]
    FontTooLarge { what: &'static str, value: usize },

    /// A packed glyph exceeds the one-byte size field and cropping is disabled.
    #[error("Glyph 0x{code:04X} packs to {size} bytes, the jump table stores at most 255")]
    GlyphTooLarge { code: u16, size: usize },

    /// The data section no longer fits a 16-bit offset.
    #[error("Glyph data section is {0} bytes, offsets address at most 65534")]
    DataOverflow(usize),

    /// The character set cannot be expressed in the requested blob layout.
    #[error("Layout mismatch: {0}")]
    LayoutMismatch(String),

    /// A byte blob does not follow the packed font layout.
    #[error("Malformed font blob: {0}")]
    MalformedBlob(String),

    /// The configuration file is not valid.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FontError {
    pub(crate) fn unavailable(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        FontError::SourceUnavailable {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Why a single glyph could not be rasterized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlyphError {
    /// The source has no glyph for this code.
    #[error("no glyph for code 0x{0:04X}")]
    Unsupported(u16),

    /// A template for this code failed structural parsing.
    #[error("malformed template for code 0x{code:04X}: {reason}")]
    Malformed { code: u16, reason: String },
}
