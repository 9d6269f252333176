//! Run configuration.
//!
//! A `FontConfig` is read from JSON with camelCase keys. Every field has a
//! default, so `{}` is a valid configuration; command-line flags override
//! whatever the file sets.
//!
//! ```json
//! {
//!   "fontSize": 12,
//!   "name": "status_font",
//!   "charset": { "chars": "0123456789:." },
//!   "spacing": 1,
//!   "heightMargin": 1,
//!   "layout": "indexed",
//!   "overflow": "crop"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assemble::{AssembleOptions, OverflowPolicy};
use crate::charset::CharSetSpec;
use crate::error::FontError;
use crate::model::BlobLayout;
use crate::template::LIT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontConfig {
    /// Pixel size the glyphs are rasterized at.
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Array name in the listing; derived from the font file when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub charset: CharSetSpec,

    /// Explicit spacing; derived from the font size when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<u8>,

    /// Rows added below the tallest glyph.
    #[serde(default = "default_height_margin")]
    pub height_margin: u8,

    #[serde(default)]
    pub layout: BlobLayout,

    #[serde(default)]
    pub overflow: OverflowPolicy,

    /// Symbol marking a lit pixel in templates.
    #[serde(default = "default_lit_symbol")]
    pub lit_symbol: char,
}

fn default_font_size() -> u32 {
    16
}

fn default_height_margin() -> u8 {
    1
}

fn default_lit_symbol() -> char {
    LIT
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            name: None,
            charset: CharSetSpec::default(),
            spacing: None,
            height_margin: default_height_margin(),
            layout: BlobLayout::default(),
            overflow: OverflowPolicy::default(),
            lit_symbol: default_lit_symbol(),
        }
    }
}

impl FontConfig {
    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(json: &str) -> Result<Self, FontError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Assembly options for this configuration.
    pub fn to_options(&self) -> AssembleOptions {
        let mut options = AssembleOptions::new(self.font_size)
            .with_height_margin(self.height_margin)
            .with_layout(self.layout)
            .with_overflow(self.overflow);
        if let Some(spacing) = self.spacing {
            options = options.with_spacing(spacing);
        }
        options
    }
}
