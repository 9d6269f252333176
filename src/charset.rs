//! Requested character sets.
//!
//! A set is given either as an inclusive numeric range or as an explicit
//! list, never both. Codes are kept in order of first occurrence with
//! duplicates removed, so the order here is the order of the character table.

use std::collections::HashSet;
use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::FontError;

/// Most codes a character table can index (16-bit count field).
pub const MAX_CHARS: usize = 0xFFFF;

/// Printable ASCII, the default set.
pub const PRINTABLE_ASCII: (u32, u32) = (32, 126);

/// How a character set is written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CharSetSpec {
    /// Inclusive range such as `"32-126"` or `"0x20-0x7E"`.
    Range(String),
    /// Literal characters such as `"0123456789:."`.
    Chars(String),
    /// Explicit code points.
    Codes(Vec<u32>),
}

impl Default for CharSetSpec {
    fn default() -> Self {
        CharSetSpec::Range(format!("{}-{}", PRINTABLE_ASCII.0, PRINTABLE_ASCII.1))
    }
}

impl CharSetSpec {
    pub fn resolve(&self) -> Result<CharSet, FontError> {
        match self {
            CharSetSpec::Range(s) => CharSet::parse_range(s),
            CharSetSpec::Chars(s) => CharSet::parse_list(s),
            CharSetSpec::Codes(codes) => CharSet::from_codes(codes.iter().copied()),
        }
    }
}

/// An ordered, duplicate-free list of 16-bit character codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharSet {
    codes: Vec<u16>,
}

impl CharSet {
    /// Inclusive range `start..=end`.
    pub fn range(start: u32, end: u32) -> Result<Self, FontError> {
        if start > end || end > 0xFFFF {
            return Err(FontError::InvalidCharset(format!("{}-{}", start, end)));
        }
        Self::from_codes(start..=end)
    }

    /// Codes in the given order; later duplicates are dropped.
    pub fn from_codes(codes: impl IntoIterator<Item = u32>) -> Result<Self, FontError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for code in codes {
            let code = u16::try_from(code)
                .map_err(|_| FontError::InvalidCharset(format!("code {} is beyond 0xFFFF", code)))?;
            if seen.insert(code) {
                out.push(code);
            }
        }
        if out.len() > MAX_CHARS {
            warn!(
                "Character set has {} codes, truncating to {}",
                out.len(),
                MAX_CHARS
            );
            out.truncate(MAX_CHARS);
        }
        Ok(Self { codes: out })
    }

    /// Parse `"start-end"`; each bound is decimal or `0x`-prefixed hex.
    pub fn parse_range(s: &str) -> Result<Self, FontError> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| FontError::InvalidCharset(s.to_string()))?;
        let start = parse_code(start).ok_or_else(|| FontError::InvalidCharset(s.to_string()))?;
        let end = parse_code(end).ok_or_else(|| FontError::InvalidCharset(s.to_string()))?;
        Self::range(start, end)
    }

    /// Parse an explicit list. A comma-separated list of numbers is read as
    /// code points; anything else is read as literal characters.
    pub fn parse_list(s: &str) -> Result<Self, FontError> {
        if s.is_empty() {
            return Err(FontError::InvalidCharset(String::new()));
        }
        let numeric: Option<Vec<u32>> = if s.contains(',') {
            s.split(',').map(parse_code).collect()
        } else {
            None
        };
        match numeric {
            Some(codes) => Self::from_codes(codes),
            None => Self::from_codes(s.chars().map(u32::from)),
        }
    }

    pub fn codes(&self) -> &[u16] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for CharSet {
    fn default() -> Self {
        Self {
            codes: (PRINTABLE_ASCII.0 as u16..=PRINTABLE_ASCII.1 as u16).collect(),
        }
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.codes.first(), self.codes.last()) {
            (Some(first), Some(last)) => {
                write!(f, "{} codes (0x{:04X}..0x{:04X})", self.codes.len(), first, last)
            }
            _ => write!(f, "empty"),
        }
    }
}

fn parse_code(s: &str) -> Option<u32> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_inclusive() {
        let set = CharSet::parse_range("32-34").unwrap();
        assert_eq!(set.codes(), &[32, 33, 34]);
    }

    #[test]
    fn test_hex_range() {
        let set = CharSet::parse_range("0x41-0x43").unwrap();
        assert_eq!(set.codes(), &[65, 66, 67]);
    }

    #[test]
    fn test_reversed_range_rejected() {
        assert!(matches!(
            CharSet::parse_range("50-40"),
            Err(FontError::InvalidCharset(_))
        ));
        assert!(CharSet::parse_range("abc").is_err());
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let set = CharSet::parse_list("baab").unwrap();
        assert_eq!(set.codes(), &[98, 97]);
    }

    #[test]
    fn test_numeric_list() {
        let set = CharSet::parse_list("65, 0x42,65").unwrap();
        assert_eq!(set.codes(), &[65, 66]);
    }

    #[test]
    fn test_comma_list_with_letters_is_literal() {
        let set = CharSet::parse_list("a,b").unwrap();
        assert_eq!(set.codes(), &[97, 44, 98]);
    }

    #[test]
    fn test_code_beyond_16_bits_rejected() {
        assert!(CharSet::from_codes([0x1F600]).is_err());
    }

    #[test]
    fn test_full_range_truncated() {
        let set = CharSet::range(0, 0xFFFF).unwrap();
        assert_eq!(set.len(), MAX_CHARS);
        assert_eq!(set.codes().last(), Some(&0xFFFE));
    }

    #[test]
    fn test_spec_resolves() {
        let spec: CharSetSpec = serde_json::from_str(r#"{"chars": "AB"}"#).unwrap();
        assert_eq!(spec.resolve().unwrap().codes(), &[65, 66]);
        assert_eq!(CharSetSpec::default().resolve().unwrap(), CharSet::default());
    }
}
