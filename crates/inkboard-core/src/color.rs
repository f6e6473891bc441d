//! RGBA colour values shared by strokes, elements and the pixel grid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a colour string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid colour: {0}")]
pub struct ColorParseError(pub String);

/// An 8-bit straight-alpha colour.
///
/// Serialises as a hex string so stroke logs stay readable
/// (`#RRGGBB`, or `#RRGGBBAA` when the colour is translucent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Same colour with a new alpha in `0.0..=1.0`.
    pub fn with_alpha(self, alpha: f64) -> Self {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { a, ..self }
    }

    /// Whether the colour is fully opaque.
    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (case-insensitive).
    pub fn from_hex(input: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError(input.to_string());
        let hex = input.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let byte = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).map_err(|_| err());

        match hex.len() {
            3 => {
                // #rgb -> #rrggbb
                let r = byte(0..1)? * 17;
                let g = byte(1..2)? * 17;
                let b = byte(2..3)? * 17;
                Ok(Self::rgb(r, g, b))
            }
            6 => Ok(Self::rgb(byte(0..2)?, byte(2..4)?, byte(4..6)?)),
            8 => Ok(Self::new(byte(0..2)?, byte(2..4)?, byte(4..6)?, byte(6..8)?)),
            _ => Err(err()),
        }
    }

    /// Format as `#RRGGBB`, appending alpha only when it is not opaque.
    pub fn to_hex(&self) -> String {
        if self.is_opaque() {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::black()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for Rgba {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(Rgba::from_hex("#000000").unwrap(), Rgba::black());
        assert_eq!(Rgba::from_hex("#fff").unwrap(), Rgba::white());
        assert_eq!(Rgba::from_hex("#7b2ff2").unwrap(), Rgba::rgb(0x7b, 0x2f, 0xf2));
        assert_eq!(Rgba::from_hex("#FF000080").unwrap(), Rgba::new(255, 0, 0, 128));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Rgba::from_hex("red").is_err());
        assert!(Rgba::from_hex("#12345").is_err());
        assert!(Rgba::from_hex("#gggggg").is_err());
    }

    #[test]
    fn test_hex_output() {
        assert_eq!(Rgba::rgb(255, 0, 0).to_hex(), "#FF0000");
        assert_eq!(Rgba::new(255, 0, 0, 128).to_hex(), "#FF000080");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Rgba::rgb(0xe0, 0xe0, 0xe0)).unwrap();
        assert_eq!(json, "\"#E0E0E0\"");
        let back: Rgba = serde_json::from_str("\"#e0e0e0\"").unwrap();
        assert_eq!(back, Rgba::rgb(0xe0, 0xe0, 0xe0));
    }

    #[test]
    fn test_with_alpha() {
        let c = Rgba::rgb(10, 20, 30).with_alpha(0.5);
        assert_eq!(c.a, 128);
        assert_eq!((c.r, c.g, c.b), (10, 20, 30));
    }
}
