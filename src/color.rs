//! Hex color parsing and small color helpers shared by the rasterizer.

use thiserror::Error;

/// Luminance weights used by the CSS `saturate()` filter matrix.
pub const LUMA_R: f32 = 0.213;
pub const LUMA_G: f32 = 0.715;
pub const LUMA_B: f32 = 0.072;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("expected 6 hex digits, got {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in {0:?}")]
    BadDigit(String),
}

/// 8-bit straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse an `RRGGBB` string. A leading `#` is tolerated since palette
    /// entries are stored without one but UI payloads sometimes keep it.
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 {
            return Err(ColorError::BadLength(hex.to_string()));
        }
        let value =
            u32::from_str_radix(digits, 16).map_err(|_| ColorError::BadDigit(hex.to_string()))?;
        Ok(Self::new(
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
            0xff,
        ))
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!(Rgba8::from_hex("DC2525"), Ok(Rgba8::new(0xdc, 0x25, 0x25, 0xff)));
        assert_eq!(Rgba8::from_hex("#121216"), Ok(Rgba8::new(0x12, 0x12, 0x16, 0xff)));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(Rgba8::from_hex("12121"), Err(ColorError::BadLength(_))));
        assert!(matches!(Rgba8::from_hex("12121g"), Err(ColorError::BadDigit(_))));
    }
}
