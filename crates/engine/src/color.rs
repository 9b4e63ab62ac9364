use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("color must start with '#': {value}")]
    MissingHash { value: String },
    #[error("color must have 3, 6 or 8 hex digits: {value}")]
    InvalidLength { value: String },
    #[error("color contains invalid hex digit '{character}'")]
    InvalidDigit { character: char },
}

/// RGBA color, written and parsed in CSS hex notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(value: &str) -> Result<Self, ColorParseError> {
        let digits = value
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash {
                value: value.to_string(),
            })?;
        let nibbles = digits
            .chars()
            .map(|ch| {
                ch.to_digit(16)
                    .map(|digit| digit as u8)
                    .ok_or(ColorParseError::InvalidDigit { character: ch })
            })
            .collect::<Result<Vec<u8>, _>>()?;

        match nibbles.as_slice() {
            [r, g, b] => Ok(Self::rgb(r * 0x11, g * 0x11, b * 0x11)),
            [r1, r2, g1, g2, b1, b2] => Ok(Self::rgb(
                r1 << 4 | r2,
                g1 << 4 | g2,
                b1 << 4 | b2,
            )),
            [r1, r2, g1, g2, b1, b2, a1, a2] => Ok(Self::rgba(
                r1 << 4 | r2,
                g1 << 4 | g2,
                b1 << 4 | b2,
                a1 << 4 | a2,
            )),
            _ => Err(ColorParseError::InvalidLength {
                value: value.to_string(),
            }),
        }
    }

    pub fn to_rgba_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 0xff {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_hex(value)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_long_and_alpha_forms() {
        assert_eq!(Color::from_hex("#0dd").expect("short"), Color::rgb(0, 0xdd, 0xdd));
        assert_eq!(
            Color::from_hex("#FF0000").expect("long"),
            Color::rgb(0xff, 0, 0)
        );
        assert_eq!(
            Color::from_hex("#00ff0080").expect("alpha"),
            Color::rgba(0, 0xff, 0, 0x80)
        );
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(
            Color::from_hex("ffffff"),
            Err(ColorParseError::MissingHash { .. })
        ));
        assert!(matches!(
            Color::from_hex("#ffff"),
            Err(ColorParseError::InvalidLength { .. })
        ));
        assert_eq!(
            Color::from_hex("#gg0000"),
            Err(ColorParseError::InvalidDigit { character: 'g' })
        );
    }

    #[test]
    fn display_omits_opaque_alpha() {
        assert_eq!(Color::rgb(0, 0xdd, 0xdd).to_string(), "#00dddd");
        assert_eq!(Color::rgba(1, 2, 3, 4).to_string(), "#01020304");
    }

    #[test]
    fn serde_uses_hex_strings() {
        let color: Color = serde_json::from_str("\"#ff0000\"").expect("deserialize");
        assert_eq!(color, Color::rgb(0xff, 0, 0));
        assert_eq!(
            serde_json::to_string(&color).expect("serialize"),
            "\"#ff0000\""
        );
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }
}
