use std::str::FromStr;

use palette::Srgb;
use thiserror::Error;

/// A thread or background colour given on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub Srgb<u8>);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(color) = parse_hex_color(s)? {
            return Ok(Self(color));
        }
        if s.contains(',') {
            let rgb: Vec<&str> = s.split(',').map(str::trim).collect();
            if rgb.len() != 3 {
                return Err(ColorParseError::InvalidRgb);
            }
            let channel = |value: &str| value.parse::<u8>().map_err(|_| ColorParseError::InvalidRgb);
            return Ok(Self(Srgb::new(
                channel(rgb[0])?,
                channel(rgb[1])?,
                channel(rgb[2])?,
            )));
        }
        named(s)
            .map(Self)
            .ok_or_else(|| ColorParseError::UnknownName(s.to_string()))
    }
}

fn parse_hex_color(s: &str) -> Result<Option<Srgb<u8>>, ColorParseError> {
    let s = s.trim();
    let (s, prefixed) = match s.strip_prefix('#').or_else(|| s.strip_prefix("0x")) {
        Some(stripped) => (stripped, true),
        None => (s, false),
    };
    if !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return if prefixed {
            Err(ColorParseError::InvalidHex)
        } else {
            Ok(None)
        };
    }

    let hex = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| ColorParseError::InvalidHex);
    match s.len() {
        6 => Ok(Some(Srgb::new(hex(&s[0..2])?, hex(&s[2..4])?, hex(&s[4..6])?))),
        3 => Ok(Some(Srgb::new(
            hex(&s[0..1].repeat(2))?,
            hex(&s[1..2].repeat(2))?,
            hex(&s[2..3].repeat(2))?,
        ))),
        _ if prefixed => Err(ColorParseError::InvalidHex),
        _ => Ok(None),
    }
}

fn named(name: &str) -> Option<Srgb<u8>> {
    Some(match name.to_lowercase().as_str() {
        "black" => Srgb::new(0, 0, 0),
        "white" => Srgb::new(255, 255, 255),
        "gray" | "grey" => Srgb::new(128, 128, 128),
        "red" => Srgb::new(255, 0, 0),
        "green" => Srgb::new(0, 255, 0),
        "blue" => Srgb::new(0, 0, 255),
        "brown" => Srgb::new(165, 42, 42),
        "beige" => Srgb::new(245, 245, 220),
        "ivory" => Srgb::new(255, 255, 240),
        "linen" => Srgb::new(240, 230, 221),
        "hemp" => Srgb::new(158, 141, 106),
        "navy" => Srgb::new(0, 0, 128),
        "gold" => Srgb::new(255, 215, 0),
        "silver" => Srgb::new(192, 192, 192),
        _ => return None,
    })
}

#[derive(Debug, Error)]
pub enum ColorParseError {
    #[error("Invalid RGB colour. Use three numbers separated by commas, like 158,141,106.")]
    InvalidRgb,
    #[error("Invalid hexadecimal colour. Use #RRGGBB, 0xRRGGBB, RRGGBB or RGB.")]
    InvalidHex,
    #[error("Unknown colour name '{0}'")]
    UnknownName(String),
}
