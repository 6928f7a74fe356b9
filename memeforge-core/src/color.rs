//! CSS-style color strings.
//!
//! Layers store colors the way the browser editor writes them (`"#222"`,
//! `"rgba(0,0,0,0.5)"`, `"blue"`). Backends need concrete RGBA, so parsing
//! lives here and is shared by every surface.

use serde::{Deserialize, Serialize};

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Create an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color with explicit alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS color string.
    ///
    /// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r,g,b)`,
    /// `rgba(r,g,b,a)` with `a` in `0..=1`, and a handful of named colors.
    /// Returns `None` for anything else.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::parse_functional(args);
        }
        Self::named(&lower)
    }

    /// Parse a color, falling back to opaque black.
    #[must_use]
    pub fn parse_or_black(input: &str) -> Self {
        Self::parse(input).unwrap_or_else(|| {
            tracing::debug!("Unrecognized color {input:?}, using black");
            Self::BLACK
        })
    }

    /// Scale this color's alpha by `factor` (clamped to `0..=1`).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn with_alpha_factor(self, factor: f32) -> Self {
        let a = (f32::from(self.a) * factor.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        let digit = |c: char| c.to_digit(16).and_then(|d| u8::try_from(d).ok());
        let chars: Vec<char> = hex.chars().collect();
        match chars.len() {
            3 | 4 => {
                let mut v = [255u8; 4];
                for (slot, c) in v.iter_mut().zip(&chars) {
                    let d = digit(*c)?;
                    *slot = d * 17;
                }
                Some(Self::rgba(v[0], v[1], v[2], v[3]))
            }
            6 | 8 => {
                let mut v = [255u8; 4];
                for (slot, pair) in v.iter_mut().zip(chars.chunks(2)) {
                    *slot = digit(pair[0])? * 16 + digit(pair[1])?;
                }
                Some(Self::rgba(v[0], v[1], v[2], v[3]))
            }
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn parse_functional(args: &str) -> Option<Self> {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |s: &str| s.parse::<f32>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = match parts.get(3) {
            Some(a) => (a.parse::<f32>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
            None => 255,
        };
        Some(Self::rgba(r, g, b, a))
    }

    fn named(name: &str) -> Option<Self> {
        let color = match name {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "transparent" => Self::TRANSPARENT,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "lime" => Self::rgb(0, 255, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "orange" => Self::rgb(255, 165, 0),
            "purple" => Self::rgb(128, 0, 128),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            _ => return None,
        };
        Some(color)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}
