//! Tile fill colors.
//!
//! RGB color value type with the HSV constructor used by the palette,
//! hex parsing/formatting for the SVG document format, and the two
//! complement rules used when rendering selection state.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };
    pub const YELLOW: Color = Color { r: 255, g: 255, b: 0 };

    /// Creates a color from RGB components.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Creates a color from hue (degrees, wrapped into 0..360), saturation
    /// and value (both 0..=255).
    pub fn from_hsv(hue: i32, saturation: u8, value: u8) -> Self {
        let h = hue.rem_euclid(360) as f64 / 60.0;
        let s = saturation as f64 / 255.0;
        let v = value as f64 / 255.0;

        let i = h.floor();
        let f = h - i;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        let (r, g, b) = match i as i32 % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self {
            r: (r * 255.0).round() as u8,
            g: (g * 255.0).round() as u8,
            b: (b * 255.0).round() as u8,
        }
    }

    /// Hue (degrees, 0..360), saturation and value (0..=255).
    ///
    /// Achromatic colors report hue 0.
    pub fn to_hsv(&self) -> (i32, u8, u8) {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (((g - b) / delta).rem_euclid(6.0))
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let saturation = if max == 0.0 { 0.0 } else { delta / max };

        (
            hue.round() as i32 % 360,
            (saturation * 255.0).round() as u8,
            (max * 255.0).round() as u8,
        )
    }

    /// Parses `#rgb` or `#rrggbb`.
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#')?;
        match digits.len() {
            3 => {
                let mut c = [0u8; 3];
                for (i, ch) in digits.chars().enumerate() {
                    let d = ch.to_digit(16)? as u8;
                    c[i] = d * 16 + d;
                }
                Some(Self::new(c[0], c[1], c[2]))
            }
            6 => {
                let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
                let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
                let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            }
            _ => None,
        }
    }

    /// Formats as `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// A saturated contrasting color for drawing a selection highlight.
    ///
    /// Picks the opposite hue at full saturation and value; grayish or dark
    /// colors get yellow instead, since their hue carries no information.
    pub fn highlight_complement(&self) -> Color {
        let (h, s, v) = self.to_hsv();
        let mut h2 = (h + 180) % 360;
        if s < 26 || v < 26 {
            h2 = 60;
        }
        Color::from_hsv(h2, 255, 255)
    }

    /// Black for light colors, white for dark ones.
    pub fn black_or_white_complement(&self) -> Color {
        let (_, _, v) = self.to_hsv();
        if v as f64 / 255.0 > 0.4 {
            Color::BLACK
        } else {
            Color::WHITE
        }
    }

    /// Component-wise average of a set of colors.
    ///
    /// Returns `None` for an empty slice.
    pub fn average(colors: &[Color]) -> Option<Color> {
        if colors.is_empty() {
            return None;
        }
        let n = colors.len() as u32;
        let (mut r, mut g, mut b) = (0u32, 0u32, 0u32);
        for c in colors {
            r += c.r as u32;
            g += c.g as u32;
            b += c.b as u32;
        }
        Some(Color::new((r / n) as u8, (g / n) as u8, (b / n) as u8))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::YELLOW
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A random fully-saturated palette color with hue in 15° steps.
pub fn random_color<R: Rng>(rng: &mut R) -> Color {
    Color::from_hsv(rng.random_range(0..24) * 15, 255, 255)
}
