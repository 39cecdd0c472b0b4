//! Hex colors and the shade arithmetic used for variant gradients.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`HexColor`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    /// Not 3 or 6 hex digits after the optional `#`.
    #[error("color must have 3 or 6 hex digits, got {0}")]
    Length(usize),
    /// A digit is not hexadecimal.
    #[error("color contains a non-hex digit")]
    NotHex,
}

/// An RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Shift every channel by `round(2.55 * percent)`, clamped to `[0, 255]`.
    ///
    /// Positive percentages lighten, negative darken. Any magnitude is
    /// accepted; out-of-range results saturate.
    #[must_use]
    pub fn lighten(self, percent: f64) -> Self {
        let amount = (2.55 * percent).round();
        let shift = |channel: u8| -> u8 {
            let shifted = (f64::from(channel) + amount).clamp(0.0, 255.0);
            // In range after the clamp; NaN (from a NaN percent) saturates to 0.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let value = shifted as u8;
            value
        };
        Self {
            r: shift(self.r),
            g: shift(self.g),
            b: shift(self.b),
        }
    }

    /// `darken(p)` is `lighten(-p)`.
    #[must_use]
    pub fn darken(self, percent: f64) -> Self {
        self.lighten(-percent)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// A validated `#RRGGBB` color.
///
/// Accepts `#rgb` and `#rrggbb` (the `#` is optional, case-insensitive) and
/// always displays as upper-case `#RRGGBB`.
///
/// ```
/// use section_forge_core::HexColor;
///
/// let color = HexColor::parse("#0af").unwrap();
/// assert_eq!(color.to_string(), "#00AAFF");
/// assert_eq!(color.lighten(100.0).to_string(), "#FFFFFF");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(Rgb);

impl HexColor {
    #[must_use]
    pub const fn from_rgb(rgb: Rgb) -> Self {
        Self(rgb)
    }

    /// Parse a hex color string.
    ///
    /// # Errors
    ///
    /// Returns an error if the digit count is not 3 or 6 or a digit is not hex.
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        let digits = s.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_owned(),
            n => return Err(ColorError::Length(n)),
        };

        let value = u32::from_str_radix(&expanded, 16).map_err(|_| ColorError::NotHex)?;
        // from_str_radix accepts a leading '+'
        if expanded.starts_with('+') {
            return Err(ColorError::NotHex);
        }

        let [_, r, g, b] = value.to_be_bytes();
        Ok(Self(Rgb::new(r, g, b)))
    }

    #[must_use]
    pub const fn rgb(self) -> Rgb {
        self.0
    }

    #[must_use]
    pub fn lighten(self, percent: f64) -> Self {
        Self(self.0.lighten(percent))
    }

    #[must_use]
    pub fn darken(self, percent: f64) -> Self {
        Self(self.0.darken(percent))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for HexColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HexColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_six_digits() {
        let color = HexColor::parse("#6366f1").unwrap();
        assert_eq!(color.rgb(), Rgb::new(0x63, 0x66, 0xF1));
        assert_eq!(color.to_string(), "#6366F1");
    }

    #[test]
    fn test_parse_three_digits_without_hash() {
        assert_eq!(HexColor::parse("fff").unwrap().rgb(), Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(HexColor::parse("#12345"), Err(ColorError::Length(5)));
        assert_eq!(HexColor::parse("#gggggg"), Err(ColorError::NotHex));
        assert_eq!(HexColor::parse("+12345"), Err(ColorError::NotHex));
        assert_eq!(HexColor::parse(""), Err(ColorError::Length(0)));
    }

    #[test]
    fn test_zero_shift_is_identity() {
        let rgb = Rgb::new(12, 200, 99);
        assert_eq!(rgb.lighten(0.0), rgb);
        assert_eq!(rgb.darken(0.0), rgb);
        assert_eq!(rgb.lighten(-0.0), rgb);
    }

    #[test]
    fn test_lighten_uses_rounded_linear_shift() {
        // 2.55 * 20 = 51
        assert_eq!(Rgb::new(100, 100, 100).lighten(20.0), Rgb::new(151, 151, 151));
        // 2.55 * 10 = 25.5 -> 26
        assert_eq!(Rgb::new(0, 0, 0).lighten(10.0), Rgb::new(26, 26, 26));
    }

    #[test]
    fn test_darken_is_negative_lighten() {
        let rgb = Rgb::new(120, 60, 240);
        for p in [1.0, 15.0, 33.3, 80.0] {
            assert_eq!(rgb.darken(p), rgb.lighten(-p));
        }
    }

    #[test]
    fn test_shift_clamps_for_any_magnitude() {
        let rgb = Rgb::new(250, 5, 128);
        assert_eq!(rgb.lighten(1_000.0), Rgb::new(255, 255, 255));
        assert_eq!(rgb.darken(1_000.0), Rgb::new(0, 0, 0));
        assert_eq!(rgb.lighten(f64::MAX), Rgb::new(255, 255, 255));
        assert_eq!(rgb.lighten(f64::MIN), Rgb::new(0, 0, 0));
        assert_eq!(Rgb::new(250, 250, 250).lighten(5.0), Rgb::new(255, 255, 255));
    }
}
