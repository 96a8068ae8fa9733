//! Colors.

/// An RGBA color with components in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0., 0., 0., 0.);
    pub const BLACK: Color = Color::rgb(0., 0., 0.);
    pub const WHITE: Color = Color::rgb(1., 1., 1.);
    pub const RED: Color = Color::rgb(1., 0., 0.);
    pub const GREEN: Color = Color::rgb(0., 1., 0.);
    pub const BLUE: Color = Color::rgb(0., 0., 1.);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b, a: 1. }
    }

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Color {
        Color { r, g, b, a }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Color> {
        let hex = hex.trim().trim_start_matches('#');
        let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        let (r, g, b, a) = match hex.len() {
            3 => (digit(0)? * 17, digit(1)? * 17, digit(2)? * 17, 255),
            6 => (byte(0)?, byte(2)?, byte(4)?, 255),
            8 => (byte(0)?, byte(2)?, byte(4)?, byte(6)?),
            _ => return None,
        };
        Some(Color::rgba(
            f64::from(r) / 255.,
            f64::from(g) / 255.,
            f64::from(b) / 255.,
            f64::from(a) / 255.,
        ))
    }

    pub fn with_alpha(self, a: f64) -> Color {
        Color { a, ..self }
    }

    /// Linear interpolation between two colors.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.max(0.).min(1.);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Converts to 8-bit ARGB components, as used by GDI+ and some native color APIs.
    pub fn to_argb8(self) -> [u8; 4] {
        let c = |v: f64| (v.max(0.).min(1.) * 255.).round() as u8;
        [c(self.a), c(self.r), c(self.g), c(self.b)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex() {
        assert_eq!(Color::from_hex("#f00"), Some(Color::RED));
        assert_eq!(Color::from_hex("0000ff"), Some(Color::BLUE));
        assert_eq!(Color::from_hex("#00000000"), Some(Color::TRANSPARENT));
        assert_eq!(Color::from_hex("#12"), None);
    }

    #[test]
    fn lerp_clamps() {
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 2.), Color::WHITE);
        assert_eq!(Color::BLACK.to_argb8(), [255, 0, 0, 0]);
    }
}
