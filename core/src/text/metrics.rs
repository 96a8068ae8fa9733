//! Font descriptions and metrics.

use core::fmt;
use unicode_width::UnicodeWidthChar;

/// Font weights, with their CSS/OpenType numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FontWeight {
    Thin = 100,
    Light = 300,
    Normal = 400,
    Semibold = 600,
    Bold = 700,
    Heavy = 900,
}

impl FontWeight {
    pub fn value(self) -> u16 {
        self as u16
    }

    pub fn is_bold(self) -> bool {
        self >= FontWeight::Semibold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Normal,
    Italic,
    Oblique,
}

/// A font description.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    /// Size in device-independent pixels.
    pub size: f64,
    pub weight: FontWeight,
    pub style: FontStyle,
}

impl Default for Font {
    fn default() -> Font {
        Font::new("Sans", 12.)
    }
}

impl Font {
    pub fn new(family: &str, size: f64) -> Font {
        Font {
            family: family.to_string(),
            size: size.max(0.),
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
        }
    }

    pub fn with_size(mut self, size: f64) -> Font {
        self.size = size.max(0.);
        self
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Font {
        self.weight = weight;
        self
    }

    pub fn with_style(mut self, style: FontStyle) -> Font {
        self.style = style;
        self
    }
}

/// Vertical font metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub ascent: f64,
    pub descent: f64,
    pub leading: f64,
}

impl LineMetrics {
    pub fn height(&self) -> f64 {
        self.ascent + self.descent + self.leading
    }
}

/// Measures text for the layout engine; implemented once per backend on top of its native text
/// API.
pub trait TextMeasurer: fmt::Debug + Send + Sync {
    /// Advance width of `text` drawn in a single font.
    fn run_width(&self, text: &str, font: &Font) -> f64;

    /// Vertical metrics of a font.
    fn line_metrics(&self, font: &Font) -> LineMetrics;

    /// Advance width of a single character.
    fn char_width(&self, c: char, font: &Font) -> f64 {
        let mut buf = [0; 4];
        self.run_width(c.encode_utf8(&mut buf), font)
    }
}

/// A deterministic font model used when no font rasterizer is available (headless native
/// surfaces and tests).
///
/// A character advances by half the font size per terminal column; bold weights are 10% wider,
/// light weights 5% narrower and slanted styles 5% wider. Lines are 1.2 × the font size tall.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessMetrics;

impl HeadlessMetrics {
    pub fn advance(c: char, font: &Font) -> f64 {
        let columns = match c {
            '\t' => 4,
            c => c.width().unwrap_or(0),
        };
        let weight_factor = match font.weight {
            FontWeight::Thin | FontWeight::Light => 0.95,
            FontWeight::Normal => 1.,
            FontWeight::Semibold | FontWeight::Bold | FontWeight::Heavy => 1.1,
        };
        let style_factor = match font.style {
            FontStyle::Normal => 1.,
            FontStyle::Italic | FontStyle::Oblique => 1.05,
        };
        columns as f64 * font.size * 0.5 * weight_factor * style_factor
    }

    pub fn metrics(font: &Font) -> LineMetrics {
        LineMetrics {
            ascent: font.size * 0.8,
            descent: font.size * 0.2,
            leading: font.size * 0.2,
        }
    }
}

impl TextMeasurer for HeadlessMetrics {
    fn run_width(&self, text: &str, font: &Font) -> f64 {
        text.chars().map(|c| HeadlessMetrics::advance(c, font)).sum()
    }

    fn line_metrics(&self, font: &Font) -> LineMetrics {
        HeadlessMetrics::metrics(font)
    }
}
