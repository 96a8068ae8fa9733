//! Gradients and paints.

use crate::color::Color;
use crate::image::Image;
use cgmath::Point2;

/// Gradient geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientKind {
    /// A linear gradient from `start` (position 0) to `end` (position 1).
    Linear {
        start: Point2<f64>,
        end: Point2<f64>,
    },
    /// A radial gradient between two circles.
    Radial {
        center0: Point2<f64>,
        radius0: f64,
        center1: Point2<f64>,
        radius1: f64,
    },
}

/// A color stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position in `0..=1`.
    pub position: f64,
    pub color: Color,
}

/// A gradient: geometry plus color stops.
///
/// Stops are kept in insertion order; consumers should use [`Gradient::sorted_stops`].
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    kind: GradientKind,
    stops: Vec<ColorStop>,
}

impl Gradient {
    pub fn linear(x0: f64, y0: f64, x1: f64, y1: f64) -> Gradient {
        Gradient {
            kind: GradientKind::Linear {
                start: Point2::new(x0, y0),
                end: Point2::new(x1, y1),
            },
            stops: Vec::new(),
        }
    }

    /// Creates a radial gradient. Negative radii are clamped to zero.
    pub fn radial(cx0: f64, cy0: f64, radius0: f64, cx1: f64, cy1: f64, radius1: f64) -> Gradient {
        Gradient {
            kind: GradientKind::Radial {
                center0: Point2::new(cx0, cy0),
                radius0: radius0.max(0.),
                center1: Point2::new(cx1, cy1),
                radius1: radius1.max(0.),
            },
            stops: Vec::new(),
        }
    }

    pub fn kind(&self) -> GradientKind {
        self.kind
    }

    /// Appends a color stop. Positions outside `0..=1` are clamped (NaN becomes 0).
    pub fn add_color_stop(&mut self, position: f64, color: Color) -> &mut Self {
        let position = if position.is_nan() {
            0.
        } else {
            position.max(0.).min(1.)
        };
        self.stops.push(ColorStop { position, color });
        self
    }

    /// Stops in insertion order.
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Stops sorted by position; stops at equal positions keep their insertion order.
    pub fn sorted_stops(&self) -> Vec<ColorStop> {
        let mut stops = self.stops.clone();
        // Vec::sort_by is stable
        stops.sort_by(|a, b| {
            a.position
                .partial_cmp(&b.position)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        stops
    }

    /// Interpolates the gradient color at position `t`, padding past the first and last stops.
    pub fn color_at(&self, t: f64) -> Color {
        let stops = self.sorted_stops();
        let first = match stops.first() {
            Some(stop) => stop,
            None => return Color::TRANSPARENT,
        };
        if t <= first.position {
            return first.color;
        }
        for pair in stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.position {
                let span = b.position - a.position;
                if span <= 0. {
                    return b.color;
                }
                return a.color.lerp(b.color, (t - a.position) / span);
            }
        }
        stops[stops.len() - 1].color
    }
}

/// A non-solid paint.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Gradient(Gradient),
    /// An image tiled from the given origin.
    Image {
        image: Image,
        origin: Point2<f64>,
    },
}

impl From<Gradient> for Pattern {
    fn from(gradient: Gradient) -> Pattern {
        Pattern::Gradient(gradient)
    }
}

/// The paint used by fill and stroke operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Pattern(Pattern),
}

impl Default for Paint {
    fn default() -> Paint {
        Paint::Solid(Color::BLACK)
    }
}

impl Paint {
    /// The solid color, if this is one.
    pub fn solid_color(&self) -> Option<Color> {
        match self {
            Paint::Solid(color) => Some(*color),
            Paint::Pattern(_) => None,
        }
    }
}
