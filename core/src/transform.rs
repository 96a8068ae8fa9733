//! Affine transforms.
//!
//! Transforms are homogeneous `Matrix3<f64>`s acting on column vectors, so `a * b` applies `b`
//! first. The last row is always `(0, 0, 1)`.

use cgmath::{Deg, Matrix3, Point2, Rad, SquareMatrix, Vector2};

/// Creates an affine matrix from its six components, in the `(xx, yx, xy, yy, x0, y0)` order
/// used by Cairo, Core Graphics (`a, b, c, d, tx, ty`) and GDI+ (`m11, m12, m21, m22, dx, dy`).
pub fn affine(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Matrix3<f64> {
    Matrix3::new(a, b, 0., c, d, 0., tx, ty, 1.)
}

/// Returns the six affine components (see [`affine`]).
pub fn to_affine(m: &Matrix3<f64>) -> [f64; 6] {
    [m.x.x, m.x.y, m.y.x, m.y.y, m.z.x, m.z.y]
}

pub fn identity() -> Matrix3<f64> {
    Matrix3::identity()
}

pub fn translation(dx: f64, dy: f64) -> Matrix3<f64> {
    affine(1., 0., 0., 1., dx, dy)
}

/// A rotation by the given angle in degrees; positive angles turn +x toward +y.
pub fn rotation(degrees: f64) -> Matrix3<f64> {
    let Rad(angle) = Rad::from(Deg(degrees));
    let (sin, cos) = angle.sin_cos();
    affine(cos, sin, -sin, cos, 0., 0.)
}

pub fn scaling(sx: f64, sy: f64) -> Matrix3<f64> {
    affine(sx, 0., 0., sy, 0., 0.)
}

pub fn transform_point(m: &Matrix3<f64>, p: Point2<f64>) -> Point2<f64> {
    Point2::new(
        m.x.x * p.x + m.y.x * p.y + m.z.x,
        m.x.y * p.x + m.y.y * p.y + m.z.y,
    )
}

/// Transforms a distance vector (ignores translation).
pub fn transform_vector(m: &Matrix3<f64>, v: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(m.x.x * v.x + m.y.x * v.y, m.x.y * v.x + m.y.y * v.y)
}

/// The factor by which the transform scales areas, as a length factor.
///
/// Used to convert device pixels to user units for hairlines.
pub fn scale_factor(m: &Matrix3<f64>) -> f64 {
    let det = m.x.x * m.y.y - m.y.x * m.x.y;
    det.abs().sqrt()
}

/// Returns the inverse, or `None` for degenerate transforms (e.g. a zero scale).
pub fn invert(m: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    m.invert()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn composes_in_source_order() {
        // translate, then rotate: points are rotated first, then translated
        let m = translation(10., 0.) * rotation(90.);
        let p = transform_point(&m, Point2::new(1., 0.));
        assert_abs_diff_eq!(p.x, 10., epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 1., epsilon = 1e-9);
    }

    #[test]
    fn round_trips_components() {
        let m = affine(2., 0.5, -1., 3., 4., 5.);
        assert_eq!(to_affine(&m), [2., 0.5, -1., 3., 4., 5.]);
        let inv = invert(&m).unwrap();
        let p = transform_point(&inv, transform_point(&m, Point2::new(3., -2.)));
        assert_abs_diff_eq!(p.x, 3., epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, -2., epsilon = 1e-9);
        assert_abs_diff_eq!(scale_factor(&scaling(2., 8.)), 4., epsilon = 1e-9);
    }
}
