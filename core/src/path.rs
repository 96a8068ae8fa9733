//! Vector paths.
//!
//! A [`Path`] is an ordered list of segments forming one or more subpaths, plus a current point
//! cursor. Paths are toolkit-neutral; backends replay the segments onto their native path APIs.

use crate::error::{Error, Result};
use crate::rect::Rect;
use crate::transform;
use cgmath::{Deg, Matrix3, Point2, Rad, Vector2};

/// A path segment.
///
/// Arc angles are in degrees, measured from +x toward +y (clockwise on screen, since the
/// y-axis points down). `angle2` is already normalized: it is `>= angle1` for positive arcs and
/// `<= angle1` for negative ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Starts a new subpath.
    MoveTo(Point2<f64>),
    /// A straight line from the current point.
    LineTo(Point2<f64>),
    /// A cubic Bézier curve from the current point: `(control1, control2, end)`.
    CurveTo(Point2<f64>, Point2<f64>, Point2<f64>),
    /// A circular arc. If the path has a current point, a line connects it to the arc start.
    Arc {
        center: Point2<f64>,
        radius: f64,
        angle1: f64,
        angle2: f64,
        negative: bool,
    },
    /// Closes the current subpath.
    ClosePath,
}

/// A mutable vector path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
    current: Option<Point2<f64>>,
    subpath_start: Option<Point2<f64>>,
}

/// Returns the point on a circle at the given angle in degrees.
pub fn arc_point(center: Point2<f64>, radius: f64, degrees: f64) -> Point2<f64> {
    let Rad(angle) = Rad::from(Deg(degrees));
    let (sin, cos) = angle.sin_cos();
    Point2::new(center.x + radius * cos, center.y + radius * sin)
}

/// Splits an arc into cubic Bézier curves of at most 90° each.
///
/// Returns `(start, control1, control2, end)` tuples.
pub fn arc_to_beziers(
    center: Point2<f64>,
    radius: f64,
    angle1: f64,
    angle2: f64,
) -> Vec<[Point2<f64>; 4]> {
    let sweep = angle2 - angle1;
    if sweep == 0. || radius == 0. {
        return Vec::new();
    }
    let pieces = (sweep.abs() / 90.).ceil().max(1.) as usize;
    let step = sweep / pieces as f64;
    let Rad(step_rad) = Rad::from(Deg(step));
    let k = 4. / 3. * (step_rad / 4.).tan();

    let mut curves = Vec::with_capacity(pieces);
    for i in 0..pieces {
        let a = angle1 + step * i as f64;
        let b = a + step;
        let Rad(ra) = Rad::from(Deg(a));
        let Rad(rb) = Rad::from(Deg(b));
        let start = arc_point(center, radius, a);
        let end = arc_point(center, radius, b);
        let c1 = Point2::new(
            start.x - k * radius * ra.sin(),
            start.y + k * radius * ra.cos(),
        );
        let c2 = Point2::new(end.x + k * radius * rb.sin(), end.y - k * radius * rb.cos());
        curves.push([start, c1, c2, end]);
    }
    curves
}

/// Normalizes arc angles so the sweep runs in the requested direction.
fn normalize_arc(angle1: f64, angle2: f64, negative: bool) -> f64 {
    if negative {
        if angle2 > angle1 {
            angle2 - 360. * ((angle2 - angle1) / 360.).ceil()
        } else {
            angle2
        }
    } else if angle2 < angle1 {
        angle2 + 360. * ((angle1 - angle2) / 360.).ceil()
    } else {
        angle2
    }
}

impl Path {
    pub fn new() -> Path {
        Path::default()
    }

    /// The segments, in the order they were added.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The current point, if any.
    pub fn current_point(&self) -> Option<Point2<f64>> {
        self.current
    }

    /// Discards all segments and the current point.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.current = None;
        self.subpath_start = None;
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = Point2::new(x, y);
        self.segments.push(PathSegment::MoveTo(p));
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    /// Adds a line to the given point. Without a current point, this behaves like `move_to`.
    pub fn line_to(&mut self, x: f64, y: f64) {
        if self.current.is_none() {
            return self.move_to(x, y);
        }
        let p = Point2::new(x, y);
        self.segments.push(PathSegment::LineTo(p));
        self.current = Some(p);
    }

    /// Adds a cubic Bézier curve. Without a current point, the first control point becomes one.
    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        if self.current.is_none() {
            self.move_to(x1, y1);
        }
        let end = Point2::new(x3, y3);
        self.segments.push(PathSegment::CurveTo(
            Point2::new(x1, y1),
            Point2::new(x2, y2),
            end,
        ));
        self.current = Some(end);
    }

    fn require_current(&self) -> Result<Point2<f64>> {
        self.current.ok_or(Error::NoCurrentPoint)
    }

    pub fn rel_move_to(&mut self, dx: f64, dy: f64) -> Result<()> {
        let p = self.require_current()?;
        self.move_to(p.x + dx, p.y + dy);
        Ok(())
    }

    pub fn rel_line_to(&mut self, dx: f64, dy: f64) -> Result<()> {
        let p = self.require_current()?;
        self.line_to(p.x + dx, p.y + dy);
        Ok(())
    }

    /// Adds a curve with all points relative to the current point.
    pub fn rel_curve_to(
        &mut self,
        dx1: f64,
        dy1: f64,
        dx2: f64,
        dy2: f64,
        dx3: f64,
        dy3: f64,
    ) -> Result<()> {
        let p = self.require_current()?;
        self.curve_to(
            p.x + dx1,
            p.y + dy1,
            p.x + dx2,
            p.y + dy2,
            p.x + dx3,
            p.y + dy3,
        );
        Ok(())
    }

    /// Adds a circular arc in the positive direction (clockwise on screen).
    ///
    /// Negative radii are clamped to zero.
    pub fn arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        self.push_arc(xc, yc, radius, angle1, angle2, false);
    }

    /// Adds a circular arc in the negative direction (counterclockwise on screen).
    pub fn arc_negative(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        self.push_arc(xc, yc, radius, angle1, angle2, true);
    }

    fn push_arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64, negative: bool) {
        if !(angle1.is_finite() && angle2.is_finite() && radius.is_finite()) {
            log::warn!("ignoring arc with non-finite parameters");
            return;
        }
        let radius = radius.max(0.);
        let center = Point2::new(xc, yc);
        let angle2 = normalize_arc(angle1, angle2, negative);
        let start = arc_point(center, radius, angle1);
        if self.subpath_start.is_none() || self.current.is_none() {
            self.subpath_start = Some(start);
        }
        self.segments.push(PathSegment::Arc {
            center,
            radius,
            angle1,
            angle2,
            negative,
        });
        self.current = Some(arc_point(center, radius, angle2));
    }

    /// Closes the current subpath. Closing twice in a row does nothing the second time.
    pub fn close_path(&mut self) {
        match self.segments.last() {
            None | Some(PathSegment::ClosePath) => return,
            _ => (),
        }
        self.segments.push(PathSegment::ClosePath);
        self.current = self.subpath_start;
    }

    /// Adds a closed rectangle subpath.
    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
    }

    /// Adds a closed rectangle subpath with rounded corners.
    ///
    /// The radius is clamped to half the shorter side.
    pub fn rounded_rectangle(&mut self, x: f64, y: f64, width: f64, height: f64, radius: f64) {
        let r = radius.max(0.).min(width.abs() / 2.).min(height.abs() / 2.);
        if r == 0. {
            return self.rectangle(x, y, width, height);
        }
        self.move_to(x + r, y);
        self.arc(x + width - r, y + r, r, 270., 360.);
        self.arc(x + width - r, y + height - r, r, 0., 90.);
        self.arc(x + r, y + height - r, r, 90., 180.);
        self.arc(x + r, y + r, r, 180., 270.);
        self.close_path();
    }

    /// Appends the segments of another path; its current point becomes the current point.
    pub fn append_path(&mut self, other: &Path) {
        if other.is_empty() {
            return;
        }
        self.segments.extend_from_slice(&other.segments);
        self.current = other.current;
        self.subpath_start = other.subpath_start;
    }

    /// Calls `f` with each segment, with arcs expanded into an implicit connecting line (or move)
    /// and cubic curves.
    pub fn for_each_curve<F: FnMut(&PathSegment)>(&self, mut f: F) {
        let mut current: Option<Point2<f64>> = None;
        let mut start: Option<Point2<f64>> = None;
        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) => {
                    current = Some(p);
                    start = Some(p);
                    f(segment);
                }
                PathSegment::LineTo(p) | PathSegment::CurveTo(_, _, p) => {
                    current = Some(p);
                    f(segment);
                }
                PathSegment::Arc {
                    center,
                    radius,
                    angle1,
                    angle2,
                    ..
                } => {
                    let arc_start = arc_point(center, radius, angle1);
                    if current.is_some() {
                        f(&PathSegment::LineTo(arc_start));
                    } else {
                        f(&PathSegment::MoveTo(arc_start));
                        start = Some(arc_start);
                    }
                    for [_, c1, c2, end] in arc_to_beziers(center, radius, angle1, angle2) {
                        f(&PathSegment::CurveTo(c1, c2, end));
                    }
                    current = Some(arc_point(center, radius, angle2));
                }
                PathSegment::ClosePath => {
                    current = start;
                    f(segment);
                }
            }
        }
    }

    /// Returns a copy with every point mapped through the transform.
    ///
    /// Arcs are converted to Bézier curves, since they may not stay circular.
    pub fn transformed(&self, m: &Matrix3<f64>) -> Path {
        let t = |p: Point2<f64>| transform::transform_point(m, p);
        let mut segments = Vec::with_capacity(self.segments.len());
        self.for_each_curve(|segment| {
            segments.push(match *segment {
                PathSegment::MoveTo(p) => PathSegment::MoveTo(t(p)),
                PathSegment::LineTo(p) => PathSegment::LineTo(t(p)),
                PathSegment::CurveTo(a, b, c) => PathSegment::CurveTo(t(a), t(b), t(c)),
                other => other,
            })
        });
        Path {
            segments,
            current: self.current.map(t),
            subpath_start: self.subpath_start.map(t),
        }
    }

    /// Returns a bounding box containing the path (control points included), or `None` if the
    /// path is empty.
    pub fn bounds(&self) -> Option<Rect> {
        let mut min: Option<(Point2<f64>, Point2<f64>)> = None;
        let mut add = |p: Point2<f64>| {
            min = Some(match min {
                None => (p, p),
                Some((lo, hi)) => (
                    Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
                    Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
                ),
            })
        };
        self.for_each_curve(|segment| match *segment {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => add(p),
            PathSegment::CurveTo(a, b, c) => {
                add(a);
                add(b);
                add(c);
            }
            _ => (),
        });
        min.map(|(lo, hi)| Rect::new(lo, Vector2::new(hi.x - lo.x, hi.y - lo.y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn relative_ops_need_a_current_point() {
        let mut path = Path::new();
        assert_eq!(path.rel_line_to(1., 1.), Err(Error::NoCurrentPoint));
        assert_eq!(path.rel_move_to(1., 1.), Err(Error::NoCurrentPoint));
        assert_eq!(
            path.rel_curve_to(1., 1., 2., 2., 3., 3.),
            Err(Error::NoCurrentPoint)
        );
        assert!(path.is_empty());

        path.move_to(10., 10.);
        path.rel_line_to(5., 0.).unwrap();
        path.rel_curve_to(0., 5., 5., 5., 5., 10.).unwrap();
        assert_eq!(path.current_point(), Some(Point2::new(20., 20.)));
        assert_eq!(
            path.segments()[2],
            PathSegment::CurveTo(
                Point2::new(15., 15.),
                Point2::new(20., 15.),
                Point2::new(20., 20.)
            )
        );
    }

    #[test]
    fn close_path_is_idempotent() {
        let mut path = Path::new();
        path.close_path();
        assert!(path.is_empty());

        path.move_to(1., 1.);
        path.line_to(5., 1.);
        path.close_path();
        path.close_path();
        assert_eq!(path.len(), 3);
        assert_eq!(path.current_point(), Some(Point2::new(1., 1.)));
    }

    #[test]
    fn close_only_closes_current_subpath() {
        let mut path = Path::new();
        path.move_to(0., 0.);
        path.line_to(1., 0.);
        path.move_to(5., 5.);
        path.line_to(6., 5.);
        path.close_path();
        assert_eq!(path.current_point(), Some(Point2::new(5., 5.)));
    }

    #[test]
    fn line_to_without_current_point_moves() {
        let mut path = Path::new();
        path.line_to(3., 4.);
        assert_eq!(path.segments(), &[PathSegment::MoveTo(Point2::new(3., 4.))]);
    }

    #[test]
    fn arcs_normalize_their_sweep() {
        let mut path = Path::new();
        path.arc(0., 0., 10., 90., 0.);
        path.arc_negative(0., 0., 10., 0., 90.);
        match path.segments() {
            [PathSegment::Arc { angle2: a, .. }, PathSegment::Arc { angle2: b, .. }] => {
                assert_eq!(*a, 360.);
                assert_eq!(*b, -270.);
            }
            other => panic!("unexpected segments {:?}", other),
        }
    }

    #[test]
    fn arc_current_point_and_negative_radius() {
        let mut path = Path::new();
        path.arc(10., 10., 5., 0., 90.);
        let p = path.current_point().unwrap();
        assert_abs_diff_eq!(p.x, 10., epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 15., epsilon = 1e-9);

        let mut path = Path::new();
        path.arc(3., 3., -4., 0., 180.);
        match path.segments()[0] {
            PathSegment::Arc { radius, .. } => assert_eq!(radius, 0.),
            _ => unreachable!(),
        }
    }

    #[test]
    fn bezier_approximation_stays_on_circle() {
        let curves = arc_to_beziers(Point2::new(0., 0.), 10., 0., 180.);
        assert_eq!(curves.len(), 2);
        let [start, _, _, end] = curves[1];
        assert_abs_diff_eq!(start.y, 10., epsilon = 1e-9);
        assert_abs_diff_eq!(end.x, -10., epsilon = 1e-9);
    }

    #[test]
    fn append_keeps_prefix() {
        let mut p = Path::new();
        p.move_to(0., 0.);
        p.line_to(10., 0.);
        p.curve_to(10., 5., 5., 10., 0., 10.);
        p.close_path();

        let mut p2 = Path::new();
        p2.move_to(20., 20.);
        p2.line_to(30., 30.);

        let mut combined = p.clone();
        combined.append_path(&p2);
        assert_eq!(&combined.segments()[..p.len()], p.segments());
        assert_eq!(combined.len(), p.len() + p2.len());
        assert_eq!(combined.current_point(), Some(Point2::new(30., 30.)));
    }

    #[test]
    fn transformed_expands_arcs() {
        let mut path = Path::new();
        path.move_to(0., 0.);
        path.arc(10., 0., 10., 180., 360.);
        let moved = path.transformed(&transform::translation(5., 5.));
        assert_eq!(moved.segments()[0], PathSegment::MoveTo(Point2::new(5., 5.)));
        assert!(moved
            .segments()
            .iter()
            .all(|s| !matches!(s, PathSegment::Arc { .. })));
        let bounds = moved.bounds().unwrap();
        assert_abs_diff_eq!(bounds.x(), 5., epsilon = 1e-9);
        assert_abs_diff_eq!(bounds.width(), 20., epsilon = 1e-9);
    }

    #[test]
    fn rounded_rectangle_clamps_radius() {
        let mut path = Path::new();
        path.rounded_rectangle(0., 0., 10., 4., 50.);
        let bounds = path.bounds().unwrap();
        assert_abs_diff_eq!(bounds.height(), 4., epsilon = 1e-6);
        assert_eq!(path.segments().last(), Some(&PathSegment::ClosePath));
    }
}
