//! Drawing with GDI+.
//!
//! GDI+ keeps the world transform on the `Graphics` and builds figures in `GraphicsPath`
//! objects. Arcs are given as a bounding box, a start angle and a sweep, all in degrees turning
//! clockwise on a y-down surface, so they map onto the neutral arcs without conversion. Dash
//! lengths are in multiples of the pen width. Gradients have no extend mode and path gradients
//! run from the boundary inward, so color stops are padded and remapped.

use crate::ffi::*;
use cgmath::{Matrix3, Point2};
use weft_core::context::{ContextBackend, Dash, FillRule, GraphicsState, LineCap, LineJoin};
use weft_core::gradient::{ColorStop, Gradient, GradientKind, Paint, Pattern};
use weft_core::image::Image;
use weft_core::path::{self, Path, PathSegment};
use weft_core::text::PreparedText;
use weft_core::{Color, Rect, Result, ToolkitType};

/// Interpolation colors with stops at exactly 0 and 1.
fn padded(mut stops: Vec<(f64, ARGB)>) -> (Vec<ARGB>, Vec<f64>) {
    if let Some(&(first, color)) = stops.first() {
        if first > 0. {
            stops.insert(0, (0., color));
        }
    }
    if let Some(&(last, color)) = stops.last() {
        if last < 1. {
            stops.push((1., color));
        }
    }
    stops.into_iter().map(|(p, c)| (c, p)).unzip()
}

fn argb_stops(stops: &[ColorStop], alpha: f64) -> Vec<(f64, ARGB)> {
    stops
        .iter()
        .map(|s| (s.position.max(0.).min(1.), ARGB::from_color(s.color, alpha)))
        .collect()
}

/// The GDI+ brush for a gradient.
///
/// A radial gradient becomes a path gradient on its outer circle whose center color sits at the
/// inner circle’s center. A neutral position `t` lies on the circle of radius
/// `r0 + t (r1 - r0)`, which is `1 - r / r1` of the way from the boundary to the center.
pub(crate) fn gradient_brush(gradient: &Gradient, alpha: f64) -> Brush {
    let stops = gradient.sorted_stops();
    let last = match stops.last() {
        Some(stop) => stop.color,
        None => return Brush::Solid(ARGB::from_color(Color::TRANSPARENT, 1.)),
    };
    match gradient.kind() {
        GradientKind::Linear { start, end } => {
            if start == end {
                return Brush::Solid(ARGB::from_color(last, alpha));
            }
            let (colors, positions) = padded(argb_stops(&stops, alpha));
            Brush::LinearGradient {
                start: start.into(),
                end: end.into(),
                colors,
                positions,
            }
        }
        GradientKind::Radial {
            center0,
            radius0,
            center1,
            radius1,
        } => {
            if radius1 <= 0. {
                return Brush::Solid(ARGB::from_color(last, alpha));
            }
            let mut remapped: Vec<_> = stops
                .iter()
                .rev()
                .map(|s| {
                    let t = s.position.max(0.).min(1.);
                    let r = radius0 + t * (radius1 - radius0);
                    let p = (1. - r / radius1).max(0.).min(1.);
                    (p, ARGB::from_color(s.color, alpha))
                })
                .collect();
            remapped.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            let (colors, positions) = padded(remapped);
            Brush::PathGradient {
                ellipse: RectF {
                    x: center1.x - radius1,
                    y: center1.y - radius1,
                    width: radius1 * 2.,
                    height: radius1 * 2.,
                },
                center: center0.into(),
                colors,
                positions,
            }
        }
    }
}

fn brush(paint: &Paint, alpha: f64) -> Brush {
    match paint {
        Paint::Solid(color) => Brush::Solid(ARGB::from_color(*color, alpha)),
        Paint::Pattern(Pattern::Gradient(gradient)) => gradient_brush(gradient, alpha),
        Paint::Pattern(Pattern::Image { image, origin }) => Brush::Texture {
            image: image.clone(),
            origin: (*origin).into(),
            alpha,
        },
    }
}

/// Dash lengths and offset in pen widths. GDI+ rejects zero-length dashes.
fn pen_dash(dash: &Dash, width: f64) -> (Vec<f64>, f64) {
    if dash.is_solid() || width <= 0. {
        return (Vec::new(), 0.);
    }
    let pattern = dash.lengths.iter().map(|l| (l / width).max(1e-3)).collect();
    (pattern, dash.offset / width)
}

fn graphics_path(path: &Path, rule: FillRule) -> GraphicsPath {
    let mut out = GraphicsPath::new(match rule {
        FillRule::NonZero => FillMode::Winding,
        FillRule::EvenOdd => FillMode::Alternate,
    });
    let mut current: Option<Point2<f64>> = None;
    let mut figure_start: Option<Point2<f64>> = None;
    for segment in path.segments() {
        match *segment {
            PathSegment::MoveTo(p) => {
                out.start_figure();
                current = Some(p);
                figure_start = Some(p);
            }
            PathSegment::LineTo(p) => {
                if let Some(from) = current {
                    out.add_line(from.into(), p.into());
                }
                current = Some(p);
            }
            PathSegment::CurveTo(c1, c2, end) => {
                if let Some(from) = current {
                    out.add_bezier([from.into(), c1.into(), c2.into(), end.into()]);
                }
                current = Some(end);
            }
            PathSegment::Arc {
                center,
                radius,
                angle1,
                angle2,
                ..
            } => {
                let start = path::arc_point(center, radius, angle1);
                if current.is_none() {
                    out.start_figure();
                    figure_start = Some(start);
                }
                if radius > 0. {
                    out.add_arc(
                        RectF {
                            x: center.x - radius,
                            y: center.y - radius,
                            width: radius * 2.,
                            height: radius * 2.,
                        },
                        angle1,
                        angle2 - angle1,
                    );
                } else if let Some(from) = current {
                    out.add_line(from.into(), center.into());
                }
                current = Some(path::arc_point(center, radius, angle2));
            }
            PathSegment::ClosePath => {
                out.close_figure();
                current = figure_start;
            }
        }
    }
    out
}

fn rect_path(x: f64, y: f64, width: f64, height: f64) -> GraphicsPath {
    let mut path = Path::new();
    path.rectangle(x, y, width, height);
    graphics_path(&path, FillRule::NonZero)
}

/// A [`ContextBackend`] on a GDI+ `Graphics`.
#[derive(Debug)]
pub struct GdiPlusContext {
    graphics: Box<dyn Graphics>,
    /// The world transform last set, if known.
    matrix: Option<Matrix3<f64>>,
    saved: Vec<(u32, Option<Matrix3<f64>>)>,
}

impl GdiPlusContext {
    pub fn new(graphics: Box<dyn Graphics>) -> GdiPlusContext {
        GdiPlusContext {
            graphics,
            matrix: None,
            saved: Vec::new(),
        }
    }

    fn apply_matrix(&mut self, m: Matrix3<f64>) {
        if self.matrix != Some(m) {
            self.graphics.set_transform(m.into());
            self.matrix = Some(m);
        }
    }
}

impl ContextBackend for GdiPlusContext {
    fn toolkit(&self) -> ToolkitType {
        ToolkitType::WinForms
    }

    fn save(&mut self) -> Result<()> {
        let token = self.graphics.save();
        self.saved.push((token, self.matrix));
        Ok(())
    }

    fn restore(&mut self, _state: &GraphicsState) -> Result<()> {
        if let Some((token, matrix)) = self.saved.pop() {
            self.graphics.restore(token);
            self.matrix = matrix;
        }
        Ok(())
    }

    fn clip(&mut self, path: &Path, rule: FillRule, state: &GraphicsState) -> Result<()> {
        self.apply_matrix(state.transform);
        self.graphics.intersect_clip(&graphics_path(path, rule));
        Ok(())
    }

    fn reset_clip(&mut self, _state: &GraphicsState) -> Result<()> {
        self.graphics.reset_clip();
        Ok(())
    }

    fn fill(&mut self, path: &Path, state: &GraphicsState) -> Result<()> {
        self.apply_matrix(state.transform);
        let brush = brush(&state.paint, state.global_alpha);
        self.graphics
            .fill_path(&brush, &graphics_path(path, state.fill_rule));
        Ok(())
    }

    fn stroke(&mut self, path: &Path, state: &GraphicsState) -> Result<()> {
        self.apply_matrix(state.transform);
        let width = state.stroke_width();
        let (dash_pattern, dash_offset) = pen_dash(&state.dash, width);
        let pen = Pen {
            brush: brush(&state.paint, state.global_alpha),
            width,
            dash_pattern,
            dash_offset,
            line_cap: match state.line_cap {
                LineCap::Butt => crate::ffi::LineCap::Flat,
                LineCap::Round => crate::ffi::LineCap::Round,
                LineCap::Square => crate::ffi::LineCap::Square,
            },
            line_join: match state.line_join {
                LineJoin::Miter => crate::ffi::LineJoin::Miter,
                LineJoin::Round => crate::ffi::LineJoin::Round,
                LineJoin::Bevel => crate::ffi::LineJoin::Bevel,
            },
        };
        self.graphics
            .draw_path(&pen, &graphics_path(path, state.fill_rule));
        Ok(())
    }

    fn draw_text(&mut self, text: &PreparedText, origin: Point2<f64>, state: &GraphicsState) -> Result<()> {
        self.apply_matrix(state.transform);
        let default_color = state.text_color();
        for line in &text.lines {
            let y = origin.y + line.top;
            for run in &line.runs {
                let x = origin.x + line.x + run.x;
                if let Some(background) = run.background {
                    self.graphics.fill_path(
                        &Brush::Solid(ARGB::from_color(background, state.global_alpha)),
                        &rect_path(x, y, run.width, line.height),
                    );
                }
                let mut decoration = 0;
                if run.underline {
                    decoration |= FONT_STYLE_UNDERLINE;
                }
                if run.strikethrough {
                    decoration |= FONT_STYLE_STRIKEOUT;
                }
                let color = run.foreground.unwrap_or(default_color);
                self.graphics.draw_string(
                    &run.text,
                    &GpFont::new(&run.font, decoration),
                    &Brush::Solid(ARGB::from_color(color, state.global_alpha)),
                    PointF { x, y },
                );
            }
        }
        Ok(())
    }

    fn draw_image(&mut self, image: &Image, dest: Rect, alpha: f64, state: &GraphicsState) -> Result<()> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(());
        }
        self.apply_matrix(state.transform);
        self.graphics
            .draw_image(image, dest.into(), alpha * state.global_alpha);
        Ok(())
    }

    fn dispose(&mut self) {
        self.graphics.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{GpCall, GpLog, RecordingGraphics};
    use approx::assert_relative_eq;
    use std::sync::Arc;
    use weft_core::text::{Font, HeadlessMetrics, TextLayout};
    use weft_core::DrawingContext;

    fn context() -> (DrawingContext, GpLog) {
        let graphics = RecordingGraphics::new();
        let log = graphics.log();
        (
            DrawingContext::new(Box::new(GdiPlusContext::new(Box::new(graphics)))),
            log,
        )
    }

    fn calls(log: &GpLog) -> Vec<GpCall> {
        log.lock().clone()
    }

    fn last_path(log: &GpLog) -> GraphicsPath {
        calls(log)
            .into_iter()
            .rev()
            .find_map(|c| match c {
                GpCall::FillPath(_, path) | GpCall::DrawPath(_, path) => Some(path),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn arcs_become_bounding_box_and_sweep() {
        let (mut ctx, log) = context();
        ctx.arc(10., 10., 5., 0., 90.).unwrap();
        ctx.stroke().unwrap();
        ctx.arc_negative(10., 10., 5., 90., 0.).unwrap();
        ctx.stroke().unwrap();
        ctx.arc(0., 0., 2., 270., 90.).unwrap();
        ctx.stroke().unwrap();

        let arcs: Vec<_> = calls(&log)
            .into_iter()
            .filter_map(|c| match c {
                GpCall::DrawPath(_, path) => path.ops.into_iter().find_map(|op| match op {
                    PathOp::Arc(rect, start, sweep) => Some((rect, start, sweep)),
                    _ => None,
                }),
                _ => None,
            })
            .collect();
        assert_eq!(
            arcs[0],
            (
                RectF {
                    x: 5.,
                    y: 5.,
                    width: 10.,
                    height: 10.
                },
                0.,
                90.
            )
        );
        assert_eq!((arcs[1].1, arcs[1].2), (90., -90.));
        assert_eq!((arcs[2].1, arcs[2].2), (270., 180.));
    }

    #[test]
    fn lines_start_at_the_current_point() {
        let (mut ctx, log) = context();
        ctx.move_to(1., 1.).unwrap();
        ctx.line_to(5., 1.).unwrap();
        ctx.line_to(5., 5.).unwrap();
        ctx.close_path().unwrap();
        ctx.set_fill_rule(FillRule::EvenOdd).unwrap();
        ctx.fill().unwrap();
        let path = last_path(&log);
        assert_eq!(path.fill_mode, FillMode::Alternate);
        assert_eq!(
            path.ops,
            vec![
                PathOp::StartFigure,
                PathOp::Line(PointF { x: 1., y: 1. }, PointF { x: 5., y: 1. }),
                PathOp::Line(PointF { x: 5., y: 1. }, PointF { x: 5., y: 5. }),
                PathOp::CloseFigure,
            ]
        );
    }

    #[test]
    fn dashes_are_in_pen_widths() {
        let (mut ctx, log) = context();
        ctx.set_line_width(2.).unwrap();
        ctx.set_line_dash(4., &[6., 2.]).unwrap();
        ctx.set_line_cap(LineCap::Round).unwrap();
        ctx.move_to(0., 0.).unwrap();
        ctx.line_to(10., 0.).unwrap();
        ctx.stroke().unwrap();
        let pen = calls(&log)
            .into_iter()
            .find_map(|c| match c {
                GpCall::DrawPath(pen, _) => Some(pen),
                _ => None,
            })
            .unwrap();
        assert_eq!(pen.width, 2.);
        assert_eq!(pen.dash_pattern, vec![3., 1.]);
        assert_eq!(pen.dash_offset, 2.);
        assert_eq!(pen.line_cap, crate::ffi::LineCap::Round);
    }

    #[test]
    fn linear_gradients_are_padded() {
        let mut gradient = Gradient::linear(0., 0., 10., 0.);
        gradient
            .add_color_stop(0.75, Color::RED)
            .add_color_stop(0.25, Color::BLUE);
        match gradient_brush(&gradient, 1.) {
            Brush::LinearGradient {
                colors, positions, ..
            } => {
                assert_eq!(positions, vec![0., 0.25, 0.75, 1.]);
                let blue = ARGB::from_color(Color::BLUE, 1.);
                let red = ARGB::from_color(Color::RED, 1.);
                assert_eq!(colors, vec![blue, blue, red, red]);
            }
            other => panic!("unexpected brush {:?}", other),
        }
        let degenerate = Gradient::linear(3., 3., 3., 3.);
        assert_eq!(
            gradient_brush(&degenerate, 1.),
            Brush::Solid(ARGB::from_color(Color::TRANSPARENT, 1.))
        );
    }

    #[test]
    fn radial_gradients_run_from_the_boundary() {
        let mut gradient = Gradient::radial(50., 50., 10., 50., 50., 50.);
        gradient
            .add_color_stop(0., Color::WHITE)
            .add_color_stop(1., Color::BLACK);
        match gradient_brush(&gradient, 0.5) {
            Brush::PathGradient {
                ellipse,
                center,
                colors,
                positions,
            } => {
                assert_eq!(
                    ellipse,
                    RectF {
                        x: 0.,
                        y: 0.,
                        width: 100.,
                        height: 100.
                    }
                );
                assert_eq!(center, PointF { x: 50., y: 50. });
                assert_eq!(positions.len(), 3);
                assert_relative_eq!(positions[0], 0.);
                assert_relative_eq!(positions[1], 0.8);
                assert_relative_eq!(positions[2], 1.);
                assert_eq!(colors[0], ARGB::from_color(Color::BLACK, 0.5));
                assert_eq!(colors[2], ARGB::from_color(Color::WHITE, 0.5));
                assert_eq!(colors[0].alpha(), 128);
            }
            other => panic!("unexpected brush {:?}", other),
        }
    }

    #[test]
    fn save_tokens_restore_the_transform() {
        let (mut ctx, log) = context();
        ctx.save().unwrap();
        ctx.scale(2., 2.).unwrap();
        ctx.rectangle(0., 0., 1., 1.).unwrap();
        ctx.fill_preserve().unwrap();
        ctx.fill().unwrap();
        ctx.restore().unwrap();
        ctx.rectangle(0., 0., 1., 1.).unwrap();
        ctx.fill().unwrap();
        let log = calls(&log);
        assert_eq!(log[0], GpCall::Save(1));
        assert!(log.contains(&GpCall::Restore(1)));
        let transforms = log
            .iter()
            .filter(|c| matches!(c, GpCall::SetTransform(_)))
            .count();
        assert_eq!(transforms, 2);
    }

    #[test]
    fn text_decorations_are_font_styles() {
        let (mut ctx, log) = context();
        let mut layout = TextLayout::with_font(Arc::new(HeadlessMetrics), Font::new("Segoe UI", 10.));
        layout.set_text("ab cd");
        layout.set_strikethrough(0, 2).unwrap();
        layout.set_foreground(3, 2, Color::RED).unwrap();
        ctx.draw_text_layout(&layout, 4., 8.).unwrap();

        let strings: Vec<_> = calls(&log)
            .into_iter()
            .filter_map(|c| match c {
                GpCall::DrawString {
                    text,
                    font,
                    brush,
                    origin,
                } => Some((text, font.style, brush, origin)),
                _ => None,
            })
            .collect();
        assert_eq!(strings[0].0, "ab");
        assert_eq!(strings[0].1, FONT_STYLE_STRIKEOUT);
        assert_eq!(strings[0].3, PointF { x: 4., y: 8. });
        let last = strings.last().unwrap();
        assert_eq!(last.0, "cd");
        assert_eq!(last.2, Brush::Solid(ARGB::from_color(Color::RED, 1.)));
        assert_eq!(last.3, PointF { x: 19., y: 8. });
    }

    #[test]
    fn image_alpha_combines_with_global_alpha() {
        let (mut ctx, log) = context();
        ctx.set_global_alpha(0.5).unwrap();
        let image = Image::filled(2, 2, Color::WHITE);
        ctx.draw_image_rect(&image, Rect::from_xywh(1., 2., 4., 4.), 0.5).unwrap();
        ctx.dispose();
        let log = calls(&log);
        assert!(log.contains(&GpCall::DrawImage {
            dest: RectF {
                x: 1.,
                y: 2.,
                width: 4.,
                height: 4.
            },
            width: 2,
            height: 2,
            alpha: 0.25,
        }));
        assert_eq!(log.last(), Some(&GpCall::Dispose));
    }
}
