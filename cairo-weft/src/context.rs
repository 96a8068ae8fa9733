//! Drawing with Cairo.
//!
//! Cairo’s model is the closest to the neutral one: the CTM is mirrored with `cairo_set_matrix`
//! on top of the matrix `cr` came with (GTK hands `draw` a context already offset to the widget),
//! arcs map onto `cairo_arc`/`cairo_arc_negative` in radians, and dashes are in user units.

use crate::ffi::*;
use cgmath::{Deg, Matrix3, Point2, Rad};
use weft_core::context::{ContextBackend, FillRule, GraphicsState, LineCap, LineJoin};
use weft_core::gradient::{Gradient, GradientKind, Paint, Pattern};
use weft_core::image::Image;
use weft_core::path::{Path, PathSegment};
use weft_core::text::PreparedText;
use weft_core::{transform, Color, Rect, Result, ToolkitType};

fn radians(degrees: f64) -> f64 {
    let Rad(r) = Rad::from(Deg(degrees));
    r
}

/// Color stops in the order Cairo needs them, with an extra alpha factor applied.
pub(crate) fn cairo_stops(gradient: &Gradient, alpha: f64) -> Vec<CairoColorStop> {
    gradient
        .sorted_stops()
        .into_iter()
        .map(|stop| CairoColorStop {
            offset: stop.position,
            r: stop.color.r,
            g: stop.color.g,
            b: stop.color.b,
            a: stop.color.a * alpha,
        })
        .collect()
}

fn cairo_pattern(pattern: &Pattern, alpha: f64) -> CairoPattern {
    match pattern {
        Pattern::Gradient(gradient) => {
            let stops = cairo_stops(gradient, alpha);
            match gradient.kind() {
                GradientKind::Linear { start, end } => CairoPattern::Linear {
                    x0: start.x,
                    y0: start.y,
                    x1: end.x,
                    y1: end.y,
                    stops,
                },
                GradientKind::Radial {
                    center0,
                    radius0,
                    center1,
                    radius1,
                } => CairoPattern::Radial {
                    cx0: center0.x,
                    cy0: center0.y,
                    radius0,
                    cx1: center1.x,
                    cy1: center1.y,
                    radius1,
                    stops,
                },
            }
        }
        Pattern::Image { image, origin } => CairoPattern::Surface {
            image: image.clone(),
            x: origin.x,
            y: origin.y,
        },
    }
}

/// A [`ContextBackend`] on a Cairo context.
#[derive(Debug)]
pub struct CairoContext {
    cr: Box<dyn Cairo>,
    /// Device matrix of `cr` when it was handed over; neutral transforms are applied on top.
    base: Matrix3<f64>,
    /// The neutral transform last mirrored onto `cr`, if known.
    matrix: Option<Matrix3<f64>>,
    saved_matrices: Vec<Option<Matrix3<f64>>>,
}

impl CairoContext {
    pub fn new(cr: Box<dyn Cairo>) -> CairoContext {
        let base = cr.get_matrix().into();
        CairoContext {
            cr,
            base,
            matrix: None,
            saved_matrices: Vec::new(),
        }
    }

    fn apply_matrix(&mut self, m: Matrix3<f64>) {
        if self.matrix != Some(m) {
            self.cr.set_matrix((self.base * m).into());
            self.matrix = Some(m);
        }
    }

    fn set_color(&mut self, color: Color, alpha: f64) {
        self.cr.set_source_rgba(color.r, color.g, color.b, color.a * alpha);
    }

    /// Sets the source; returns true if the operation must be wrapped in a group to apply the
    /// global alpha.
    fn apply_paint(&mut self, state: &GraphicsState) -> bool {
        match &state.paint {
            Paint::Solid(color) => {
                self.set_color(*color, state.global_alpha);
                false
            }
            Paint::Pattern(pattern @ Pattern::Gradient(_)) => {
                self.cr.set_source(cairo_pattern(pattern, state.global_alpha));
                false
            }
            Paint::Pattern(pattern @ Pattern::Image { .. }) => {
                let group = state.global_alpha < 1.;
                if group {
                    self.cr.push_group();
                }
                self.cr.set_source(cairo_pattern(pattern, 1.));
                group
            }
        }
    }

    fn end_group(&mut self, group: bool, alpha: f64) {
        if group {
            self.cr.pop_group_to_source();
            self.cr.paint_with_alpha(alpha);
        }
    }

    fn append_path(&mut self, path: &Path) {
        self.cr.new_path();
        for segment in path.segments() {
            match *segment {
                PathSegment::MoveTo(p) => self.cr.move_to(p.x, p.y),
                PathSegment::LineTo(p) => self.cr.line_to(p.x, p.y),
                PathSegment::CurveTo(a, b, c) => self.cr.curve_to(a.x, a.y, b.x, b.y, c.x, c.y),
                PathSegment::Arc {
                    center,
                    radius,
                    angle1,
                    angle2,
                    negative,
                } => {
                    let (a1, a2) = (radians(angle1), radians(angle2));
                    if negative {
                        self.cr.arc_negative(center.x, center.y, radius, a1, a2);
                    } else {
                        self.cr.arc(center.x, center.y, radius, a1, a2);
                    }
                }
                PathSegment::ClosePath => self.cr.close_path(),
            }
        }
    }

    fn set_fill_rule(&mut self, rule: FillRule) {
        self.cr.set_fill_rule(match rule {
            FillRule::NonZero => CairoFillRule::Winding,
            FillRule::EvenOdd => CairoFillRule::EvenOdd,
        });
    }
}

impl ContextBackend for CairoContext {
    fn toolkit(&self) -> ToolkitType {
        ToolkitType::Gtk
    }

    fn save(&mut self) -> Result<()> {
        self.cr.save();
        self.saved_matrices.push(self.matrix);
        Ok(())
    }

    fn restore(&mut self, _state: &GraphicsState) -> Result<()> {
        self.cr.restore();
        self.matrix = self.saved_matrices.pop().unwrap_or(None);
        Ok(())
    }

    fn clip(&mut self, path: &Path, rule: FillRule, state: &GraphicsState) -> Result<()> {
        self.apply_matrix(state.transform);
        self.set_fill_rule(rule);
        self.append_path(path);
        self.cr.clip();
        Ok(())
    }

    fn reset_clip(&mut self, _state: &GraphicsState) -> Result<()> {
        self.cr.reset_clip();
        Ok(())
    }

    fn fill(&mut self, path: &Path, state: &GraphicsState) -> Result<()> {
        self.apply_matrix(state.transform);
        let group = self.apply_paint(state);
        self.set_fill_rule(state.fill_rule);
        self.append_path(path);
        self.cr.fill();
        self.end_group(group, state.global_alpha);
        Ok(())
    }

    fn stroke(&mut self, path: &Path, state: &GraphicsState) -> Result<()> {
        self.apply_matrix(state.transform);
        let group = self.apply_paint(state);
        self.cr.set_line_width(state.stroke_width());
        self.cr.set_dash(&state.dash.lengths, state.dash.offset);
        self.cr.set_line_cap(match state.line_cap {
            LineCap::Butt => CairoLineCap::Butt,
            LineCap::Round => CairoLineCap::Round,
            LineCap::Square => CairoLineCap::Square,
        });
        self.cr.set_line_join(match state.line_join {
            LineJoin::Miter => CairoLineJoin::Miter,
            LineJoin::Round => CairoLineJoin::Round,
            LineJoin::Bevel => CairoLineJoin::Bevel,
        });
        self.append_path(path);
        self.cr.stroke();
        self.end_group(group, state.global_alpha);
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
                    self.set_color(background, state.global_alpha);
                    self.cr.new_path();
                    self.cr.rectangle(x, y, run.width, line.height);
                    self.cr.fill();
                }
                self.set_color(run.foreground.unwrap_or(default_color), state.global_alpha);
                self.cr.new_path();
                self.cr.move_to(x, y);
                self.cr.show_layout(
                    &run.text,
                    &PangoFontDescription::from(&run.font),
                    PangoAttrs {
                        underline: run.underline,
                        strikethrough: run.strikethrough,
                    },
                );
            }
        }
        Ok(())
    }

    fn draw_image(&mut self, image: &Image, dest: Rect, alpha: f64, state: &GraphicsState) -> Result<()> {
        let size = image.size();
        if size.x == 0. || size.y == 0. {
            return Ok(());
        }
        let m = self.base
            * state.transform
            * transform::translation(dest.x(), dest.y())
            * transform::scaling(dest.width() / size.x, dest.height() / size.y);
        self.cr.save();
        self.cr.set_matrix(m.into());
        self.cr.set_source_image(image, 0., 0.);
        self.cr.paint_with_alpha(alpha * state.global_alpha);
        self.cr.restore();
        Ok(())
    }

    fn dispose(&mut self) {
        self.cr.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{CairoCall, CairoLog, RecordingCairo};
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;
    use std::sync::Arc;
    use weft_core::text::{Font, HeadlessMetrics, TextLayout};
    use weft_core::DrawingContext;

    fn context() -> (DrawingContext, CairoLog) {
        let cr = RecordingCairo::new();
        let log = cr.log();
        (DrawingContext::new(Box::new(CairoContext::new(Box::new(cr)))), log)
    }

    fn calls(log: &CairoLog) -> Vec<CairoCall> {
        log.lock().clone()
    }

    #[test]
    fn arcs_use_radians_in_the_same_direction() {
        let (mut ctx, log) = context();
        ctx.arc(10., 10., 5., 0., 90.).unwrap();
        ctx.arc_negative(10., 10., 5., 90., 0.).unwrap();
        ctx.stroke().unwrap();
        let arcs: Vec<_> = calls(&log)
            .into_iter()
            .filter_map(|c| match c {
                CairoCall::Arc {
                    angle1,
                    angle2,
                    negative,
                    ..
                } => Some((angle1, angle2, negative)),
                _ => None,
            })
            .collect();
        assert_eq!(arcs.len(), 2);
        assert_abs_diff_eq!(arcs[0].1, PI / 2., epsilon = 1e-12);
        assert!(!arcs[0].2);
        assert_abs_diff_eq!(arcs[1].0, PI / 2., epsilon = 1e-12);
        assert!(arcs[1].2);
    }

    #[test]
    fn gradient_stops_are_sorted() {
        let (mut ctx, log) = context();
        let mut gradient = Gradient::linear(0., 0., 100., 0.);
        gradient
            .add_color_stop(1., Color::RED)
            .add_color_stop(0., Color::BLUE)
            .add_color_stop(0.5, Color::GREEN);
        ctx.set_pattern(gradient).unwrap();
        ctx.rectangle(0., 0., 100., 10.).unwrap();
        ctx.fill().unwrap();

        let stops = calls(&log)
            .into_iter()
            .find_map(|c| match c {
                CairoCall::SetSource(CairoPattern::Linear { stops, .. }) => Some(stops),
                _ => None,
            })
            .unwrap();
        let order: Vec<_> = stops.iter().map(|s| (s.offset, s.r, s.g, s.b)).collect();
        assert_eq!(
            order,
            vec![(0., 0., 0., 1.), (0.5, 0., 1., 0.), (1., 1., 0., 0.)]
        );
    }

    #[test]
    fn transform_is_mirrored_once() {
        let (mut ctx, log) = context();
        ctx.translate(5., 0.).unwrap();
        ctx.rectangle(0., 0., 1., 1.).unwrap();
        ctx.fill_preserve().unwrap();
        ctx.fill().unwrap();
        let matrices: Vec<_> = calls(&log)
            .into_iter()
            .filter_map(|c| match c {
                CairoCall::SetMatrix(m) => Some(m),
                _ => None,
            })
            .collect();
        assert_eq!(matrices.len(), 1);
        assert_eq!(matrices[0].x0, 5.);
    }

    #[test]
    fn keeps_the_device_matrix() {
        let cr = RecordingCairo::with_matrix(transform::translation(30., 40.).into());
        let log = cr.log();
        let mut ctx = DrawingContext::new(Box::new(CairoContext::new(Box::new(cr))));
        ctx.rectangle(0., 0., 10., 10.).unwrap();
        ctx.fill().unwrap();
        ctx.translate(5., 0.).unwrap();
        ctx.rectangle(0., 0., 10., 10.).unwrap();
        ctx.fill().unwrap();
        let offsets: Vec<_> = calls(&log)
            .into_iter()
            .filter_map(|c| match c {
                CairoCall::SetMatrix(m) => Some((m.x0, m.y0)),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![(30., 40.), (35., 40.)]);
    }

    #[test]
    fn hairlines_and_dashes() {
        let (mut ctx, log) = context();
        ctx.scale(2., 2.).unwrap();
        ctx.set_line_width(0.).unwrap();
        ctx.set_line_dash(1., &[3., 1.]).unwrap();
        ctx.move_to(0., 0.).unwrap();
        ctx.line_to(4., 0.).unwrap();
        ctx.stroke().unwrap();
        let log = calls(&log);
        assert!(log.contains(&CairoCall::SetLineWidth(0.5)));
        assert!(log.contains(&CairoCall::SetDash(vec![3., 1.], 1.)));
        assert_eq!(log.last(), Some(&CairoCall::Stroke));
    }

    #[test]
    fn restore_forgets_the_matrix() {
        let (mut ctx, log) = context();
        ctx.save().unwrap();
        ctx.translate(1., 1.).unwrap();
        ctx.rectangle(0., 0., 1., 1.).unwrap();
        ctx.fill().unwrap();
        ctx.restore().unwrap();
        ctx.rectangle(0., 0., 1., 1.).unwrap();
        ctx.fill().unwrap();
        let count = calls(&log)
            .iter()
            .filter(|c| matches!(c, CairoCall::SetMatrix(_)))
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn text_runs_are_shown_with_their_style() {
        let (mut ctx, log) = context();
        let mut layout = TextLayout::with_font(Arc::new(HeadlessMetrics), Font::new("Sans", 10.));
        layout.set_text("ab cd");
        layout.set_underline(3, 2).unwrap();
        layout.set_background(0, 2, Color::GREEN).unwrap();
        ctx.draw_text_layout(&layout, 10., 20.).unwrap();

        let log = calls(&log);
        assert!(log.contains(&CairoCall::Rectangle([10., 20., 10., 12.])));
        let shown: Vec<_> = log
            .iter()
            .filter_map(|c| match c {
                CairoCall::ShowLayout { text, attrs, .. } => Some((text.clone(), attrs.underline)),
                _ => None,
            })
            .collect();
        assert_eq!(
            shown,
            vec![("ab".to_string(), false), (" ".to_string(), false), ("cd".to_string(), true)]
        );
        assert!(log.contains(&CairoCall::MoveTo(25., 20.)));
    }

    #[test]
    fn images_are_scaled_into_place() {
        let (mut ctx, log) = context();
        let image = Image::filled(4, 2, Color::WHITE);
        ctx.draw_image_rect(&image, Rect::from_xywh(10., 10., 8., 8.), 0.5).unwrap();
        let log = calls(&log);
        let matrix = log
            .iter()
            .find_map(|c| match c {
                CairoCall::SetMatrix(m) => Some(*m),
                _ => None,
            })
            .unwrap();
        assert_eq!((matrix.xx, matrix.yy, matrix.x0, matrix.y0), (2., 4., 10., 10.));
        assert!(log.contains(&CairoCall::PaintWithAlpha(0.5)));
    }
}
