//! Drawing with Core Graphics.
//!
//! Contexts handed to this backend are flipped (y down), either by AppKit for flipped views or by
//! the toolkit for bitmap contexts. Core Graphics has no way to set the CTM, so the neutral
//! transform is mirrored by concatenating the difference to the last one. Patterns are painted by
//! clipping to the shape and drawing the gradient or tiled image into the clip.
//!
//! The clip can only be widened by restoring a gstate saved before it was narrowed, so the context
//! is wrapped in a base gstate that [`ContextBackend::reset_clip`] unwinds to.

use crate::ffi::*;
use cgmath::{Deg, Matrix3, Rad};
use std::sync::Arc;
use weft_core::context::{ContextBackend, FillRule, GraphicsState, LineCap, LineJoin};
use weft_core::gradient::{GradientKind, Paint, Pattern};
use weft_core::image::Image;
use weft_core::path::{Path, PathSegment};
use weft_core::text::PreparedText;
use weft_core::{transform, Point2, Rect, Result, ToolkitType};

const GRADIENT_EXTEND: u32 = K_CG_GRADIENT_DRAWS_BEFORE_START_LOCATION | K_CG_GRADIENT_DRAWS_AFTER_END_LOCATION;

fn radians(degrees: f64) -> f64 {
    let Rad(r) = Rad::from(Deg(degrees));
    r
}

fn fill_rule(rule: FillRule) -> CGPathFillRule {
    match rule {
        FillRule::NonZero => CGPathFillRule::Winding,
        FillRule::EvenOdd => CGPathFillRule::EvenOdd,
    }
}

/// A gstate pushed by `save`.
#[derive(Debug, Clone, Copy)]
struct SavedGState {
    ctm: Matrix3<f64>,
    /// Re-pushed by `reset_clip` without its clip, which `restore` must apply again.
    unclipped: bool,
}

/// A [`ContextBackend`] on a flipped Core Graphics context.
#[derive(Debug)]
pub struct QuartzContext {
    cg: Box<dyn CGContext>,
    core_text: Arc<dyn CoreText>,
    /// The transform concatenated onto the context’s base CTM.
    ctm: Matrix3<f64>,
    saved: Vec<SavedGState>,
}

impl QuartzContext {
    pub fn new(mut cg: Box<dyn CGContext>, core_text: Arc<dyn CoreText>) -> QuartzContext {
        cg.save_gstate();
        QuartzContext {
            cg,
            core_text,
            ctm: transform::identity(),
            saved: Vec::new(),
        }
    }

    /// Brings the native CTM to `m`. Returns false if `m` is singular, in which case nothing
    /// would be visible and the CTM is left alone.
    fn apply_transform(&mut self, m: Matrix3<f64>) -> bool {
        if self.ctm == m {
            return true;
        }
        if transform::invert(&m).is_none() {
            return false;
        }
        let inverse = match transform::invert(&self.ctm) {
            Some(inverse) => inverse,
            None => return false,
        };
        self.cg.concat_ctm((inverse * m).into());
        self.ctm = m;
        true
    }

    fn add_path(&mut self, path: &Path) {
        self.cg.begin_path();
        for segment in path.segments() {
            match *segment {
                PathSegment::MoveTo(p) => self.cg.move_to_point(p.x, p.y),
                PathSegment::LineTo(p) => self.cg.add_line_to_point(p.x, p.y),
                PathSegment::CurveTo(a, b, c) => self.cg.add_curve_to_point(a.x, a.y, b.x, b.y, c.x, c.y),
                PathSegment::Arc {
                    center,
                    radius,
                    angle1,
                    angle2,
                    negative,
                } => {
                    // y is flipped, so positive arcs run counterclockwise in y-up terms
                    self.cg.add_arc(
                        center.x,
                        center.y,
                        radius,
                        radians(angle1),
                        radians(angle2),
                        negative,
                    );
                }
                PathSegment::ClosePath => self.cg.close_path(),
            }
        }
    }

    /// Paints a pattern into the current clip.
    fn draw_pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Gradient(gradient) => {
                let stops = gradient.sorted_stops();
                if stops.is_empty() {
                    return;
                }
                let cg_gradient = CGGradient {
                    colors: stops.iter().map(|s| s.color.into()).collect(),
                    locations: stops.iter().map(|s| s.position).collect(),
                };
                match gradient.kind() {
                    GradientKind::Linear { start, end } => {
                        self.cg
                            .draw_linear_gradient(&cg_gradient, start.into(), end.into(), GRADIENT_EXTEND)
                    }
                    GradientKind::Radial {
                        center0,
                        radius0,
                        center1,
                        radius1,
                    } => self.cg.draw_radial_gradient(
                        &cg_gradient,
                        center0.into(),
                        radius0,
                        center1.into(),
                        radius1,
                        GRADIENT_EXTEND,
                    ),
                }
            }
            Pattern::Image { image, origin } => {
                let size = image.size();
                // tiles are drawn y-up
                self.cg.concat_ctm(CGAffineTransform::FLIP);
                self.cg.draw_tiled_image(
                    CGRect::new(origin.x, -origin.y - size.y, size.x, size.y),
                    image,
                );
            }
        }
    }

    fn set_stroke_style(&mut self, state: &GraphicsState) {
        self.cg.set_line_width(state.stroke_width());
        self.cg.set_line_dash(state.dash.offset, &state.dash.lengths);
        self.cg.set_line_cap(match state.line_cap {
            LineCap::Butt => CGLineCap::Butt,
            LineCap::Round => CGLineCap::Round,
            LineCap::Square => CGLineCap::Square,
        });
        self.cg.set_line_join(match state.line_join {
            LineJoin::Miter => CGLineJoin::Miter,
            LineJoin::Round => CGLineJoin::Round,
            LineJoin::Bevel => CGLineJoin::Bevel,
        });
    }
}

impl ContextBackend for QuartzContext {
    fn toolkit(&self) -> ToolkitType {
        ToolkitType::Cocoa
    }

    fn save(&mut self) -> Result<()> {
        self.cg.save_gstate();
        self.saved.push(SavedGState {
            ctm: self.ctm,
            unclipped: false,
        });
        Ok(())
    }

    fn restore(&mut self, state: &GraphicsState) -> Result<()> {
        self.cg.restore_gstate();
        if let Some(saved) = self.saved.pop() {
            self.ctm = saved.ctm;
            if saved.unclipped {
                for clip in &state.clip {
                    self.add_path(&clip.path);
                    self.cg.clip(fill_rule(clip.fill_rule));
                }
            }
        }
        Ok(())
    }

    fn clip(&mut self, path: &Path, rule: FillRule, state: &GraphicsState) -> Result<()> {
        if !self.apply_transform(state.transform) {
            return Ok(());
        }
        self.add_path(path);
        self.cg.clip(fill_rule(rule));
        Ok(())
    }

    fn reset_clip(&mut self, _state: &GraphicsState) -> Result<()> {
        for _ in 0..=self.saved.len() {
            self.cg.restore_gstate();
        }
        self.cg.save_gstate();
        for saved in &mut self.saved {
            self.cg.save_gstate();
            *saved = SavedGState {
                ctm: transform::identity(),
                unclipped: true,
            };
        }
        self.ctm = transform::identity();
        Ok(())
    }

    fn fill(&mut self, path: &Path, state: &GraphicsState) -> Result<()> {
        if !self.apply_transform(state.transform) {
            return Ok(());
        }
        match &state.paint {
            Paint::Solid(color) => {
                self.cg.set_fill_color((*color).into());
                self.cg.set_alpha(state.global_alpha);
                self.add_path(path);
                self.cg.fill_path(fill_rule(state.fill_rule));
            }
            Paint::Pattern(pattern) => {
                self.cg.save_gstate();
                self.add_path(path);
                self.cg.clip(fill_rule(state.fill_rule));
                self.cg.set_alpha(state.global_alpha);
                self.draw_pattern(pattern);
                self.cg.restore_gstate();
            }
        }
        Ok(())
    }

    fn stroke(&mut self, path: &Path, state: &GraphicsState) -> Result<()> {
        if !self.apply_transform(state.transform) {
            return Ok(());
        }
        self.set_stroke_style(state);
        match &state.paint {
            Paint::Solid(color) => {
                self.cg.set_stroke_color((*color).into());
                self.cg.set_alpha(state.global_alpha);
                self.add_path(path);
                self.cg.stroke_path();
            }
            Paint::Pattern(pattern) => {
                self.cg.save_gstate();
                self.add_path(path);
                self.cg.replace_path_with_stroked_path();
                self.cg.clip(CGPathFillRule::Winding);
                self.cg.set_alpha(state.global_alpha);
                self.draw_pattern(pattern);
                self.cg.restore_gstate();
            }
        }
        Ok(())
    }

    fn draw_text(&mut self, text: &PreparedText, origin: Point2<f64>, state: &GraphicsState) -> Result<()> {
        if !self.apply_transform(state.transform) {
            return Ok(());
        }
        let default_color = state.text_color();
        self.cg.set_alpha(state.global_alpha);
        // glyphs would be upside down in the flipped context
        self.cg.set_text_matrix(CGAffineTransform::FLIP);
        for line in &text.lines {
            let top = origin.y + line.top;
            let baseline = origin.y + line.baseline;
            for run in &line.runs {
                let x = origin.x + line.x + run.x;
                let color = run.foreground.unwrap_or(default_color);
                if let Some(background) = run.background {
                    self.cg.set_fill_color(background.into());
                    self.cg.begin_path();
                    self.cg.add_rect(CGRect::new(x, top, run.width, line.height));
                    self.cg.fill_path(CGPathFillRule::Winding);
                }
                let font = CTFontDescriptor::from(&run.font);
                self.cg.set_fill_color(color.into());
                self.cg.set_text_position(x, baseline);
                self.cg.show_line(
                    &run.text,
                    &font,
                    CTLineAttrs {
                        underline: run.underline,
                    },
                );
                if run.strikethrough {
                    let metrics = self.core_text.font_metrics(&font);
                    let thickness = metrics.underline_thickness;
                    self.cg.begin_path();
                    self.cg.add_rect(CGRect::new(
                        x,
                        baseline - metrics.x_height / 2. - thickness / 2.,
                        run.width,
                        thickness,
                    ));
                    self.cg.fill_path(CGPathFillRule::Winding);
                }
            }
        }
        Ok(())
    }

    fn draw_image(&mut self, image: &Image, dest: Rect, alpha: f64, state: &GraphicsState) -> Result<()> {
        if !self.apply_transform(state.transform) {
            return Ok(());
        }
        self.cg.save_gstate();
        // images are drawn y-up
        self.cg.concat_ctm(
            (transform::translation(dest.x(), dest.y() + dest.height()) * transform::scaling(1., -1.)).into(),
        );
        self.cg.set_alpha(alpha * state.global_alpha);
        self.cg
            .draw_image(CGRect::new(0., 0., dest.width(), dest.height()), image);
        self.cg.restore_gstate();
        Ok(())
    }

    fn dispose(&mut self) {
        for _ in 0..=self.saved.len() {
            self.cg.restore_gstate();
        }
        self.saved.clear();
        self.cg.release();
    }
}
