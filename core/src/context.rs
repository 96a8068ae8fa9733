//! Drawing contexts.
//!
//! A [`DrawingContext`] holds the neutral graphics state (paint, line style, font, transform,
//! clip), the path under construction and the save stack. Drawing operations are forwarded to
//! a [`ContextBackend`], which maps them onto a native graphics API.
//!
//! # Transforms
//! The context tracks the current transformation matrix (CTM). `translate`, `rotate` and `scale`
//! compose in source order, i.e. the last call applies first to the coordinates it transforms.
//! Path points are stored in user space and consumed under the CTM in effect when the path is
//! filled, stroked or clipped. Clip paths are converted to device space when `clip` is called, so
//! later transforms do not move the clip.
//!
//! # Save and restore
//! `save` pushes a snapshot of the [`GraphicsState`]; the path under construction is not part of
//! it and survives `restore`.

use crate::backend::ToolkitType;
use crate::color::Color;
use crate::error::{Error, Result};
use crate::gradient::{Paint, Pattern};
use crate::image::Image;
use crate::path::Path;
use crate::rect::Rect;
use crate::text::{Font, PreparedText, TextLayout};
use crate::transform;
use cgmath::{Matrix3, Point2};
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

/// Decides which regions of a self-intersecting path are inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

/// A dash pattern. An empty list of lengths draws solid lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dash {
    pub offset: f64,
    pub lengths: Vec<f64>,
}

impl Dash {
    pub fn is_solid(&self) -> bool {
        self.lengths.is_empty()
    }
}

/// A clip path, in device space.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPath {
    pub path: Path,
    pub fill_rule: FillRule,
}

/// The state snapshotted by `save` and restored by `restore`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub paint: Paint,
    pub line_width: f64,
    pub dash: Dash,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub fill_rule: FillRule,
    pub font: Font,
    /// User space to device space.
    pub transform: Matrix3<f64>,
    pub global_alpha: f64,
    /// Clip paths in the order they were applied; the clip region is their intersection.
    pub clip: Vec<ClipPath>,
}

impl Default for GraphicsState {
    fn default() -> GraphicsState {
        GraphicsState {
            paint: Paint::default(),
            line_width: 1.,
            dash: Dash::default(),
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            fill_rule: FillRule::NonZero,
            font: Font::default(),
            transform: transform::identity(),
            global_alpha: 1.,
            clip: Vec::new(),
        }
    }
}

impl GraphicsState {
    /// The line width to stroke with, in user units.
    ///
    /// A line width of zero is a hairline of one device pixel.
    pub fn stroke_width(&self) -> f64 {
        if self.line_width > 0. {
            return self.line_width;
        }
        let scale = transform::scale_factor(&self.transform);
        if scale > 0. {
            1. / scale
        } else {
            1.
        }
    }

    /// The color text is drawn with when a run has no foreground attribute.
    pub fn text_color(&self) -> Color {
        self.paint.solid_color().unwrap_or(Color::BLACK)
    }
}

/// A native graphics context.
///
/// Paths are passed in user space; `state.transform` is the CTM to draw them under.
pub trait ContextBackend: fmt::Debug {
    fn toolkit(&self) -> ToolkitType;

    /// Pushes the native graphics state.
    fn save(&mut self) -> Result<()>;

    /// Pops the native graphics state. `state` is the neutral state after the restore.
    fn restore(&mut self, state: &GraphicsState) -> Result<()>;

    /// Intersects the native clip with the interior of a path.
    fn clip(&mut self, path: &Path, rule: FillRule, state: &GraphicsState) -> Result<()>;

    /// Clears the native clip. `state.clip` has already been emptied.
    fn reset_clip(&mut self, state: &GraphicsState) -> Result<()>;

    fn fill(&mut self, path: &Path, state: &GraphicsState) -> Result<()>;

    fn stroke(&mut self, path: &Path, state: &GraphicsState) -> Result<()>;

    /// Draws laid out text with its top-left corner at `origin` (user space).
    fn draw_text(&mut self, text: &PreparedText, origin: Point2<f64>, state: &GraphicsState) -> Result<()>;

    fn draw_image(&mut self, image: &Image, dest: Rect, alpha: f64, state: &GraphicsState) -> Result<()>;

    /// Releases the native context. Called exactly once.
    fn dispose(&mut self);
}

/// A drawing context for one drawing session.
///
/// The native context is released by [`DrawingContext::dispose`] or when the context is
/// dropped, whichever comes first.
pub struct DrawingContext {
    backend: Option<Box<dyn ContextBackend>>,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    path: Path,
}

impl fmt::Debug for DrawingContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DrawingContext")
            .field("backend", &self.backend)
            .field("depth", &self.stack.len())
            .field("path_len", &self.path.len())
            .finish()
    }
}

impl DrawingContext {
    pub fn new(backend: Box<dyn ContextBackend>) -> DrawingContext {
        DrawingContext {
            backend: Some(backend),
            state: GraphicsState::default(),
            stack: Vec::new(),
            path: Path::new(),
        }
    }

    fn backend(&mut self) -> Result<&mut dyn ContextBackend> {
        match &mut self.backend {
            Some(backend) => Ok(backend.as_mut()),
            None => Err(Error::Disposed),
        }
    }

    fn check(&self) -> Result<()> {
        if self.backend.is_some() {
            Ok(())
        } else {
            Err(Error::Disposed)
        }
    }

    pub fn toolkit(&self) -> Result<ToolkitType> {
        match &self.backend {
            Some(backend) => Ok(backend.toolkit()),
            None => Err(Error::Disposed),
        }
    }

    /// The current graphics state.
    pub fn state(&self) -> &GraphicsState {
        &self.state
    }

    /// Number of unmatched `save` calls.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.backend.is_none()
    }

    /// Releases the native context. Calling this again does nothing; any other operation fails
    /// with [`Error::Disposed`] afterwards.
    pub fn dispose(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            if !self.stack.is_empty() {
                log::debug!("disposing context with {} unmatched saves", self.stack.len());
            }
            backend.dispose();
        }
    }

    pub fn save(&mut self) -> Result<()> {
        self.backend()?.save()?;
        self.stack.push(self.state.clone());
        Ok(())
    }

    /// Restores the state saved by the matching `save`.
    pub fn restore(&mut self) -> Result<()> {
        self.check()?;
        let state = self.stack.pop().ok_or(Error::UnbalancedRestore)?;
        self.state = state;
        let state = self.state.clone();
        self.backend()?.restore(&state)
    }

    // path construction

    /// Discards the current path.
    pub fn new_path(&mut self) -> Result<()> {
        self.check()?;
        self.path.clear();
        Ok(())
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.check()?;
        self.path.move_to(x, y);
        Ok(())
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.check()?;
        self.path.line_to(x, y);
        Ok(())
    }

    pub fn rel_move_to(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.check()?;
        self.path.rel_move_to(dx, dy)
    }

    pub fn rel_line_to(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.check()?;
        self.path.rel_line_to(dx, dy)
    }

    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) -> Result<()> {
        self.check()?;
        self.path.curve_to(x1, y1, x2, y2, x3, y3);
        Ok(())
    }

    pub fn rel_curve_to(
        &mut self,
        dx1: f64,
        dy1: f64,
        dx2: f64,
        dy2: f64,
        dx3: f64,
        dy3: f64,
    ) -> Result<()> {
        self.check()?;
        self.path.rel_curve_to(dx1, dy1, dx2, dy2, dx3, dy3)
    }

    /// Adds an arc; angles are in degrees, running from +x toward +y.
    pub fn arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) -> Result<()> {
        self.check()?;
        self.path.arc(xc, yc, radius, angle1, angle2);
        Ok(())
    }

    pub fn arc_negative(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) -> Result<()> {
        self.check()?;
        self.path.arc_negative(xc, yc, radius, angle1, angle2);
        Ok(())
    }

    pub fn close_path(&mut self) -> Result<()> {
        self.check()?;
        self.path.close_path();
        Ok(())
    }

    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        self.check()?;
        self.path.rectangle(x, y, width, height);
        Ok(())
    }

    pub fn rounded_rectangle(&mut self, x: f64, y: f64, width: f64, height: f64, radius: f64) -> Result<()> {
        self.check()?;
        self.path.rounded_rectangle(x, y, width, height, radius);
        Ok(())
    }

    pub fn append_path(&mut self, path: &Path) -> Result<()> {
        self.check()?;
        self.path.append_path(path);
        Ok(())
    }

    /// A copy of the current path, in user space.
    pub fn copy_path(&self) -> Result<Path> {
        self.check()?;
        Ok(self.path.clone())
    }

    pub fn current_point(&self) -> Result<Option<Point2<f64>>> {
        self.check()?;
        Ok(self.path.current_point())
    }

    // painting

    fn take_path(&mut self, preserve: bool) -> Path {
        if preserve {
            self.path.clone()
        } else {
            std::mem::replace(&mut self.path, Path::new())
        }
    }

    fn fill_impl(&mut self, preserve: bool) -> Result<()> {
        self.check()?;
        let path = self.take_path(preserve);
        if path.is_empty() {
            return Ok(());
        }
        let state = self.state.clone();
        self.backend()?.fill(&path, &state)
    }

    fn stroke_impl(&mut self, preserve: bool) -> Result<()> {
        self.check()?;
        let path = self.take_path(preserve);
        if path.is_empty() {
            return Ok(());
        }
        let state = self.state.clone();
        self.backend()?.stroke(&path, &state)
    }

    /// Fills the current path and clears it.
    pub fn fill(&mut self) -> Result<()> {
        self.fill_impl(false)
    }

    pub fn fill_preserve(&mut self) -> Result<()> {
        self.fill_impl(true)
    }

    /// Strokes the current path and clears it.
    pub fn stroke(&mut self) -> Result<()> {
        self.stroke_impl(false)
    }

    pub fn stroke_preserve(&mut self) -> Result<()> {
        self.stroke_impl(true)
    }

    // clipping

    fn clip_impl(&mut self, preserve: bool) -> Result<()> {
        self.check()?;
        let path = self.take_path(preserve);
        if path.is_empty() {
            return Ok(());
        }
        let rule = self.state.fill_rule;
        let state = self.state.clone();
        self.backend()?.clip(&path, rule, &state)?;
        self.state.clip.push(ClipPath {
            path: path.transformed(&self.state.transform),
            fill_rule: rule,
        });
        Ok(())
    }

    /// Intersects the clip region with the current path and clears the path.
    pub fn clip(&mut self) -> Result<()> {
        self.clip_impl(false)
    }

    pub fn clip_preserve(&mut self) -> Result<()> {
        self.clip_impl(true)
    }

    /// Resets the clip region to the whole surface.
    pub fn reset_clip(&mut self) -> Result<()> {
        self.check()?;
        self.state.clip.clear();
        let state = self.state.clone();
        self.backend()?.reset_clip(&state)
    }

    /// Device-space bounds of the clip region, or `None` if nothing is clipped.
    pub fn clip_extents(&self) -> Result<Option<Rect>> {
        self.check()?;
        let mut extents: Option<Rect> = None;
        for clip in &self.state.clip {
            let bounds = clip.path.bounds().unwrap_or_else(Rect::zero);
            extents = Some(match extents {
                None => bounds,
                Some(rect) => rect.intersect(bounds).unwrap_or_else(Rect::zero),
            });
        }
        Ok(extents)
    }

    // paint and line style

    pub fn set_color(&mut self, color: Color) -> Result<()> {
        self.check()?;
        self.state.paint = Paint::Solid(color);
        Ok(())
    }

    pub fn set_pattern<P: Into<Pattern>>(&mut self, pattern: P) -> Result<()> {
        self.check()?;
        self.state.paint = Paint::Pattern(pattern.into());
        Ok(())
    }

    /// Sets the line width; negative widths are clamped to zero (a hairline).
    pub fn set_line_width(&mut self, width: f64) -> Result<()> {
        self.check()?;
        self.state.line_width = if width > 0. { width } else { 0. };
        Ok(())
    }

    /// Sets the dash pattern. Negative lengths are clamped to zero; an empty pattern or one of
    /// only zeros draws solid lines.
    pub fn set_line_dash(&mut self, offset: f64, lengths: &[f64]) -> Result<()> {
        self.check()?;
        let lengths: Vec<f64> = lengths.iter().map(|&l| if l > 0. { l } else { 0. }).collect();
        self.state.dash = if lengths.iter().all(|&l| l == 0.) {
            Dash::default()
        } else {
            Dash { offset, lengths }
        };
        Ok(())
    }

    pub fn set_line_cap(&mut self, cap: LineCap) -> Result<()> {
        self.check()?;
        self.state.line_cap = cap;
        Ok(())
    }

    pub fn set_line_join(&mut self, join: LineJoin) -> Result<()> {
        self.check()?;
        self.state.line_join = join;
        Ok(())
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) -> Result<()> {
        self.check()?;
        self.state.fill_rule = rule;
        Ok(())
    }

    pub fn set_font(&mut self, font: Font) -> Result<()> {
        self.check()?;
        self.state.font = font;
        Ok(())
    }

    /// Sets the opacity applied to everything drawn, clamped to `0..=1`.
    pub fn set_global_alpha(&mut self, alpha: f64) -> Result<()> {
        self.check()?;
        self.state.global_alpha = if alpha >= 0. { alpha.min(1.) } else { 0. };
        Ok(())
    }

    // transforms

    pub fn translate(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.check()?;
        self.state.transform = self.state.transform * transform::translation(dx, dy);
        Ok(())
    }

    /// Rotates user space by `degrees`, from +x toward +y.
    pub fn rotate(&mut self, degrees: f64) -> Result<()> {
        self.check()?;
        self.state.transform = self.state.transform * transform::rotation(degrees);
        Ok(())
    }

    pub fn scale(&mut self, sx: f64, sy: f64) -> Result<()> {
        self.check()?;
        self.state.transform = self.state.transform * transform::scaling(sx, sy);
        Ok(())
    }

    pub fn reset_transform(&mut self) -> Result<()> {
        self.check()?;
        self.state.transform = transform::identity();
        Ok(())
    }

    pub fn transform(&self) -> Matrix3<f64> {
        self.state.transform
    }

    pub fn user_to_device(&self, point: Point2<f64>) -> Point2<f64> {
        transform::transform_point(&self.state.transform, point)
    }

    /// Maps a device-space point to user space; `None` if the transform is singular.
    pub fn device_to_user(&self, point: Point2<f64>) -> Option<Point2<f64>> {
        transform::invert(&self.state.transform).map(|m| transform::transform_point(&m, point))
    }

    // text and images

    /// Draws a text layout with its top-left corner at (x, y).
    pub fn draw_text_layout(&mut self, layout: &TextLayout, x: f64, y: f64) -> Result<()> {
        self.check()?;
        let prepared = layout.prepare();
        let state = self.state.clone();
        self.backend()?.draw_text(&prepared, Point2::new(x, y), &state)
    }

    /// Draws an image at its natural size.
    pub fn draw_image(&mut self, image: &Image, x: f64, y: f64, alpha: f64) -> Result<()> {
        let size = image.size();
        self.draw_image_rect(image, Rect::from_xywh(x, y, size.x, size.y), alpha)
    }

    /// Draws an image scaled into a rectangle.
    pub fn draw_image_rect(&mut self, image: &Image, dest: Rect, alpha: f64) -> Result<()> {
        self.check()?;
        if dest.is_empty() || alpha <= 0. {
            return Ok(());
        }
        let state = self.state.clone();
        self.backend()?.draw_image(image, dest, alpha.min(1.), &state)
    }
}

impl Drop for DrawingContext {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::Gradient;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl ContextBackend for Recorder {
        fn toolkit(&self) -> ToolkitType {
            ToolkitType::Gtk
        }
        fn save(&mut self) -> Result<()> {
            self.0.lock().push("save".into());
            Ok(())
        }
        fn restore(&mut self, _: &GraphicsState) -> Result<()> {
            self.0.lock().push("restore".into());
            Ok(())
        }
        fn clip(&mut self, path: &Path, _: FillRule, _: &GraphicsState) -> Result<()> {
            self.0.lock().push(format!("clip {}", path.len()));
            Ok(())
        }
        fn reset_clip(&mut self, _: &GraphicsState) -> Result<()> {
            self.0.lock().push("reset_clip".into());
            Ok(())
        }
        fn fill(&mut self, path: &Path, _: &GraphicsState) -> Result<()> {
            self.0.lock().push(format!("fill {}", path.len()));
            Ok(())
        }
        fn stroke(&mut self, path: &Path, state: &GraphicsState) -> Result<()> {
            self.0.lock().push(format!("stroke {} {}", path.len(), state.stroke_width()));
            Ok(())
        }
        fn draw_text(&mut self, text: &PreparedText, _: Point2<f64>, _: &GraphicsState) -> Result<()> {
            self.0.lock().push(format!("text {}", text.lines.len()));
            Ok(())
        }
        fn draw_image(&mut self, _: &Image, _: Rect, _: f64, _: &GraphicsState) -> Result<()> {
            self.0.lock().push("image".into());
            Ok(())
        }
        fn dispose(&mut self) {
            self.0.lock().push("dispose".into());
        }
    }

    fn context() -> (DrawingContext, Arc<Mutex<Vec<String>>>) {
        let recorder = Recorder::default();
        let log = Arc::clone(&recorder.0);
        (DrawingContext::new(Box::new(recorder)), log)
    }

    #[test]
    fn restore_returns_to_saved_state() {
        let (mut ctx, _) = context();
        ctx.set_color(Color::RED).unwrap();
        ctx.set_line_width(3.).unwrap();
        ctx.translate(10., 0.).unwrap();
        let before = ctx.state().clone();

        ctx.save().unwrap();
        ctx.set_pattern(Gradient::linear(0., 0., 1., 0.)).unwrap();
        ctx.set_line_width(7.).unwrap();
        ctx.set_font(Font::new("Serif", 30.)).unwrap();
        ctx.rotate(45.).unwrap();
        ctx.save().unwrap();
        ctx.set_line_dash(1., &[2., 2.]).unwrap();
        ctx.restore().unwrap();
        ctx.restore().unwrap();

        assert_eq!(ctx.state(), &before);
        assert_eq!(ctx.restore(), Err(Error::UnbalancedRestore));
    }

    #[test]
    fn path_survives_restore() {
        let (mut ctx, _) = context();
        ctx.save().unwrap();
        ctx.move_to(1., 1.).unwrap();
        ctx.line_to(2., 2.).unwrap();
        ctx.restore().unwrap();
        assert_eq!(ctx.copy_path().unwrap().len(), 2);
    }

    #[test]
    fn fill_consumes_the_path() {
        let (mut ctx, log) = context();
        ctx.rectangle(0., 0., 10., 10.).unwrap();
        ctx.fill_preserve().unwrap();
        ctx.stroke().unwrap();
        ctx.fill().unwrap();
        ctx.stroke().unwrap();
        assert_eq!(*log.lock(), vec!["fill 5", "stroke 5 1"]);
        assert!(ctx.copy_path().unwrap().is_empty());
    }

    #[test]
    fn last_paint_wins() {
        let (mut ctx, _) = context();
        ctx.set_pattern(Gradient::linear(0., 0., 1., 0.)).unwrap();
        ctx.set_color(Color::GREEN).unwrap();
        assert_eq!(ctx.state().paint, Paint::Solid(Color::GREEN));
        ctx.set_pattern(Gradient::radial(0., 0., 0., 0., 0., 5.)).unwrap();
        assert!(ctx.state().paint.solid_color().is_none());
    }

    #[test]
    fn zero_width_is_a_hairline() {
        let (mut ctx, log) = context();
        ctx.scale(4., 4.).unwrap();
        ctx.set_line_width(0.).unwrap();
        ctx.move_to(0., 0.).unwrap();
        ctx.line_to(1., 1.).unwrap();
        ctx.stroke().unwrap();
        assert_eq!(log.lock().last().map(String::as_str), Some("stroke 2 0.25"));
    }

    #[test]
    fn transforms_compose_in_source_order() {
        let (mut ctx, _) = context();
        ctx.translate(10., 0.).unwrap();
        ctx.scale(2., 2.).unwrap();
        assert_eq!(ctx.user_to_device(Point2::new(1., 1.)), Point2::new(12., 2.));
        assert_eq!(ctx.device_to_user(Point2::new(12., 2.)), Some(Point2::new(1., 1.)));
        ctx.reset_transform().unwrap();
        assert_eq!(ctx.user_to_device(Point2::new(1., 1.)), Point2::new(1., 1.));
    }

    #[test]
    fn clip_is_kept_in_device_space() {
        let (mut ctx, log) = context();
        assert_eq!(ctx.clip_extents().unwrap(), None);
        ctx.translate(5., 5.).unwrap();
        ctx.rectangle(0., 0., 10., 10.).unwrap();
        ctx.clip().unwrap();
        ctx.reset_transform().unwrap();
        ctx.rectangle(0., 0., 10., 10.).unwrap();
        ctx.clip_preserve().unwrap();
        assert_eq!(ctx.clip_extents().unwrap(), Some(Rect::from_xywh(5., 5., 5., 5.)));
        assert!(!ctx.copy_path().unwrap().is_empty());

        ctx.save().unwrap();
        ctx.reset_clip().unwrap();
        assert_eq!(ctx.clip_extents().unwrap(), None);
        ctx.restore().unwrap();
        assert_eq!(ctx.state().clip.len(), 2);
        assert_eq!(&log.lock()[..2], &["clip 5", "clip 5"]);
    }

    #[test]
    fn operations_after_dispose_fail() {
        let (mut ctx, log) = context();
        ctx.dispose();
        ctx.dispose();
        assert_eq!(ctx.move_to(0., 0.), Err(Error::Disposed));
        assert_eq!(ctx.fill(), Err(Error::Disposed));
        assert_eq!(ctx.restore(), Err(Error::Disposed));
        drop(ctx);
        assert_eq!(*log.lock(), vec!["dispose"]);
    }

    #[test]
    fn drop_disposes() {
        let (ctx, log) = context();
        drop(ctx);
        assert_eq!(*log.lock(), vec!["dispose"]);
    }

    #[test]
    fn dash_lengths_are_clamped() {
        let (mut ctx, _) = context();
        ctx.set_line_dash(2., &[4., -1.]).unwrap();
        assert_eq!(ctx.state().dash.lengths, vec![4., 0.]);
        ctx.set_line_dash(2., &[0., -3.]).unwrap();
        assert!(ctx.state().dash.is_solid());
    }
}
