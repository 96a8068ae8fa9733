//! A Core Graphics, CoreText and AppKit implementation without a window server.
//!
//! Contexts record every call. Views keep their state in memory and deliver events and frame
//! notifications synchronously. Text is measured with
//! [`HeadlessMetrics`](weft_core::text::HeadlessMetrics).

use crate::ffi::*;
use core::fmt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use weft_core::image::Image;
use weft_core::text::{Font, HeadlessMetrics, TextMeasurer};

/// A recorded Core Graphics call.
#[derive(Debug, Clone, PartialEq)]
pub enum CGCall {
    SaveGState,
    RestoreGState,
    ConcatCTM(CGAffineTransform),
    BeginPath,
    MoveToPoint(f64, f64),
    AddLineToPoint(f64, f64),
    AddCurveToPoint([f64; 6]),
    AddArc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        clockwise: bool,
    },
    ClosePath,
    AddRect(CGRect),
    SetFillColor(CGColor),
    SetStrokeColor(CGColor),
    SetAlpha(f64),
    SetLineWidth(f64),
    SetLineDash(f64, Vec<f64>),
    SetLineCap(CGLineCap),
    SetLineJoin(CGLineJoin),
    FillPath(CGPathFillRule),
    StrokePath,
    Clip(CGPathFillRule),
    ReplacePathWithStrokedPath,
    DrawLinearGradient {
        gradient: CGGradient,
        start: CGPoint,
        end: CGPoint,
        options: u32,
    },
    DrawRadialGradient {
        gradient: CGGradient,
        start_center: CGPoint,
        start_radius: f64,
        end_center: CGPoint,
        end_radius: f64,
        options: u32,
    },
    DrawImage(CGRect, u32, u32),
    DrawTiledImage(CGRect, u32, u32),
    SetTextMatrix(CGAffineTransform),
    SetTextPosition(f64, f64),
    ShowLine {
        text: String,
        font: CTFontDescriptor,
        attrs: CTLineAttrs,
    },
    Release,
}

pub type CGLog = Arc<Mutex<Vec<CGCall>>>;

/// A context that records its calls.
#[derive(Debug, Clone, Default)]
pub struct RecordingContext {
    log: CGLog,
}

impl RecordingContext {
    pub fn new() -> RecordingContext {
        RecordingContext::default()
    }

    pub fn log(&self) -> CGLog {
        Arc::clone(&self.log)
    }

    fn record(&mut self, call: CGCall) {
        self.log.lock().push(call);
    }
}

impl CGContext for RecordingContext {
    fn save_gstate(&mut self) {
        self.record(CGCall::SaveGState);
    }
    fn restore_gstate(&mut self) {
        self.record(CGCall::RestoreGState);
    }
    fn concat_ctm(&mut self, transform: CGAffineTransform) {
        self.record(CGCall::ConcatCTM(transform));
    }
    fn begin_path(&mut self) {
        self.record(CGCall::BeginPath);
    }
    fn move_to_point(&mut self, x: f64, y: f64) {
        self.record(CGCall::MoveToPoint(x, y));
    }
    fn add_line_to_point(&mut self, x: f64, y: f64) {
        self.record(CGCall::AddLineToPoint(x, y));
    }
    fn add_curve_to_point(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.record(CGCall::AddCurveToPoint([cp1x, cp1y, cp2x, cp2y, x, y]));
    }
    fn add_arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, clockwise: bool) {
        self.record(CGCall::AddArc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            clockwise,
        });
    }
    fn close_path(&mut self) {
        self.record(CGCall::ClosePath);
    }
    fn add_rect(&mut self, rect: CGRect) {
        self.record(CGCall::AddRect(rect));
    }
    fn set_fill_color(&mut self, color: CGColor) {
        self.record(CGCall::SetFillColor(color));
    }
    fn set_stroke_color(&mut self, color: CGColor) {
        self.record(CGCall::SetStrokeColor(color));
    }
    fn set_alpha(&mut self, alpha: f64) {
        self.record(CGCall::SetAlpha(alpha));
    }
    fn set_line_width(&mut self, width: f64) {
        self.record(CGCall::SetLineWidth(width));
    }
    fn set_line_dash(&mut self, phase: f64, lengths: &[f64]) {
        self.record(CGCall::SetLineDash(phase, lengths.to_vec()));
    }
    fn set_line_cap(&mut self, cap: CGLineCap) {
        self.record(CGCall::SetLineCap(cap));
    }
    fn set_line_join(&mut self, join: CGLineJoin) {
        self.record(CGCall::SetLineJoin(join));
    }
    fn fill_path(&mut self, rule: CGPathFillRule) {
        self.record(CGCall::FillPath(rule));
    }
    fn stroke_path(&mut self) {
        self.record(CGCall::StrokePath);
    }
    fn clip(&mut self, rule: CGPathFillRule) {
        self.record(CGCall::Clip(rule));
    }
    fn replace_path_with_stroked_path(&mut self) {
        self.record(CGCall::ReplacePathWithStrokedPath);
    }
    fn draw_linear_gradient(&mut self, gradient: &CGGradient, start: CGPoint, end: CGPoint, options: u32) {
        self.record(CGCall::DrawLinearGradient {
            gradient: gradient.clone(),
            start,
            end,
            options,
        });
    }
    fn draw_radial_gradient(
        &mut self,
        gradient: &CGGradient,
        start_center: CGPoint,
        start_radius: f64,
        end_center: CGPoint,
        end_radius: f64,
        options: u32,
    ) {
        self.record(CGCall::DrawRadialGradient {
            gradient: gradient.clone(),
            start_center,
            start_radius,
            end_center,
            end_radius,
            options,
        });
    }
    fn draw_image(&mut self, rect: CGRect, image: &Image) {
        self.record(CGCall::DrawImage(rect, image.width(), image.height()));
    }
    fn draw_tiled_image(&mut self, rect: CGRect, image: &Image) {
        self.record(CGCall::DrawTiledImage(rect, image.width(), image.height()));
    }
    fn set_text_matrix(&mut self, transform: CGAffineTransform) {
        self.record(CGCall::SetTextMatrix(transform));
    }
    fn set_text_position(&mut self, x: f64, y: f64) {
        self.record(CGCall::SetTextPosition(x, y));
    }
    fn show_line(&mut self, text: &str, font: &CTFontDescriptor, attrs: CTLineAttrs) {
        self.record(CGCall::ShowLine {
            text: text.to_string(),
            font: font.clone(),
            attrs,
        });
    }
    fn release(&mut self) {
        self.record(CGCall::Release);
    }
}

/// CoreText metrics from the headless font model.
///
/// The x-height is half the font size and underlines are a twentieth of it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessCoreText;

impl CoreText for HeadlessCoreText {
    fn typographic_width(&self, text: &str, font: &CTFontDescriptor) -> f64 {
        HeadlessMetrics.run_width(text, &font.to_font())
    }

    fn font_metrics(&self, font: &CTFontDescriptor) -> CTFontMetrics {
        let metrics = HeadlessMetrics.line_metrics(&font.to_font());
        CTFontMetrics {
            ascent: metrics.ascent,
            descent: metrics.descent,
            leading: metrics.leading,
            x_height: font.size * 0.5,
            underline_thickness: font.size * 0.05,
        }
    }
}

type SharedHandler = Arc<Mutex<NSEventHandler>>;

struct ViewState {
    class: NSViewClass,
    text: String,
    intrinsic: Option<NSSize>,
    frame: NSRect,
    superview: Option<NSView>,
    subviews: Vec<NSView>,
    handler: Option<SharedHandler>,
    needs_display: usize,
    released: bool,
}

#[derive(Default)]
struct AppKitState {
    next: u64,
    views: HashMap<NSView, ViewState>,
    bitmaps: Vec<CGLog>,
}

/// An in-memory AppKit.
///
/// Text fields use a 10pt Helvetica and wrap to their frame width once it is set; buttons add
/// 24pt of bezel and are 22pt tall. Canvases and plain views have no intrinsic size unless one is
/// set with [`HeadlessAppKit::set_intrinsic_size`].
pub struct HeadlessAppKit {
    state: Mutex<AppKitState>,
}

impl fmt::Debug for HeadlessAppKit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HeadlessAppKit {{ views: {} }}", self.state.lock().views.len())
    }
}

impl Default for HeadlessAppKit {
    fn default() -> HeadlessAppKit {
        HeadlessAppKit::new()
    }
}

impl HeadlessAppKit {
    pub fn new() -> HeadlessAppKit {
        HeadlessAppKit {
            state: Mutex::new(AppKitState {
                next: 1,
                ..AppKitState::default()
            }),
        }
    }

    fn text_font() -> Font {
        Font::new("Helvetica", 10.)
    }

    /// Delivers an event to the view’s handler.
    pub fn send_event(&self, view: NSView, event: NSEvent) -> bool {
        let handler = match self.state.lock().views.get(&view) {
            Some(v) if !v.released => v.handler.clone(),
            _ => None,
        };
        match handler {
            Some(handler) => (&mut *handler.lock())(event),
            None => false,
        }
    }

    /// Sends `drawRect:` for the view’s bounds with a recording context.
    pub fn display(&self, view: NSView) -> CGLog {
        let cg = RecordingContext::new();
        let log = cg.log();
        let size = self.frame(view).size;
        self.send_event(
            view,
            NSEvent::DrawRect {
                cg: Box::new(cg),
                dirty: CGRect::new(0., 0., size.width, size.height),
            },
        );
        log
    }

    pub fn set_intrinsic_size(&self, view: NSView, size: NSSize) {
        if let Some(v) = self.state.lock().views.get_mut(&view) {
            v.intrinsic = Some(size);
        }
    }

    pub fn subviews(&self, view: NSView) -> Vec<NSView> {
        self.state
            .lock()
            .views
            .get(&view)
            .map_or_else(Vec::new, |v| v.subviews.clone())
    }

    pub fn string_value(&self, view: NSView) -> Option<String> {
        self.state.lock().views.get(&view).map(|v| v.text.clone())
    }

    pub fn class(&self, view: NSView) -> Option<NSViewClass> {
        self.state.lock().views.get(&view).map(|v| v.class)
    }

    pub fn is_released(&self, view: NSView) -> bool {
        self.state.lock().views.get(&view).map_or(false, |v| v.released)
    }

    pub fn needs_display_count(&self, view: NSView) -> usize {
        self.state.lock().views.get(&view).map_or(0, |v| v.needs_display)
    }

    /// The call log of the `index`th bitmap context created.
    pub fn bitmap_log(&self, index: usize) -> Option<CGLog> {
        self.state.lock().bitmaps.get(index).cloned()
    }
}

impl AppKit for HeadlessAppKit {
    fn view_new(&self, class: NSViewClass) -> NSView {
        let mut state = self.state.lock();
        let view = NSView(state.next);
        state.next += 1;
        state.views.insert(
            view,
            ViewState {
                class,
                text: String::new(),
                intrinsic: None,
                frame: CGRect::new(0., 0., 0., 0.),
                superview: None,
                subviews: Vec::new(),
                handler: None,
                needs_display: 0,
                released: false,
            },
        );
        view
    }

    fn set_event_handler(&self, view: NSView, handler: NSEventHandler) {
        if let Some(v) = self.state.lock().views.get_mut(&view) {
            v.handler = Some(Arc::new(Mutex::new(handler)));
        }
    }

    fn fitting_size(&self, view: NSView) -> NSSize {
        let state = self.state.lock();
        let view = match state.views.get(&view) {
            Some(v) if !v.released => v,
            _ => {
                return NSSize {
                    width: 0.,
                    height: 0.,
                }
            }
        };
        if let Some(size) = view.intrinsic {
            return size;
        }
        let font = HeadlessAppKit::text_font();
        let text_width = HeadlessMetrics.run_width(&view.text, &font);
        let line_height = HeadlessMetrics.line_metrics(&font).height();
        match view.class {
            NSViewClass::TextField => {
                let max_width = view.frame.size.width;
                if max_width > 0. && text_width > max_width {
                    NSSize {
                        width: max_width,
                        height: (text_width / max_width).ceil() * line_height,
                    }
                } else {
                    NSSize {
                        width: text_width,
                        height: line_height,
                    }
                }
            }
            NSViewClass::Button => NSSize {
                width: text_width + 24.,
                height: 22.,
            },
            NSViewClass::Canvas | NSViewClass::View => NSSize {
                width: 0.,
                height: 0.,
            },
        }
    }

    fn frame(&self, view: NSView) -> NSRect {
        self.state
            .lock()
            .views
            .get(&view)
            .map_or(CGRect::new(0., 0., 0., 0.), |v| v.frame)
    }

    fn set_frame(&self, view: NSView, frame: NSRect) {
        {
            let mut state = self.state.lock();
            match state.views.get_mut(&view) {
                Some(v) if !v.released => v.frame = frame,
                _ => return,
            }
        }
        self.send_event(view, NSEvent::FrameChanged(frame));
    }

    fn set_frame_size(&self, view: NSView, size: NSSize) {
        let frame = {
            let mut state = self.state.lock();
            match state.views.get_mut(&view) {
                Some(v) if !v.released => {
                    v.frame.size = size;
                    v.frame
                }
                _ => return,
            }
        };
        self.send_event(view, NSEvent::FrameChanged(frame));
    }

    fn is_flipped(&self, view: NSView) -> bool {
        self.class(view) == Some(NSViewClass::Canvas)
    }

    fn add_subview(&self, parent: NSView, child: NSView) {
        let mut state = self.state.lock();
        let old = state.views.get_mut(&child).and_then(|c| c.superview.replace(parent));
        if let Some(old) = old.and_then(|p| state.views.get_mut(&p)) {
            old.subviews.retain(|v| *v != child);
        }
        if let Some(p) = state.views.get_mut(&parent) {
            p.subviews.push(child);
        }
    }

    fn remove_from_superview(&self, view: NSView) {
        let mut state = self.state.lock();
        let parent = state.views.get_mut(&view).and_then(|v| v.superview.take());
        if let Some(parent) = parent.and_then(|p| state.views.get_mut(&p)) {
            parent.subviews.retain(|v| *v != view);
        }
    }

    fn superview(&self, view: NSView) -> Option<NSView> {
        self.state.lock().views.get(&view).and_then(|v| v.superview)
    }

    fn set_string_value(&self, view: NSView, text: &str) {
        if let Some(v) = self.state.lock().views.get_mut(&view) {
            v.text = text.to_string();
        }
    }

    fn set_needs_display(&self, view: NSView) {
        if let Some(v) = self.state.lock().views.get_mut(&view) {
            v.needs_display += 1;
        }
    }

    fn release(&self, view: NSView) {
        if let Some(v) = self.state.lock().views.get_mut(&view) {
            v.released = true;
            v.handler = None;
        }
    }

    fn bitmap_context_create(&self, _width: usize, _height: usize) -> Box<dyn CGContext> {
        let cg = RecordingContext::new();
        self.state.lock().bitmaps.push(cg.log());
        Box::new(cg)
    }

    fn resize_image(&self, image: &Image, width: usize, height: usize) -> Option<Image> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(image.scaled_nearest(width as u32, height as u32))
    }
}
