//! A GTK, Cairo and Pango implementation without a display.
//!
//! Cairo contexts record every call; GTK widgets keep their state in memory and deliver signals
//! synchronously, the way the GTK main loop would. Text is measured with
//! [`HeadlessMetrics`](weft_core::text::HeadlessMetrics).

use crate::ffi::*;
use core::fmt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use weft_core::image::Image;
use weft_core::transform;
use weft_core::text::{Font, HeadlessMetrics, TextMeasurer};

/// A recorded Cairo call.
#[derive(Debug, Clone, PartialEq)]
pub enum CairoCall {
    Save,
    Restore,
    SetMatrix(CairoMatrix),
    NewPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo([f64; 6]),
    Arc {
        xc: f64,
        yc: f64,
        radius: f64,
        angle1: f64,
        angle2: f64,
        negative: bool,
    },
    ClosePath,
    Rectangle([f64; 4]),
    SetSourceRgba([f64; 4]),
    SetSource(CairoPattern),
    SetLineWidth(f64),
    SetDash(Vec<f64>, f64),
    SetLineCap(CairoLineCap),
    SetLineJoin(CairoLineJoin),
    SetFillRule(CairoFillRule),
    Fill,
    Stroke,
    Clip,
    ResetClip,
    PushGroup,
    PopGroupToSource,
    SetSourceImage { width: u32, height: u32, x: f64, y: f64 },
    PaintWithAlpha(f64),
    ShowLayout {
        text: String,
        font: PangoFontDescription,
        attrs: PangoAttrs,
    },
    Destroy,
}

pub type CairoLog = Arc<Mutex<Vec<CairoCall>>>;

/// A Cairo context that records its calls.
///
/// The current matrix is tracked through `save`/`restore` like Cairo’s gstate, so a context can
/// start with the device offset GTK installs before emitting `draw`.
#[derive(Debug, Clone)]
pub struct RecordingCairo {
    log: CairoLog,
    matrix: CairoMatrix,
    saved: Vec<CairoMatrix>,
}

impl Default for RecordingCairo {
    fn default() -> RecordingCairo {
        RecordingCairo::with_matrix(transform::identity().into())
    }
}

impl RecordingCairo {
    pub fn new() -> RecordingCairo {
        RecordingCairo::default()
    }

    pub fn with_matrix(matrix: CairoMatrix) -> RecordingCairo {
        RecordingCairo {
            log: CairoLog::default(),
            matrix,
            saved: Vec::new(),
        }
    }

    pub fn log(&self) -> CairoLog {
        Arc::clone(&self.log)
    }

    fn record(&mut self, call: CairoCall) {
        self.log.lock().push(call);
    }
}

impl Cairo for RecordingCairo {
    fn save(&mut self) {
        self.saved.push(self.matrix);
        self.record(CairoCall::Save);
    }
    fn restore(&mut self) {
        if let Some(matrix) = self.saved.pop() {
            self.matrix = matrix;
        }
        self.record(CairoCall::Restore);
    }
    fn get_matrix(&self) -> CairoMatrix {
        self.matrix
    }
    fn set_matrix(&mut self, matrix: CairoMatrix) {
        self.matrix = matrix;
        self.record(CairoCall::SetMatrix(matrix));
    }
    fn new_path(&mut self) {
        self.record(CairoCall::NewPath);
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.record(CairoCall::MoveTo(x, y));
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.record(CairoCall::LineTo(x, y));
    }
    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.record(CairoCall::CurveTo([x1, y1, x2, y2, x3, y3]));
    }
    fn arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        self.record(CairoCall::Arc {
            xc,
            yc,
            radius,
            angle1,
            angle2,
            negative: false,
        });
    }
    fn arc_negative(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        self.record(CairoCall::Arc {
            xc,
            yc,
            radius,
            angle1,
            angle2,
            negative: true,
        });
    }
    fn close_path(&mut self) {
        self.record(CairoCall::ClosePath);
    }
    fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.record(CairoCall::Rectangle([x, y, width, height]));
    }
    fn set_source_rgba(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.record(CairoCall::SetSourceRgba([r, g, b, a]));
    }
    fn set_source(&mut self, pattern: CairoPattern) {
        self.record(CairoCall::SetSource(pattern));
    }
    fn set_line_width(&mut self, width: f64) {
        self.record(CairoCall::SetLineWidth(width));
    }
    fn set_dash(&mut self, dashes: &[f64], offset: f64) {
        self.record(CairoCall::SetDash(dashes.to_vec(), offset));
    }
    fn set_line_cap(&mut self, cap: CairoLineCap) {
        self.record(CairoCall::SetLineCap(cap));
    }
    fn set_line_join(&mut self, join: CairoLineJoin) {
        self.record(CairoCall::SetLineJoin(join));
    }
    fn set_fill_rule(&mut self, rule: CairoFillRule) {
        self.record(CairoCall::SetFillRule(rule));
    }
    fn fill(&mut self) {
        self.record(CairoCall::Fill);
    }
    fn stroke(&mut self) {
        self.record(CairoCall::Stroke);
    }
    fn clip(&mut self) {
        self.record(CairoCall::Clip);
    }
    fn reset_clip(&mut self) {
        self.record(CairoCall::ResetClip);
    }
    fn push_group(&mut self) {
        self.record(CairoCall::PushGroup);
    }
    fn pop_group_to_source(&mut self) {
        self.record(CairoCall::PopGroupToSource);
    }
    fn set_source_image(&mut self, image: &Image, x: f64, y: f64) {
        self.record(CairoCall::SetSourceImage {
            width: image.width(),
            height: image.height(),
            x,
            y,
        });
    }
    fn paint_with_alpha(&mut self, alpha: f64) {
        self.record(CairoCall::PaintWithAlpha(alpha));
    }
    fn show_layout(&mut self, text: &str, font: &PangoFontDescription, attrs: PangoAttrs) {
        self.record(CairoCall::ShowLayout {
            text: text.to_string(),
            font: font.clone(),
            attrs,
        });
    }
    fn destroy(&mut self) {
        self.record(CairoCall::Destroy);
    }
}

/// Pango metrics from the headless font model, rounded to Pango units.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessPango;

fn pango_units(value: f64) -> i32 {
    (value * f64::from(PANGO_SCALE)).round() as i32
}

impl Pango for HeadlessPango {
    fn layout_size(&self, text: &str, font: &PangoFontDescription) -> (i32, i32) {
        let font = font.to_font();
        let width = HeadlessMetrics.run_width(text, &font);
        let height = HeadlessMetrics.line_metrics(&font).height();
        (pango_units(width), pango_units(height))
    }

    fn font_metrics(&self, font: &PangoFontDescription) -> PangoFontMetrics {
        let metrics = HeadlessMetrics.line_metrics(&font.to_font());
        PangoFontMetrics {
            ascent: pango_units(metrics.ascent),
            descent: pango_units(metrics.descent),
            height: pango_units(metrics.height()),
        }
    }
}

type SharedHandler = Arc<Mutex<SignalHandler>>;

struct WidgetState {
    class: GtkWidgetClass,
    text: String,
    intrinsic: Option<((i32, i32), (i32, i32))>,
    allocation: Option<GtkAllocation>,
    parent: Option<GtkWidget>,
    children: Vec<GtkWidget>,
    handlers: Vec<(&'static str, SharedHandler)>,
    queued_draws: usize,
    destroyed: bool,
}

#[derive(Default)]
struct GtkState {
    next: u64,
    next_handler: u64,
    widgets: HashMap<GtkWidget, WidgetState>,
    surfaces: Vec<CairoLog>,
}

impl GtkSignal {
    /// Copies the signal, unless it carries a drawing context.
    fn try_clone(&self) -> Option<GtkSignal> {
        Some(match self {
            GtkSignal::ButtonPress(e) => GtkSignal::ButtonPress(*e),
            GtkSignal::ButtonRelease(e) => GtkSignal::ButtonRelease(*e),
            GtkSignal::MotionNotify(e) => GtkSignal::MotionNotify(*e),
            GtkSignal::Scroll(e) => GtkSignal::Scroll(*e),
            GtkSignal::KeyPress(e) => GtkSignal::KeyPress(*e),
            GtkSignal::KeyRelease(e) => GtkSignal::KeyRelease(*e),
            GtkSignal::SizeAllocate(a) => GtkSignal::SizeAllocate(*a),
            GtkSignal::Draw { .. } => return None,
        })
    }
}

/// An in-memory GTK.
///
/// Labels and buttons use a 10px sans font; buttons add 8px horizontal and 5px vertical padding.
/// Drawing areas and containers have no intrinsic size unless one is set with
/// [`HeadlessGtk::set_intrinsic_size`].
pub struct HeadlessGtk {
    state: Mutex<GtkState>,
}

impl fmt::Debug for HeadlessGtk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.state.lock();
        write!(f, "HeadlessGtk {{ widgets: {} }}", state.widgets.len())
    }
}

impl Default for HeadlessGtk {
    fn default() -> HeadlessGtk {
        HeadlessGtk::new()
    }
}

impl HeadlessGtk {
    pub fn new() -> HeadlessGtk {
        HeadlessGtk {
            state: Mutex::new(GtkState {
                next: 1,
                ..GtkState::default()
            }),
        }
    }

    fn label_font() -> Font {
        Font::new("Sans", 10.)
    }

    fn intrinsic(&self, widget: GtkWidget) -> ((i32, i32), (i32, i32)) {
        let state = self.state.lock();
        let widget = match state.widgets.get(&widget) {
            Some(w) if !w.destroyed => w,
            _ => return ((0, 0), (0, 0)),
        };
        if let Some(size) = widget.intrinsic {
            return size;
        }
        let font = HeadlessGtk::label_font();
        let text_width = HeadlessMetrics.run_width(&widget.text, &font).ceil() as i32;
        let line_height = HeadlessMetrics.line_metrics(&font).height().ceil() as i32;
        match widget.class {
            GtkWidgetClass::Label => ((text_width, text_width), (line_height, line_height)),
            GtkWidgetClass::Button => {
                let w = text_width + 16;
                let h = line_height + 10;
                ((w, w), (h, h))
            }
            GtkWidgetClass::DrawingArea | GtkWidgetClass::Fixed => ((0, 0), (0, 0)),
        }
    }

    /// Delivers a signal to the widget’s handlers in connection order, until one returns true.
    pub fn emit(&self, widget: GtkWidget, signal: GtkSignal) -> bool {
        let name = signal.name();
        let handlers: Vec<SharedHandler> = {
            let state = self.state.lock();
            match state.widgets.get(&widget) {
                Some(w) if !w.destroyed => w
                    .handlers
                    .iter()
                    .filter(|(n, _)| *n == name)
                    .map(|(_, h)| Arc::clone(h))
                    .collect(),
                _ => return false,
            }
        };

        let mut pending = Some(signal);
        for handler in handlers {
            let signal = match pending.take() {
                Some(signal) => signal,
                None => break,
            };
            let next = signal.try_clone();
            if (&mut *handler.lock())(signal) {
                return true;
            }
            pending = next;
        }
        false
    }

    /// Emits `draw` with a recording context sized to the widget’s allocation and translated to
    /// its origin, as GTK does for widgets drawn into their parent’s window.
    pub fn draw(&self, widget: GtkWidget) -> CairoLog {
        let allocation = self.allocation(widget).unwrap_or_default();
        let origin = transform::translation(f64::from(allocation.x), f64::from(allocation.y));
        let cr = RecordingCairo::with_matrix(origin.into());
        let log = cr.log();
        let (width, height) = (allocation.width, allocation.height);
        self.emit(
            widget,
            GtkSignal::Draw {
                cr: Box::new(cr),
                width,
                height,
            },
        );
        log
    }

    pub fn set_intrinsic_size(&self, widget: GtkWidget, width: (i32, i32), height: (i32, i32)) {
        if let Some(w) = self.state.lock().widgets.get_mut(&widget) {
            w.intrinsic = Some((width, height));
        }
    }

    pub fn allocation(&self, widget: GtkWidget) -> Option<GtkAllocation> {
        self.state.lock().widgets.get(&widget).and_then(|w| w.allocation)
    }

    pub fn children(&self, widget: GtkWidget) -> Vec<GtkWidget> {
        self.state
            .lock()
            .widgets
            .get(&widget)
            .map_or_else(Vec::new, |w| w.children.clone())
    }

    pub fn text(&self, widget: GtkWidget) -> Option<String> {
        self.state.lock().widgets.get(&widget).map(|w| w.text.clone())
    }

    pub fn class(&self, widget: GtkWidget) -> Option<GtkWidgetClass> {
        self.state.lock().widgets.get(&widget).map(|w| w.class)
    }

    pub fn is_destroyed(&self, widget: GtkWidget) -> bool {
        self.state
            .lock()
            .widgets
            .get(&widget)
            .map_or(false, |w| w.destroyed)
    }

    pub fn queued_draws(&self, widget: GtkWidget) -> usize {
        self.state
            .lock()
            .widgets
            .get(&widget)
            .map_or(0, |w| w.queued_draws)
    }

    /// The call log of the `index`th image surface created.
    pub fn surface_log(&self, index: usize) -> Option<CairoLog> {
        self.state.lock().surfaces.get(index).cloned()
    }
}

impl Gtk for HeadlessGtk {
    fn widget_new(&self, class: GtkWidgetClass) -> GtkWidget {
        let mut state = self.state.lock();
        let widget = GtkWidget(state.next);
        state.next += 1;
        state.widgets.insert(
            widget,
            WidgetState {
                class,
                text: String::new(),
                intrinsic: None,
                allocation: None,
                parent: None,
                children: Vec::new(),
                handlers: Vec::new(),
                queued_draws: 0,
                destroyed: false,
            },
        );
        widget
    }

    fn widget_destroy(&self, widget: GtkWidget) {
        let mut state = self.state.lock();
        let parent = match state.widgets.get_mut(&widget) {
            Some(w) => {
                w.destroyed = true;
                w.handlers.clear();
                w.parent.take()
            }
            None => return,
        };
        if let Some(parent) = parent.and_then(|p| state.widgets.get_mut(&p)) {
            parent.children.retain(|c| *c != widget);
        }
    }

    fn get_preferred_width(&self, widget: GtkWidget) -> (i32, i32) {
        self.intrinsic(widget).0
    }

    fn get_preferred_height(&self, widget: GtkWidget) -> (i32, i32) {
        self.intrinsic(widget).1
    }

    fn get_preferred_height_for_width(&self, widget: GtkWidget, _width: i32) -> (i32, i32) {
        self.intrinsic(widget).1
    }

    fn get_preferred_width_for_height(&self, widget: GtkWidget, _height: i32) -> (i32, i32) {
        self.intrinsic(widget).0
    }

    fn size_allocate(&self, widget: GtkWidget, allocation: GtkAllocation) {
        {
            let mut state = self.state.lock();
            match state.widgets.get_mut(&widget) {
                Some(w) if !w.destroyed => w.allocation = Some(allocation),
                _ => return,
            }
        }
        self.emit(widget, GtkSignal::SizeAllocate(allocation));
    }

    fn container_add(&self, container: GtkWidget, child: GtkWidget) {
        let mut state = self.state.lock();
        if let Some(c) = state.widgets.get_mut(&child) {
            c.parent = Some(container);
        }
        if let Some(c) = state.widgets.get_mut(&container) {
            c.children.push(child);
        }
    }

    fn container_remove(&self, container: GtkWidget, child: GtkWidget) {
        let mut state = self.state.lock();
        if let Some(c) = state.widgets.get_mut(&child) {
            c.parent = None;
        }
        if let Some(c) = state.widgets.get_mut(&container) {
            c.children.retain(|w| *w != child);
        }
    }

    fn set_text(&self, widget: GtkWidget, text: &str) {
        if let Some(w) = self.state.lock().widgets.get_mut(&widget) {
            w.text = text.to_string();
        }
    }

    fn queue_draw(&self, widget: GtkWidget) {
        if let Some(w) = self.state.lock().widgets.get_mut(&widget) {
            w.queued_draws += 1;
        }
    }

    fn signal_connect(&self, widget: GtkWidget, signal: &'static str, handler: SignalHandler) -> u64 {
        let mut state = self.state.lock();
        state.next_handler += 1;
        let id = state.next_handler;
        if let Some(w) = state.widgets.get_mut(&widget) {
            w.handlers.push((signal, Arc::new(Mutex::new(handler))));
        }
        id
    }

    fn image_surface_create(&self, _width: i32, _height: i32) -> Box<dyn Cairo> {
        let cr = RecordingCairo::new();
        self.state.lock().surfaces.push(cr.log());
        Box::new(cr)
    }

    fn pixbuf_scale_simple(&self, image: &Image, width: i32, height: i32) -> Option<Image> {
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(image.scaled_nearest(width as u32, height as u32))
    }
}
