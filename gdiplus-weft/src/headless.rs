//! A GDI+ and Windows Forms implementation without a desktop.
//!
//! Graphics objects record every call. Controls keep their state in memory and deliver messages
//! synchronously. Text is measured with [`HeadlessMetrics`](weft_core::text::HeadlessMetrics).

use crate::ffi::*;
use core::fmt;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use weft_core::image::Image;
use weft_core::text::{Font, FontStyle, FontWeight, HeadlessMetrics, TextMeasurer};

/// A recorded GDI+ call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpCall {
    Save(u32),
    Restore(u32),
    SetTransform(GpMatrix),
    IntersectClip(GraphicsPath),
    ResetClip,
    FillPath(Brush, GraphicsPath),
    DrawPath(Pen, GraphicsPath),
    DrawString {
        text: String,
        font: GpFont,
        brush: Brush,
        origin: PointF,
    },
    DrawImage {
        dest: RectF,
        width: u32,
        height: u32,
        alpha: f64,
    },
    Dispose,
}

pub type GpLog = Arc<Mutex<Vec<GpCall>>>;

/// A `Graphics` that records its calls.
#[derive(Debug, Clone, Default)]
pub struct RecordingGraphics {
    log: GpLog,
    next_state: u32,
}

impl RecordingGraphics {
    pub fn new() -> RecordingGraphics {
        RecordingGraphics::default()
    }

    pub fn log(&self) -> GpLog {
        Arc::clone(&self.log)
    }

    fn record(&mut self, call: GpCall) {
        self.log.lock().push(call);
    }
}

impl Graphics for RecordingGraphics {
    fn save(&mut self) -> u32 {
        self.next_state += 1;
        let state = self.next_state;
        self.record(GpCall::Save(state));
        state
    }
    fn restore(&mut self, state: u32) {
        self.record(GpCall::Restore(state));
    }
    fn set_transform(&mut self, matrix: GpMatrix) {
        self.record(GpCall::SetTransform(matrix));
    }
    fn intersect_clip(&mut self, path: &GraphicsPath) {
        self.record(GpCall::IntersectClip(path.clone()));
    }
    fn reset_clip(&mut self) {
        self.record(GpCall::ResetClip);
    }
    fn fill_path(&mut self, brush: &Brush, path: &GraphicsPath) {
        self.record(GpCall::FillPath(brush.clone(), path.clone()));
    }
    fn draw_path(&mut self, pen: &Pen, path: &GraphicsPath) {
        self.record(GpCall::DrawPath(pen.clone(), path.clone()));
    }
    fn draw_string(&mut self, text: &str, font: &GpFont, brush: &Brush, origin: PointF) {
        self.record(GpCall::DrawString {
            text: text.to_string(),
            font: font.clone(),
            brush: brush.clone(),
            origin,
        });
    }
    fn draw_image(&mut self, image: &Image, dest: RectF, alpha: f64) {
        self.record(GpCall::DrawImage {
            dest,
            width: image.width(),
            height: image.height(),
            alpha,
        });
    }
    fn dispose(&mut self) {
        self.record(GpCall::Dispose);
    }
}

fn headless_font(font: &GpFont) -> Font {
    let mut out = Font::new(&font.family, font.em_size);
    if font.style & FONT_STYLE_BOLD != 0 {
        out = out.with_weight(FontWeight::Bold);
    }
    if font.style & FONT_STYLE_ITALIC != 0 {
        out = out.with_style(FontStyle::Italic);
    }
    out
}

/// GDI+ measurement on the headless font model.
///
/// Every family has an em height of 1000 design units, 800 ascent, 200 descent and a line spacing
/// of 1200.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessGdiPlus;

impl GdiPlus for HeadlessGdiPlus {
    fn measure_string(&self, text: &str, font: &GpFont) -> f64 {
        HeadlessMetrics.run_width(text, &headless_font(font))
    }

    fn font_family_metrics(&self, _family: &str, _style: u32) -> FontFamilyMetrics {
        FontFamilyMetrics {
            em_height: 1000,
            cell_ascent: 800,
            cell_descent: 200,
            line_spacing: 1200,
        }
    }
}

type SharedHandler = Arc<Mutex<MessageHandler>>;

struct ControlState {
    class: ControlClass,
    text: String,
    preferred: Option<Size>,
    minimum: Size,
    bounds: Bounds,
    parent: Option<HWND>,
    controls: Vec<HWND>,
    handler: Option<SharedHandler>,
    invalidated: usize,
    disposed: bool,
}

#[derive(Default)]
struct FormsState {
    next: u64,
    controls: HashMap<HWND, ControlState>,
    keys_down: HashSet<u16>,
    bitmaps: Vec<GpLog>,
}

/// In-memory Windows Forms.
///
/// Labels use a 10px font and wrap to the proposed width; buttons add 16px of padding and are
/// 23px tall. Canvases and panels prefer a zero size unless one is set with
/// [`HeadlessWinForms::set_preferred_size`]. Client coordinates equal screen coordinates.
pub struct HeadlessWinForms {
    state: Mutex<FormsState>,
}

impl fmt::Debug for HeadlessWinForms {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HeadlessWinForms {{ controls: {} }}", self.state.lock().controls.len())
    }
}

impl Default for HeadlessWinForms {
    fn default() -> HeadlessWinForms {
        HeadlessWinForms::new()
    }
}

impl HeadlessWinForms {
    pub fn new() -> HeadlessWinForms {
        HeadlessWinForms {
            state: Mutex::new(FormsState {
                next: 1,
                ..FormsState::default()
            }),
        }
    }

    fn text_font() -> Font {
        Font::new("Segoe UI", 10.)
    }

    /// Delivers a message to the control’s handler.
    pub fn send_message(&self, hwnd: HWND, message: WindowMessage) -> bool {
        let handler = match self.state.lock().controls.get(&hwnd) {
            Some(c) if !c.disposed => c.handler.clone(),
            _ => None,
        };
        match handler {
            Some(handler) => (&mut *handler.lock())(message),
            None => false,
        }
    }

    /// Sends an input message.
    pub fn send_input(&self, hwnd: HWND, msg: u32, wparam: usize, lparam: isize) -> bool {
        self.send_message(hwnd, WindowMessage::Input { msg, wparam, lparam })
    }

    /// Raises `Paint` over the control’s client area with a recording graphics.
    pub fn paint(&self, hwnd: HWND) -> GpLog {
        let graphics = RecordingGraphics::new();
        let log = graphics.log();
        let bounds = self.bounds(hwnd);
        self.send_message(
            hwnd,
            WindowMessage::Paint {
                graphics: Box::new(graphics),
                clip: Bounds {
                    x: 0,
                    y: 0,
                    ..bounds
                },
            },
        );
        log
    }

    pub fn set_key_down(&self, vk: u16, down: bool) {
        let mut state = self.state.lock();
        if down {
            state.keys_down.insert(vk);
        } else {
            state.keys_down.remove(&vk);
        }
    }

    pub fn set_preferred_size(&self, hwnd: HWND, size: Size) {
        if let Some(c) = self.state.lock().controls.get_mut(&hwnd) {
            c.preferred = Some(size);
        }
    }

    pub fn set_minimum_size(&self, hwnd: HWND, size: Size) {
        if let Some(c) = self.state.lock().controls.get_mut(&hwnd) {
            c.minimum = size;
        }
    }

    pub fn controls(&self, hwnd: HWND) -> Vec<HWND> {
        self.state
            .lock()
            .controls
            .get(&hwnd)
            .map_or_else(Vec::new, |c| c.controls.clone())
    }

    pub fn text(&self, hwnd: HWND) -> Option<String> {
        self.state.lock().controls.get(&hwnd).map(|c| c.text.clone())
    }

    pub fn class(&self, hwnd: HWND) -> Option<ControlClass> {
        self.state.lock().controls.get(&hwnd).map(|c| c.class)
    }

    pub fn is_disposed(&self, hwnd: HWND) -> bool {
        self.state.lock().controls.get(&hwnd).map_or(false, |c| c.disposed)
    }

    pub fn invalidate_count(&self, hwnd: HWND) -> usize {
        self.state.lock().controls.get(&hwnd).map_or(0, |c| c.invalidated)
    }

    /// The call log of the `index`th bitmap graphics created.
    pub fn bitmap_log(&self, index: usize) -> Option<GpLog> {
        self.state.lock().bitmaps.get(index).cloned()
    }
}

impl WinForms for HeadlessWinForms {
    fn control_new(&self, class: ControlClass) -> HWND {
        let mut state = self.state.lock();
        let hwnd = HWND(state.next);
        state.next += 1;
        state.controls.insert(
            hwnd,
            ControlState {
                class,
                text: String::new(),
                preferred: None,
                minimum: Size { width: 0, height: 0 },
                bounds: Bounds {
                    x: 0,
                    y: 0,
                    width: 0,
                    height: 0,
                },
                parent: None,
                controls: Vec::new(),
                handler: None,
                invalidated: 0,
                disposed: false,
            },
        );
        hwnd
    }

    fn set_message_handler(&self, hwnd: HWND, handler: MessageHandler) {
        if let Some(c) = self.state.lock().controls.get_mut(&hwnd) {
            c.handler = Some(Arc::new(Mutex::new(handler)));
        }
    }

    fn get_preferred_size(&self, hwnd: HWND, proposed: Size) -> Size {
        let state = self.state.lock();
        let control = match state.controls.get(&hwnd) {
            Some(c) if !c.disposed => c,
            _ => return Size { width: 0, height: 0 },
        };
        if let Some(size) = control.preferred {
            return size;
        }
        let font = HeadlessWinForms::text_font();
        let text_width = HeadlessMetrics.run_width(&control.text, &font);
        let line_height = HeadlessMetrics.line_metrics(&font).height();
        match control.class {
            ControlClass::Label => {
                let max_width = f64::from(proposed.width);
                if proposed.width > 0 && text_width > max_width {
                    Size {
                        width: proposed.width,
                        height: ((text_width / max_width).ceil() * line_height).ceil() as i32,
                    }
                } else {
                    Size {
                        width: text_width.ceil() as i32,
                        height: line_height.ceil() as i32,
                    }
                }
            }
            ControlClass::Button => Size {
                width: text_width.ceil() as i32 + 16,
                height: 23,
            },
            ControlClass::Canvas | ControlClass::Panel => Size { width: 0, height: 0 },
        }
    }

    fn minimum_size(&self, hwnd: HWND) -> Size {
        self.state
            .lock()
            .controls
            .get(&hwnd)
            .map_or(Size { width: 0, height: 0 }, |c| c.minimum)
    }

    fn set_bounds(&self, hwnd: HWND, bounds: Bounds) {
        {
            let mut state = self.state.lock();
            match state.controls.get_mut(&hwnd) {
                Some(c) if !c.disposed => c.bounds = bounds,
                _ => return,
            }
        }
        self.send_message(hwnd, WindowMessage::WindowPosChanged(bounds));
    }

    fn bounds(&self, hwnd: HWND) -> Bounds {
        self.state.lock().controls.get(&hwnd).map_or(
            Bounds {
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            },
            |c| c.bounds,
        )
    }

    fn controls_add(&self, parent: HWND, child: HWND) {
        let mut state = self.state.lock();
        let old = state.controls.get_mut(&child).and_then(|c| c.parent.replace(parent));
        if let Some(old) = old.and_then(|p| state.controls.get_mut(&p)) {
            old.controls.retain(|c| *c != child);
        }
        if let Some(p) = state.controls.get_mut(&parent) {
            p.controls.push(child);
        }
    }

    fn controls_remove(&self, parent: HWND, child: HWND) {
        let mut state = self.state.lock();
        if let Some(c) = state.controls.get_mut(&child) {
            if c.parent == Some(parent) {
                c.parent = None;
            }
        }
        if let Some(p) = state.controls.get_mut(&parent) {
            p.controls.retain(|c| *c != child);
        }
    }

    fn parent(&self, hwnd: HWND) -> Option<HWND> {
        self.state.lock().controls.get(&hwnd).and_then(|c| c.parent)
    }

    fn set_text(&self, hwnd: HWND, text: &str) {
        if let Some(c) = self.state.lock().controls.get_mut(&hwnd) {
            c.text = text.to_string();
        }
    }

    fn invalidate(&self, hwnd: HWND) {
        if let Some(c) = self.state.lock().controls.get_mut(&hwnd) {
            c.invalidated += 1;
        }
    }

    fn dispose(&self, hwnd: HWND) {
        let mut state = self.state.lock();
        let parent = match state.controls.get_mut(&hwnd) {
            Some(c) => {
                c.disposed = true;
                c.handler = None;
                c.parent.take()
            }
            None => None,
        };
        if let Some(p) = parent.and_then(|p| state.controls.get_mut(&p)) {
            p.controls.retain(|c| *c != hwnd);
        }
    }

    fn screen_to_client(&self, _hwnd: HWND, x: i32, y: i32) -> (i32, i32) {
        (x, y)
    }

    fn is_key_down(&self, vk: u16) -> bool {
        self.state.lock().keys_down.contains(&vk)
    }

    fn bitmap_graphics(&self, _width: i32, _height: i32) -> Box<dyn Graphics> {
        let graphics = RecordingGraphics::new();
        self.state.lock().bitmaps.push(graphics.log());
        Box::new(graphics)
    }
}
