//! Events.
//!
//! Native input callbacks are translated into these toolkit-neutral events by each backend and
//! delivered to the widget's [`EventSink`]. Events are delivered in the order the native toolkit
//! delivers them; nothing is coalesced here.

use crate::context::DrawingContext;
use crate::error::{Error, Result};
use crate::rect::Rect;
use cgmath::{Point2, Vector2};
use core::fmt;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
    /// Extra buttons, numbered as the native toolkit numbers them.
    Other(u8),
}

/// Modifier key state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyModifiers {
    /// Whether any shift key is pressed.
    pub shift: bool,

    /// Whether any control key is pressed.
    pub control: bool,

    /// Whether any option key or alt key is pressed.
    pub option: bool,

    /// Whether any command key, windows key or meta key is pressed.
    pub command: bool,
}

impl KeyModifiers {
    pub fn is_empty(&self) -> bool {
        !(self.shift || self.control || self.option || self.command)
    }
}

/// A button press or release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonEvent {
    /// Location in the widget’s coordinate system.
    pub position: Point2<f64>,
    pub button: PointerButton,
    /// 1 for a single click, 2 for a double click, and so on.
    pub click_count: u32,
    pub modifiers: KeyModifiers,
}

/// Pointer motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseMoved {
    pub position: Point2<f64>,
    pub modifiers: KeyModifiers,
}

/// A scroll event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scroll {
    pub position: Point2<f64>,

    /// Scroll delta; positive y scrolls down. In points, or in wheel steps if `is_discrete`.
    pub delta: Vector2<f64>,

    /// If true, the scrolling device is discrete (e.g. a mouse wheel that scrolls in increments).
    pub is_discrete: bool,
}

/// A key press or release.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    /// `None` for keys without a [`KeyCode`].
    pub code: Option<KeyCode>,
    pub modifiers: KeyModifiers,
    pub is_repeat: bool,
}

/// A toolkit-neutral widget event.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    ButtonPressed(ButtonEvent),
    ButtonReleased(ButtonEvent),
    MouseMoved(MouseMoved),
    Scrolled(Scroll),
    KeyPressed(KeyEvent),
    KeyReleased(KeyEvent),
    /// The widget’s bounds changed, in its parent’s coordinate system (y down).
    BoundsChanged(Rect),
}

/// A shared event handler.
pub struct EventHandler(Arc<Mutex<dyn FnMut(&WidgetEvent) + Send>>);

impl Clone for EventHandler {
    fn clone(&self) -> Self {
        EventHandler(Arc::clone(&self.0))
    }
}

impl EventHandler {
    pub fn new<F: 'static + FnMut(&WidgetEvent) + Send>(handler: F) -> Self {
        EventHandler(Arc::new(Mutex::new(handler)))
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EventHandler")
    }
}

type DrawFn = dyn FnMut(&mut DrawingContext, Rect) -> Result<()> + Send;

/// A draw handler. Receives the context and the dirty rectangle.
pub struct DrawHandler(Arc<Mutex<DrawFn>>);

impl Clone for DrawHandler {
    fn clone(&self) -> Self {
        DrawHandler(Arc::clone(&self.0))
    }
}

impl DrawHandler {
    pub fn new<F>(handler: F) -> Self
    where
        F: 'static + FnMut(&mut DrawingContext, Rect) -> Result<()> + Send,
    {
        DrawHandler(Arc::new(Mutex::new(handler)))
    }
}

impl fmt::Debug for DrawHandler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DrawHandler")
    }
}

#[derive(Debug, Default)]
struct Handlers {
    events: Vec<EventHandler>,
    draw: Option<DrawHandler>,
}

/// The toolkit-neutral end of a widget’s native event callbacks.
///
/// Clones share the same handlers, so the native side can hold one while the frontend registers
/// handlers through another.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    handlers: Arc<Mutex<Handlers>>,
}

impl EventSink {
    pub fn new() -> EventSink {
        EventSink::default()
    }

    /// Adds an event handler.
    pub fn on_event<F: 'static + FnMut(&WidgetEvent) + Send>(&self, handler: F) {
        self.handlers.lock().events.push(EventHandler::new(handler));
    }

    /// Sets the draw handler, replacing any previous one.
    pub fn set_draw_handler<F>(&self, handler: F)
    where
        F: 'static + FnMut(&mut DrawingContext, Rect) -> Result<()> + Send,
    {
        self.handlers.lock().draw = Some(DrawHandler::new(handler));
    }

    pub fn has_draw_handler(&self) -> bool {
        self.handlers.lock().draw.is_some()
    }

    /// Delivers an event to all handlers, in registration order.
    pub fn emit(&self, event: &WidgetEvent) {
        // handlers may register more handlers, so don’t hold the lock while calling them
        let handlers = self.handlers.lock().events.clone();
        for handler in handlers {
            (&mut *handler.0.lock())(event);
        }
    }

    /// Runs the draw handler on a fresh context and disposes the context afterwards.
    ///
    /// This is the boundary to native code: errors and panics from the handler are logged and
    /// swallowed here, and reported through the return value.
    pub fn draw(&self, mut ctx: DrawingContext, dirty: Rect) -> Result<()> {
        let handler = self.handlers.lock().draw.clone();
        let handler = match handler {
            Some(handler) => handler,
            None => {
                ctx.dispose();
                return Ok(());
            }
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| (&mut *handler.0.lock())(&mut ctx, dirty)));
        ctx.dispose();

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                log::error!("draw handler failed: {}", err);
                Err(err)
            }
            Err(payload) => {
                let message = if let Some(s) = payload.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                log::error!("draw handler panicked: {}", message);
                Err(Error::DrawPanicked(message))
            }
        }
    }
}

/// Keyboard layout-independent identifiers for keyboard keys.
///
/// Only keys all three toolkits report are listed.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    A = 0x1,
    B = 0x2,
    C = 0x3,
    D = 0x4,
    E = 0x5,
    F = 0x6,
    G = 0x7,
    H = 0x8,
    I = 0x9,
    J = 0xA,
    K = 0xB,
    L = 0xC,
    M = 0xD,
    N = 0xE,
    O = 0xF,
    P = 0x10,
    Q = 0x11,
    R = 0x12,
    S = 0x13,
    T = 0x14,
    U = 0x15,
    V = 0x16,
    W = 0x17,
    X = 0x18,
    Y = 0x19,
    Z = 0x1A,
    N0 = 0x20,
    N1 = 0x21,
    N2 = 0x22,
    N3 = 0x23,
    N4 = 0x24,
    N5 = 0x25,
    N6 = 0x26,
    N7 = 0x27,
    N8 = 0x28,
    N9 = 0x29,
    Return = 0x35,
    Tab = 0x36,
    Space = 0x37,
    /// Backspace.
    Delete = 0x38,
    Escape = 0x39,
    LeftArrow = 0x44,
    DownArrow = 0x45,
    UpArrow = 0x46,
    RightArrow = 0x47,
    ForwardDelete = 0x48,
    Home = 0x4A,
    End = 0x4B,
    PageUp = 0x4C,
    PageDown = 0x4D,
    F1 = 0x50,
    F2 = 0x51,
    F3 = 0x52,
    F4 = 0x53,
    F5 = 0x54,
    F6 = 0x55,
    F7 = 0x56,
    F8 = 0x57,
    F9 = 0x58,
    F10 = 0x59,
    F11 = 0x5A,
    F12 = 0x5B,
}

impl KeyCode {
    const LETTERS: [KeyCode; 26] = [
        KeyCode::A,
        KeyCode::B,
        KeyCode::C,
        KeyCode::D,
        KeyCode::E,
        KeyCode::F,
        KeyCode::G,
        KeyCode::H,
        KeyCode::I,
        KeyCode::J,
        KeyCode::K,
        KeyCode::L,
        KeyCode::M,
        KeyCode::N,
        KeyCode::O,
        KeyCode::P,
        KeyCode::Q,
        KeyCode::R,
        KeyCode::S,
        KeyCode::T,
        KeyCode::U,
        KeyCode::V,
        KeyCode::W,
        KeyCode::X,
        KeyCode::Y,
        KeyCode::Z,
    ];

    const DIGITS: [KeyCode; 10] = [
        KeyCode::N0,
        KeyCode::N1,
        KeyCode::N2,
        KeyCode::N3,
        KeyCode::N4,
        KeyCode::N5,
        KeyCode::N6,
        KeyCode::N7,
        KeyCode::N8,
        KeyCode::N9,
    ];

    const FUNCTION: [KeyCode; 12] = [
        KeyCode::F1,
        KeyCode::F2,
        KeyCode::F3,
        KeyCode::F4,
        KeyCode::F5,
        KeyCode::F6,
        KeyCode::F7,
        KeyCode::F8,
        KeyCode::F9,
        KeyCode::F10,
        KeyCode::F11,
        KeyCode::F12,
    ];

    /// The key for an ASCII letter or digit (case-insensitive).
    pub fn from_char(c: char) -> Option<KeyCode> {
        match c.to_ascii_uppercase() {
            c @ 'A'..='Z' => Some(KeyCode::LETTERS[(c as u8 - b'A') as usize]),
            c @ '0'..='9' => Some(KeyCode::DIGITS[(c as u8 - b'0') as usize]),
            ' ' => Some(KeyCode::Space),
            _ => None,
        }
    }

    /// The function key F`n`, for `n` in `1..=12`.
    pub fn function(n: u8) -> Option<KeyCode> {
        if n >= 1 && n <= 12 {
            Some(KeyCode::FUNCTION[n as usize - 1])
        } else {
            None
        }
    }
}
