//! Windows Forms controls.
//!
//! Input arrives as raw window messages. Mouse positions are packed into `lParam` in client
//! coordinates, except for wheel messages, which carry screen coordinates. Modifier state is read
//! with `GetKeyState` at the time the message is handled.

use crate::context::GdiPlusContext;
use crate::ffi::keys::*;
use crate::ffi::*;
use cgmath::{Point2, Vector2};
use std::sync::Arc;
use weft_core::events::{ButtonEvent, KeyCode, KeyEvent, KeyModifiers, MouseMoved, PointerButton, Scroll};
use weft_core::view::{NativeView, WidgetSize};
use weft_core::{DrawingContext, Error, EventSink, NativeHandle, Rect, Result, ToolkitType, WidgetEvent, WidgetKind};

/// Bit 30 of a key message’s `lParam`: the key was already down.
const KEY_PREVIOUS_STATE: isize = 1 << 30;

fn low_word(lparam: isize) -> i32 {
    i32::from(lparam as u16 as i16)
}

fn high_word(lparam: isize) -> i32 {
    i32::from((lparam >> 16) as u16 as i16)
}

fn wheel_delta(wparam: usize) -> i16 {
    (wparam >> 16) as u16 as i16
}

pub(crate) fn key_code(vk: u16) -> Option<KeyCode> {
    match vk {
        k @ VK_A..=VK_Z | k @ VK_0..=VK_9 => KeyCode::from_char(k as u8 as char),
        VK_SPACE => Some(KeyCode::Space),
        VK_RETURN => Some(KeyCode::Return),
        VK_TAB => Some(KeyCode::Tab),
        VK_BACK => Some(KeyCode::Delete),
        VK_ESCAPE => Some(KeyCode::Escape),
        VK_DELETE => Some(KeyCode::ForwardDelete),
        VK_LEFT => Some(KeyCode::LeftArrow),
        VK_RIGHT => Some(KeyCode::RightArrow),
        VK_UP => Some(KeyCode::UpArrow),
        VK_DOWN => Some(KeyCode::DownArrow),
        VK_HOME => Some(KeyCode::Home),
        VK_END => Some(KeyCode::End),
        VK_PRIOR => Some(KeyCode::PageUp),
        VK_NEXT => Some(KeyCode::PageDown),
        k @ VK_F1..=VK_F12 => KeyCode::function((k - VK_F1 + 1) as u8),
        _ => None,
    }
}

/// Decodes window messages for one control.
struct MessageDecoder {
    forms: Arc<dyn WinForms>,
    hwnd: HWND,
    events: EventSink,
}

impl MessageDecoder {
    fn modifiers(&self) -> KeyModifiers {
        KeyModifiers {
            shift: self.forms.is_key_down(VK_SHIFT),
            control: self.forms.is_key_down(VK_CONTROL),
            option: self.forms.is_key_down(VK_MENU),
            command: self.forms.is_key_down(VK_LWIN) || self.forms.is_key_down(VK_RWIN),
        }
    }

    fn button_event(&self, button: PointerButton, click_count: u32, lparam: isize) -> ButtonEvent {
        ButtonEvent {
            position: Point2::new(f64::from(low_word(lparam)), f64::from(high_word(lparam))),
            button,
            click_count,
            modifiers: self.modifiers(),
        }
    }

    fn key_event(&self, wparam: usize, is_repeat: bool) -> KeyEvent {
        KeyEvent {
            code: key_code(wparam as u16),
            modifiers: self.modifiers(),
            is_repeat,
        }
    }

    fn scroll(&self, wparam: usize, lparam: isize, horizontal: bool) -> Scroll {
        let (x, y) = self
            .forms
            .screen_to_client(self.hwnd, low_word(lparam), high_word(lparam));
        let raw = wheel_delta(wparam);
        let steps = f64::from(raw) / f64::from(WHEEL_DELTA);
        Scroll {
            position: Point2::new(f64::from(x), f64::from(y)),
            // a positive vertical delta is a rotation away from the user
            delta: if horizontal {
                Vector2::new(steps, 0.)
            } else {
                Vector2::new(0., -steps)
            },
            is_discrete: raw % WHEEL_DELTA == 0,
        }
    }

    fn input(&self, msg: u32, wparam: usize, lparam: isize) -> Option<WidgetEvent> {
        use PointerButton::*;
        Some(match msg {
            WM_LBUTTONDOWN => WidgetEvent::ButtonPressed(self.button_event(Left, 1, lparam)),
            WM_RBUTTONDOWN => WidgetEvent::ButtonPressed(self.button_event(Right, 1, lparam)),
            WM_MBUTTONDOWN => WidgetEvent::ButtonPressed(self.button_event(Middle, 1, lparam)),
            WM_LBUTTONDBLCLK => WidgetEvent::ButtonPressed(self.button_event(Left, 2, lparam)),
            WM_RBUTTONDBLCLK => WidgetEvent::ButtonPressed(self.button_event(Right, 2, lparam)),
            WM_MBUTTONDBLCLK => WidgetEvent::ButtonPressed(self.button_event(Middle, 2, lparam)),
            WM_LBUTTONUP => WidgetEvent::ButtonReleased(self.button_event(Left, 1, lparam)),
            WM_RBUTTONUP => WidgetEvent::ButtonReleased(self.button_event(Right, 1, lparam)),
            WM_MBUTTONUP => WidgetEvent::ButtonReleased(self.button_event(Middle, 1, lparam)),
            WM_MOUSEMOVE => WidgetEvent::MouseMoved(MouseMoved {
                position: Point2::new(f64::from(low_word(lparam)), f64::from(high_word(lparam))),
                modifiers: self.modifiers(),
            }),
            WM_MOUSEWHEEL => WidgetEvent::Scrolled(self.scroll(wparam, lparam, false)),
            WM_MOUSEHWHEEL => WidgetEvent::Scrolled(self.scroll(wparam, lparam, true)),
            WM_KEYDOWN => WidgetEvent::KeyPressed(self.key_event(wparam, lparam & KEY_PREVIOUS_STATE != 0)),
            WM_KEYUP => WidgetEvent::KeyReleased(self.key_event(wparam, false)),
            _ => return None,
        })
    }

    fn handle(&self, message: WindowMessage) -> bool {
        let event = match message {
            WindowMessage::Input { msg, wparam, lparam } => match self.input(msg, wparam, lparam) {
                Some(event) => event,
                None => return false,
            },
            WindowMessage::WindowPosChanged(bounds) => WidgetEvent::BoundsChanged(bounds.into()),
            WindowMessage::Paint { graphics, clip } => {
                let ctx = DrawingContext::new(Box::new(GdiPlusContext::new(graphics)));
                return self.events.draw(ctx, clip.into()).is_ok();
            }
        };
        self.events.emit(&event);
        true
    }
}

fn proposed(width: f64, height: f64) -> Size {
    Size {
        width: width.round().max(0.) as i32,
        height: height.round().max(0.) as i32,
    }
}

/// A Windows Forms control.
#[derive(Debug)]
pub struct FormsView {
    forms: Arc<dyn WinForms>,
    hwnd: HWND,
    kind: Option<WidgetKind>,
}

impl FormsView {
    pub fn new(forms: Arc<dyn WinForms>) -> FormsView {
        FormsView {
            forms,
            hwnd: HWND::NULL,
            kind: None,
        }
    }

    /// The native control; [`HWND::NULL`] before creation and after disposal.
    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    fn preferred(&self, proposed: Size) -> (Size, Size) {
        (
            self.forms.minimum_size(self.hwnd),
            self.forms.get_preferred_size(self.hwnd, proposed),
        )
    }
}

impl NativeView for FormsView {
    fn toolkit(&self) -> ToolkitType {
        ToolkitType::WinForms
    }

    fn create(&mut self, kind: WidgetKind, events: &EventSink) -> Result<NativeHandle> {
        let class = match kind {
            WidgetKind::Canvas => ControlClass::Canvas,
            WidgetKind::Label => ControlClass::Label,
            WidgetKind::Button => ControlClass::Button,
            WidgetKind::Container => ControlClass::Panel,
        };
        let hwnd = self.forms.control_new(class);
        if hwnd == HWND::NULL {
            return Err(Error::Native(format!("could not create a {:?}", class)));
        }
        let decoder = MessageDecoder {
            forms: Arc::clone(&self.forms),
            hwnd,
            events: events.clone(),
        };
        self.forms
            .set_message_handler(hwnd, Box::new(move |message| decoder.handle(message)));
        self.hwnd = hwnd;
        self.kind = Some(kind);
        Ok(NativeHandle(hwnd.0))
    }

    fn preferred_width(&mut self) -> WidgetSize {
        let (min, natural) = self.preferred(proposed(0., 0.));
        WidgetSize::new(f64::from(min.width), f64::from(natural.width))
    }

    fn preferred_height(&mut self) -> WidgetSize {
        let (min, natural) = self.preferred(proposed(0., 0.));
        WidgetSize::new(f64::from(min.height), f64::from(natural.height))
    }

    fn preferred_height_for_width(&mut self, width: f64) -> WidgetSize {
        let (min, natural) = self.preferred(proposed(width, 0.));
        WidgetSize::new(f64::from(min.height), f64::from(natural.height))
    }

    fn preferred_width_for_height(&mut self, height: f64) -> WidgetSize {
        let (min, natural) = self.preferred(proposed(0., height));
        WidgetSize::new(f64::from(min.width), f64::from(natural.width))
    }

    fn set_frame(&mut self, rect: Rect, _parent_size: Vector2<f64>) -> Result<()> {
        self.forms.set_bounds(self.hwnd, rect.into());
        Ok(())
    }

    fn add_child(&mut self, child: NativeHandle) -> Result<()> {
        if self.kind != Some(WidgetKind::Container) {
            return Err(Error::Native("only panels can have child controls".into()));
        }
        self.forms.controls_add(self.hwnd, HWND(child.0));
        Ok(())
    }

    fn remove_child(&mut self, child: NativeHandle) -> Result<()> {
        let child = HWND(child.0);
        if self.forms.parent(child) != Some(self.hwnd) {
            return Err(Error::NotAChild);
        }
        self.forms.controls_remove(self.hwnd, child);
        Ok(())
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        match self.kind {
            Some(kind) if kind.has_text() => {
                self.forms.set_text(self.hwnd, text);
                Ok(())
            }
            _ => Err(Error::Native(format!("{:?} has no text", self.kind))),
        }
    }

    fn queue_draw(&mut self) {
        self.forms.invalidate(self.hwnd);
    }

    fn destroy(&mut self) {
        if self.hwnd != HWND::NULL {
            self.forms.dispose(self.hwnd);
            self.hwnd = HWND::NULL;
        }
    }
}
