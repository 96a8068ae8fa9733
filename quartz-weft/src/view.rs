//! AppKit views.
//!
//! Frames are y-up in unflipped superviews; the conversion happens here in both directions.

use crate::context::QuartzContext;
use crate::ffi::keys::*;
use crate::ffi::*;
use cgmath::{Point2, Vector2};
use std::sync::Arc;
use weft_core::events::{ButtonEvent, KeyCode, KeyEvent, KeyModifiers, MouseMoved, PointerButton, Scroll};
use weft_core::view::{NativeView, WidgetSize};
use weft_core::{DrawingContext, Error, EventSink, NativeHandle, Rect, Result, ToolkitType, WidgetEvent, WidgetKind};

pub(crate) fn modifiers(flags: u64) -> KeyModifiers {
    KeyModifiers {
        shift: flags & NS_EVENT_MODIFIER_FLAG_SHIFT != 0,
        control: flags & NS_EVENT_MODIFIER_FLAG_CONTROL != 0,
        option: flags & NS_EVENT_MODIFIER_FLAG_OPTION != 0,
        command: flags & NS_EVENT_MODIFIER_FLAG_COMMAND != 0,
    }
}

const KEYS: [(u16, KeyCode); 62] = [
    (KVK_ANSI_A, KeyCode::A),
    (KVK_ANSI_B, KeyCode::B),
    (KVK_ANSI_C, KeyCode::C),
    (KVK_ANSI_D, KeyCode::D),
    (KVK_ANSI_E, KeyCode::E),
    (KVK_ANSI_F, KeyCode::F),
    (KVK_ANSI_G, KeyCode::G),
    (KVK_ANSI_H, KeyCode::H),
    (KVK_ANSI_I, KeyCode::I),
    (KVK_ANSI_J, KeyCode::J),
    (KVK_ANSI_K, KeyCode::K),
    (KVK_ANSI_L, KeyCode::L),
    (KVK_ANSI_M, KeyCode::M),
    (KVK_ANSI_N, KeyCode::N),
    (KVK_ANSI_O, KeyCode::O),
    (KVK_ANSI_P, KeyCode::P),
    (KVK_ANSI_Q, KeyCode::Q),
    (KVK_ANSI_R, KeyCode::R),
    (KVK_ANSI_S, KeyCode::S),
    (KVK_ANSI_T, KeyCode::T),
    (KVK_ANSI_U, KeyCode::U),
    (KVK_ANSI_V, KeyCode::V),
    (KVK_ANSI_W, KeyCode::W),
    (KVK_ANSI_X, KeyCode::X),
    (KVK_ANSI_Y, KeyCode::Y),
    (KVK_ANSI_Z, KeyCode::Z),
    (KVK_ANSI_0, KeyCode::N0),
    (KVK_ANSI_1, KeyCode::N1),
    (KVK_ANSI_2, KeyCode::N2),
    (KVK_ANSI_3, KeyCode::N3),
    (KVK_ANSI_4, KeyCode::N4),
    (KVK_ANSI_5, KeyCode::N5),
    (KVK_ANSI_6, KeyCode::N6),
    (KVK_ANSI_7, KeyCode::N7),
    (KVK_ANSI_8, KeyCode::N8),
    (KVK_ANSI_9, KeyCode::N9),
    (KVK_RETURN, KeyCode::Return),
    (KVK_TAB, KeyCode::Tab),
    (KVK_SPACE, KeyCode::Space),
    (KVK_DELETE, KeyCode::Delete),
    (KVK_ESCAPE, KeyCode::Escape),
    (KVK_LEFT_ARROW, KeyCode::LeftArrow),
    (KVK_DOWN_ARROW, KeyCode::DownArrow),
    (KVK_UP_ARROW, KeyCode::UpArrow),
    (KVK_RIGHT_ARROW, KeyCode::RightArrow),
    (KVK_FORWARD_DELETE, KeyCode::ForwardDelete),
    (KVK_HOME, KeyCode::Home),
    (KVK_END, KeyCode::End),
    (KVK_PAGE_UP, KeyCode::PageUp),
    (KVK_PAGE_DOWN, KeyCode::PageDown),
    (KVK_F1, KeyCode::F1),
    (KVK_F2, KeyCode::F2),
    (KVK_F3, KeyCode::F3),
    (KVK_F4, KeyCode::F4),
    (KVK_F5, KeyCode::F5),
    (KVK_F6, KeyCode::F6),
    (KVK_F7, KeyCode::F7),
    (KVK_F8, KeyCode::F8),
    (KVK_F9, KeyCode::F9),
    (KVK_F10, KeyCode::F10),
    (KVK_F11, KeyCode::F11),
    (KVK_F12, KeyCode::F12),
];

pub(crate) fn key_code(key: u16) -> Option<KeyCode> {
    KEYS.iter().find(|(k, _)| *k == key).map(|(_, code)| *code)
}

/// Converts between a frame in a superview and the neutral y-down rectangle.
///
/// The conversion is its own inverse.
fn flip_frame(rect: Rect, parent_height: f64) -> Rect {
    Rect::from_xywh(
        rect.x(),
        parent_height - rect.y() - rect.height(),
        rect.width(),
        rect.height(),
    )
}

/// Everything an event handler needs to know about its view.
struct EventContext {
    appkit: Arc<dyn AppKit>,
    core_text: Arc<dyn CoreText>,
    view: NSView,
    events: EventSink,
}

impl EventContext {
    /// Converts a location to y-down view coordinates.
    fn location(&self, point: CGPoint) -> Point2<f64> {
        if self.appkit.is_flipped(self.view) {
            Point2::new(point.x, point.y)
        } else {
            Point2::new(point.x, self.appkit.frame(self.view).size.height - point.y)
        }
    }

    fn button_event(&self, e: &NSMouseEvent) -> ButtonEvent {
        ButtonEvent {
            position: self.location(e.location),
            button: match e.button_number {
                0 => PointerButton::Left,
                1 => PointerButton::Right,
                2 => PointerButton::Middle,
                n => PointerButton::Other(n.max(0).min(255) as u8),
            },
            click_count: e.click_count.max(1) as u32,
            modifiers: modifiers(e.modifier_flags),
        }
    }

    fn neutral_frame(&self, frame: NSRect) -> Rect {
        match self.appkit.superview(self.view) {
            Some(parent) if !self.appkit.is_flipped(parent) => {
                flip_frame(frame.into(), self.appkit.frame(parent).size.height)
            }
            _ => frame.into(),
        }
    }

    fn handle(&self, event: NSEvent) -> bool {
        let event = match event {
            NSEvent::MouseDown(e) => WidgetEvent::ButtonPressed(self.button_event(&e)),
            NSEvent::MouseUp(e) => WidgetEvent::ButtonReleased(self.button_event(&e)),
            NSEvent::MouseMoved(e) | NSEvent::MouseDragged(e) => WidgetEvent::MouseMoved(MouseMoved {
                position: self.location(e.location),
                modifiers: modifiers(e.modifier_flags),
            }),
            NSEvent::ScrollWheel(e) => WidgetEvent::Scrolled(Scroll {
                position: self.location(e.location),
                delta: Vector2::new(-e.scrolling_delta_x, -e.scrolling_delta_y),
                is_discrete: !e.has_precise_scrolling_deltas,
            }),
            NSEvent::KeyDown(e) => WidgetEvent::KeyPressed(KeyEvent {
                code: key_code(e.key_code),
                modifiers: modifiers(e.modifier_flags),
                is_repeat: e.is_a_repeat,
            }),
            NSEvent::KeyUp(e) => WidgetEvent::KeyReleased(KeyEvent {
                code: key_code(e.key_code),
                modifiers: modifiers(e.modifier_flags),
                is_repeat: false,
            }),
            NSEvent::FrameChanged(frame) => WidgetEvent::BoundsChanged(self.neutral_frame(frame)),
            NSEvent::DrawRect { cg, dirty } => {
                let ctx = DrawingContext::new(Box::new(QuartzContext::new(cg, Arc::clone(&self.core_text))));
                return self.events.draw(ctx, dirty.into()).is_ok();
            }
        };
        self.events.emit(&event);
        true
    }
}

/// An AppKit view.
#[derive(Debug)]
pub struct QuartzView {
    appkit: Arc<dyn AppKit>,
    core_text: Arc<dyn CoreText>,
    view: NSView,
    kind: Option<WidgetKind>,
}

impl QuartzView {
    pub fn new(appkit: Arc<dyn AppKit>, core_text: Arc<dyn CoreText>) -> QuartzView {
        QuartzView {
            appkit,
            core_text,
            view: NSView::NULL,
            kind: None,
        }
    }

    /// The native view; [`NSView::NULL`] before creation and after destruction.
    pub fn view(&self) -> NSView {
        self.view
    }

    /// Measures the fitting size with the frame temporarily resized.
    fn fitting_size_with(&self, size: NSSize) -> NSSize {
        let frame = self.appkit.frame(self.view);
        self.appkit.set_frame_size(self.view, size);
        let fitting = self.appkit.fitting_size(self.view);
        self.appkit.set_frame_size(self.view, frame.size);
        fitting
    }
}

impl NativeView for QuartzView {
    fn toolkit(&self) -> ToolkitType {
        ToolkitType::Cocoa
    }

    fn create(&mut self, kind: WidgetKind, events: &EventSink) -> Result<NativeHandle> {
        let class = match kind {
            WidgetKind::Canvas => NSViewClass::Canvas,
            WidgetKind::Label => NSViewClass::TextField,
            WidgetKind::Button => NSViewClass::Button,
            WidgetKind::Container => NSViewClass::View,
        };
        let view = self.appkit.view_new(class);
        if view == NSView::NULL {
            return Err(Error::Native(format!("could not create a {:?}", class)));
        }
        let context = EventContext {
            appkit: Arc::clone(&self.appkit),
            core_text: Arc::clone(&self.core_text),
            view,
            events: events.clone(),
        };
        self.appkit
            .set_event_handler(view, Box::new(move |event| context.handle(event)));
        self.view = view;
        self.kind = Some(kind);
        Ok(NativeHandle(view.0))
    }

    fn preferred_width(&mut self) -> WidgetSize {
        WidgetSize::fixed(self.appkit.fitting_size(self.view).width)
    }

    fn preferred_height(&mut self) -> WidgetSize {
        WidgetSize::fixed(self.appkit.fitting_size(self.view).height)
    }

    fn preferred_height_for_width(&mut self, width: f64) -> WidgetSize {
        let height = self.appkit.frame(self.view).size.height;
        WidgetSize::fixed(self.fitting_size_with(NSSize { width, height }).height)
    }

    fn preferred_width_for_height(&mut self, height: f64) -> WidgetSize {
        let width = self.appkit.frame(self.view).size.width;
        WidgetSize::fixed(self.fitting_size_with(NSSize { width, height }).width)
    }

    fn set_frame(&mut self, rect: Rect, parent_size: Vector2<f64>) -> Result<()> {
        let frame = match self.appkit.superview(self.view) {
            Some(parent) if !self.appkit.is_flipped(parent) => flip_frame(rect, parent_size.y),
            _ => rect,
        };
        self.appkit.set_frame(self.view, frame.into());
        Ok(())
    }

    fn add_child(&mut self, child: NativeHandle) -> Result<()> {
        self.appkit.add_subview(self.view, NSView(child.0));
        Ok(())
    }

    fn remove_child(&mut self, child: NativeHandle) -> Result<()> {
        let child = NSView(child.0);
        if self.appkit.superview(child) != Some(self.view) {
            return Err(Error::NotAChild);
        }
        self.appkit.remove_from_superview(child);
        Ok(())
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        match self.kind {
            Some(kind) if kind.has_text() => {
                self.appkit.set_string_value(self.view, text);
                Ok(())
            }
            _ => Err(Error::Native(format!("{:?} has no text", self.kind))),
        }
    }

    fn queue_draw(&mut self) {
        self.appkit.set_needs_display(self.view);
    }

    fn destroy(&mut self) {
        if self.view != NSView::NULL {
            self.appkit.remove_from_superview(self.view);
            self.appkit.release(self.view);
            self.view = NSView::NULL;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{CGCall, HeadlessAppKit, HeadlessCoreText};
    use parking_lot::Mutex;
    use weft_core::{Color, ViewBackend, WidgetBackend};

    fn view(appkit: &Arc<HeadlessAppKit>, kind: WidgetKind) -> ViewBackend<QuartzView> {
        let mut view = ViewBackend::new(QuartzView::new(appkit.clone(), Arc::new(HeadlessCoreText)));
        view.initialize(kind).unwrap();
        view
    }

    fn recorded(view: &ViewBackend<QuartzView>) -> Arc<Mutex<Vec<WidgetEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        view.events().on_event(move |e| sink.lock().push(e.clone()));
        events
    }

    #[test]
    fn fitting_size_is_min_and_natural() {
        let appkit = Arc::new(HeadlessAppKit::new());
        let mut label = view(&appkit, WidgetKind::Label);
        label.set_text("hello world").unwrap();
        assert_eq!(label.preferred_width().unwrap(), WidgetSize::fixed(55.));
        assert_eq!(label.preferred_height().unwrap(), WidgetSize::fixed(12.));
        // wraps to three lines at 20pt
        assert_eq!(label.preferred_height_for_width(20.).unwrap(), WidgetSize::fixed(36.));
        assert_eq!(appkit.frame(label.native().view()).size.width, 0.);
    }

    #[test]
    fn frames_are_flipped_in_unflipped_parents() {
        let appkit = Arc::new(HeadlessAppKit::new());
        let mut container = view(&appkit, WidgetKind::Container);
        let mut canvas = view(&appkit, WidgetKind::Canvas);
        let mut button = view(&appkit, WidgetKind::Button);
        let events = recorded(&button);
        container.add_child(&mut canvas).unwrap();
        canvas.add_child(&mut button).unwrap();

        container
            .set_allocation(Rect::from_xywh(0., 0., 100., 100.), Vector2::new(100., 100.))
            .unwrap();
        container.finish_allocation();
        container
            .set_child_bounds(&mut canvas, Rect::from_xywh(10., 20., 50., 40.))
            .unwrap();
        canvas.finish_allocation();
        canvas
            .set_child_bounds(&mut button, Rect::from_xywh(5., 5., 30., 20.))
            .unwrap();
        button.finish_allocation();

        // 100 - 20 - 40
        assert_eq!(appkit.frame(canvas.native().view()), CGRect::new(10., 40., 50., 40.));
        // the canvas is flipped
        assert_eq!(appkit.frame(button.native().view()), CGRect::new(5., 5., 30., 20.));
        assert_eq!(
            *events.lock(),
            vec![WidgetEvent::BoundsChanged(Rect::from_xywh(5., 5., 30., 20.))]
        );
    }

    #[test]
    fn bounds_changes_report_neutral_frames() {
        let appkit = Arc::new(HeadlessAppKit::new());
        let mut container = view(&appkit, WidgetKind::Container);
        let mut label = view(&appkit, WidgetKind::Label);
        container.add_child(&mut label).unwrap();
        container
            .set_allocation(Rect::from_xywh(0., 0., 100., 50.), Vector2::new(100., 50.))
            .unwrap();
        container.finish_allocation();
        let events = recorded(&label);
        appkit.set_frame(label.native().view(), CGRect::new(0., 30., 40., 20.));
        assert_eq!(
            *events.lock(),
            vec![WidgetEvent::BoundsChanged(Rect::from_xywh(0., 0., 40., 20.))]
        );
    }

    #[test]
    fn input_is_translated() {
        let appkit = Arc::new(HeadlessAppKit::new());
        let mut button = view(&appkit, WidgetKind::Button);
        button
            .set_allocation(Rect::from_xywh(0., 0., 80., 22.), Vector2::new(80., 22.))
            .unwrap();
        button.finish_allocation();
        let events = recorded(&button);
        let native = button.native().view();

        appkit.send_event(
            native,
            NSEvent::MouseDown(NSMouseEvent {
                location: CGPoint { x: 4., y: 2. },
                button_number: 1,
                click_count: 1,
                modifier_flags: NS_EVENT_MODIFIER_FLAG_OPTION,
            }),
        );
        appkit.send_event(
            native,
            NSEvent::ScrollWheel(NSScrollEvent {
                location: CGPoint { x: 0., y: 0. },
                scrolling_delta_x: 0.,
                scrolling_delta_y: 3.5,
                has_precise_scrolling_deltas: true,
                modifier_flags: 0,
            }),
        );
        appkit.send_event(
            native,
            NSEvent::KeyDown(NSKeyEvent {
                key_code: KVK_ANSI_Q,
                modifier_flags: NS_EVENT_MODIFIER_FLAG_COMMAND,
                is_a_repeat: true,
            }),
        );

        let events = events.lock();
        assert_eq!(
            events[0],
            WidgetEvent::ButtonPressed(ButtonEvent {
                position: Point2::new(4., 20.),
                button: PointerButton::Right,
                click_count: 1,
                modifiers: KeyModifiers {
                    option: true,
                    ..KeyModifiers::default()
                },
            })
        );
        match &events[1] {
            WidgetEvent::Scrolled(e) => {
                assert_eq!(e.delta, Vector2::new(0., -3.5));
                assert!(!e.is_discrete);
            }
            e => panic!("unexpected event {:?}", e),
        }
        assert_eq!(
            events[2],
            WidgetEvent::KeyPressed(KeyEvent {
                code: Some(KeyCode::Q),
                modifiers: KeyModifiers {
                    command: true,
                    ..KeyModifiers::default()
                },
                is_repeat: true,
            })
        );
    }

    #[test]
    fn key_table_has_no_duplicates() {
        for (i, (key, code)) in KEYS.iter().enumerate() {
            assert!(KEYS[i + 1..].iter().all(|(k, c)| k != key && c != code));
        }
        assert_eq!(key_code(KVK_F10), Some(KeyCode::F10));
        assert_eq!(key_code(0x3F), None);
    }

    #[test]
    fn draw_rect_runs_the_handler() {
        let appkit = Arc::new(HeadlessAppKit::new());
        let mut canvas = view(&appkit, WidgetKind::Canvas);
        canvas
            .set_allocation(Rect::from_xywh(0., 0., 30., 30.), Vector2::new(30., 30.))
            .unwrap();
        canvas.finish_allocation();
        canvas.events().set_draw_handler(|ctx, dirty| {
            assert_eq!(dirty, Rect::from_xywh(0., 0., 30., 30.));
            ctx.set_color(Color::GREEN)?;
            ctx.move_to(0., 0.)?;
            ctx.line_to(30., 30.)?;
            ctx.stroke()
        });
        let log = appkit.display(canvas.native().view());
        let log = log.lock();
        assert!(log.contains(&CGCall::SetStrokeColor(Color::GREEN.into())));
        assert!(log.contains(&CGCall::StrokePath));
        assert_eq!(log.last(), Some(&CGCall::Release));
    }

    #[test]
    fn destroy_releases() {
        let appkit = Arc::new(HeadlessAppKit::new());
        let mut container = view(&appkit, WidgetKind::Container);
        let mut canvas = view(&appkit, WidgetKind::Canvas);
        container.add_child(&mut canvas).unwrap();
        let native = canvas.native().view();
        canvas.dispose();
        assert!(appkit.is_released(native));
        assert!(appkit.subviews(container.native().view()).is_empty());
    }
}
