//! GTK widgets.

use crate::context::CairoContext;
use crate::ffi::keys::*;
use crate::ffi::*;
use cgmath::{Point2, Vector2};
use std::sync::Arc;
use weft_core::events::{ButtonEvent, KeyCode, KeyEvent, KeyModifiers, MouseMoved, PointerButton, Scroll};
use weft_core::view::{NativeView, WidgetSize};
use weft_core::{DrawingContext, Error, EventSink, NativeHandle, Rect, Result, ToolkitType, WidgetEvent, WidgetKind};

const INPUT_SIGNALS: [&str; 7] = [
    "button-press-event",
    "button-release-event",
    "motion-notify-event",
    "scroll-event",
    "key-press-event",
    "key-release-event",
    "size-allocate",
];

pub(crate) fn modifiers(state: u32) -> KeyModifiers {
    KeyModifiers {
        shift: state & GDK_SHIFT_MASK != 0,
        control: state & GDK_CONTROL_MASK != 0,
        option: state & GDK_MOD1_MASK != 0,
        command: state & (GDK_SUPER_MASK | GDK_META_MASK) != 0,
    }
}

fn pointer_button(button: u32) -> PointerButton {
    match button {
        1 => PointerButton::Left,
        2 => PointerButton::Middle,
        3 => PointerButton::Right,
        n => PointerButton::Other(n.min(u32::from(u8::max_value())) as u8),
    }
}

pub(crate) fn key_code(keyval: u32) -> Option<KeyCode> {
    match keyval {
        k @ GDK_KEY_A..=GDK_KEY_Z | k @ GDK_KEY_UPPER_A..=GDK_KEY_UPPER_Z | k @ GDK_KEY_0..=GDK_KEY_9 => {
            KeyCode::from_char(k as u8 as char)
        }
        GDK_KEY_SPACE => Some(KeyCode::Space),
        GDK_KEY_RETURN => Some(KeyCode::Return),
        GDK_KEY_TAB => Some(KeyCode::Tab),
        GDK_KEY_BACKSPACE => Some(KeyCode::Delete),
        GDK_KEY_ESCAPE => Some(KeyCode::Escape),
        GDK_KEY_DELETE => Some(KeyCode::ForwardDelete),
        GDK_KEY_LEFT => Some(KeyCode::LeftArrow),
        GDK_KEY_RIGHT => Some(KeyCode::RightArrow),
        GDK_KEY_UP => Some(KeyCode::UpArrow),
        GDK_KEY_DOWN => Some(KeyCode::DownArrow),
        GDK_KEY_HOME => Some(KeyCode::Home),
        GDK_KEY_END => Some(KeyCode::End),
        GDK_KEY_PAGE_UP => Some(KeyCode::PageUp),
        GDK_KEY_PAGE_DOWN => Some(KeyCode::PageDown),
        k @ GDK_KEY_F1..=GDK_KEY_F12 => KeyCode::function((k - GDK_KEY_F1 + 1) as u8),
        _ => None,
    }
}

fn button_event(e: &GdkEventButton) -> ButtonEvent {
    ButtonEvent {
        position: Point2::new(e.x, e.y),
        button: pointer_button(e.button),
        click_count: match e.event_type {
            GdkEventType::DoubleButtonPress => 2,
            GdkEventType::TripleButtonPress => 3,
            GdkEventType::ButtonPress | GdkEventType::ButtonRelease => 1,
        },
        modifiers: modifiers(e.state),
    }
}

fn key_event(e: &GdkEventKey) -> KeyEvent {
    KeyEvent {
        code: key_code(e.keyval),
        modifiers: modifiers(e.state),
        // GDK doesn’t flag auto-repeat
        is_repeat: false,
    }
}

/// Translates a GTK signal into a widget event, or a draw call.
fn dispatch(events: &EventSink, signal: GtkSignal) -> bool {
    let event = match signal {
        GtkSignal::ButtonPress(e) => WidgetEvent::ButtonPressed(button_event(&e)),
        GtkSignal::ButtonRelease(e) => WidgetEvent::ButtonReleased(button_event(&e)),
        GtkSignal::MotionNotify(e) => WidgetEvent::MouseMoved(MouseMoved {
            position: Point2::new(e.x, e.y),
            modifiers: modifiers(e.state),
        }),
        GtkSignal::Scroll(e) => {
            let (delta, is_discrete) = match e.direction {
                GdkScrollDirection::Up => (Vector2::new(0., -1.), true),
                GdkScrollDirection::Down => (Vector2::new(0., 1.), true),
                GdkScrollDirection::Left => (Vector2::new(-1., 0.), true),
                GdkScrollDirection::Right => (Vector2::new(1., 0.), true),
                GdkScrollDirection::Smooth => (Vector2::new(e.delta_x, e.delta_y), false),
            };
            WidgetEvent::Scrolled(Scroll {
                position: Point2::new(e.x, e.y),
                delta,
                is_discrete,
            })
        }
        GtkSignal::KeyPress(e) => WidgetEvent::KeyPressed(key_event(&e)),
        GtkSignal::KeyRelease(e) => WidgetEvent::KeyReleased(key_event(&e)),
        GtkSignal::SizeAllocate(allocation) => WidgetEvent::BoundsChanged(allocation.into()),
        GtkSignal::Draw { cr, width, height } => {
            let ctx = DrawingContext::new(Box::new(CairoContext::new(cr)));
            let dirty = Rect::from_xywh(0., 0., f64::from(width), f64::from(height));
            return events.draw(ctx, dirty).is_ok();
        }
    };
    events.emit(&event);
    false
}

fn widget_size((min, natural): (i32, i32)) -> WidgetSize {
    WidgetSize::new(f64::from(min), f64::from(natural))
}

/// A GTK widget.
#[derive(Debug)]
pub struct GtkView {
    gtk: Arc<dyn Gtk>,
    widget: GtkWidget,
    kind: Option<WidgetKind>,
}

impl GtkView {
    pub fn new(gtk: Arc<dyn Gtk>) -> GtkView {
        GtkView {
            gtk,
            widget: GtkWidget::NULL,
            kind: None,
        }
    }

    /// The native widget; [`GtkWidget::NULL`] before creation and after destruction.
    pub fn widget(&self) -> GtkWidget {
        self.widget
    }
}

impl NativeView for GtkView {
    fn toolkit(&self) -> ToolkitType {
        ToolkitType::Gtk
    }

    fn create(&mut self, kind: WidgetKind, events: &EventSink) -> Result<NativeHandle> {
        let class = match kind {
            WidgetKind::Canvas => GtkWidgetClass::DrawingArea,
            WidgetKind::Label => GtkWidgetClass::Label,
            WidgetKind::Button => GtkWidgetClass::Button,
            WidgetKind::Container => GtkWidgetClass::Fixed,
        };
        let widget = self.gtk.widget_new(class);
        if widget == GtkWidget::NULL {
            return Err(Error::Native(format!("could not create a {:?}", class)));
        }

        let mut signals = INPUT_SIGNALS.to_vec();
        if kind == WidgetKind::Canvas {
            signals.push("draw");
        }
        for signal in signals {
            let events = events.clone();
            self.gtk
                .signal_connect(widget, signal, Box::new(move |s| dispatch(&events, s)));
        }

        self.widget = widget;
        self.kind = Some(kind);
        Ok(NativeHandle(widget.0))
    }

    fn preferred_width(&mut self) -> WidgetSize {
        widget_size(self.gtk.get_preferred_width(self.widget))
    }

    fn preferred_height(&mut self) -> WidgetSize {
        widget_size(self.gtk.get_preferred_height(self.widget))
    }

    fn preferred_height_for_width(&mut self, width: f64) -> WidgetSize {
        widget_size(
            self.gtk
                .get_preferred_height_for_width(self.widget, width.round() as i32),
        )
    }

    fn preferred_width_for_height(&mut self, height: f64) -> WidgetSize {
        widget_size(
            self.gtk
                .get_preferred_width_for_height(self.widget, height.round() as i32),
        )
    }

    fn set_frame(&mut self, rect: Rect, _parent_size: Vector2<f64>) -> Result<()> {
        self.gtk.size_allocate(self.widget, rect.into());
        Ok(())
    }

    fn add_child(&mut self, child: NativeHandle) -> Result<()> {
        if self.kind != Some(WidgetKind::Container) {
            return Err(Error::Native("only containers can have children".into()));
        }
        self.gtk.container_add(self.widget, GtkWidget(child.0));
        Ok(())
    }

    fn remove_child(&mut self, child: NativeHandle) -> Result<()> {
        self.gtk.container_remove(self.widget, GtkWidget(child.0));
        Ok(())
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        match self.kind {
            Some(kind) if kind.has_text() => {
                self.gtk.set_text(self.widget, text);
                Ok(())
            }
            _ => Err(Error::Native(format!("{:?} has no text", self.kind))),
        }
    }

    fn queue_draw(&mut self) {
        self.gtk.queue_draw(self.widget);
    }

    fn destroy(&mut self) {
        if self.widget != GtkWidget::NULL {
            self.gtk.widget_destroy(self.widget);
            self.widget = GtkWidget::NULL;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{CairoCall, HeadlessGtk};
    use parking_lot::Mutex;
    use weft_core::{Color, ViewBackend, WidgetBackend};

    fn view(gtk: &Arc<HeadlessGtk>, kind: WidgetKind) -> ViewBackend<GtkView> {
        let mut view = ViewBackend::new(GtkView::new(gtk.clone()));
        view.initialize(kind).unwrap();
        view
    }

    fn recorded(view: &ViewBackend<GtkView>) -> Arc<Mutex<Vec<WidgetEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        view.events().on_event(move |e| sink.lock().push(e.clone()));
        events
    }

    #[test]
    fn kinds_map_to_classes() {
        let gtk = Arc::new(HeadlessGtk::new());
        let canvas = view(&gtk, WidgetKind::Canvas);
        let container = view(&gtk, WidgetKind::Container);
        assert_eq!(gtk.class(canvas.native().widget()), Some(GtkWidgetClass::DrawingArea));
        assert_eq!(gtk.class(container.native().widget()), Some(GtkWidgetClass::Fixed));
        assert_eq!(
            canvas.native_handle().unwrap(),
            NativeHandle(canvas.native().widget().0)
        );
    }

    #[test]
    fn sizes_come_from_gtk_with_overrides() {
        let gtk = Arc::new(HeadlessGtk::new());
        let mut button = view(&gtk, WidgetKind::Button);
        button.set_text("hello").unwrap();
        // 5 chars × 5px + 16px padding
        assert_eq!(button.preferred_width().unwrap(), WidgetSize::fixed(41.));
        assert_eq!(button.preferred_height().unwrap(), WidgetSize::fixed(22.));

        button.set_min_size(60., -1.).unwrap();
        assert_eq!(button.preferred_width().unwrap(), WidgetSize::fixed(60.));
        button.set_natural_size(-1., 30.).unwrap();
        assert_eq!(button.preferred_height_for_width(41.).unwrap(), WidgetSize::new(22., 30.));
    }

    #[test]
    fn allocation_reports_bounds() {
        let gtk = Arc::new(HeadlessGtk::new());
        let mut container = view(&gtk, WidgetKind::Container);
        let mut canvas = view(&gtk, WidgetKind::Canvas);
        let events = recorded(&canvas);
        container.add_child(&mut canvas).unwrap();
        assert_eq!(gtk.children(container.native().widget()), vec![canvas.native().widget()]);

        container
            .set_allocation(Rect::from_xywh(0., 0., 100., 100.), Vector2::new(100., 100.))
            .unwrap();
        container.finish_allocation();
        container
            .set_child_bounds(&mut canvas, Rect::from_xywh(10., 20., 30., 40.))
            .unwrap();
        assert_eq!(
            canvas.preferred_width().unwrap_err().to_string(),
            Error::ReentrantSizeQuery.to_string()
        );
        canvas.finish_allocation();

        assert_eq!(
            gtk.allocation(canvas.native().widget()),
            Some(GtkAllocation {
                x: 10,
                y: 20,
                width: 30,
                height: 40,
            })
        );
        assert_eq!(
            *events.lock(),
            vec![WidgetEvent::BoundsChanged(Rect::from_xywh(10., 20., 30., 40.))]
        );
    }

    #[test]
    fn input_is_translated() {
        let gtk = Arc::new(HeadlessGtk::new());
        let canvas = view(&gtk, WidgetKind::Canvas);
        let events = recorded(&canvas);
        let widget = canvas.native().widget();

        gtk.emit(
            widget,
            GtkSignal::ButtonPress(GdkEventButton {
                event_type: GdkEventType::DoubleButtonPress,
                x: 3.,
                y: 4.,
                button: 3,
                state: GDK_CONTROL_MASK | GDK_SHIFT_MASK,
            }),
        );
        gtk.emit(
            widget,
            GtkSignal::Scroll(GdkEventScroll {
                x: 0.,
                y: 0.,
                direction: GdkScrollDirection::Up,
                delta_x: 0.,
                delta_y: 0.,
            }),
        );
        gtk.emit(
            widget,
            GtkSignal::KeyPress(GdkEventKey {
                keyval: GDK_KEY_UPPER_A,
                state: GDK_SUPER_MASK,
            }),
        );

        let events = events.lock();
        assert_eq!(events.len(), 3);
        match &events[0] {
            WidgetEvent::ButtonPressed(e) => {
                assert_eq!(e.position, Point2::new(3., 4.));
                assert_eq!(e.button, PointerButton::Right);
                assert_eq!(e.click_count, 2);
                assert!(e.modifiers.control && e.modifiers.shift && !e.modifiers.command);
            }
            e => panic!("unexpected event {:?}", e),
        }
        match &events[1] {
            WidgetEvent::Scrolled(e) => {
                assert_eq!(e.delta, Vector2::new(0., -1.));
                assert!(e.is_discrete);
            }
            e => panic!("unexpected event {:?}", e),
        }
        match &events[2] {
            WidgetEvent::KeyPressed(e) => {
                assert_eq!(e.code, Some(KeyCode::A));
                assert!(e.modifiers.command);
            }
            e => panic!("unexpected event {:?}", e),
        }
    }

    #[test]
    fn key_mapping() {
        assert_eq!(key_code(GDK_KEY_9), Some(KeyCode::N9));
        assert_eq!(key_code(GDK_KEY_BACKSPACE), Some(KeyCode::Delete));
        assert_eq!(key_code(GDK_KEY_DELETE), Some(KeyCode::ForwardDelete));
        assert_eq!(key_code(GDK_KEY_F12), Some(KeyCode::F12));
        assert_eq!(key_code(0xfe03), None);
    }

    #[test]
    fn draw_runs_the_handler_and_disposes() {
        let gtk = Arc::new(HeadlessGtk::new());
        let mut canvas = view(&gtk, WidgetKind::Canvas);
        canvas
            .set_allocation(Rect::from_xywh(0., 0., 50., 20.), Vector2::new(50., 20.))
            .unwrap();
        canvas.finish_allocation();
        canvas.events().set_draw_handler(|ctx, dirty| {
            ctx.set_color(Color::RED)?;
            ctx.rectangle(dirty.x(), dirty.y(), dirty.width(), dirty.height())?;
            ctx.fill()
        });

        let log = gtk.draw(canvas.native().widget());
        let log = log.lock();
        assert!(log.contains(&CairoCall::Rectangle([0., 0., 50., 20.])));
        assert!(log.contains(&CairoCall::SetSourceRgba([1., 0., 0., 1.])));
        assert_eq!(log.last(), Some(&CairoCall::Destroy));
    }

    #[test]
    fn drawing_stays_at_the_widget_origin() {
        let gtk = Arc::new(HeadlessGtk::new());
        let mut canvas = view(&gtk, WidgetKind::Canvas);
        canvas
            .set_allocation(Rect::from_xywh(30., 40., 50., 20.), Vector2::new(100., 100.))
            .unwrap();
        canvas.finish_allocation();
        canvas.events().set_draw_handler(|ctx, dirty| {
            ctx.rectangle(dirty.x(), dirty.y(), dirty.width(), dirty.height())?;
            ctx.fill()
        });

        let log = gtk.draw(canvas.native().widget());
        let matrix = log
            .lock()
            .iter()
            .find_map(|c| match c {
                CairoCall::SetMatrix(m) => Some(*m),
                _ => None,
            })
            .unwrap();
        assert_eq!((matrix.x0, matrix.y0), (30., 40.));
    }

    #[test]
    fn draw_panics_stay_inside() {
        let gtk = Arc::new(HeadlessGtk::new());
        let canvas = view(&gtk, WidgetKind::Canvas);
        canvas.events().set_draw_handler(|_, _| panic!("oh no"));
        let log = gtk.draw(canvas.native().widget());
        assert_eq!(*log.lock(), vec![CairoCall::Destroy]);
    }

    #[test]
    fn disposing_destroys_the_widget() {
        let gtk = Arc::new(HeadlessGtk::new());
        let mut label = view(&gtk, WidgetKind::Label);
        let widget = label.native().widget();
        assert!(view(&gtk, WidgetKind::Canvas).set_text("x").is_err());
        label.dispose();
        assert!(gtk.is_destroyed(widget));
        assert_eq!(label.native().widget(), GtkWidget::NULL);
    }
}
