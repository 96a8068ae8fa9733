//! Widgets.

use cgmath::Vector2;
use core::fmt;
use weft_core::{
    DrawingContext, EventSink, Lifecycle, Rect, Result, Toolkit, WidgetBackend, WidgetEvent, WidgetKind, WidgetSize,
};

/// Something that takes part in layout: a widget, or a container laying out widgets.
pub trait Element: fmt::Debug {
    fn backend(&self) -> &dyn WidgetBackend;

    fn backend_mut(&mut self) -> &mut dyn WidgetBackend;

    fn preferred_width(&mut self) -> Result<WidgetSize> {
        self.backend_mut().preferred_width()
    }

    fn preferred_height(&mut self) -> Result<WidgetSize> {
        self.backend_mut().preferred_height()
    }

    fn preferred_height_for_width(&mut self, width: f64) -> Result<WidgetSize> {
        self.backend_mut().preferred_height_for_width(width)
    }

    fn preferred_width_for_height(&mut self, height: f64) -> Result<WidgetSize> {
        self.backend_mut().preferred_width_for_height(height)
    }

    /// Lays out children after this element’s own allocation.
    fn layout_children(&mut self) -> Result<()> {
        Ok(())
    }

    /// Allocates `rect` to this element as a top-level view (one without a parent widget),
    /// then lays out its children.
    fn allocate(&mut self, rect: Rect) -> Result<()> {
        let parent_size = Vector2::new(rect.x() + rect.width(), rect.y() + rect.height());
        let result = self.backend_mut().set_allocation(rect, parent_size);
        self.backend_mut().finish_allocation();
        result?;
        self.layout_children()
    }
}

/// A widget on the active toolkit.
///
/// The widget owns its backend, which owns the native view; both are released on
/// [`Widget::dispose`] or drop.
#[derive(Debug)]
pub struct Widget {
    backend: Box<dyn WidgetBackend>,
}

impl Widget {
    pub fn new(toolkit: &dyn Toolkit, kind: WidgetKind) -> Result<Widget> {
        Ok(Widget {
            backend: toolkit.new_widget(kind)?,
        })
    }

    /// Wraps an initialized backend.
    pub fn from_backend(backend: Box<dyn WidgetBackend>) -> Widget {
        Widget { backend }
    }

    pub fn kind(&self) -> Option<WidgetKind> {
        self.backend.kind()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.backend.lifecycle()
    }

    pub fn events(&self) -> &EventSink {
        self.backend.events()
    }

    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.backend.set_text(text)
    }

    /// Overrides the minimum size; negative values keep the native minimum.
    pub fn set_min_size(&mut self, width: f64, height: f64) -> Result<()> {
        self.backend.set_min_size(width, height)
    }

    /// Overrides the natural size; negative values keep the native natural size.
    pub fn set_natural_size(&mut self, width: f64, height: f64) -> Result<()> {
        self.backend.set_natural_size(width, height)
    }

    /// Adds an event handler.
    pub fn on_event<F: 'static + FnMut(&WidgetEvent) + Send>(&self, handler: F) {
        self.backend.events().on_event(handler);
    }

    /// Sets the draw handler of a canvas.
    pub fn on_draw<F>(&self, handler: F)
    where
        F: 'static + FnMut(&mut DrawingContext, Rect) -> Result<()> + Send,
    {
        self.backend.events().set_draw_handler(handler);
    }

    pub fn queue_draw(&mut self) -> Result<()> {
        self.backend.queue_draw()
    }

    /// The rectangle last allocated to this widget, in its parent’s coordinates.
    pub fn allocation(&self) -> Rect {
        self.backend.allocation()
    }

    pub fn dispose(&mut self) {
        self.backend.dispose();
    }
}

impl Element for Widget {
    fn backend(&self) -> &dyn WidgetBackend {
        &*self.backend
    }

    fn backend_mut(&mut self) -> &mut dyn WidgetBackend {
        &mut *self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairo_weft::GtkToolkit;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use weft_core::Error;

    #[test]
    fn min_size_override_wins_over_native_size() {
        let (toolkit, _) = GtkToolkit::headless();
        let mut button = Widget::new(&toolkit, WidgetKind::Button).unwrap();
        button.set_text("hello").unwrap();
        assert_eq!(button.preferred_width().unwrap().min_size, 41.);
        button.set_min_size(200., 50.).unwrap();
        assert_eq!(button.preferred_width().unwrap().min_size, 200.);
        assert_eq!(button.preferred_height().unwrap().min_size, 50.);
    }

    #[test]
    fn top_level_allocation_reports_bounds() {
        let (toolkit, _) = GtkToolkit::headless();
        let mut canvas = Widget::new(&toolkit, WidgetKind::Canvas).unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        canvas.on_event(move |e| sink.lock().push(e.clone()));

        canvas.allocate(Rect::from_xywh(0., 0., 64., 32.)).unwrap();
        assert_eq!(canvas.allocation(), Rect::from_xywh(0., 0., 64., 32.));
        assert_eq!(
            *events.lock(),
            vec![WidgetEvent::BoundsChanged(Rect::from_xywh(0., 0., 64., 32.))]
        );
        // the allocation pass is over
        assert!(canvas.preferred_width().is_ok());
    }

    #[test]
    fn disposed_widgets_fail_fast() {
        let (toolkit, gtk) = GtkToolkit::headless();
        let mut label = Widget::new(&toolkit, WidgetKind::Label).unwrap();
        let native = label.backend().native_handle().unwrap();
        label.dispose();
        assert_eq!(label.lifecycle(), Lifecycle::Disposed);
        assert!(gtk.is_destroyed(cairo_weft::ffi::GtkWidget(native.0)));
        assert!(matches!(label.set_text("x"), Err(Error::InvalidState { .. })));
        assert!(matches!(label.queue_draw(), Err(Error::InvalidState { .. })));
    }
}
