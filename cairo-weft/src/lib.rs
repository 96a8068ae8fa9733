//! GTK backend for weft.
//!
//! Drawing goes through Cairo, text is measured with Pango and widgets are GTK widgets sized with
//! GTK’s minimum/natural size requests. The native surface is described by the traits in
//! [`ffi`]; [`headless`] implements them without a display. With the `gtk` feature, `native`
//! implements the drawing and text traits on the system Cairo and Pango libraries.

mod context;
pub mod ffi;
pub mod headless;
#[cfg(feature = "gtk")]
pub mod native;
mod text;
mod view;

pub use context::CairoContext;
pub use text::PangoMeasurer;
pub use view::GtkView;

use crate::ffi::{Gtk, Pango};
use crate::headless::{HeadlessGtk, HeadlessPango};
use std::sync::Arc;
use weft_core::image::Image;
use weft_core::text::TextMeasurer;
use weft_core::{DrawingContext, Error, Result, Toolkit, ToolkitType, ViewBackend, WidgetBackend};

fn dimension(value: u32) -> Result<i32> {
    if value == 0 || value > i32::max_value() as u32 {
        return Err(Error::Native(format!("invalid surface dimension {}", value)));
    }
    Ok(value as i32)
}

/// The GTK toolkit.
#[derive(Debug, Clone)]
pub struct GtkToolkit {
    gtk: Arc<dyn Gtk>,
    pango: Arc<dyn Pango>,
}

impl GtkToolkit {
    pub fn new(gtk: Arc<dyn Gtk>, pango: Arc<dyn Pango>) -> GtkToolkit {
        GtkToolkit { gtk, pango }
    }

    /// A toolkit on [`HeadlessGtk`] and [`HeadlessPango`].
    pub fn headless() -> (GtkToolkit, Arc<HeadlessGtk>) {
        let gtk = Arc::new(HeadlessGtk::new());
        (GtkToolkit::new(gtk.clone(), Arc::new(HeadlessPango)), gtk)
    }
}

impl Toolkit for GtkToolkit {
    fn toolkit_type(&self) -> ToolkitType {
        ToolkitType::Gtk
    }

    fn text_measurer(&self) -> Arc<dyn TextMeasurer> {
        Arc::new(PangoMeasurer::new(Arc::clone(&self.pango)))
    }

    fn create_view(&self) -> Box<dyn WidgetBackend> {
        Box::new(ViewBackend::new(GtkView::new(Arc::clone(&self.gtk))))
    }

    fn create_image_context(&self, width: u32, height: u32) -> Result<DrawingContext> {
        let cr = self.gtk.image_surface_create(dimension(width)?, dimension(height)?);
        log::trace!("created {}×{} image surface", width, height);
        Ok(DrawingContext::new(Box::new(CairoContext::new(cr))))
    }

    fn resize_image(&self, image: &Image, width: u32, height: u32) -> Result<Image> {
        self.gtk
            .pixbuf_scale_simple(image, dimension(width)?, dimension(height)?)
            .ok_or_else(|| Error::Native("gdk_pixbuf_scale_simple failed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::CairoCall;
    use weft_core::{Color, WidgetKind};

    #[test]
    fn image_contexts_draw_on_surfaces() {
        let (toolkit, gtk) = GtkToolkit::headless();
        let mut ctx = toolkit.create_image_context(10, 10).unwrap();
        ctx.set_color(Color::BLUE).unwrap();
        ctx.rectangle(0., 0., 10., 10.).unwrap();
        ctx.fill().unwrap();
        drop(ctx);

        let log = gtk.surface_log(0).unwrap();
        let log = log.lock();
        assert!(log.contains(&CairoCall::Fill));
        assert_eq!(log.last(), Some(&CairoCall::Destroy));
        assert!(toolkit.create_image_context(0, 10).is_err());
    }

    #[test]
    fn resizes_images() {
        let (toolkit, _) = GtkToolkit::headless();
        let image = Image::filled(2, 2, Color::RED);
        let resized = toolkit.resize_image(&image, 4, 6).unwrap();
        assert_eq!((resized.width(), resized.height()), (4, 6));
        assert_eq!(resized.pixel(3, 5), image.pixel(1, 1));
    }

    #[test]
    fn new_widgets_are_initialized() {
        let (toolkit, _) = GtkToolkit::headless();
        let widget = toolkit.new_widget(WidgetKind::Label).unwrap();
        assert_eq!(widget.toolkit(), ToolkitType::Gtk);
        assert_eq!(widget.kind(), Some(WidgetKind::Label));
    }
}
