//! Cocoa backend for weft.
//!
//! Drawing goes through Core Graphics, text is measured with CoreText and widgets are `NSView`s
//! sized by their fitting size. The native surface is described by the traits in [`ffi`];
//! [`headless`] implements them without a window server. With the `cocoa` feature, `native`
//! implements the drawing and text traits on Core Graphics and CoreText.

mod context;
pub mod ffi;
pub mod headless;
#[cfg(feature = "cocoa")]
pub mod native;
mod text;
mod view;

pub use context::QuartzContext;
pub use text::CoreTextMeasurer;
pub use view::QuartzView;

use crate::ffi::{AppKit, CGAffineTransform, CoreText};
use crate::headless::{HeadlessAppKit, HeadlessCoreText};
use std::sync::Arc;
use weft_core::image::Image;
use weft_core::text::TextMeasurer;
use weft_core::{DrawingContext, Error, Result, Toolkit, ToolkitType, ViewBackend, WidgetBackend};

/// The Cocoa toolkit.
#[derive(Debug, Clone)]
pub struct QuartzToolkit {
    appkit: Arc<dyn AppKit>,
    core_text: Arc<dyn CoreText>,
}

impl QuartzToolkit {
    pub fn new(appkit: Arc<dyn AppKit>, core_text: Arc<dyn CoreText>) -> QuartzToolkit {
        QuartzToolkit { appkit, core_text }
    }

    /// A toolkit on [`HeadlessAppKit`] and [`HeadlessCoreText`].
    pub fn headless() -> (QuartzToolkit, Arc<HeadlessAppKit>) {
        let appkit = Arc::new(HeadlessAppKit::new());
        (
            QuartzToolkit::new(appkit.clone(), Arc::new(HeadlessCoreText)),
            appkit,
        )
    }
}

impl Toolkit for QuartzToolkit {
    fn toolkit_type(&self) -> ToolkitType {
        ToolkitType::Cocoa
    }

    fn text_measurer(&self) -> Arc<dyn TextMeasurer> {
        Arc::new(CoreTextMeasurer::new(Arc::clone(&self.core_text)))
    }

    fn create_view(&self) -> Box<dyn WidgetBackend> {
        Box::new(ViewBackend::new(QuartzView::new(
            Arc::clone(&self.appkit),
            Arc::clone(&self.core_text),
        )))
    }

    fn create_image_context(&self, width: u32, height: u32) -> Result<DrawingContext> {
        if width == 0 || height == 0 {
            return Err(Error::Native(format!("invalid bitmap size {}×{}", width, height)));
        }
        let mut cg = self
            .appkit
            .bitmap_context_create(width as usize, height as usize);
        // bitmap contexts are y-up
        cg.concat_ctm(CGAffineTransform {
            ty: f64::from(height),
            ..CGAffineTransform::FLIP
        });
        Ok(DrawingContext::new(Box::new(QuartzContext::new(
            cg,
            Arc::clone(&self.core_text),
        ))))
    }

    fn resize_image(&self, image: &Image, width: u32, height: u32) -> Result<Image> {
        self.appkit
            .resize_image(image, width as usize, height as usize)
            .ok_or_else(|| Error::Native(format!("could not resize image to {}×{}", width, height)))
    }
}
