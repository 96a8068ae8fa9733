//! Windows Forms backend for weft.
//!
//! Controls are Windows Forms controls sized with `GetPreferredSize`, drawing goes through a GDI+
//! `Graphics` and text is measured with `MeasureString` and font family design metrics. The
//! native surface is described by the traits in [`ffi`]; [`headless`] implements them without a
//! desktop.

mod context;
pub mod ffi;
pub mod headless;
mod text;
mod view;

pub use context::GdiPlusContext;
pub use text::GdiPlusMeasurer;
pub use view::FormsView;

use crate::ffi::{GdiPlus, WinForms};
use crate::headless::{HeadlessGdiPlus, HeadlessWinForms};
use std::sync::Arc;
use weft_core::text::TextMeasurer;
use weft_core::{DrawingContext, Error, Result, Toolkit, ToolkitType, ViewBackend, WidgetBackend};

/// The Windows Forms toolkit.
///
/// Image resizing is not available; [`Toolkit::resize_image`] returns
/// [`Error::NotImplemented`].
#[derive(Debug, Clone)]
pub struct GdiPlusToolkit {
    forms: Arc<dyn WinForms>,
    gdiplus: Arc<dyn GdiPlus>,
}

impl GdiPlusToolkit {
    pub fn new(forms: Arc<dyn WinForms>, gdiplus: Arc<dyn GdiPlus>) -> GdiPlusToolkit {
        GdiPlusToolkit { forms, gdiplus }
    }

    /// A toolkit on [`HeadlessWinForms`] and [`HeadlessGdiPlus`].
    pub fn headless() -> (GdiPlusToolkit, Arc<HeadlessWinForms>) {
        let forms = Arc::new(HeadlessWinForms::new());
        (
            GdiPlusToolkit::new(forms.clone(), Arc::new(HeadlessGdiPlus)),
            forms,
        )
    }
}

impl Toolkit for GdiPlusToolkit {
    fn toolkit_type(&self) -> ToolkitType {
        ToolkitType::WinForms
    }

    fn text_measurer(&self) -> Arc<dyn TextMeasurer> {
        Arc::new(GdiPlusMeasurer::new(Arc::clone(&self.gdiplus)))
    }

    fn create_view(&self) -> Box<dyn WidgetBackend> {
        Box::new(ViewBackend::new(FormsView::new(Arc::clone(&self.forms))))
    }

    fn create_image_context(&self, width: u32, height: u32) -> Result<DrawingContext> {
        let size = |v: u32| match v {
            0 => None,
            v if v > i32::max_value() as u32 => None,
            v => Some(v as i32),
        };
        match (size(width), size(height)) {
            (Some(w), Some(h)) => Ok(DrawingContext::new(Box::new(GdiPlusContext::new(
                self.forms.bitmap_graphics(w, h),
            )))),
            _ => Err(Error::Native(format!("invalid bitmap size {}×{}", width, height))),
        }
    }
}
