//! Traits for backends.

use crate::context::DrawingContext;
use crate::error::{Error, Result};
use crate::image::Image;
use crate::text::{TextLayout, TextMeasurer};
use crate::view::{WidgetBackend, WidgetKind};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The native toolkits with a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolkitType {
    /// GTK, drawing with Cairo and Pango.
    Gtk,
    /// Cocoa, drawing with Core Graphics and CoreText.
    Cocoa,
    /// Windows Forms, drawing with GDI+.
    WinForms,
}

impl ToolkitType {
    pub const ALL: [ToolkitType; 3] = [ToolkitType::Gtk, ToolkitType::Cocoa, ToolkitType::WinForms];

    pub fn name(self) -> &'static str {
        match self {
            ToolkitType::Gtk => "gtk",
            ToolkitType::Cocoa => "cocoa",
            ToolkitType::WinForms => "winforms",
        }
    }

    /// The toolkit native to the platform this was compiled for.
    pub fn platform_default() -> ToolkitType {
        if cfg!(target_os = "macos") {
            ToolkitType::Cocoa
        } else if cfg!(target_os = "windows") {
            ToolkitType::WinForms
        } else {
            ToolkitType::Gtk
        }
    }
}

impl fmt::Display for ToolkitType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when parsing an unknown toolkit name.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown toolkit {0:?} (expected gtk, cocoa or winforms)")]
pub struct ParseToolkitError(pub String);

impl FromStr for ToolkitType {
    type Err = ParseToolkitError;

    fn from_str(s: &str) -> Result<ToolkitType, ParseToolkitError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gtk" => Ok(ToolkitType::Gtk),
            "cocoa" | "mac" => Ok(ToolkitType::Cocoa),
            "winforms" | "wpf" | "gdi" => Ok(ToolkitType::WinForms),
            _ => Err(ParseToolkitError(s.to_string())),
        }
    }
}

/// A backend implementation: the entry point to one native toolkit.
///
/// One toolkit is active per process; the frontend dispatches every subsystem (views, drawing
/// contexts, text measurement, images) through it.
pub trait Toolkit: fmt::Debug {
    fn toolkit_type(&self) -> ToolkitType;

    /// The text measurer for layouts created on this toolkit.
    fn text_measurer(&self) -> Arc<dyn TextMeasurer>;

    /// Creates an uninitialized view backend.
    fn create_view(&self) -> Box<dyn WidgetBackend>;

    /// Creates a drawing context that renders into an offscreen image.
    fn create_image_context(&self, width: u32, height: u32) -> Result<DrawingContext>;

    /// Resizes an image using the toolkit’s scaling.
    fn resize_image(&self, image: &Image, width: u32, height: u32) -> Result<Image> {
        drop((image, width, height));
        Err(Error::NotImplemented {
            operation: "resize_image",
            toolkit: self.toolkit_type(),
        })
    }

    /// Creates and initializes a view backend of the given kind.
    fn new_widget(&self, kind: WidgetKind) -> Result<Box<dyn WidgetBackend>> {
        let mut view = self.create_view();
        view.initialize(kind)?;
        Ok(view)
    }

    /// Creates a text layout measured with this toolkit’s metrics.
    fn create_text_layout(&self) -> TextLayout {
        TextLayout::new(self.text_measurer())
    }
}
