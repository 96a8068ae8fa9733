//! CoreText measurement.

use crate::ffi::{CTFontDescriptor, CoreText};
use std::sync::Arc;
use weft_core::text::{Font, LineMetrics, TextMeasurer};

/// Measures text with CoreText typographic bounds.
#[derive(Debug, Clone)]
pub struct CoreTextMeasurer {
    core_text: Arc<dyn CoreText>,
}

impl CoreTextMeasurer {
    pub fn new(core_text: Arc<dyn CoreText>) -> CoreTextMeasurer {
        CoreTextMeasurer { core_text }
    }
}

impl TextMeasurer for CoreTextMeasurer {
    fn run_width(&self, text: &str, font: &Font) -> f64 {
        self.core_text
            .typographic_width(text, &CTFontDescriptor::from(font))
    }

    fn line_metrics(&self, font: &Font) -> LineMetrics {
        let metrics = self.core_text.font_metrics(&CTFontDescriptor::from(font));
        LineMetrics {
            ascent: metrics.ascent,
            descent: metrics.descent,
            leading: metrics.leading.max(0.),
        }
    }
}
