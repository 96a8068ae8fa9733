//! Pango text measurement.

use crate::ffi::{Pango, PangoFontDescription, PANGO_SCALE};
use std::sync::Arc;
use weft_core::text::{Font, LineMetrics, TextMeasurer};

fn from_pango(units: i32) -> f64 {
    f64::from(units) / f64::from(PANGO_SCALE)
}

/// Measures text with Pango.
#[derive(Debug, Clone)]
pub struct PangoMeasurer {
    pango: Arc<dyn Pango>,
}

impl PangoMeasurer {
    pub fn new(pango: Arc<dyn Pango>) -> PangoMeasurer {
        PangoMeasurer { pango }
    }
}

impl TextMeasurer for PangoMeasurer {
    fn run_width(&self, text: &str, font: &Font) -> f64 {
        let (width, _) = self.pango.layout_size(text, &PangoFontDescription::from(font));
        from_pango(width)
    }

    fn line_metrics(&self, font: &Font) -> LineMetrics {
        let metrics = self.pango.font_metrics(&PangoFontDescription::from(font));
        let ascent = from_pango(metrics.ascent);
        let descent = from_pango(metrics.descent);
        LineMetrics {
            ascent,
            descent,
            leading: (from_pango(metrics.height) - ascent - descent).max(0.),
        }
    }
}
