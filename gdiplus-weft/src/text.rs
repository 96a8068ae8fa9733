//! GDI+ measurement.

use crate::ffi::{GdiPlus, GpFont};
use std::sync::Arc;
use weft_core::text::{Font, LineMetrics, TextMeasurer};

/// Measures text with `MeasureString` and scales family design metrics to the font size.
#[derive(Debug, Clone)]
pub struct GdiPlusMeasurer {
    gdiplus: Arc<dyn GdiPlus>,
}

impl GdiPlusMeasurer {
    pub fn new(gdiplus: Arc<dyn GdiPlus>) -> GdiPlusMeasurer {
        GdiPlusMeasurer { gdiplus }
    }
}

impl TextMeasurer for GdiPlusMeasurer {
    fn run_width(&self, text: &str, font: &Font) -> f64 {
        self.gdiplus.measure_string(text, &GpFont::from(font))
    }

    fn line_metrics(&self, font: &Font) -> LineMetrics {
        let gp_font = GpFont::from(font);
        let metrics = self.gdiplus.font_family_metrics(&gp_font.family, gp_font.style);
        if metrics.em_height == 0 {
            return LineMetrics {
                ascent: font.size,
                descent: 0.,
                leading: 0.,
            };
        }
        let em = f64::from(metrics.em_height);
        let scale = |units: u16| f64::from(units) * font.size / em;
        let ascent = scale(metrics.cell_ascent);
        let descent = scale(metrics.cell_descent);
        let spacing = scale(metrics.line_spacing);
        LineMetrics {
            ascent,
            descent,
            leading: (spacing - ascent - descent).max(0.),
        }
    }
}
