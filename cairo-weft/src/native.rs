//! The [`ffi`](crate::ffi) drawing and text traits on the real Cairo and Pango libraries.
//!
//! A context handed over by GTK’s `draw` signal (or made for an `ImageSurface`) is wrapped in
//! [`NativeCairo`]; [`NativePango`] measures with the default PangoCairo font map.

use crate::ffi::*;
use crate::CairoContext;
use cairo::{Extend, Format, ImageSurface, LinearGradient, Matrix, RadialGradient, SurfacePattern};
use core::fmt;
use pango::prelude::*;
use weft_core::image::Image;
use weft_core::DrawingContext;

fn check(op: &str, result: Result<(), cairo::Error>) {
    if let Err(err) = result {
        log::warn!("{} failed: {}", op, err);
    }
}

/// Converts RGBA8 pixels to a premultiplied ARGB32 surface.
fn image_surface(image: &Image) -> Result<ImageSurface, cairo::Error> {
    let stride = Format::ARgb32.stride_for_width(image.width())?;
    let mut data = vec![0; stride as usize * image.height() as usize];
    for (y, row) in image.pixels().chunks(image.width() as usize * 4).enumerate() {
        for (x, px) in row.chunks(4).enumerate() {
            let a = u32::from(px[3]);
            let premultiply = |c: u8| (u32::from(c) * a + 127) / 255;
            let argb = a << 24 | premultiply(px[0]) << 16 | premultiply(px[1]) << 8 | premultiply(px[2]);
            let offset = y * stride as usize + x * 4;
            data[offset..offset + 4].copy_from_slice(&argb.to_ne_bytes());
        }
    }
    ImageSurface::create_for_data(data, Format::ARgb32, image.width() as i32, image.height() as i32, stride)
}

fn pango_font(font: &PangoFontDescription) -> pango::FontDescription {
    let mut desc = pango::FontDescription::new();
    desc.set_family(&font.family);
    desc.set_size(font.size);
    desc.set_weight(match font.weight {
        w if w < 200 => pango::Weight::Thin,
        w if w < 350 => pango::Weight::Light,
        w if w < 500 => pango::Weight::Normal,
        w if w < 650 => pango::Weight::Semibold,
        w if w < 800 => pango::Weight::Bold,
        _ => pango::Weight::Heavy,
    });
    desc.set_style(match font.style {
        PangoStyle::Normal => pango::Style::Normal,
        PangoStyle::Oblique => pango::Style::Oblique,
        PangoStyle::Italic => pango::Style::Italic,
    });
    desc
}

/// A `cairo_t`.
pub struct NativeCairo {
    cr: cairo::Context,
}

// SAFETY: GTK contexts are only created, drawn on and dropped on the GTK main thread; the bound
// only lets them travel inside signal payloads.
unsafe impl Send for NativeCairo {}

impl fmt::Debug for NativeCairo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NativeCairo").finish()
    }
}

impl NativeCairo {
    pub fn new(cr: cairo::Context) -> NativeCairo {
        NativeCairo { cr }
    }

    /// A drawing context on `cr`, keeping the matrix it already has as the device base.
    pub fn drawing_context(cr: cairo::Context) -> DrawingContext {
        DrawingContext::new(Box::new(CairoContext::new(Box::new(NativeCairo::new(cr)))))
    }
}

impl Cairo for NativeCairo {
    fn save(&mut self) {
        check("cairo_save", self.cr.save());
    }
    fn restore(&mut self) {
        check("cairo_restore", self.cr.restore());
    }
    fn get_matrix(&self) -> CairoMatrix {
        let m = self.cr.matrix();
        CairoMatrix {
            xx: m.xx(),
            yx: m.yx(),
            xy: m.xy(),
            yy: m.yy(),
            x0: m.x0(),
            y0: m.y0(),
        }
    }
    fn set_matrix(&mut self, m: CairoMatrix) {
        self.cr.set_matrix(Matrix::new(m.xx, m.yx, m.xy, m.yy, m.x0, m.y0));
    }
    fn new_path(&mut self) {
        self.cr.new_path();
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.cr.move_to(x, y);
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.cr.line_to(x, y);
    }
    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.cr.curve_to(x1, y1, x2, y2, x3, y3);
    }
    fn arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        self.cr.arc(xc, yc, radius, angle1, angle2);
    }
    fn arc_negative(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        self.cr.arc_negative(xc, yc, radius, angle1, angle2);
    }
    fn close_path(&mut self) {
        self.cr.close_path();
    }
    fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.cr.rectangle(x, y, width, height);
    }
    fn set_source_rgba(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.cr.set_source_rgba(r, g, b, a);
    }
    fn set_source(&mut self, pattern: CairoPattern) {
        let result = match pattern {
            CairoPattern::Linear { x0, y0, x1, y1, stops } => {
                let gradient = LinearGradient::new(x0, y0, x1, y1);
                for s in stops {
                    gradient.add_color_stop_rgba(s.offset, s.r, s.g, s.b, s.a);
                }
                self.cr.set_source(&gradient)
            }
            CairoPattern::Radial {
                cx0,
                cy0,
                radius0,
                cx1,
                cy1,
                radius1,
                stops,
            } => {
                let gradient = RadialGradient::new(cx0, cy0, radius0, cx1, cy1, radius1);
                for s in stops {
                    gradient.add_color_stop_rgba(s.offset, s.r, s.g, s.b, s.a);
                }
                self.cr.set_source(&gradient)
            }
            CairoPattern::Surface { image, x, y } => image_surface(&image).and_then(|surface| {
                let pattern = SurfacePattern::create(&surface);
                pattern.set_extend(Extend::Repeat);
                pattern.set_matrix(Matrix::new(1., 0., 0., 1., -x, -y));
                self.cr.set_source(&pattern)
            }),
        };
        check("cairo_set_source", result);
    }
    fn set_line_width(&mut self, width: f64) {
        self.cr.set_line_width(width);
    }
    fn set_dash(&mut self, dashes: &[f64], offset: f64) {
        self.cr.set_dash(dashes, offset);
    }
    fn set_line_cap(&mut self, cap: CairoLineCap) {
        self.cr.set_line_cap(match cap {
            CairoLineCap::Butt => cairo::LineCap::Butt,
            CairoLineCap::Round => cairo::LineCap::Round,
            CairoLineCap::Square => cairo::LineCap::Square,
        });
    }
    fn set_line_join(&mut self, join: CairoLineJoin) {
        self.cr.set_line_join(match join {
            CairoLineJoin::Miter => cairo::LineJoin::Miter,
            CairoLineJoin::Round => cairo::LineJoin::Round,
            CairoLineJoin::Bevel => cairo::LineJoin::Bevel,
        });
    }
    fn set_fill_rule(&mut self, rule: CairoFillRule) {
        self.cr.set_fill_rule(match rule {
            CairoFillRule::Winding => cairo::FillRule::Winding,
            CairoFillRule::EvenOdd => cairo::FillRule::EvenOdd,
        });
    }
    fn fill(&mut self) {
        check("cairo_fill", self.cr.fill());
    }
    fn stroke(&mut self) {
        check("cairo_stroke", self.cr.stroke());
    }
    fn clip(&mut self) {
        self.cr.clip();
    }
    fn reset_clip(&mut self) {
        self.cr.reset_clip();
    }
    fn push_group(&mut self) {
        self.cr.push_group();
    }
    fn pop_group_to_source(&mut self) {
        check("cairo_pop_group_to_source", self.cr.pop_group_to_source());
    }
    fn set_source_image(&mut self, image: &Image, x: f64, y: f64) {
        let result = image_surface(image).and_then(|surface| self.cr.set_source_surface(&surface, x, y));
        check("gdk_cairo_set_source_pixbuf", result);
    }
    fn paint_with_alpha(&mut self, alpha: f64) {
        check("cairo_paint_with_alpha", self.cr.paint_with_alpha(alpha));
    }
    fn show_layout(&mut self, text: &str, font: &PangoFontDescription, attrs: PangoAttrs) {
        let layout = pangocairo::functions::create_layout(&self.cr);
        layout.set_font_description(Some(&pango_font(font)));
        let list = pango::AttrList::new();
        if attrs.underline {
            list.insert(pango::AttrInt::new_underline(pango::Underline::Single));
        }
        if attrs.strikethrough {
            list.insert(pango::AttrInt::new_strikethrough(true));
        }
        layout.set_attributes(Some(&list));
        layout.set_text(text);
        pangocairo::functions::show_layout(&self.cr, &layout);
    }
    fn destroy(&mut self) {
        // the reference is dropped with the box
    }
}

/// Pango measurement with the default PangoCairo font map.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePango;

impl NativePango {
    fn context() -> pango::Context {
        pangocairo::FontMap::new().create_context()
    }
}

impl Pango for NativePango {
    fn layout_size(&self, text: &str, font: &PangoFontDescription) -> (i32, i32) {
        let layout = pango::Layout::new(&NativePango::context());
        layout.set_font_description(Some(&pango_font(font)));
        layout.set_text(text);
        layout.size()
    }

    fn font_metrics(&self, font: &PangoFontDescription) -> PangoFontMetrics {
        let metrics = NativePango::context().metrics(Some(&pango_font(font)), None);
        PangoFontMetrics {
            ascent: metrics.ascent(),
            descent: metrics.descent(),
            height: metrics.height(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::Color;

    #[test]
    fn fills_land_under_the_device_offset() {
        let mut surface = ImageSurface::create(Format::ARgb32, 20, 20).unwrap();
        {
            let cr = cairo::Context::new(&surface).unwrap();
            cr.translate(10., 10.);
            let mut ctx = NativeCairo::drawing_context(cr);
            ctx.set_color(Color::RED).unwrap();
            ctx.rectangle(0., 0., 5., 5.).unwrap();
            ctx.fill().unwrap();
            ctx.dispose();
        }
        surface.flush();
        let stride = surface.stride() as usize;
        let data = surface.data().unwrap();
        let pixel = |x: usize, y: usize| {
            let offset = y * stride + x * 4;
            u32::from_ne_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
        };
        assert_eq!(pixel(12, 12), 0xffff_0000);
        assert_eq!(pixel(2, 2), 0);
    }
}
