//! The [`ffi`](crate::ffi) drawing and text traits on the real Core Graphics and CoreText
//! frameworks.

use crate::ffi::*;
use crate::QuartzContext;
use core::fmt;
use core_foundation::attributed_string::CFMutableAttributedString;
use core_foundation::base::{CFRange, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::number::CFNumber;
use core_foundation::string::{CFString, CFStringRef};
use core_graphics::color_space::CGColorSpace;
use core_graphics::data_provider::CGDataProvider;
use core_graphics::geometry as cg;
use core_graphics::image::CGImage;
use core_graphics::sys::{CGColorSpaceRef, CGContextRef, CGImageRef};
use core_text::font::CTFont;
use core_text::line::CTLine;
use core_text::string_attributes::kCTFontAttributeName;
use foreign_types::ForeignType;
use std::os::raw::c_int;
use std::sync::Arc;
use weft_core::image::Image;
use weft_core::DrawingContext;

const K_CG_IMAGE_ALPHA_LAST: u32 = 3;
const K_CG_RENDERING_INTENT_DEFAULT: u32 = 0;

enum CGGradientOpaque {}
type CGGradientRef = *mut CGGradientOpaque;

extern "C" {
    static kCTUnderlineStyleAttributeName: CFStringRef;
    static kCTForegroundColorFromContextAttributeName: CFStringRef;

    fn CGContextSaveGState(c: CGContextRef);
    fn CGContextRestoreGState(c: CGContextRef);
    fn CGContextConcatCTM(c: CGContextRef, transform: cg::CGAffineTransform);
    fn CGContextBeginPath(c: CGContextRef);
    fn CGContextMoveToPoint(c: CGContextRef, x: f64, y: f64);
    fn CGContextAddLineToPoint(c: CGContextRef, x: f64, y: f64);
    fn CGContextAddCurveToPoint(c: CGContextRef, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    fn CGContextAddArc(c: CGContextRef, x: f64, y: f64, radius: f64, start: f64, end: f64, clockwise: c_int);
    fn CGContextClosePath(c: CGContextRef);
    fn CGContextAddRect(c: CGContextRef, rect: cg::CGRect);
    fn CGContextSetAlpha(c: CGContextRef, alpha: f64);
    fn CGContextSetLineDash(c: CGContextRef, phase: f64, lengths: *const f64, count: usize);
    fn CGContextSetLineCap(c: CGContextRef, cap: c_int);
    fn CGContextSetLineJoin(c: CGContextRef, join: c_int);
    fn CGContextFillPath(c: CGContextRef);
    fn CGContextEOFillPath(c: CGContextRef);
    fn CGContextStrokePath(c: CGContextRef);
    fn CGContextClip(c: CGContextRef);
    fn CGContextEOClip(c: CGContextRef);
    fn CGContextReplacePathWithStrokedPath(c: CGContextRef);
    fn CGContextDrawLinearGradient(
        c: CGContextRef,
        gradient: CGGradientRef,
        start: cg::CGPoint,
        end: cg::CGPoint,
        options: u32,
    );
    fn CGContextDrawRadialGradient(
        c: CGContextRef,
        gradient: CGGradientRef,
        start_center: cg::CGPoint,
        start_radius: f64,
        end_center: cg::CGPoint,
        end_radius: f64,
        options: u32,
    );
    fn CGContextDrawImage(c: CGContextRef, rect: cg::CGRect, image: CGImageRef);
    fn CGContextDrawTiledImage(c: CGContextRef, rect: cg::CGRect, image: CGImageRef);
    fn CGGradientCreateWithColorComponents(
        space: CGColorSpaceRef,
        components: *const f64,
        locations: *const f64,
        count: usize,
    ) -> CGGradientRef;
    fn CGGradientRelease(gradient: CGGradientRef);
    fn CTLineDraw(line: core_text::line::CTLineRef, c: CGContextRef);
}

fn cg_rect(rect: CGRect) -> cg::CGRect {
    cg::CGRect::new(
        &cg::CGPoint::new(rect.origin.x, rect.origin.y),
        &cg::CGSize::new(rect.size.width, rect.size.height),
    )
}

fn cg_point(p: CGPoint) -> cg::CGPoint {
    cg::CGPoint::new(p.x, p.y)
}

fn cg_image(image: &Image) -> CGImage {
    let provider = CGDataProvider::from_buffer(Arc::new(image.pixels().to_vec()));
    CGImage::new(
        image.width() as usize,
        image.height() as usize,
        8,
        32,
        image.width() as usize * 4,
        &CGColorSpace::create_device_rgb(),
        K_CG_IMAGE_ALPHA_LAST,
        &provider,
        true,
        K_CG_RENDERING_INTENT_DEFAULT,
    )
}

fn ct_font(font: &CTFontDescriptor) -> Option<CTFont> {
    core_text::font::new_from_name(&font.family, font.size)
        .or_else(|_| core_text::font::new_from_name("Helvetica", font.size))
        .map_err(|_| log::warn!("no font for {:?}", font.family))
        .ok()
}

/// A single-run CoreText line.
fn ct_line(text: &str, font: &CTFont, attrs: CTLineAttrs) -> CTLine {
    let string = CFString::new(text);
    let mut attributed = CFMutableAttributedString::new();
    attributed.replace_str(&string, CFRange::init(0, 0));
    let range = CFRange::init(0, string.char_len());
    unsafe {
        attributed.set_attribute(range, kCTFontAttributeName, font);
        attributed.set_attribute(range, kCTForegroundColorFromContextAttributeName, &CFBoolean::true_value());
        if attrs.underline {
            attributed.set_attribute(range, kCTUnderlineStyleAttributeName, &CFNumber::from(1i32));
        }
    }
    CTLine::new_with_attributed_string(attributed.as_concrete_TypeRef())
}

/// A `CGContextRef`.
pub struct NativeCGContext {
    cg: core_graphics::context::CGContext,
}

// SAFETY: AppKit contexts are only created, drawn on and dropped on the main thread; the bound
// only lets them travel inside event payloads.
unsafe impl Send for NativeCGContext {}

impl fmt::Debug for NativeCGContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NativeCGContext").finish()
    }
}

impl NativeCGContext {
    pub fn new(cg: core_graphics::context::CGContext) -> NativeCGContext {
        NativeCGContext { cg }
    }

    /// A drawing context on a flipped context, such as the one AppKit hands a flipped view.
    pub fn drawing_context(cg: core_graphics::context::CGContext) -> DrawingContext {
        DrawingContext::new(Box::new(QuartzContext::new(
            Box::new(NativeCGContext::new(cg)),
            Arc::new(NativeCoreText),
        )))
    }

    fn ptr(&self) -> CGContextRef {
        self.cg.as_ptr()
    }
}

impl CGContext for NativeCGContext {
    fn save_gstate(&mut self) {
        unsafe { CGContextSaveGState(self.ptr()) }
    }
    fn restore_gstate(&mut self) {
        unsafe { CGContextRestoreGState(self.ptr()) }
    }
    fn concat_ctm(&mut self, t: CGAffineTransform) {
        let t = cg::CGAffineTransform {
            a: t.a,
            b: t.b,
            c: t.c,
            d: t.d,
            tx: t.tx,
            ty: t.ty,
        };
        unsafe { CGContextConcatCTM(self.ptr(), t) }
    }
    fn begin_path(&mut self) {
        unsafe { CGContextBeginPath(self.ptr()) }
    }
    fn move_to_point(&mut self, x: f64, y: f64) {
        unsafe { CGContextMoveToPoint(self.ptr(), x, y) }
    }
    fn add_line_to_point(&mut self, x: f64, y: f64) {
        unsafe { CGContextAddLineToPoint(self.ptr(), x, y) }
    }
    fn add_curve_to_point(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        unsafe { CGContextAddCurveToPoint(self.ptr(), cp1x, cp1y, cp2x, cp2y, x, y) }
    }
    fn add_arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, clockwise: bool) {
        unsafe { CGContextAddArc(self.ptr(), x, y, radius, start_angle, end_angle, c_int::from(clockwise)) }
    }
    fn close_path(&mut self) {
        unsafe { CGContextClosePath(self.ptr()) }
    }
    fn add_rect(&mut self, rect: CGRect) {
        unsafe { CGContextAddRect(self.ptr(), cg_rect(rect)) }
    }
    fn set_fill_color(&mut self, color: CGColor) {
        self.cg.set_rgb_fill_color(color.r, color.g, color.b, color.a);
    }
    fn set_stroke_color(&mut self, color: CGColor) {
        self.cg.set_rgb_stroke_color(color.r, color.g, color.b, color.a);
    }
    fn set_alpha(&mut self, alpha: f64) {
        unsafe { CGContextSetAlpha(self.ptr(), alpha) }
    }
    fn set_line_width(&mut self, width: f64) {
        self.cg.set_line_width(width);
    }
    fn set_line_dash(&mut self, phase: f64, lengths: &[f64]) {
        unsafe { CGContextSetLineDash(self.ptr(), phase, lengths.as_ptr(), lengths.len()) }
    }
    fn set_line_cap(&mut self, cap: CGLineCap) {
        let cap = match cap {
            CGLineCap::Butt => 0,
            CGLineCap::Round => 1,
            CGLineCap::Square => 2,
        };
        unsafe { CGContextSetLineCap(self.ptr(), cap) }
    }
    fn set_line_join(&mut self, join: CGLineJoin) {
        let join = match join {
            CGLineJoin::Miter => 0,
            CGLineJoin::Round => 1,
            CGLineJoin::Bevel => 2,
        };
        unsafe { CGContextSetLineJoin(self.ptr(), join) }
    }
    fn fill_path(&mut self, rule: CGPathFillRule) {
        match rule {
            CGPathFillRule::Winding => unsafe { CGContextFillPath(self.ptr()) },
            CGPathFillRule::EvenOdd => unsafe { CGContextEOFillPath(self.ptr()) },
        }
    }
    fn stroke_path(&mut self) {
        unsafe { CGContextStrokePath(self.ptr()) }
    }
    fn clip(&mut self, rule: CGPathFillRule) {
        match rule {
            CGPathFillRule::Winding => unsafe { CGContextClip(self.ptr()) },
            CGPathFillRule::EvenOdd => unsafe { CGContextEOClip(self.ptr()) },
        }
    }
    fn replace_path_with_stroked_path(&mut self) {
        unsafe { CGContextReplacePathWithStrokedPath(self.ptr()) }
    }
    fn draw_linear_gradient(&mut self, gradient: &CGGradient, start: CGPoint, end: CGPoint, options: u32) {
        with_gradient(gradient, |g| unsafe {
            CGContextDrawLinearGradient(self.ptr(), g, cg_point(start), cg_point(end), options)
        });
    }
    fn draw_radial_gradient(
        &mut self,
        gradient: &CGGradient,
        start_center: CGPoint,
        start_radius: f64,
        end_center: CGPoint,
        end_radius: f64,
        options: u32,
    ) {
        with_gradient(gradient, |g| unsafe {
            CGContextDrawRadialGradient(
                self.ptr(),
                g,
                cg_point(start_center),
                start_radius,
                cg_point(end_center),
                end_radius,
                options,
            )
        });
    }
    fn draw_image(&mut self, rect: CGRect, image: &Image) {
        let image = cg_image(image);
        unsafe { CGContextDrawImage(self.ptr(), cg_rect(rect), image.as_ptr()) }
    }
    fn draw_tiled_image(&mut self, rect: CGRect, image: &Image) {
        let image = cg_image(image);
        unsafe { CGContextDrawTiledImage(self.ptr(), cg_rect(rect), image.as_ptr()) }
    }
    fn set_text_matrix(&mut self, t: CGAffineTransform) {
        self.cg.set_text_matrix(&cg::CGAffineTransform {
            a: t.a,
            b: t.b,
            c: t.c,
            d: t.d,
            tx: t.tx,
            ty: t.ty,
        });
    }
    fn set_text_position(&mut self, x: f64, y: f64) {
        self.cg.set_text_position(x, y);
    }
    fn show_line(&mut self, text: &str, font: &CTFontDescriptor, attrs: CTLineAttrs) {
        if let Some(font) = ct_font(font) {
            let line = ct_line(text, &font, attrs);
            unsafe { CTLineDraw(line.as_concrete_TypeRef(), self.ptr()) }
        }
    }
    fn release(&mut self) {
        // the reference is released when the wrapper drops
    }
}

fn with_gradient(gradient: &CGGradient, draw: impl FnOnce(CGGradientRef)) {
    let components: Vec<f64> = gradient.colors.iter().flat_map(|c| vec![c.r, c.g, c.b, c.a]).collect();
    let space = CGColorSpace::create_device_rgb();
    let g = unsafe {
        CGGradientCreateWithColorComponents(
            space.as_ptr(),
            components.as_ptr(),
            gradient.locations.as_ptr(),
            gradient.locations.len(),
        )
    };
    if g.is_null() {
        log::warn!("could not create a gradient with {} stops", gradient.locations.len());
        return;
    }
    draw(g);
    unsafe { CGGradientRelease(g) }
}

/// CoreText measurement with system fonts looked up by family name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCoreText;

impl CoreText for NativeCoreText {
    fn typographic_width(&self, text: &str, font: &CTFontDescriptor) -> f64 {
        ct_font(font).map_or(0., |font| {
            ct_line(text, &font, CTLineAttrs::default())
                .get_typographic_bounds()
                .width
        })
    }

    fn font_metrics(&self, font: &CTFontDescriptor) -> CTFontMetrics {
        match ct_font(font) {
            Some(font) => CTFontMetrics {
                ascent: font.ascent(),
                descent: font.descent(),
                leading: font.leading(),
                x_height: font.x_height(),
                underline_thickness: font.underline_thickness(),
            },
            None => CTFontMetrics {
                ascent: 0.,
                descent: 0.,
                leading: 0.,
                x_height: 0.,
                underline_thickness: 0.,
            },
        }
    }
}

#[cfg(all(test, target_os = "macos"))]
mod tests {
    use super::*;
    use weft_core::Color;

    const K_CG_IMAGE_ALPHA_PREMULTIPLIED_LAST: u32 = 1;

    #[test]
    fn fills_a_bitmap() {
        let mut bitmap = core_graphics::context::CGContext::create_bitmap_context(
            None,
            20,
            20,
            8,
            0,
            &CGColorSpace::create_device_rgb(),
            K_CG_IMAGE_ALPHA_PREMULTIPLIED_LAST,
        );
        let stride = bitmap.bytes_per_row();
        {
            let cg = unsafe { core_graphics::context::CGContext::from_existing_context_ptr(bitmap.as_ptr()) };
            let mut ctx = NativeCGContext::drawing_context(cg);
            ctx.set_color(Color::RED).unwrap();
            ctx.rectangle(0., 0., 5., 5.).unwrap();
            ctx.fill().unwrap();
            ctx.dispose();
        }
        // y-up: the rectangle covers the last rows in memory
        let data = bitmap.data();
        let offset = 17 * stride + 2 * 4;
        assert_eq!(&data[offset..offset + 4], &[255, 0, 0, 255]);
        assert_eq!(&data[2 * stride + 8..2 * stride + 12], &[0, 0, 0, 0]);
    }
}
