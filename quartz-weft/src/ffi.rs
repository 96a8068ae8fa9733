//! The native Core Graphics, CoreText and AppKit surface this backend consumes.
//!
//! Each trait method stands for one native call (`CGContext*`, `CTLine*`, an `NSView` message)
//! with the native units: Core Graphics angles are radians, sizes are points. The rest of the
//! backend only talks to the native frameworks through these traits. [`crate::headless`]
//! implements them without a window server.

use cgmath::{Matrix3, Point2};
use core::fmt;
use weft_core::image::Image;
use weft_core::text::{Font, FontStyle, FontWeight};
use weft_core::{transform, Color, Rect};

/// `CGAffineTransform`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CGAffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl From<Matrix3<f64>> for CGAffineTransform {
    fn from(m: Matrix3<f64>) -> CGAffineTransform {
        let [a, b, c, d, tx, ty] = transform::to_affine(&m);
        CGAffineTransform { a, b, c, d, tx, ty }
    }
}

impl CGAffineTransform {
    /// Flips the y axis.
    pub const FLIP: CGAffineTransform = CGAffineTransform {
        a: 1.,
        b: 0.,
        c: 0.,
        d: -1.,
        tx: 0.,
        ty: 0.,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CGPoint {
    pub x: f64,
    pub y: f64,
}

impl From<Point2<f64>> for CGPoint {
    fn from(p: Point2<f64>) -> CGPoint {
        CGPoint { x: p.x, y: p.y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CGSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CGRect {
    pub origin: CGPoint,
    pub size: CGSize,
}

impl CGRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> CGRect {
        CGRect {
            origin: CGPoint { x, y },
            size: CGSize { width, height },
        }
    }
}

impl From<Rect> for CGRect {
    fn from(rect: Rect) -> CGRect {
        CGRect::new(rect.x(), rect.y(), rect.width(), rect.height())
    }
}

impl Into<Rect> for CGRect {
    fn into(self) -> Rect {
        Rect::from_xywh(self.origin.x, self.origin.y, self.size.width, self.size.height)
    }
}

pub type NSRect = CGRect;
pub type NSSize = CGSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CGLineCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CGLineJoin {
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CGPathFillRule {
    Winding,
    EvenOdd,
}

/// A device RGB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CGColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl From<Color> for CGColor {
    fn from(c: Color) -> CGColor {
        CGColor {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// `CGGradientCreateWithColorComponents`.
#[derive(Debug, Clone, PartialEq)]
pub struct CGGradient {
    pub colors: Vec<CGColor>,
    pub locations: Vec<f64>,
}

pub const K_CG_GRADIENT_DRAWS_BEFORE_START_LOCATION: u32 = 1;
pub const K_CG_GRADIENT_DRAWS_AFTER_END_LOCATION: u32 = 1 << 1;

/// A font as `CTFontCreateWithFontDescriptor` receives it.
#[derive(Debug, Clone, PartialEq)]
pub struct CTFontDescriptor {
    pub family: String,
    pub size: f64,
    /// `NSFontWeight`, -1 to 1.
    pub weight: f64,
    pub italic: bool,
}

const WEIGHTS: [(FontWeight, f64); 6] = [
    (FontWeight::Thin, -0.6),
    (FontWeight::Light, -0.4),
    (FontWeight::Normal, 0.),
    (FontWeight::Semibold, 0.3),
    (FontWeight::Bold, 0.4),
    (FontWeight::Heavy, 0.56),
];

impl From<&Font> for CTFontDescriptor {
    fn from(font: &Font) -> CTFontDescriptor {
        CTFontDescriptor {
            family: font.family.clone(),
            size: font.size,
            weight: WEIGHTS
                .iter()
                .find(|(w, _)| *w == font.weight)
                .map_or(0., |(_, v)| *v),
            italic: font.style != FontStyle::Normal,
        }
    }
}

impl CTFontDescriptor {
    /// The closest neutral font.
    pub fn to_font(&self) -> Font {
        let mut weight = FontWeight::Normal;
        let mut distance = f64::INFINITY;
        for &(w, value) in &WEIGHTS {
            if (value - self.weight).abs() < distance {
                distance = (value - self.weight).abs();
                weight = w;
            }
        }
        let style = if self.italic {
            FontStyle::Italic
        } else {
            FontStyle::Normal
        };
        Font::new(&self.family, self.size)
            .with_weight(weight)
            .with_style(style)
    }
}

/// `CTFontGet*` metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CTFontMetrics {
    pub ascent: f64,
    pub descent: f64,
    pub leading: f64,
    pub x_height: f64,
    pub underline_thickness: f64,
}

/// Attributes of the attributed string a `CTLine` is made from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CTLineAttrs {
    /// `kCTUnderlineStyleAttributeName`. CoreText has no strikethrough attribute.
    pub underline: bool,
}

/// A Core Graphics context (`CGContextRef`).
pub trait CGContext: fmt::Debug + Send {
    fn save_gstate(&mut self);
    fn restore_gstate(&mut self);
    fn concat_ctm(&mut self, transform: CGAffineTransform);
    fn begin_path(&mut self);
    fn move_to_point(&mut self, x: f64, y: f64);
    fn add_line_to_point(&mut self, x: f64, y: f64);
    fn add_curve_to_point(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    /// Angles in radians. `clockwise` refers to the unflipped (y-up) coordinate system.
    fn add_arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, clockwise: bool);
    fn close_path(&mut self);
    fn add_rect(&mut self, rect: CGRect);
    fn set_fill_color(&mut self, color: CGColor);
    fn set_stroke_color(&mut self, color: CGColor);
    fn set_alpha(&mut self, alpha: f64);
    fn set_line_width(&mut self, width: f64);
    /// An empty length list disables dashing.
    fn set_line_dash(&mut self, phase: f64, lengths: &[f64]);
    fn set_line_cap(&mut self, cap: CGLineCap);
    fn set_line_join(&mut self, join: CGLineJoin);
    /// `CGContextFillPath` or `CGContextEOFillPath`.
    fn fill_path(&mut self, rule: CGPathFillRule);
    fn stroke_path(&mut self);
    /// `CGContextClip` or `CGContextEOClip`.
    fn clip(&mut self, rule: CGPathFillRule);
    fn replace_path_with_stroked_path(&mut self);
    fn draw_linear_gradient(&mut self, gradient: &CGGradient, start: CGPoint, end: CGPoint, options: u32);
    fn draw_radial_gradient(
        &mut self,
        gradient: &CGGradient,
        start_center: CGPoint,
        start_radius: f64,
        end_center: CGPoint,
        end_radius: f64,
        options: u32,
    );
    /// Draws an image with its first row at the top of `rect` in y-up space.
    fn draw_image(&mut self, rect: CGRect, image: &Image);
    fn draw_tiled_image(&mut self, rect: CGRect, image: &Image);
    fn set_text_matrix(&mut self, transform: CGAffineTransform);
    fn set_text_position(&mut self, x: f64, y: f64);
    /// `CTLineDraw` of a line made from `text`, starting at the text position on the baseline.
    fn show_line(&mut self, text: &str, font: &CTFontDescriptor, attrs: CTLineAttrs);
    fn release(&mut self);
}

/// CoreText measurement.
pub trait CoreText: fmt::Debug + Send + Sync {
    /// `CTLineGetTypographicBounds` width.
    fn typographic_width(&self, text: &str, font: &CTFontDescriptor) -> f64;

    fn font_metrics(&self, font: &CTFontDescriptor) -> CTFontMetrics;
}

/// An `NSView*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NSView(pub u64);

impl NSView {
    pub const NULL: NSView = NSView(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NSViewClass {
    /// A flipped custom view that forwards `drawRect:` and input.
    Canvas,
    TextField,
    Button,
    /// A plain (unflipped) `NSView`.
    View,
}

pub const NS_EVENT_MODIFIER_FLAG_SHIFT: u64 = 1 << 17;
pub const NS_EVENT_MODIFIER_FLAG_CONTROL: u64 = 1 << 18;
pub const NS_EVENT_MODIFIER_FLAG_OPTION: u64 = 1 << 19;
pub const NS_EVENT_MODIFIER_FLAG_COMMAND: u64 = 1 << 20;

/// A mouse event, located in the view’s own coordinate system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NSMouseEvent {
    pub location: CGPoint,
    /// 0 is the left button, 1 the right button, 2 the middle button.
    pub button_number: i64,
    pub click_count: i64,
    pub modifier_flags: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NSScrollEvent {
    pub location: CGPoint,
    /// Positive when the content moves right.
    pub scrolling_delta_x: f64,
    /// Positive when the content moves down (scrolling up).
    pub scrolling_delta_y: f64,
    pub has_precise_scrolling_deltas: bool,
    pub modifier_flags: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NSKeyEvent {
    /// Virtual key code (`kVK_*`).
    pub key_code: u16,
    pub modifier_flags: u64,
    pub is_a_repeat: bool,
}

/// Virtual key codes (`kVK_*`).
pub mod keys {
    pub const KVK_ANSI_A: u16 = 0x00;
    pub const KVK_ANSI_S: u16 = 0x01;
    pub const KVK_ANSI_D: u16 = 0x02;
    pub const KVK_ANSI_F: u16 = 0x03;
    pub const KVK_ANSI_H: u16 = 0x04;
    pub const KVK_ANSI_G: u16 = 0x05;
    pub const KVK_ANSI_Z: u16 = 0x06;
    pub const KVK_ANSI_X: u16 = 0x07;
    pub const KVK_ANSI_C: u16 = 0x08;
    pub const KVK_ANSI_V: u16 = 0x09;
    pub const KVK_ANSI_B: u16 = 0x0B;
    pub const KVK_ANSI_Q: u16 = 0x0C;
    pub const KVK_ANSI_W: u16 = 0x0D;
    pub const KVK_ANSI_E: u16 = 0x0E;
    pub const KVK_ANSI_R: u16 = 0x0F;
    pub const KVK_ANSI_Y: u16 = 0x10;
    pub const KVK_ANSI_T: u16 = 0x11;
    pub const KVK_ANSI_1: u16 = 0x12;
    pub const KVK_ANSI_2: u16 = 0x13;
    pub const KVK_ANSI_3: u16 = 0x14;
    pub const KVK_ANSI_4: u16 = 0x15;
    pub const KVK_ANSI_6: u16 = 0x16;
    pub const KVK_ANSI_5: u16 = 0x17;
    pub const KVK_ANSI_9: u16 = 0x19;
    pub const KVK_ANSI_7: u16 = 0x1A;
    pub const KVK_ANSI_8: u16 = 0x1C;
    pub const KVK_ANSI_0: u16 = 0x1D;
    pub const KVK_ANSI_O: u16 = 0x1F;
    pub const KVK_ANSI_U: u16 = 0x20;
    pub const KVK_ANSI_I: u16 = 0x22;
    pub const KVK_ANSI_P: u16 = 0x23;
    pub const KVK_RETURN: u16 = 0x24;
    pub const KVK_ANSI_L: u16 = 0x25;
    pub const KVK_ANSI_J: u16 = 0x26;
    pub const KVK_ANSI_K: u16 = 0x28;
    pub const KVK_ANSI_N: u16 = 0x2D;
    pub const KVK_ANSI_M: u16 = 0x2E;
    pub const KVK_TAB: u16 = 0x30;
    pub const KVK_SPACE: u16 = 0x31;
    pub const KVK_DELETE: u16 = 0x33;
    pub const KVK_ESCAPE: u16 = 0x35;
    pub const KVK_F5: u16 = 0x60;
    pub const KVK_F6: u16 = 0x61;
    pub const KVK_F7: u16 = 0x62;
    pub const KVK_F3: u16 = 0x63;
    pub const KVK_F8: u16 = 0x64;
    pub const KVK_F9: u16 = 0x65;
    pub const KVK_F11: u16 = 0x67;
    pub const KVK_F10: u16 = 0x6D;
    pub const KVK_F12: u16 = 0x6F;
    pub const KVK_HOME: u16 = 0x73;
    pub const KVK_PAGE_UP: u16 = 0x74;
    pub const KVK_FORWARD_DELETE: u16 = 0x75;
    pub const KVK_F4: u16 = 0x76;
    pub const KVK_END: u16 = 0x77;
    pub const KVK_F2: u16 = 0x78;
    pub const KVK_PAGE_DOWN: u16 = 0x79;
    pub const KVK_F1: u16 = 0x7A;
    pub const KVK_LEFT_ARROW: u16 = 0x7B;
    pub const KVK_RIGHT_ARROW: u16 = 0x7C;
    pub const KVK_DOWN_ARROW: u16 = 0x7D;
    pub const KVK_UP_ARROW: u16 = 0x7E;
}

/// Messages a view forwards to its event handler.
#[derive(Debug)]
pub enum NSEvent {
    MouseDown(NSMouseEvent),
    MouseUp(NSMouseEvent),
    MouseMoved(NSMouseEvent),
    MouseDragged(NSMouseEvent),
    ScrollWheel(NSScrollEvent),
    KeyDown(NSKeyEvent),
    KeyUp(NSKeyEvent),
    /// `NSViewFrameDidChangeNotification`, with the new frame in the superview’s coordinates.
    FrameChanged(NSRect),
    /// `drawRect:` with the current graphics context.
    DrawRect { cg: Box<dyn CGContext>, dirty: NSRect },
}

/// Receives the view’s events; returns true if the event was handled.
pub type NSEventHandler = Box<dyn FnMut(NSEvent) -> bool + Send>;

/// AppKit view functions.
pub trait AppKit: fmt::Debug + Send + Sync {
    fn view_new(&self, class: NSViewClass) -> NSView;
    fn set_event_handler(&self, view: NSView, handler: NSEventHandler);
    fn fitting_size(&self, view: NSView) -> NSSize;
    fn frame(&self, view: NSView) -> NSRect;
    /// `setFrame:`; posts `NSViewFrameDidChangeNotification`.
    fn set_frame(&self, view: NSView, frame: NSRect);
    fn set_frame_size(&self, view: NSView, size: NSSize);
    fn is_flipped(&self, view: NSView) -> bool;
    fn add_subview(&self, parent: NSView, child: NSView);
    fn remove_from_superview(&self, view: NSView);
    fn superview(&self, view: NSView) -> Option<NSView>;
    /// `setStringValue:` on text fields, `setTitle:` on buttons.
    fn set_string_value(&self, view: NSView, text: &str);
    fn set_needs_display(&self, view: NSView);
    fn release(&self, view: NSView);
    /// `CGBitmapContextCreate` with an RGBA8 buffer. The context is y-up.
    fn bitmap_context_create(&self, width: usize, height: usize) -> Box<dyn CGContext>;
    /// Draws the image into a new `NSImage` of the given size.
    fn resize_image(&self, image: &Image, width: usize, height: usize) -> Option<Image>;
}
