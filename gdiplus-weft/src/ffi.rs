//! The native GDI+, Win32 and Windows Forms surface this backend consumes.
//!
//! Each trait method stands for one native call (`Gdip*`, a `Control` member, a Win32 function)
//! with native units: GDI+ angles are degrees, colors are 8-bit ARGB, control geometry is integer
//! pixels. Nothing outside this module talks to the native libraries. [`crate::headless`]
//! implements the traits without a desktop.

use cgmath::{Matrix3, Point2};
use core::fmt;
use weft_core::image::Image;
use weft_core::text::Font;
use weft_core::{transform, Color, Rect};

/// `Gdiplus::Matrix` elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpMatrix {
    pub m11: f64,
    pub m12: f64,
    pub m21: f64,
    pub m22: f64,
    pub dx: f64,
    pub dy: f64,
}

impl From<Matrix3<f64>> for GpMatrix {
    fn from(m: Matrix3<f64>) -> GpMatrix {
        let [m11, m12, m21, m22, dx, dy] = transform::to_affine(&m);
        GpMatrix {
            m11,
            m12,
            m21,
            m22,
            dx,
            dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl From<Point2<f64>> for PointF {
    fn from(p: Point2<f64>) -> PointF {
        PointF { x: p.x, y: p.y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<Rect> for RectF {
    fn from(rect: Rect) -> RectF {
        RectF {
            x: rect.x(),
            y: rect.y(),
            width: rect.width(),
            height: rect.height(),
        }
    }
}

/// A packed 8-bit ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ARGB(pub u32);

impl ARGB {
    pub fn from_color(color: Color, alpha: f64) -> ARGB {
        let [a, r, g, b] = color.with_alpha(color.a * alpha).to_argb8();
        ARGB(u32::from(a) << 24 | u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b))
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Alternate,
    Winding,
}

/// One `GdipAddPath*` call, or a figure boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOp {
    StartFigure,
    Line(PointF, PointF),
    Bezier([PointF; 4]),
    /// Bounding rectangle of the ellipse, start angle and sweep in degrees (clockwise).
    Arc(RectF, f64, f64),
    CloseFigure,
}

/// A `GraphicsPath`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsPath {
    pub fill_mode: FillMode,
    pub ops: Vec<PathOp>,
}

impl GraphicsPath {
    pub fn new(fill_mode: FillMode) -> GraphicsPath {
        GraphicsPath {
            fill_mode,
            ops: Vec::new(),
        }
    }

    pub fn start_figure(&mut self) {
        self.ops.push(PathOp::StartFigure);
    }

    pub fn add_line(&mut self, from: PointF, to: PointF) {
        self.ops.push(PathOp::Line(from, to));
    }

    pub fn add_bezier(&mut self, points: [PointF; 4]) {
        self.ops.push(PathOp::Bezier(points));
    }

    pub fn add_arc(&mut self, rect: RectF, start_angle: f64, sweep_angle: f64) {
        self.ops.push(PathOp::Arc(rect, start_angle, sweep_angle));
    }

    pub fn close_figure(&mut self) {
        self.ops.push(PathOp::CloseFigure);
    }
}

/// A GDI+ brush.
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    Solid(ARGB),
    /// A `LinearGradientBrush` with `InterpolationColors`; positions must start at 0 and end at 1.
    LinearGradient {
        start: PointF,
        end: PointF,
        colors: Vec<ARGB>,
        positions: Vec<f64>,
    },
    /// A `PathGradientBrush` on an ellipse. Positions run from the boundary (0) to the center (1).
    PathGradient {
        ellipse: RectF,
        center: PointF,
        colors: Vec<ARGB>,
        positions: Vec<f64>,
    },
    /// A tiling `TextureBrush`, translated to `origin`.
    Texture { image: Image, origin: PointF, alpha: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Flat,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

/// A GDI+ pen.
#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
    pub brush: Brush,
    pub width: f64,
    /// In multiples of the pen width; empty for solid lines.
    pub dash_pattern: Vec<f64>,
    /// In multiples of the pen width.
    pub dash_offset: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
}

pub const FONT_STYLE_BOLD: u32 = 1;
pub const FONT_STYLE_ITALIC: u32 = 2;
pub const FONT_STYLE_UNDERLINE: u32 = 4;
pub const FONT_STYLE_STRIKEOUT: u32 = 8;

/// A GDI+ font in pixel units.
#[derive(Debug, Clone, PartialEq)]
pub struct GpFont {
    pub family: String,
    pub em_size: f64,
    pub style: u32,
}

impl GpFont {
    pub fn new(font: &Font, decoration: u32) -> GpFont {
        let mut style = decoration;
        if font.weight.is_bold() {
            style |= FONT_STYLE_BOLD;
        }
        if font.style != weft_core::text::FontStyle::Normal {
            style |= FONT_STYLE_ITALIC;
        }
        GpFont {
            family: font.family.clone(),
            em_size: font.size,
            style,
        }
    }
}

impl From<&Font> for GpFont {
    fn from(font: &Font) -> GpFont {
        GpFont::new(font, 0)
    }
}

/// `FontFamily` design metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontFamilyMetrics {
    pub em_height: u16,
    pub cell_ascent: u16,
    pub cell_descent: u16,
    pub line_spacing: u16,
}

/// A GDI+ `Graphics`.
pub trait Graphics: fmt::Debug + Send {
    /// `Graphics::Save`; returns the state token.
    fn save(&mut self) -> u32;
    fn restore(&mut self, state: u32);
    fn set_transform(&mut self, matrix: GpMatrix);
    /// `SetClip(path, CombineModeIntersect)`.
    fn intersect_clip(&mut self, path: &GraphicsPath);
    fn reset_clip(&mut self);
    fn fill_path(&mut self, brush: &Brush, path: &GraphicsPath);
    fn draw_path(&mut self, pen: &Pen, path: &GraphicsPath);
    /// `DrawString` with `StringFormat::GenericTypographic`, top-left at `origin`.
    fn draw_string(&mut self, text: &str, font: &GpFont, brush: &Brush, origin: PointF);
    /// `DrawImage` with a color matrix scaling alpha.
    fn draw_image(&mut self, image: &Image, dest: RectF, alpha: f64);
    fn dispose(&mut self);
}

/// GDI+ text measurement.
pub trait GdiPlus: fmt::Debug + Send + Sync {
    /// `MeasureString` with `StringFormat::GenericTypographic` width.
    fn measure_string(&self, text: &str, font: &GpFont) -> f64;

    fn font_family_metrics(&self, family: &str, style: u32) -> FontFamilyMetrics;
}

/// A window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HWND(pub u64);

impl HWND {
    pub const NULL: HWND = HWND(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlClass {
    /// A double-buffered `UserControl` that raises `Paint`.
    Canvas,
    Label,
    Button,
    Panel,
}

/// `System.Drawing.Size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// Integer bounds of a control in its parent’s client area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Bounds {
        Bounds {
            x: rect.x().round() as i32,
            y: rect.y().round() as i32,
            width: rect.width().round().max(0.) as i32,
            height: rect.height().round().max(0.) as i32,
        }
    }
}

impl Into<Rect> for Bounds {
    fn into(self) -> Rect {
        Rect::from_xywh(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.width),
            f64::from(self.height),
        )
    }
}

pub const WM_KEYDOWN: u32 = 0x0100;
pub const WM_KEYUP: u32 = 0x0101;
pub const WM_MOUSEMOVE: u32 = 0x0200;
pub const WM_LBUTTONDOWN: u32 = 0x0201;
pub const WM_LBUTTONUP: u32 = 0x0202;
pub const WM_LBUTTONDBLCLK: u32 = 0x0203;
pub const WM_RBUTTONDOWN: u32 = 0x0204;
pub const WM_RBUTTONUP: u32 = 0x0205;
pub const WM_RBUTTONDBLCLK: u32 = 0x0206;
pub const WM_MBUTTONDOWN: u32 = 0x0207;
pub const WM_MBUTTONUP: u32 = 0x0208;
pub const WM_MBUTTONDBLCLK: u32 = 0x0209;
pub const WM_MOUSEWHEEL: u32 = 0x020A;
pub const WM_MOUSEHWHEEL: u32 = 0x020E;

/// One notch of a mouse wheel.
pub const WHEEL_DELTA: i16 = 120;

/// Virtual key codes.
pub mod keys {
    pub const VK_BACK: u16 = 0x08;
    pub const VK_TAB: u16 = 0x09;
    pub const VK_RETURN: u16 = 0x0D;
    pub const VK_SHIFT: u16 = 0x10;
    pub const VK_CONTROL: u16 = 0x11;
    pub const VK_MENU: u16 = 0x12;
    pub const VK_ESCAPE: u16 = 0x1B;
    pub const VK_SPACE: u16 = 0x20;
    pub const VK_PRIOR: u16 = 0x21;
    pub const VK_NEXT: u16 = 0x22;
    pub const VK_END: u16 = 0x23;
    pub const VK_HOME: u16 = 0x24;
    pub const VK_LEFT: u16 = 0x25;
    pub const VK_UP: u16 = 0x26;
    pub const VK_RIGHT: u16 = 0x27;
    pub const VK_DOWN: u16 = 0x28;
    pub const VK_DELETE: u16 = 0x2E;
    pub const VK_0: u16 = 0x30;
    pub const VK_9: u16 = 0x39;
    pub const VK_A: u16 = 0x41;
    pub const VK_Z: u16 = 0x5A;
    pub const VK_LWIN: u16 = 0x5B;
    pub const VK_RWIN: u16 = 0x5C;
    pub const VK_F1: u16 = 0x70;
    pub const VK_F12: u16 = 0x7B;
}

/// Messages a control forwards to its handler.
#[derive(Debug)]
pub enum WindowMessage {
    /// An input message as the window procedure receives it.
    Input { msg: u32, wparam: usize, lparam: isize },
    /// `WM_WINDOWPOSCHANGED`, with the decoded `WINDOWPOS`.
    WindowPosChanged(Bounds),
    /// `OnPaint` with the paint graphics and clip rectangle.
    Paint { graphics: Box<dyn Graphics>, clip: Bounds },
}

/// Handles a message; returns true if it was handled.
pub type MessageHandler = Box<dyn FnMut(WindowMessage) -> bool + Send>;

/// Windows Forms control functions.
pub trait WinForms: fmt::Debug + Send + Sync {
    fn control_new(&self, class: ControlClass) -> HWND;
    fn set_message_handler(&self, hwnd: HWND, handler: MessageHandler);
    /// `Control.GetPreferredSize(proposedSize)`; zero components are unconstrained.
    fn get_preferred_size(&self, hwnd: HWND, proposed: Size) -> Size;
    fn minimum_size(&self, hwnd: HWND) -> Size;
    fn set_bounds(&self, hwnd: HWND, bounds: Bounds);
    fn bounds(&self, hwnd: HWND) -> Bounds;
    fn controls_add(&self, parent: HWND, child: HWND);
    fn controls_remove(&self, parent: HWND, child: HWND);
    fn parent(&self, hwnd: HWND) -> Option<HWND>;
    fn set_text(&self, hwnd: HWND, text: &str);
    fn invalidate(&self, hwnd: HWND);
    fn dispose(&self, hwnd: HWND);
    /// `ScreenToClient`.
    fn screen_to_client(&self, hwnd: HWND, x: i32, y: i32) -> (i32, i32);
    /// Whether the high bit of `GetKeyState(vk)` is set.
    fn is_key_down(&self, vk: u16) -> bool;
    /// `Graphics.FromImage` on a new 32bpp ARGB bitmap.
    fn bitmap_graphics(&self, width: i32, height: i32) -> Box<dyn Graphics>;
}
