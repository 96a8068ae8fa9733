//! The native GTK, Cairo and Pango surface this backend consumes.
//!
//! Each trait method stands for one C function (`cairo_*`, `pango_*`, `gtk_*`) with the same
//! units and conventions: Cairo angles are radians, Pango sizes are in Pango units, GTK sizes are
//! integer pixels. The rest of the backend only talks to the native libraries through these
//! traits.
//! [`crate::headless`] implements the traits without a display server.

use cgmath::Matrix3;
use core::fmt;
use weft_core::image::Image;
use weft_core::text::{Font, FontStyle, FontWeight};
use weft_core::{transform, Rect};

/// Pango units per device unit.
pub const PANGO_SCALE: i32 = 1024;

/// `cairo_matrix_t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CairoMatrix {
    pub xx: f64,
    pub yx: f64,
    pub xy: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

impl From<Matrix3<f64>> for CairoMatrix {
    fn from(m: Matrix3<f64>) -> CairoMatrix {
        let [xx, yx, xy, yy, x0, y0] = transform::to_affine(&m);
        CairoMatrix {
            xx,
            yx,
            xy,
            yy,
            x0,
            y0,
        }
    }
}

impl From<CairoMatrix> for Matrix3<f64> {
    fn from(m: CairoMatrix) -> Matrix3<f64> {
        transform::affine(m.xx, m.yx, m.xy, m.yy, m.x0, m.y0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CairoLineCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CairoLineJoin {
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CairoFillRule {
    Winding,
    EvenOdd,
}

/// A color stop as passed to `cairo_pattern_add_color_stop_rgba`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CairoColorStop {
    pub offset: f64,
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// `cairo_pattern_t`.
#[derive(Debug, Clone, PartialEq)]
pub enum CairoPattern {
    Linear {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        stops: Vec<CairoColorStop>,
    },
    Radial {
        cx0: f64,
        cy0: f64,
        radius0: f64,
        cx1: f64,
        cy1: f64,
        radius1: f64,
        stops: Vec<CairoColorStop>,
    },
    /// A repeating surface pattern.
    Surface { image: Image, x: f64, y: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PangoStyle {
    Normal,
    Oblique,
    Italic,
}

/// `PangoFontDescription`.
#[derive(Debug, Clone, PartialEq)]
pub struct PangoFontDescription {
    pub family: String,
    /// Size in Pango units.
    pub size: i32,
    /// `PangoWeight`, 100 to 1000.
    pub weight: i32,
    pub style: PangoStyle,
}

impl From<&Font> for PangoFontDescription {
    fn from(font: &Font) -> PangoFontDescription {
        PangoFontDescription {
            family: font.family.clone(),
            size: (font.size * f64::from(PANGO_SCALE)).round() as i32,
            weight: i32::from(font.weight.value()),
            style: match font.style {
                FontStyle::Normal => PangoStyle::Normal,
                FontStyle::Italic => PangoStyle::Italic,
                FontStyle::Oblique => PangoStyle::Oblique,
            },
        }
    }
}

impl PangoFontDescription {
    /// The neutral font this description was made from.
    pub fn to_font(&self) -> Font {
        let weight = match self.weight {
            w if w < 200 => FontWeight::Thin,
            w if w < 350 => FontWeight::Light,
            w if w < 500 => FontWeight::Normal,
            w if w < 650 => FontWeight::Semibold,
            w if w < 800 => FontWeight::Bold,
            _ => FontWeight::Heavy,
        };
        let style = match self.style {
            PangoStyle::Normal => FontStyle::Normal,
            PangoStyle::Italic => FontStyle::Italic,
            PangoStyle::Oblique => FontStyle::Oblique,
        };
        Font::new(&self.family, f64::from(self.size) / f64::from(PANGO_SCALE))
            .with_weight(weight)
            .with_style(style)
    }
}

/// The attributes of a `PangoAttrList` the backend uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PangoAttrs {
    pub underline: bool,
    pub strikethrough: bool,
}

/// `PangoFontMetrics`, in Pango units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PangoFontMetrics {
    pub ascent: i32,
    pub descent: i32,
    /// Line height (`pango_font_metrics_get_height`).
    pub height: i32,
}

/// A Cairo drawing context (`cairo_t`).
pub trait Cairo: fmt::Debug + Send {
    fn save(&mut self);
    fn restore(&mut self);
    fn get_matrix(&self) -> CairoMatrix;
    fn set_matrix(&mut self, matrix: CairoMatrix);
    fn new_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64);
    /// Angles in radians, increasing from +x toward +y.
    fn arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64);
    fn arc_negative(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64);
    fn close_path(&mut self);
    fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn set_source_rgba(&mut self, r: f64, g: f64, b: f64, a: f64);
    fn set_source(&mut self, pattern: CairoPattern);
    fn set_line_width(&mut self, width: f64);
    /// An empty dash list disables dashing.
    fn set_dash(&mut self, dashes: &[f64], offset: f64);
    fn set_line_cap(&mut self, cap: CairoLineCap);
    fn set_line_join(&mut self, join: CairoLineJoin);
    fn set_fill_rule(&mut self, rule: CairoFillRule);
    fn fill(&mut self);
    fn stroke(&mut self);
    fn clip(&mut self);
    fn reset_clip(&mut self);
    fn push_group(&mut self);
    fn pop_group_to_source(&mut self);
    /// `gdk_cairo_set_source_pixbuf`.
    fn set_source_image(&mut self, image: &Image, x: f64, y: f64);
    fn paint_with_alpha(&mut self, alpha: f64);
    /// `pango_cairo_show_layout` of a single-run layout, with its top-left at the current point.
    fn show_layout(&mut self, text: &str, font: &PangoFontDescription, attrs: PangoAttrs);
    fn destroy(&mut self);
}

/// Pango text measurement.
pub trait Pango: fmt::Debug + Send + Sync {
    /// `pango_layout_get_size` of a single-line layout.
    fn layout_size(&self, text: &str, font: &PangoFontDescription) -> (i32, i32);

    fn font_metrics(&self, font: &PangoFontDescription) -> PangoFontMetrics;
}

/// A `GtkWidget*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GtkWidget(pub u64);

impl GtkWidget {
    pub const NULL: GtkWidget = GtkWidget(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GtkWidgetClass {
    DrawingArea,
    Label,
    Button,
    Fixed,
}

/// `GtkAllocation`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GtkAllocation {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<Rect> for GtkAllocation {
    fn from(rect: Rect) -> GtkAllocation {
        GtkAllocation {
            x: rect.x().round() as i32,
            y: rect.y().round() as i32,
            width: rect.width().round().max(0.) as i32,
            height: rect.height().round().max(0.) as i32,
        }
    }
}

impl Into<Rect> for GtkAllocation {
    fn into(self) -> Rect {
        Rect::from_xywh(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.width),
            f64::from(self.height),
        )
    }
}

pub const GDK_SHIFT_MASK: u32 = 1;
pub const GDK_CONTROL_MASK: u32 = 1 << 2;
pub const GDK_MOD1_MASK: u32 = 1 << 3;
pub const GDK_SUPER_MASK: u32 = 1 << 26;
pub const GDK_META_MASK: u32 = 1 << 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdkEventType {
    ButtonPress,
    DoubleButtonPress,
    TripleButtonPress,
    ButtonRelease,
}

/// `GdkEventButton`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GdkEventButton {
    pub event_type: GdkEventType,
    pub x: f64,
    pub y: f64,
    pub button: u32,
    pub state: u32,
}

/// `GdkEventMotion`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GdkEventMotion {
    pub x: f64,
    pub y: f64,
    pub state: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdkScrollDirection {
    Up,
    Down,
    Left,
    Right,
    Smooth,
}

/// `GdkEventScroll`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GdkEventScroll {
    pub x: f64,
    pub y: f64,
    pub direction: GdkScrollDirection,
    /// Only set for smooth scrolling.
    pub delta_x: f64,
    pub delta_y: f64,
}

/// `GdkEventKey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GdkEventKey {
    pub keyval: u32,
    pub state: u32,
}

pub mod keys {
    pub const GDK_KEY_SPACE: u32 = 0x020;
    pub const GDK_KEY_0: u32 = 0x030;
    pub const GDK_KEY_9: u32 = 0x039;
    pub const GDK_KEY_UPPER_A: u32 = 0x041;
    pub const GDK_KEY_UPPER_Z: u32 = 0x05a;
    pub const GDK_KEY_A: u32 = 0x061;
    pub const GDK_KEY_Z: u32 = 0x07a;
    pub const GDK_KEY_BACKSPACE: u32 = 0xff08;
    pub const GDK_KEY_TAB: u32 = 0xff09;
    pub const GDK_KEY_RETURN: u32 = 0xff0d;
    pub const GDK_KEY_ESCAPE: u32 = 0xff1b;
    pub const GDK_KEY_HOME: u32 = 0xff50;
    pub const GDK_KEY_LEFT: u32 = 0xff51;
    pub const GDK_KEY_UP: u32 = 0xff52;
    pub const GDK_KEY_RIGHT: u32 = 0xff53;
    pub const GDK_KEY_DOWN: u32 = 0xff54;
    pub const GDK_KEY_PAGE_UP: u32 = 0xff55;
    pub const GDK_KEY_PAGE_DOWN: u32 = 0xff56;
    pub const GDK_KEY_END: u32 = 0xff57;
    pub const GDK_KEY_F1: u32 = 0xffbe;
    pub const GDK_KEY_F12: u32 = 0xffc9;
    pub const GDK_KEY_DELETE: u32 = 0xffff;
}

/// Signal payloads.
#[derive(Debug)]
pub enum GtkSignal {
    ButtonPress(GdkEventButton),
    ButtonRelease(GdkEventButton),
    MotionNotify(GdkEventMotion),
    Scroll(GdkEventScroll),
    KeyPress(GdkEventKey),
    KeyRelease(GdkEventKey),
    SizeAllocate(GtkAllocation),
    /// The `draw` signal: a context for the widget plus its allocated size.
    Draw {
        cr: Box<dyn Cairo>,
        width: i32,
        height: i32,
    },
}

impl GtkSignal {
    /// The detailed signal name.
    pub fn name(&self) -> &'static str {
        match self {
            GtkSignal::ButtonPress(_) => "button-press-event",
            GtkSignal::ButtonRelease(_) => "button-release-event",
            GtkSignal::MotionNotify(_) => "motion-notify-event",
            GtkSignal::Scroll(_) => "scroll-event",
            GtkSignal::KeyPress(_) => "key-press-event",
            GtkSignal::KeyRelease(_) => "key-release-event",
            GtkSignal::SizeAllocate(_) => "size-allocate",
            GtkSignal::Draw { .. } => "draw",
        }
    }
}

/// A signal handler; returns true to stop other handlers from being invoked.
pub type SignalHandler = Box<dyn FnMut(GtkSignal) -> bool + Send>;

/// GTK widget functions.
pub trait Gtk: fmt::Debug + Send + Sync {
    fn widget_new(&self, class: GtkWidgetClass) -> GtkWidget;
    fn widget_destroy(&self, widget: GtkWidget);
    fn get_preferred_width(&self, widget: GtkWidget) -> (i32, i32);
    fn get_preferred_height(&self, widget: GtkWidget) -> (i32, i32);
    fn get_preferred_height_for_width(&self, widget: GtkWidget, width: i32) -> (i32, i32);
    fn get_preferred_width_for_height(&self, widget: GtkWidget, height: i32) -> (i32, i32);
    fn size_allocate(&self, widget: GtkWidget, allocation: GtkAllocation);
    fn container_add(&self, container: GtkWidget, child: GtkWidget);
    fn container_remove(&self, container: GtkWidget, child: GtkWidget);
    /// `gtk_label_set_text` or `gtk_button_set_label`, depending on the class.
    fn set_text(&self, widget: GtkWidget, text: &str);
    fn queue_draw(&self, widget: GtkWidget);
    fn signal_connect(&self, widget: GtkWidget, signal: &'static str, handler: SignalHandler) -> u64;
    /// `cairo_create(cairo_image_surface_create(CAIRO_FORMAT_ARGB32, width, height))`.
    fn image_surface_create(&self, width: i32, height: i32) -> Box<dyn Cairo>;
    /// `gdk_pixbuf_scale_simple` with bilinear interpolation.
    fn pixbuf_scale_simple(&self, image: &Image, width: i32, height: i32) -> Option<Image>;
}
