//! Behavior that must agree across the GTK, Cocoa and Windows Forms backends, checked against
//! their headless native surfaces.

use weft::cairo_weft::ffi::{CairoPattern, GtkWidget};
use weft::cairo_weft::headless::CairoCall;
use weft::cairo_weft::GtkToolkit;
use weft::gdiplus_weft::ffi::{Brush, Size, ARGB, HWND};
use weft::gdiplus_weft::headless::GpCall;
use weft::gdiplus_weft::GdiPlusToolkit;
use weft::quartz_weft::ffi::{CGSize, NSView};
use weft::quartz_weft::headless::CGCall;
use weft::quartz_weft::QuartzToolkit;
use weft::{
    Color, Element, Gradient, Paint, Path, Toolkit, ToolkitRegistry, ToolkitType, Trimming, Widget, WidgetKind,
    WidgetSize,
};

fn toolkits() -> Vec<Box<dyn Toolkit>> {
    let registry = ToolkitRegistry::headless();
    ToolkitType::ALL
        .iter()
        .map(|t| registry.create(*t).unwrap())
        .collect()
}

fn sample_path() -> Path {
    let mut path = Path::new();
    path.move_to(10., 10.);
    path.line_to(50., 10.);
    path.curve_to(60., 10., 70., 20., 70., 30.);
    path.rel_curve_to(0., 10., -5., 15., -10., 20.).unwrap();
    path.arc(40., 40., 10., 0., 180.);
    path.close_path();
    path
}

#[test]
fn paths_survive_a_round_trip_through_the_context() {
    for toolkit in toolkits() {
        let mut ctx = toolkit.create_image_context(100, 100).unwrap();
        let path = sample_path();
        ctx.append_path(&path).unwrap();
        let copy = ctx.copy_path().unwrap();
        assert_eq!(copy.segments(), path.segments(), "{}", toolkit.toolkit_type());

        ctx.new_path().unwrap();
        ctx.append_path(&copy).unwrap();
        ctx.move_to(0., 0.).unwrap();
        ctx.rel_line_to(5., 5.).unwrap();
        let extended = ctx.copy_path().unwrap();
        assert_eq!(extended.len(), path.len() + 2);
        assert_eq!(&extended.segments()[..path.len()], path.segments());
        ctx.fill().unwrap();
        assert!(ctx.copy_path().unwrap().is_empty());
        ctx.dispose();
    }
}

#[test]
fn restore_brings_back_the_saved_state() {
    for toolkit in toolkits() {
        let mut ctx = toolkit.create_image_context(64, 64).unwrap();
        ctx.set_color(Color::RED).unwrap();
        ctx.set_line_width(3.).unwrap();
        let saved = ctx.state().clone();

        ctx.save().unwrap();
        ctx.set_color(Color::BLUE).unwrap();
        ctx.set_line_width(8.).unwrap();
        ctx.translate(10., 5.).unwrap();
        ctx.rotate(30.).unwrap();
        ctx.rectangle(0., 0., 10., 10.).unwrap();
        ctx.clip().unwrap();
        ctx.restore().unwrap();

        assert_eq!(ctx.state(), &saved, "{}", toolkit.toolkit_type());
        assert_eq!(ctx.save_depth(), 0);
        assert!(ctx.restore().is_err());
    }
}

#[test]
fn text_size_follows_the_text() {
    for toolkit in toolkits() {
        let mut layout = toolkit.create_text_layout();
        layout.set_text("Hi");
        let short = layout.get_size();
        assert_eq!(layout.get_size(), short);

        layout.set_text("Hello World");
        let long = layout.get_size();
        assert!(long.x > short.x, "{}", toolkit.toolkit_type());
        assert_eq!(long.y, short.y);

        layout.set_text("Hi");
        assert_eq!(layout.get_size(), short);
    }
}

#[test]
fn word_ellipsis_truncates_to_the_width() {
    for toolkit in toolkits() {
        let mut layout = toolkit.create_text_layout();
        layout.set_text("The quick brown fox jumps over the lazy dog");
        layout.set_width(100.);
        layout.set_trimming(Trimming::WordElipsis);

        let visible = layout.visible_text();
        assert!(visible.ends_with('\u{2026}'), "{}: {:?}", toolkit.toolkit_type(), visible);
        assert!(layout.get_size().x <= 100. + 1e-6);
        assert_eq!(layout.lines().len(), 1);

        // without a width, text is neither wrapped nor truncated
        let mut free = toolkit.create_text_layout();
        free.set_text("The quick brown fox jumps over the lazy dog");
        free.set_trimming(Trimming::WordElipsis);
        assert_eq!(free.visible_text(), "The quick brown fox jumps over the lazy dog");
        assert_eq!(free.lines().len(), 1);
    }
}

fn assert_min_size_override(widget: &mut Widget) {
    assert_eq!(widget.preferred_width().unwrap(), WidgetSize::fixed(80.));
    assert_eq!(widget.preferred_height().unwrap(), WidgetSize::fixed(20.));
    widget.set_min_size(200., 50.).unwrap();
    assert_eq!(widget.preferred_width().unwrap(), WidgetSize::fixed(200.));
    assert_eq!(widget.preferred_height().unwrap(), WidgetSize::fixed(50.));
    widget.set_min_size(-1., -1.).unwrap();
    assert_eq!(widget.preferred_width().unwrap(), WidgetSize::fixed(80.));
}

#[test]
fn min_size_overrides_native_size() {
    let (gtk_toolkit, gtk) = GtkToolkit::headless();
    let mut widget = Widget::new(&gtk_toolkit, WidgetKind::Canvas).unwrap();
    let native = widget.backend().native_handle().unwrap();
    gtk.set_intrinsic_size(GtkWidget(native.0), (80, 80), (20, 20));
    assert_min_size_override(&mut widget);

    let (quartz_toolkit, appkit) = QuartzToolkit::headless();
    let mut widget = Widget::new(&quartz_toolkit, WidgetKind::Canvas).unwrap();
    let native = widget.backend().native_handle().unwrap();
    appkit.set_intrinsic_size(
        NSView(native.0),
        CGSize {
            width: 80.,
            height: 20.,
        },
    );
    assert_min_size_override(&mut widget);

    let (forms_toolkit, forms) = GdiPlusToolkit::headless();
    let mut widget = Widget::new(&forms_toolkit, WidgetKind::Canvas).unwrap();
    let native = widget.backend().native_handle().unwrap();
    let size = Size {
        width: 80,
        height: 20,
    };
    forms.set_preferred_size(HWND(native.0), size);
    forms.set_minimum_size(HWND(native.0), size);
    assert_min_size_override(&mut widget);
}

/// A gradient whose stops were added out of order.
fn unsorted_gradient() -> Gradient {
    let mut gradient = Gradient::linear(0., 0., 100., 0.);
    gradient
        .add_color_stop(1., Color::RED)
        .add_color_stop(0., Color::BLUE)
        .add_color_stop(0.5, Color::GREEN);
    gradient
}

fn fill_with_gradient(toolkit: &dyn Toolkit) {
    let mut ctx = toolkit.create_image_context(100, 100).unwrap();
    ctx.set_pattern(unsorted_gradient()).unwrap();
    assert!(matches!(ctx.state().paint, Paint::Pattern(_)));
    ctx.rectangle(0., 0., 100., 100.).unwrap();
    ctx.fill().unwrap();
    ctx.dispose();
}

#[test]
fn gradient_stops_are_sorted_for_every_backend() {
    let (toolkit, gtk) = GtkToolkit::headless();
    fill_with_gradient(&toolkit);
    let log = gtk.surface_log(0).unwrap();
    let stops = log
        .lock()
        .iter()
        .find_map(|call| match call {
            CairoCall::SetSource(CairoPattern::Linear { stops, .. }) => Some(stops.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(stops.iter().map(|s| s.offset).collect::<Vec<_>>(), vec![0., 0.5, 1.]);
    assert_eq!((stops[0].b, stops[1].g, stops[2].r), (1., 1., 1.));

    let (toolkit, appkit) = QuartzToolkit::headless();
    fill_with_gradient(&toolkit);
    let log = appkit.bitmap_log(0).unwrap();
    let gradient = log
        .lock()
        .iter()
        .find_map(|call| match call {
            CGCall::DrawLinearGradient { gradient, .. } => Some(gradient.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(gradient.locations, vec![0., 0.5, 1.]);
    assert_eq!((gradient.colors[0].b, gradient.colors[2].r), (1., 1.));

    let (toolkit, forms) = GdiPlusToolkit::headless();
    fill_with_gradient(&toolkit);
    let log = forms.bitmap_log(0).unwrap();
    let (colors, positions) = log
        .lock()
        .iter()
        .find_map(|call| match call {
            GpCall::FillPath(Brush::LinearGradient { colors, positions, .. }, _) => {
                Some((colors.clone(), positions.clone()))
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(positions, vec![0., 0.5, 1.]);
    assert_eq!(colors[0], ARGB::from_color(Color::BLUE, 1.));
    assert_eq!(colors[2], ARGB::from_color(Color::RED, 1.));
}
