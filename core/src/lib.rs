//! Toolkit-neutral core of the weft UI abstraction layer.
//!
//! # Conceptual overview
//! Weft puts one API in front of three structurally different native toolkits: GTK (Cairo and
//! Pango), Cocoa (Core Graphics and CoreText) and Windows Forms (GDI+). This crate holds
//! everything that does not depend on the toolkit; each backend crate implements the traits in
//! [`backend`], [`context`] and [`view`] on top of its native API.
//!
//! ## Drawing
//! Drawing happens on a [`DrawingContext`], a stateful context in the style of Cairo: a path is
//! built up with `move_to`, `line_to`, `curve_to`, `arc` and friends, and then consumed by `fill`,
//! `stroke` or `clip`. Paint, line style, font, transform and clip are part of the graphics state,
//! which is saved and restored on a stack. The context keeps the neutral state itself and sends
//! fully resolved drawing operations to its backend, so all backends agree on transform
//! composition, arc direction and hairline width.
//!
//! ## Text
//! A [`TextLayout`] breaks text into lines and truncates it according to its constraints. Only
//! glyph metrics come from the backend (through [`TextMeasurer`]), so wrapping and ellipsizing
//! behave the same on every toolkit.
//!
//! ## Views
//! Widgets are backed by a [`WidgetBackend`], which owns exactly one native view from
//! `initialize` to `dispose`. Layout is a two-pass negotiation: first sizes are queried
//! bottom-up ([`WidgetSize`] with a minimum and a natural size per dimension), then rectangles
//! are allocated top-down. Native input is translated into [`WidgetEvent`]s; draw requests run
//! the widget’s draw handler inside a trampoline that keeps errors and panics from reaching the
//! native event loop.
//!
//! ## Coordinate System
//! The origin is at the top left corner of a view and positive y points down. Angles are in
//! degrees and turn from +x toward +y. Backends whose native y-axis points up (Cocoa) flip at the
//! boundary.

pub mod backend;
pub mod color;
pub mod context;
pub mod error;
pub mod events;
pub mod gradient;
pub mod image;
pub mod path;
mod rect;
pub mod text;
pub mod transform;
pub mod view;

pub use backend::{Toolkit, ToolkitType};
pub use color::Color;
pub use context::{ContextBackend, DrawingContext, FillRule, GraphicsState, LineCap, LineJoin};
pub use error::{Error, Result};
pub use events::{EventSink, WidgetEvent};
pub use gradient::{Gradient, Paint, Pattern};
pub use image::Image;
pub use path::{Path, PathSegment};
pub use rect::Rect;
pub use text::{Alignment, Font, TextLayout, TextMeasurer, Trimming, WrapMode};
pub use view::{Lifecycle, NativeHandle, ViewBackend, ViewId, WidgetBackend, WidgetKind, WidgetSize};

pub use cgmath::{Point2, Vector2};
