//! View backends and size negotiation.
//!
//! A [`ViewBackend`] pairs a frontend widget identity with exactly one native view for its
//! lifetime and answers the toolkit-neutral size queries by asking the native layout system and
//! applying the widget’s size overrides. Frontend widgets hold it as a `Box<dyn WidgetBackend>`.
//!
//! Size negotiation is two-pass: size queries flow bottom-up, then allocations flow top-down
//! through [`WidgetBackend::set_allocation`] and [`WidgetBackend::set_child_bounds`]. A widget
//! must not be asked for its size while its own allocation is in progress.

use crate::backend::ToolkitType;
use crate::error::{Error, Result};
use crate::events::EventSink;
use crate::rect::Rect;
use cgmath::Vector2;
use core::fmt;
use uuid::Uuid;

/// A unique identifier for a view.
///
/// (this is just a UUID)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u32, u16, u16, [u8; 8]);

impl ViewId {
    pub fn new() -> ViewId {
        let uuid = Uuid::new_v4();
        let (a, b, c, d) = uuid.as_fields();
        ViewId(a, b, c, *d)
    }
}

/// An opaque native view handle, as handed out by the native toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NativeHandle(pub u64);

/// The answer to a size query along one dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidgetSize {
    pub min_size: f64,
    pub natural_size: f64,
}

impl WidgetSize {
    /// Creates a size; the natural size is raised to the minimum size if it is smaller.
    pub fn new(min_size: f64, natural_size: f64) -> WidgetSize {
        let min_size = min_size.max(0.);
        WidgetSize {
            min_size,
            natural_size: natural_size.max(min_size),
        }
    }

    /// A size whose minimum and natural sizes are equal.
    pub fn fixed(size: f64) -> WidgetSize {
        WidgetSize::new(size, size)
    }

    pub fn zero() -> WidgetSize {
        WidgetSize::fixed(0.)
    }

    /// Sum of two sizes (for widgets laid out one after the other).
    pub fn add(self, other: WidgetSize) -> WidgetSize {
        WidgetSize::new(self.min_size + other.min_size, self.natural_size + other.natural_size)
    }

    /// Adds the same amount to both sizes.
    pub fn add_space(self, space: f64) -> WidgetSize {
        WidgetSize::new(self.min_size + space, self.natural_size + space)
    }

    /// Componentwise maximum (for widgets laid out side by side along the other axis).
    pub fn max(self, other: WidgetSize) -> WidgetSize {
        WidgetSize::new(
            self.min_size.max(other.min_size),
            self.natural_size.max(other.natural_size),
        )
    }
}

/// Lifecycle of a view backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Uninitialized,
    Initialized,
    /// Initialized and added to a parent.
    Attached,
    Disposed,
}

/// Kinds of native widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// A custom-drawn surface.
    Canvas,
    Label,
    Button,
    /// A view that holds child views.
    Container,
}

impl WidgetKind {
    pub fn has_text(self) -> bool {
        match self {
            WidgetKind::Label | WidgetKind::Button => true,
            WidgetKind::Canvas | WidgetKind::Container => false,
        }
    }
}

/// The native side of a view backend, implemented once per toolkit.
///
/// Sizes are in the toolkit’s logical pixels.
pub trait NativeView: fmt::Debug {
    fn toolkit(&self) -> ToolkitType;

    /// Constructs the native view and wires its event callbacks to `events`.
    fn create(&mut self, kind: WidgetKind, events: &EventSink) -> Result<NativeHandle>;

    fn preferred_width(&mut self) -> WidgetSize;

    fn preferred_height(&mut self) -> WidgetSize;

    fn preferred_height_for_width(&mut self, width: f64) -> WidgetSize;

    fn preferred_width_for_height(&mut self, height: f64) -> WidgetSize;

    /// Moves the native view to `rect`, given in the parent’s coordinate system with y pointing
    /// down. `parent_size` is needed by toolkits whose y-axis points up.
    fn set_frame(&mut self, rect: Rect, parent_size: Vector2<f64>) -> Result<()>;

    fn add_child(&mut self, child: NativeHandle) -> Result<()>;

    fn remove_child(&mut self, child: NativeHandle) -> Result<()>;

    /// Sets the text of a label or button.
    fn set_text(&mut self, text: &str) -> Result<()>;

    /// Schedules a redraw.
    fn queue_draw(&mut self);

    /// Destroys the native view.
    fn destroy(&mut self);
}

/// A toolkit-neutral view backend; see [`ViewBackend`].
pub trait WidgetBackend: fmt::Debug {
    fn id(&self) -> ViewId;

    fn toolkit(&self) -> ToolkitType;

    fn lifecycle(&self) -> Lifecycle;

    fn kind(&self) -> Option<WidgetKind>;

    /// The native view handle; fails before `initialize` and after `dispose`.
    fn native_handle(&self) -> Result<NativeHandle>;

    fn events(&self) -> &EventSink;

    /// Constructs the native view. Must be called exactly once.
    fn initialize(&mut self, kind: WidgetKind) -> Result<()>;

    /// Overrides the minimum size. A negative value clears the override for that dimension.
    fn set_min_size(&mut self, width: f64, height: f64) -> Result<()>;

    /// Overrides the natural size. A negative value clears the override for that dimension.
    fn set_natural_size(&mut self, width: f64, height: f64) -> Result<()>;

    fn preferred_width(&mut self) -> Result<WidgetSize>;

    fn preferred_height(&mut self) -> Result<WidgetSize>;

    fn preferred_height_for_width(&mut self, width: f64) -> Result<WidgetSize>;

    fn preferred_width_for_height(&mut self, height: f64) -> Result<WidgetSize>;

    /// Starts the allocation pass of this widget by moving it to `rect` (in the parent’s
    /// coordinate system). Size queries fail until [`WidgetBackend::finish_allocation`].
    fn set_allocation(&mut self, rect: Rect, parent_size: Vector2<f64>) -> Result<()>;

    fn finish_allocation(&mut self);

    /// The last allocated rectangle.
    fn allocation(&self) -> Rect;

    /// Adds a child view. The child must be initialized and not attached elsewhere.
    fn add_child(&mut self, child: &mut dyn WidgetBackend) -> Result<()>;

    fn remove_child(&mut self, child: &mut dyn WidgetBackend) -> Result<()>;

    /// Allocates a rectangle to a child, in this widget’s coordinate system.
    fn set_child_bounds(&mut self, child: &mut dyn WidgetBackend, rect: Rect) -> Result<()>;

    fn set_text(&mut self, text: &str) -> Result<()>;

    fn queue_draw(&mut self) -> Result<()>;

    /// Destroys the native view. Calling this again does nothing.
    fn dispose(&mut self);

    /// The parent this backend is attached to.
    fn parent(&self) -> Option<NativeHandle>;

    #[doc(hidden)]
    fn attach_to(&mut self, parent: NativeHandle) -> Result<()>;

    #[doc(hidden)]
    fn detach(&mut self) -> Result<()>;
}

/// Per-dimension size overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Overrides {
    min: Option<f64>,
    natural: Option<f64>,
}

impl Overrides {
    fn apply(&self, native: WidgetSize) -> WidgetSize {
        let mut size = native;
        if let Some(min) = self.min {
            if min > size.min_size {
                size.min_size = min;
            }
        }
        if let Some(natural) = self.natural {
            size.natural_size = natural;
        }
        WidgetSize::new(size.min_size, size.natural_size)
    }
}

fn override_value(value: f64) -> Option<f64> {
    if value >= 0. {
        Some(value)
    } else {
        None
    }
}

/// A view backend: one native view plus the neutral size-request state.
#[derive(Debug)]
pub struct ViewBackend<N: NativeView> {
    id: ViewId,
    native: N,
    kind: Option<WidgetKind>,
    handle: Option<NativeHandle>,
    state: Lifecycle,
    width: Overrides,
    height: Overrides,
    events: EventSink,
    parent: Option<NativeHandle>,
    allocating: bool,
    allocation: Rect,
}

impl<N: NativeView> ViewBackend<N> {
    pub fn new(native: N) -> ViewBackend<N> {
        ViewBackend {
            id: ViewId::new(),
            native,
            kind: None,
            handle: None,
            state: Lifecycle::Uninitialized,
            width: Overrides::default(),
            height: Overrides::default(),
            events: EventSink::new(),
            parent: None,
            allocating: false,
            allocation: Rect::zero(),
        }
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    pub fn native_mut(&mut self) -> &mut N {
        &mut self.native
    }

    fn require_live(&self, operation: &'static str) -> Result<NativeHandle> {
        match (self.state, self.handle) {
            (Lifecycle::Initialized, Some(handle)) | (Lifecycle::Attached, Some(handle)) => Ok(handle),
            (state, _) => Err(Error::InvalidState { operation, state }),
        }
    }

    fn require_query(&self, operation: &'static str) -> Result<()> {
        self.require_live(operation)?;
        if self.allocating {
            return Err(Error::ReentrantSizeQuery);
        }
        Ok(())
    }
}

impl<N: NativeView> WidgetBackend for ViewBackend<N> {
    fn id(&self) -> ViewId {
        self.id
    }

    fn toolkit(&self) -> ToolkitType {
        self.native.toolkit()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.state
    }

    fn kind(&self) -> Option<WidgetKind> {
        self.kind
    }

    fn native_handle(&self) -> Result<NativeHandle> {
        self.require_live("get the native handle of")
    }

    fn events(&self) -> &EventSink {
        &self.events
    }

    fn initialize(&mut self, kind: WidgetKind) -> Result<()> {
        if self.state != Lifecycle::Uninitialized {
            return Err(Error::InvalidState {
                operation: "initialize",
                state: self.state,
            });
        }
        let handle = self.native.create(kind, &self.events)?;
        log::debug!(
            "{:?}: created native {:?} {:?} for {:?}",
            self.native.toolkit(),
            kind,
            handle,
            self.id
        );
        self.kind = Some(kind);
        self.handle = Some(handle);
        self.state = Lifecycle::Initialized;
        Ok(())
    }

    fn set_min_size(&mut self, width: f64, height: f64) -> Result<()> {
        self.require_live("set the minimum size of")?;
        self.width.min = override_value(width);
        self.height.min = override_value(height);
        Ok(())
    }

    fn set_natural_size(&mut self, width: f64, height: f64) -> Result<()> {
        self.require_live("set the natural size of")?;
        self.width.natural = override_value(width);
        self.height.natural = override_value(height);
        Ok(())
    }

    fn preferred_width(&mut self) -> Result<WidgetSize> {
        self.require_query("query the width of")?;
        Ok(self.width.apply(self.native.preferred_width()))
    }

    fn preferred_height(&mut self) -> Result<WidgetSize> {
        self.require_query("query the height of")?;
        Ok(self.height.apply(self.native.preferred_height()))
    }

    fn preferred_height_for_width(&mut self, width: f64) -> Result<WidgetSize> {
        self.require_query("query the height of")?;
        Ok(self
            .height
            .apply(self.native.preferred_height_for_width(width.max(0.))))
    }

    fn preferred_width_for_height(&mut self, height: f64) -> Result<WidgetSize> {
        self.require_query("query the width of")?;
        Ok(self
            .width
            .apply(self.native.preferred_width_for_height(height.max(0.))))
    }

    fn set_allocation(&mut self, rect: Rect, parent_size: Vector2<f64>) -> Result<()> {
        self.require_live("allocate")?;
        self.allocating = true;
        if let Err(err) = self.native.set_frame(rect, parent_size) {
            self.allocating = false;
            return Err(err);
        }
        self.allocation = rect;
        Ok(())
    }

    fn finish_allocation(&mut self) {
        self.allocating = false;
    }

    fn allocation(&self) -> Rect {
        self.allocation
    }

    fn add_child(&mut self, child: &mut dyn WidgetBackend) -> Result<()> {
        let handle = self.require_live("add a child to")?;
        if child.lifecycle() != Lifecycle::Initialized {
            return Err(Error::InvalidState {
                operation: "attach",
                state: child.lifecycle(),
            });
        }
        let child_handle = child.native_handle()?;
        self.native.add_child(child_handle)?;
        child.attach_to(handle)
    }

    fn remove_child(&mut self, child: &mut dyn WidgetBackend) -> Result<()> {
        let handle = self.require_live("remove a child from")?;
        if child.parent() != Some(handle) {
            return Err(Error::NotAChild);
        }
        self.native.remove_child(child.native_handle()?)?;
        child.detach()
    }

    fn set_child_bounds(&mut self, child: &mut dyn WidgetBackend, rect: Rect) -> Result<()> {
        let handle = self.require_live("lay out the children of")?;
        if child.parent() != Some(handle) {
            return Err(Error::NotAChild);
        }
        child.set_allocation(rect, self.allocation.size)
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.require_live("set the text of")?;
        self.native.set_text(text)
    }

    fn queue_draw(&mut self) -> Result<()> {
        self.require_live("redraw")?;
        self.native.queue_draw();
        Ok(())
    }

    fn dispose(&mut self) {
        match self.state {
            Lifecycle::Disposed => return,
            Lifecycle::Initialized | Lifecycle::Attached => self.native.destroy(),
            Lifecycle::Uninitialized => (),
        }
        log::trace!("disposed view {:?}", self.id);
        self.state = Lifecycle::Disposed;
        self.handle = None;
        self.parent = None;
    }

    fn parent(&self) -> Option<NativeHandle> {
        self.parent
    }

    fn attach_to(&mut self, parent: NativeHandle) -> Result<()> {
        if self.state != Lifecycle::Initialized {
            return Err(Error::InvalidState {
                operation: "attach",
                state: self.state,
            });
        }
        self.parent = Some(parent);
        self.state = Lifecycle::Attached;
        Ok(())
    }

    fn detach(&mut self) -> Result<()> {
        if self.state != Lifecycle::Attached {
            return Err(Error::InvalidState {
                operation: "detach",
                state: self.state,
            });
        }
        self.parent = None;
        self.state = Lifecycle::Initialized;
        Ok(())
    }
}

impl<N: NativeView> Drop for ViewBackend<N> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point2;
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

    /// A native view with a fixed intrinsic size of 80×20.
    #[derive(Debug, Default)]
    struct FixedView {
        frames: Vec<Rect>,
        children: Vec<NativeHandle>,
        destroyed: bool,
    }

    impl NativeView for FixedView {
        fn toolkit(&self) -> ToolkitType {
            ToolkitType::WinForms
        }
        fn create(&mut self, _: WidgetKind, _: &EventSink) -> Result<NativeHandle> {
            Ok(NativeHandle(NEXT_HANDLE.fetch_add(1, Ordering::SeqCst)))
        }
        fn preferred_width(&mut self) -> WidgetSize {
            WidgetSize::new(40., 80.)
        }
        fn preferred_height(&mut self) -> WidgetSize {
            WidgetSize::fixed(20.)
        }
        fn preferred_height_for_width(&mut self, width: f64) -> WidgetSize {
            WidgetSize::fixed(if width < 80. { 40. } else { 20. })
        }
        fn preferred_width_for_height(&mut self, _: f64) -> WidgetSize {
            self.preferred_width()
        }
        fn set_frame(&mut self, rect: Rect, _: Vector2<f64>) -> Result<()> {
            self.frames.push(rect);
            Ok(())
        }
        fn add_child(&mut self, child: NativeHandle) -> Result<()> {
            self.children.push(child);
            Ok(())
        }
        fn remove_child(&mut self, child: NativeHandle) -> Result<()> {
            self.children.retain(|c| *c != child);
            Ok(())
        }
        fn set_text(&mut self, _: &str) -> Result<()> {
            Ok(())
        }
        fn queue_draw(&mut self) {}
        fn destroy(&mut self) {
            self.destroyed = true;
        }
    }

    fn backend() -> ViewBackend<FixedView> {
        let mut backend = ViewBackend::new(FixedView::default());
        backend.initialize(WidgetKind::Canvas).unwrap();
        backend
    }

    #[test]
    fn min_size_override_wins() {
        let mut backend = backend();
        backend.set_min_size(200., 50.).unwrap();
        let width = backend.preferred_width().unwrap();
        assert_eq!(width.min_size, 200.);
        assert_eq!(width.natural_size, 200.);
        assert_eq!(backend.preferred_height().unwrap(), WidgetSize::fixed(50.));

        // a smaller override does not shrink the native minimum
        backend.set_min_size(10., -1.).unwrap();
        assert_eq!(backend.preferred_width().unwrap(), WidgetSize::new(40., 80.));
        assert_eq!(backend.preferred_height().unwrap(), WidgetSize::fixed(20.));
    }

    #[test]
    fn natural_size_override_replaces_native() {
        let mut backend = backend();
        backend.set_natural_size(120., -1.).unwrap();
        assert_eq!(backend.preferred_width().unwrap(), WidgetSize::new(40., 120.));
        backend.set_natural_size(10., -1.).unwrap();
        assert_eq!(backend.preferred_width().unwrap(), WidgetSize::new(40., 40.));
        assert_eq!(
            backend.preferred_height_for_width(50.).unwrap(),
            WidgetSize::fixed(40.)
        );
    }

    #[test]
    fn lifecycle_is_enforced() {
        let mut backend = ViewBackend::new(FixedView::default());
        assert_eq!(
            backend.preferred_width(),
            Err(Error::InvalidState {
                operation: "query the width of",
                state: Lifecycle::Uninitialized
            })
        );
        backend.initialize(WidgetKind::Label).unwrap();
        assert!(backend.initialize(WidgetKind::Label).is_err());
        backend.dispose();
        assert!(backend.native().destroyed);
        backend.dispose();
        assert_eq!(
            backend.set_min_size(1., 1.),
            Err(Error::InvalidState {
                operation: "set the minimum size of",
                state: Lifecycle::Disposed
            })
        );
        assert!(backend.native_handle().is_err());
    }

    #[test]
    fn size_queries_fail_during_allocation() {
        let mut backend = backend();
        backend
            .set_allocation(Rect::from_xywh(0., 0., 80., 20.), Vector2::new(100., 100.))
            .unwrap();
        assert_eq!(backend.preferred_width(), Err(Error::ReentrantSizeQuery));
        backend.finish_allocation();
        assert!(backend.preferred_width().is_ok());
    }

    #[test]
    fn children_are_attached_and_allocated() {
        let mut parent = backend();
        let mut child = backend();
        let mut stranger = backend();

        parent.add_child(&mut child).unwrap();
        assert_eq!(child.lifecycle(), Lifecycle::Attached);
        assert!(parent.add_child(&mut child).is_err());

        let rect = Rect::new(Point2::new(5., 5.), Vector2::new(10., 10.));
        parent.set_child_bounds(&mut child, rect).unwrap();
        child.finish_allocation();
        assert_eq!(child.allocation(), rect);
        assert_eq!(child.native().frames, vec![rect]);
        assert_eq!(
            parent.set_child_bounds(&mut stranger, rect),
            Err(Error::NotAChild)
        );

        parent.remove_child(&mut child).unwrap();
        assert_eq!(child.lifecycle(), Lifecycle::Initialized);
        assert!(parent.native().children.is_empty());
    }

    #[test]
    fn view_ids_are_unique() {
        assert_ne!(ViewId::new(), ViewId::new());
    }
}
