//! Box layout.
//!
//! A [`BoxContainer`] stacks its children along one axis. Size queries add up the children
//! along the axis (plus spacing) and take the largest child across it. When allocated, the
//! container queries every child first and then hands out the space: children get their natural
//! size if it fits, and leftover space is shared between the children added with `expand`. If
//! there is not enough room, every child shrinks toward its minimum size in proportion to how
//! far it can shrink.

use crate::widget::{Element, Widget};
use weft_core::{Error, Rect, Result, Toolkit, WidgetBackend, WidgetKind, WidgetSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Children flow left to right.
    Horizontal,
    /// Children flow top to bottom.
    Vertical,
}

#[derive(Debug)]
struct Child {
    element: Box<dyn Element>,
    expand: bool,
}

impl Orientation {
    /// Size of an element along this axis, given its length across the axis.
    fn along(self, element: &mut dyn Element, across: Option<f64>) -> Result<WidgetSize> {
        match (self, across) {
            (Orientation::Horizontal, None) => element.preferred_width(),
            (Orientation::Horizontal, Some(height)) => element.preferred_width_for_height(height),
            (Orientation::Vertical, None) => element.preferred_height(),
            (Orientation::Vertical, Some(width)) => element.preferred_height_for_width(width),
        }
    }

    /// Size of an element across this axis, given its length along the axis.
    fn across(self, element: &mut dyn Element, along: Option<f64>) -> Result<WidgetSize> {
        match (self, along) {
            (Orientation::Horizontal, None) => element.preferred_height(),
            (Orientation::Horizontal, Some(width)) => element.preferred_height_for_width(width),
            (Orientation::Vertical, None) => element.preferred_width(),
            (Orientation::Vertical, Some(height)) => element.preferred_width_for_height(height),
        }
    }

    fn rect(self, offset: f64, along: f64, across: f64) -> Rect {
        match self {
            Orientation::Horizontal => Rect::from_xywh(offset, 0., along, across),
            Orientation::Vertical => Rect::from_xywh(0., offset, across, along),
        }
    }
}

/// Splits `available` space between children of the given sizes, separated by `spacing`.
fn distribute(sizes: &[WidgetSize], expand: &[bool], available: f64, spacing: f64) -> Vec<f64> {
    if sizes.is_empty() {
        return Vec::new();
    }
    let available = (available - spacing * (sizes.len() - 1) as f64).max(0.);
    let total_min: f64 = sizes.iter().map(|s| s.min_size).sum();
    let total_natural: f64 = sizes.iter().map(|s| s.natural_size).sum();

    if available >= total_natural {
        let expanding = expand.iter().filter(|e| **e).count();
        let extra = if expanding > 0 {
            (available - total_natural) / expanding as f64
        } else {
            0.
        };
        sizes
            .iter()
            .zip(expand)
            .map(|(size, expand)| size.natural_size + if *expand { extra } else { 0. })
            .collect()
    } else if available > total_min {
        let t = (available - total_min) / (total_natural - total_min);
        sizes
            .iter()
            .map(|s| s.min_size + (s.natural_size - s.min_size) * t)
            .collect()
    } else {
        // overflows; children are clipped by the container
        sizes.iter().map(|s| s.min_size).collect()
    }
}

/// A container widget laying out its children in a row or column.
#[derive(Debug)]
pub struct BoxContainer {
    // children are dropped before the container view
    children: Vec<Child>,
    widget: Widget,
    orientation: Orientation,
    spacing: f64,
}

impl BoxContainer {
    pub fn new(toolkit: &dyn Toolkit, orientation: Orientation) -> Result<BoxContainer> {
        Ok(BoxContainer {
            children: Vec::new(),
            widget: Widget::new(toolkit, WidgetKind::Container)?,
            orientation,
            spacing: 0.,
        })
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Sets the space between adjacent children. Negative values are clamped to 0.
    pub fn set_spacing(&mut self, spacing: f64) {
        self.spacing = spacing.max(0.);
    }

    /// The container’s own widget.
    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut Widget {
        &mut self.widget
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Appends a child. If `expand` is set, the child grows to take up extra space.
    pub fn add(&mut self, mut element: Box<dyn Element>, expand: bool) -> Result<()> {
        self.widget.backend_mut().add_child(element.backend_mut())?;
        self.children.push(Child { element, expand });
        Ok(())
    }

    /// Removes and returns the child at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Box<dyn Element>> {
        if index >= self.children.len() {
            return Err(Error::NotAChild);
        }
        let backend = self.widget.backend_mut();
        backend.remove_child(self.children[index].element.backend_mut())?;
        Ok(self.children.remove(index).element)
    }

    pub fn child(&self, index: usize) -> Option<&dyn Element> {
        self.children.get(index).map(|c| &*c.element)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut (dyn Element + 'static)> {
        self.children.get_mut(index).map(|c| &mut *c.element)
    }

    /// Children laid out one after another along the axis.
    fn sum_along(&mut self, across: Option<f64>) -> Result<WidgetSize> {
        let mut total = WidgetSize::zero();
        for child in &mut self.children {
            total = total.add(self.orientation.along(&mut *child.element, across)?);
        }
        let gaps = self.children.len().saturating_sub(1) as f64;
        Ok(total.add_space(self.spacing * gaps))
    }

    /// The largest child across the axis, with the space along the axis split as in an
    /// allocation.
    fn max_across(&mut self, along: Option<f64>) -> Result<WidgetSize> {
        let lengths = match along {
            Some(along) => {
                let mut sizes = Vec::with_capacity(self.children.len());
                for child in &mut self.children {
                    sizes.push(self.orientation.along(&mut *child.element, None)?);
                }
                let expand: Vec<_> = self.children.iter().map(|c| c.expand).collect();
                distribute(&sizes, &expand, along, self.spacing)
                    .into_iter()
                    .map(Some)
                    .collect()
            }
            None => vec![None; self.children.len()],
        };
        let mut size = WidgetSize::zero();
        for (child, length) in self.children.iter_mut().zip(lengths) {
            size = size.max(self.orientation.across(&mut *child.element, length)?);
        }
        Ok(size)
    }

    /// Applies the container’s own size overrides to a size computed from its children.
    fn with_overrides(own: WidgetSize, children: WidgetSize) -> WidgetSize {
        children.max(own)
    }
}

impl Element for BoxContainer {
    fn backend(&self) -> &dyn WidgetBackend {
        self.widget.backend()
    }

    fn backend_mut(&mut self) -> &mut dyn WidgetBackend {
        self.widget.backend_mut()
    }

    fn preferred_width(&mut self) -> Result<WidgetSize> {
        let own = self.widget.preferred_width()?;
        let children = match self.orientation {
            Orientation::Horizontal => self.sum_along(None)?,
            Orientation::Vertical => self.max_across(None)?,
        };
        Ok(BoxContainer::with_overrides(own, children))
    }

    fn preferred_height(&mut self) -> Result<WidgetSize> {
        let own = self.widget.preferred_height()?;
        let children = match self.orientation {
            Orientation::Horizontal => self.max_across(None)?,
            Orientation::Vertical => self.sum_along(None)?,
        };
        Ok(BoxContainer::with_overrides(own, children))
    }

    fn preferred_height_for_width(&mut self, width: f64) -> Result<WidgetSize> {
        let own = self.widget.preferred_height_for_width(width)?;
        let children = match self.orientation {
            Orientation::Horizontal => self.max_across(Some(width))?,
            Orientation::Vertical => self.sum_along(Some(width))?,
        };
        Ok(BoxContainer::with_overrides(own, children))
    }

    fn preferred_width_for_height(&mut self, height: f64) -> Result<WidgetSize> {
        let own = self.widget.preferred_width_for_height(height)?;
        let children = match self.orientation {
            Orientation::Horizontal => self.sum_along(Some(height))?,
            Orientation::Vertical => self.max_across(Some(height))?,
        };
        Ok(BoxContainer::with_overrides(own, children))
    }

    fn layout_children(&mut self) -> Result<()> {
        let allocation = self.widget.allocation();
        let (along, across) = match self.orientation {
            Orientation::Horizontal => (allocation.width(), allocation.height()),
            Orientation::Vertical => (allocation.height(), allocation.width()),
        };

        // all size queries happen before the first child is allocated
        let mut sizes = Vec::with_capacity(self.children.len());
        for child in &mut self.children {
            sizes.push(self.orientation.along(&mut *child.element, Some(across))?);
        }
        let expand: Vec<_> = self.children.iter().map(|c| c.expand).collect();
        let lengths = distribute(&sizes, &expand, along, self.spacing);

        let mut offset = 0.;
        for (child, length) in self.children.iter_mut().zip(lengths) {
            let rect = self.orientation.rect(offset, length, across);
            let result = self
                .widget
                .backend_mut()
                .set_child_bounds(child.element.backend_mut(), rect);
            child.element.backend_mut().finish_allocation();
            result?;
            child.element.layout_children()?;
            offset += length + self.spacing;
        }
        log::trace!(
            "laid out {} children of {:?} in {:?}",
            self.children.len(),
            self.widget.backend().id(),
            allocation
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairo_weft::ffi::{GtkAllocation, GtkWidget};
    use cairo_weft::headless::HeadlessGtk;
    use cairo_weft::GtkToolkit;
    use std::sync::Arc;

    fn canvas(toolkit: &GtkToolkit, gtk: &HeadlessGtk, width: (i32, i32), height: (i32, i32)) -> Box<dyn Element> {
        let widget = Widget::new(toolkit, WidgetKind::Canvas).unwrap();
        let native = widget.backend().native_handle().unwrap();
        gtk.set_intrinsic_size(GtkWidget(native.0), width, height);
        Box::new(widget)
    }

    fn allocation(gtk: &Arc<HeadlessGtk>, element: &dyn Element) -> GtkAllocation {
        let native = element.backend().native_handle().unwrap();
        gtk.allocation(GtkWidget(native.0)).unwrap()
    }

    #[test]
    fn distributes_extra_space_to_expanding_children() {
        let sizes = [WidgetSize::new(10., 20.), WidgetSize::new(10., 30.)];
        assert_eq!(distribute(&sizes, &[false, true], 100., 10.), vec![20., 70.]);
        assert_eq!(distribute(&sizes, &[false, false], 100., 10.), vec![20., 30.]);
        assert_eq!(distribute(&sizes, &[true, true], 90., 0.), vec![40., 50.]);
    }

    #[test]
    fn shrinks_toward_the_minimum() {
        let sizes = [WidgetSize::new(10., 20.), WidgetSize::new(10., 40.)];
        // 40 available, 20 min: each child keeps half of its slack
        assert_eq!(distribute(&sizes, &[true, true], 40., 0.), vec![15., 25.]);
        assert_eq!(distribute(&sizes, &[false, false], 5., 0.), vec![10., 10.]);
        assert!(distribute(&[], &[], 100., 10.).is_empty());
    }

    #[test]
    fn sizes_add_up_along_the_axis() {
        let (toolkit, gtk) = GtkToolkit::headless();
        let mut row = BoxContainer::new(&toolkit, Orientation::Horizontal).unwrap();
        row.set_spacing(4.);
        row.add(canvas(&toolkit, &gtk, (10, 20), (5, 8)), false).unwrap();
        row.add(canvas(&toolkit, &gtk, (30, 40), (12, 12)), true).unwrap();

        assert_eq!(row.preferred_width().unwrap(), WidgetSize::new(44., 64.));
        assert_eq!(row.preferred_height().unwrap(), WidgetSize::new(12., 12.));

        let mut column = BoxContainer::new(&toolkit, Orientation::Vertical).unwrap();
        column.add(Box::new(row), false).unwrap();
        column.add(canvas(&toolkit, &gtk, (100, 100), (6, 6)), false).unwrap();
        assert_eq!(column.preferred_width().unwrap(), WidgetSize::new(100., 100.));
        assert_eq!(column.preferred_height().unwrap(), WidgetSize::new(18., 18.));
    }

    #[test]
    fn container_overrides_apply() {
        let (toolkit, gtk) = GtkToolkit::headless();
        let mut row = BoxContainer::new(&toolkit, Orientation::Horizontal).unwrap();
        row.add(canvas(&toolkit, &gtk, (10, 20), (5, 8)), false).unwrap();
        row.widget_mut().set_min_size(200., -1.).unwrap();
        assert_eq!(row.preferred_width().unwrap().min_size, 200.);
        assert_eq!(row.preferred_height().unwrap(), WidgetSize::new(5., 8.));
    }

    #[test]
    fn allocation_flows_down_to_nested_children() {
        let (toolkit, gtk) = GtkToolkit::headless();
        let mut row = BoxContainer::new(&toolkit, Orientation::Horizontal).unwrap();
        row.set_spacing(10.);
        row.add(canvas(&toolkit, &gtk, (20, 20), (10, 10)), false).unwrap();
        let mut column = BoxContainer::new(&toolkit, Orientation::Vertical).unwrap();
        column.add(canvas(&toolkit, &gtk, (10, 10), (10, 10)), false).unwrap();
        column.add(canvas(&toolkit, &gtk, (10, 10), (10, 10)), true).unwrap();
        row.add(Box::new(column), true).unwrap();

        row.allocate(Rect::from_xywh(0., 0., 130., 50.)).unwrap();

        let first = allocation(&gtk, row.child(0).unwrap());
        assert_eq!((first.x, first.width, first.height), (0, 20, 50));
        let column = row.child(1).unwrap();
        let second = allocation(&gtk, column);
        assert_eq!((second.x, second.width), (30, 100));

        let column_children: Vec<_> = gtk.children(GtkWidget(column.backend().native_handle().unwrap().0));
        assert_eq!(column_children.len(), 2);
        let top = gtk.allocation(column_children[0]).unwrap();
        let bottom = gtk.allocation(column_children[1]).unwrap();
        assert_eq!((top.y, top.height, top.width), (0, 10, 100));
        assert_eq!((bottom.y, bottom.height), (10, 40));

        // every allocation pass has finished
        assert!(row.preferred_width().is_ok());
    }

    #[test]
    fn removing_children() {
        let (toolkit, gtk) = GtkToolkit::headless();
        let mut row = BoxContainer::new(&toolkit, Orientation::Horizontal).unwrap();
        row.add(canvas(&toolkit, &gtk, (10, 10), (10, 10)), false).unwrap();
        assert_eq!(row.remove(3).unwrap_err(), Error::NotAChild);

        let mut child = row.remove(0).unwrap();
        assert!(row.is_empty());
        assert_eq!(child.backend().parent(), None);
        assert_eq!(row.preferred_width().unwrap(), WidgetSize::zero());

        // the removed child can be added elsewhere
        let mut other = BoxContainer::new(&toolkit, Orientation::Vertical).unwrap();
        assert!(other.widget_mut().backend_mut().add_child(child.backend_mut()).is_ok());
    }
}
