//! Weft: one widget and drawing API over GTK, Cocoa and Windows Forms.
//!
//! An [`Application`] picks a toolkit from a [`ToolkitRegistry`] according to its
//! [`AppConfig`]; widgets, box layouts, text layouts and offscreen drawing contexts are then
//! created through it. The toolkit-neutral model lives in [`weft_core`] and is re-exported here.

pub mod app;
pub mod config;
pub mod layout;
pub mod logging;
pub mod registry;
pub mod widget;

pub use app::{Application, Invoker, Reply, TimerHandle};
pub use config::{AppConfig, ConfigError, FontConfig};
pub use layout::{BoxContainer, Orientation};
pub use registry::{ToolkitFactory, ToolkitRegistry};
pub use widget::{Element, Widget};

pub use weft_core::*;

pub use cairo_weft;
pub use gdiplus_weft;
pub use quartz_weft;
