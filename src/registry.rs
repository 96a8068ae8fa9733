//! Backend selection.

use cairo_weft::GtkToolkit;
use gdiplus_weft::GdiPlusToolkit;
use quartz_weft::QuartzToolkit;
use std::collections::HashMap;
use std::fmt;
use weft_core::{Error, Result, Toolkit, ToolkitType};

/// Creates a toolkit.
pub type ToolkitFactory = Box<dyn Fn() -> Result<Box<dyn Toolkit>> + Send + Sync>;

/// Maps toolkit types to factories. The application picks one toolkit from it at startup.
#[derive(Default)]
pub struct ToolkitRegistry {
    factories: HashMap<ToolkitType, ToolkitFactory>,
}

impl fmt::Debug for ToolkitRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ToolkitRegistry")
            .field("toolkits", &self.available())
            .finish()
    }
}

impl ToolkitRegistry {
    /// An empty registry.
    pub fn new() -> ToolkitRegistry {
        ToolkitRegistry::default()
    }

    /// A registry with all three backends running on their headless native surfaces.
    pub fn headless() -> ToolkitRegistry {
        let mut registry = ToolkitRegistry::new();
        registry.register(ToolkitType::Gtk, || Ok(Box::new(GtkToolkit::headless().0)));
        registry.register(ToolkitType::Cocoa, || Ok(Box::new(QuartzToolkit::headless().0)));
        registry.register(ToolkitType::WinForms, || Ok(Box::new(GdiPlusToolkit::headless().0)));
        registry
    }

    /// Registers a factory, replacing any previous one for the same toolkit.
    pub fn register<F>(&mut self, toolkit: ToolkitType, factory: F)
    where
        F: Fn() -> Result<Box<dyn Toolkit>> + Send + Sync + 'static,
    {
        if self.factories.insert(toolkit, Box::new(factory)).is_some() {
            log::debug!("replaced the {} backend", toolkit);
        }
    }

    pub fn contains(&self, toolkit: ToolkitType) -> bool {
        self.factories.contains_key(&toolkit)
    }

    /// The registered toolkits, in [`ToolkitType::ALL`] order.
    pub fn available(&self) -> Vec<ToolkitType> {
        ToolkitType::ALL
            .iter()
            .copied()
            .filter(|t| self.contains(*t))
            .collect()
    }

    pub fn create(&self, toolkit: ToolkitType) -> Result<Box<dyn Toolkit>> {
        let factory = self
            .factories
            .get(&toolkit)
            .ok_or(Error::UnknownToolkit(toolkit))?;
        let created = factory()?;
        if created.toolkit_type() != toolkit {
            return Err(Error::Native(format!(
                "the {} factory created a {} toolkit",
                toolkit,
                created.toolkit_type()
            )));
        }
        log::info!("using the {} backend", toolkit);
        Ok(created)
    }
}
