//! Collaborators a host hands to a plugin at initialization.
//!
//! Every collaborator is optional. A plugin that finds one missing logs a
//! warning and keeps running without that feature.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::core::EventBus;

/// Route registry of the host shell.
pub trait Navigation: Send + Sync + 'static {
    /// Maps `route` to a page URL. Returns `false` if the host refused it.
    fn register_route(&self, route: &str, url: &str) -> bool;
}

/// Side menu of the host shell.
pub trait Menu: Send + Sync + 'static {
    /// Adds an item. Returns `false` if the host refused it (duplicate id, ...).
    fn register_item(&self, item: MenuItem) -> bool;

    /// Sets the badge text of a registered item.
    fn set_badge(&self, item_id: &str, badge: &str);
}

/// Lookup of bundled resources (pages, icons).
pub trait ResourceProbe: Send + Sync + 'static {
    fn exists(&self, path: &str) -> bool;
}

/// One entry in the host menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub route: String,
    pub plugin_id: String,
    pub order: i32,
    pub group: String,
}

/// Services available to a plugin.
#[derive(Clone, Default)]
pub struct Host {
    navigation: Option<Arc<dyn Navigation>>,
    menu: Option<Arc<dyn Menu>>,
    resources: Option<Arc<dyn ResourceProbe>>,
    bus: Option<EventBus>,
}

impl Host {
    /// Host with no services at all.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_navigation(mut self, navigation: Arc<dyn Navigation>) -> Self {
        self.navigation = Some(navigation);
        self
    }

    pub fn with_menu(mut self, menu: Arc<dyn Menu>) -> Self {
        self.menu = Some(menu);
        self
    }

    pub fn with_resources(mut self, resources: Arc<dyn ResourceProbe>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn navigation(&self) -> Option<&Arc<dyn Navigation>> {
        self.navigation.as_ref()
    }

    pub fn menu(&self) -> Option<&Arc<dyn Menu>> {
        self.menu.as_ref()
    }

    pub fn resources(&self) -> Option<&Arc<dyn ResourceProbe>> {
        self.resources.as_ref()
    }

    pub fn bus(&self) -> Option<&EventBus> {
        self.bus.as_ref()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("navigation", &self.navigation.is_some())
            .field("menu", &self.menu.is_some())
            .field("resources", &self.resources.is_some())
            .field("bus", &self.bus)
            .finish()
    }
}
