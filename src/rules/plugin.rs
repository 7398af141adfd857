//! # RulesPlugin: business rules management.
//!
//! ## Startup
//! ```text
//! initialize(host)
//!   ├─ keep host services
//!   ├─ create RulesService
//!   └─ probe bundled pages (debug log only)
//!
//! start()
//!   ├─ navigation: rules, rules-demo              (missing → warn)
//!   ├─ menu: rules (badge = rule count), rules-demo (missing → warn)
//!   ├─ bus:  orders/**       sync,  priority 0    (missing → standalone)
//!   │        orders/created  async, priority 10   (no runtime → warn, skipped)
//!   └─ seed sample rules                          (if configured)
//!
//! stop()
//!   ├─ bus.unsubscribe_all("com.biiz.rules")
//!   └─ drop store observers (badge sync)
//! ```
//!
//! The async `orders/created` handler holds a bus clone. The reference cycle
//! this creates is broken by `stop()`.

use std::sync::{Arc, Weak};

use serde_json::json;

use super::engine::{OrderCheck, OrdersWatch, RuleEngine, RulesConfig};
use super::service::{ObserverId, RulesService};
use crate::error::PluginError;
use crate::events::payload;
use crate::plugin::{Host, Menu, MenuItem, Plugin, PluginMetadata, PluginState};
use crate::policies::SubscriptionOptions;

/// Plugin id; also the subscriber identity and publisher identity on the bus.
pub const PLUGIN_ID: &str = "com.biiz.rules";

const MANIFEST: &str = r#"{
    "id": "com.biiz.rules",
    "name": "Rules Plugin",
    "version": "1.0.0",
    "description": "Business rules management",
    "vendor": "Biiz",
    "requires": [
        { "type": "service", "id": "INavigation", "min": "1.0" }
    ],
    "provides": ["RulesService"],
    "qmlModules": ["Biiz.Rules"],
    "priority": 20
}"#;

const RULES_PAGE: &str = "qrc:/Biiz/Rules/RulesPage.qml";
const DEMO_PAGE: &str = "qrc:/Biiz/Rules/DemoPage.qml";
const PROBED_RESOURCES: [&str; 2] = [":/Biiz/Rules/RulesPage.qml", RULES_PAGE];

/// The rules plugin.
pub struct RulesPlugin {
    meta: PluginMetadata,
    cfg: RulesConfig,
    state: PluginState,
    host: Host,
    engine: Arc<RuleEngine>,
    service: Option<Arc<RulesService>>,
    observers: Vec<ObserverId>,
}

impl RulesPlugin {
    /// Creates the plugin from its embedded manifest.
    pub fn new(cfg: RulesConfig) -> Result<Self, PluginError> {
        Ok(Self {
            meta: PluginMetadata::from_json(MANIFEST)?,
            engine: Arc::new(RuleEngine::new(cfg.clone())),
            cfg,
            state: PluginState::Created,
            host: Host::default(),
            service: None,
            observers: Vec::new(),
        })
    }

    /// The rule store; `None` before `initialize`.
    pub fn service(&self) -> Option<Arc<RulesService>> {
        self.service.clone()
    }

    pub fn engine(&self) -> &Arc<RuleEngine> {
        &self.engine
    }

    fn register_routes(&self) {
        let Some(nav) = self.host.navigation() else {
            tracing::warn!(plugin = PLUGIN_ID, "navigation service not available");
            return;
        };
        for (route, url) in [("rules", RULES_PAGE), ("rules-demo", DEMO_PAGE)] {
            if nav.register_route(route, url) {
                tracing::info!(plugin = PLUGIN_ID, route, url, "registered route");
            } else {
                tracing::warn!(plugin = PLUGIN_ID, route, "route registration refused");
            }
        }
    }

    fn register_menu(&mut self, service: &Arc<RulesService>) {
        let Some(menu) = self.host.menu().cloned() else {
            tracing::warn!(plugin = PLUGIN_ID, "menu service not available");
            return;
        };

        if !menu.register_item(menu_item("rules", "Rules", "📋", 20, "Business")) {
            tracing::warn!(plugin = PLUGIN_ID, "failed to register menu item");
            return;
        }
        update_badge(menu.as_ref(), service);

        let weak: Weak<RulesService> = Arc::downgrade(service);
        let badge_menu = Arc::clone(&menu);
        self.observers.push(service.on_list_changed(move || {
            if let Some(svc) = weak.upgrade() {
                update_badge(badge_menu.as_ref(), &svc);
            }
        }));

        menu.register_item(menu_item("rules-demo", "Rules Demo", "🎨", 25, "Demo"));
        tracing::debug!(plugin = PLUGIN_ID, "registered menu items");
    }

    /// Each subscription that fails is skipped with a warning; the plugin
    /// keeps running without that feature.
    fn subscribe_events(&self) {
        let Some(bus) = self.host.bus() else {
            tracing::warn!(plugin = PLUGIN_ID, "event bus not available, running standalone");
            return;
        };

        let watch = bus.subscribe(
            "orders/**",
            PLUGIN_ID,
            Some(Arc::new(OrdersWatch)),
            SubscriptionOptions::synchronous().with_priority(self.cfg.watch_priority),
        );
        if let Err(e) = &watch {
            tracing::warn!(plugin = PLUGIN_ID, error = %e, label = e.as_label(), "orders watch not subscribed");
        }

        let check = bus.subscribe(
            "orders/created",
            PLUGIN_ID,
            Some(Arc::new(OrderCheck::new(Arc::clone(&self.engine), bus.clone(), PLUGIN_ID))),
            SubscriptionOptions::asynchronous().with_priority(self.cfg.check_priority),
        );
        if let Err(e) = &check {
            tracing::warn!(plugin = PLUGIN_ID, error = %e, label = e.as_label(), "running without order checks");
        }

        if watch.is_ok() && check.is_ok() {
            tracing::info!(plugin = PLUGIN_ID, "event subscriptions active");
        }
    }

    fn seed(service: &RulesService) {
        for (customer, product) in [("Rule A", "Validation Rule"), ("Rule B", "Approval Rule")] {
            service.create_rule(&payload(json!({
                "customerName": customer,
                "productName": product,
                "quantity": 1,
                "price": 0,
                "status": "active",
            })));
        }
    }
}

fn menu_item(id: &str, label: &str, icon: &str, order: i32, group: &str) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        label: label.to_string(),
        icon: icon.to_string(),
        route: id.to_string(),
        plugin_id: PLUGIN_ID.to_string(),
        order,
        group: group.to_string(),
    }
}

fn update_badge(menu: &dyn Menu, service: &RulesService) {
    menu.set_badge("rules", &service.rule_count().to_string());
}

impl Plugin for RulesPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.meta
    }

    fn state(&self) -> PluginState {
        self.state
    }

    fn initialize(&mut self, host: Host) -> Result<(), PluginError> {
        let next = self.state.advance("initialize")?;
        tracing::info!(plugin = PLUGIN_ID, "initializing");

        if let Some(probe) = host.resources() {
            for res in PROBED_RESOURCES {
                tracing::debug!(plugin = PLUGIN_ID, resource = res, exists = probe.exists(res), "resource check");
            }
        }

        self.host = host;
        self.service = Some(Arc::new(RulesService::new()));
        self.state = next;
        tracing::info!(plugin = PLUGIN_ID, "initialized");
        Ok(())
    }

    fn start(&mut self) -> Result<(), PluginError> {
        let next = self.state.advance("start")?;
        let Some(service) = self.service.clone() else {
            return Err(PluginError::InvalidState {
                action: "start",
                state: self.state,
            });
        };
        tracing::info!(plugin = PLUGIN_ID, "starting");

        self.register_routes();
        self.register_menu(&service);
        self.subscribe_events();

        if self.cfg.seed_sample_rules {
            Self::seed(&service);
        }

        self.state = next;
        tracing::info!(plugin = PLUGIN_ID, rules = service.rule_count(), "started");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PluginError> {
        let next = self.state.advance("stop")?;
        tracing::info!(plugin = PLUGIN_ID, "stopping");

        if let Some(bus) = self.host.bus() {
            let removed = bus.unsubscribe_all(PLUGIN_ID);
            tracing::info!(plugin = PLUGIN_ID, removed, "unsubscribed from all events");
        }
        if let Some(service) = &self.service {
            for id in self.observers.drain(..) {
                service.remove_observer(id);
            }
        }

        self.state = next;
        Ok(())
    }
}

impl std::fmt::Debug for RulesPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulesPlugin")
            .field("id", &self.meta.id)
            .field("state", &self.state)
            .field("host", &self.host)
            .finish()
    }
}
