//! # Rules plugin.
//!
//! Business rules management for the MPF host:
//! - [`RulesService`]: rule store with change observers
//! - [`RuleModel`]: filtered row view for list UIs
//! - [`RuleEngine`]: order checks, wired to `orders/**` events
//! - [`RulesPlugin`]: lifecycle, routes, menu and bus subscriptions

mod engine;
mod model;
mod plugin;
mod rule;
mod service;

pub use engine::{CheckResult, OrderCheck, OrdersWatch, RuleEngine, RulesConfig, CHECK_COMPLETED_TOPIC};
pub use model::{ModelSignal, Role, RuleModel};
pub use plugin::{RulesPlugin, PLUGIN_ID};
pub use rule::{Rule, DEFAULT_STATUS};
pub use service::{ObserverId, RulesService};
