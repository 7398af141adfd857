//! # mpf-rules
//!
//! **mpf-rules** is the business rules plugin of the MPF host, together with the
//! topic-based event bus plugins use to talk to each other.
//!
//! Plugins never link against each other. They agree on topic strings
//! (`orders/created`) and payload shapes (`{ orderId, customerName, totalAmount }`)
//! and exchange events through the [`EventBus`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ orders plugin│   │ rules plugin │   │   UI / host  │
//!     │  (publisher) │   │ (subscriber) │   │ (feed reader)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ publish          │ subscribe        │ feed()
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBus                                                         │
//! │  - Registry   (copy-on-write list, identity = pattern+subscriber) │
//! │  - Dispatcher (match → self-echo filter → stable priority sort)   │
//! │  - Feed       (broadcast of every published event)                │
//! └──────┬──────────────────────────────────┬─────────────────────────┘
//!        ▼                                  ▼
//!   Sync subscription                  Async subscription
//!   deliver() inline                   bounded queue ─► worker ─► deliver()
//!   (publisher waits)                  (publisher returns immediately)
//!        │                                  │
//!        └──────────► Subscribe::on_event(&Event) ◄──────────┘
//!                     errors and panics are logged, never propagated
//! ```
//!
//! ### Topics
//! ```text
//! topic    = segment ("/" segment)*          e.g. orders/status_changed
//! pattern  = topic | prefix "/**" | "**"     e.g. orders/**  (matches orders, orders/a, orders/a/b)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Event bus**     | Topic routing with wildcards, priorities and self-echo rules. | [`EventBus`], [`TopicPattern`]              |
//! | **Handlers**      | Trait and closure handlers, sync or async delivery.           | [`Subscribe`], [`HandlerFn`], [`DeliveryMode`] |
//! | **Plugins**       | Lifecycle contract and host services.                         | [`Plugin`], [`Host`], [`PluginMetadata`]    |
//! | **Rules**         | Rule store, list model and order checks.                      | [`RulesService`], [`RuleModel`], [`RuleEngine`] |
//! | **Errors**        | Typed errors with stable labels.                              | [`BusError`], [`HandlerError`], [`PluginError`] |
//! | **Configuration** | Capacities and rule limits, deserializable.                   | [`BusConfig`], [`RulesConfig`]              |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a handler that traces every event it receives.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use mpf_rules::{payload, BusConfig, EventBus, Host, Plugin, RulesConfig, RulesPlugin, SubscriptionOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::new(BusConfig::default());
//!
//!     // Trace all traffic
//!     #[cfg(feature = "logging")]
//!     bus.subscribe("**", "host", Some(Arc::new(mpf_rules::LogWriter::new())), SubscriptionOptions::default())?;
//!
//!     let mut rules = RulesPlugin::new(RulesConfig::default())?;
//!     rules.initialize(Host::new().with_bus(bus.clone()))?;
//!     rules.start()?;
//!
//!     bus.publish(
//!         "orders/created",
//!         payload(json!({ "orderId": "o-1", "customerName": "Ann", "totalAmount": 250.0 })),
//!         "com.biiz.orders",
//!     )
//!     .await?;
//!
//!     rules.stop()?;
//!     bus.shutdown().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod plugin;
mod policies;
mod rules;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{BusConfig, EventBus, EventBusBuilder, SubscriptionInfo};
pub use error::{BusError, HandlerError, PluginError};
pub use events::{payload, validate_topic, Event, Payload, TopicPattern, SEPARATOR, WILDCARD};
pub use plugin::{Host, Menu, MenuItem, Navigation, Plugin, PluginMetadata, PluginState, Requirement, ResourceProbe};
pub use policies::{DeliveryMode, SubscriptionOptions};
pub use rules::{
    CheckResult, ModelSignal, ObserverId, OrderCheck, OrdersWatch, Role, Rule, RuleEngine, RuleModel, RulesConfig,
    RulesPlugin, RulesService, CHECK_COMPLETED_TOPIC, DEFAULT_STATUS, PLUGIN_ID,
};
pub use subscribers::{HandlerFn, HandlerRef, Subscribe};

// Optional: expose a simple built-in logger handler (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
