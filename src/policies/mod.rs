//! Delivery policies.
//!
//! This module groups the knobs that control **how** a matched event is delivered
//! and **in which order** subscriptions see it.
//!
//! ## Contents
//! - [`DeliveryMode`] sync (inline) or async (queued to a worker)
//! - [`SubscriptionOptions`] mode + priority + self-echo + async queue capacity
//!
//! ## Quick wiring
//! ```text
//! EventBus::subscribe(pattern, subscriber, handler, SubscriptionOptions)
//!      └─► EventBus::publish uses:
//!           - priority to order matched subscriptions (stable)
//!           - receive_own_events to filter self-echo
//!           - mode to await inline or enqueue for the worker
//! ```
//!
//! ## Defaults
//! - `DeliveryMode::Sync`, priority `0`, self-echo suppressed.
//! - Async queues take their capacity from `BusConfig::queue_capacity` unless overridden.

mod delivery;

pub use delivery::{DeliveryMode, SubscriptionOptions};
