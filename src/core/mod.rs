//! Bus core: registry, dispatch and lifecycle.
//!
//! The only entry points from this module are [`EventBus`] and its builder;
//! everything else is plumbing.
//!
//! Internal modules:
//! - [`bus`]: validates, matches, orders and delivers published events;
//! - [`registry`]: copy-on-write subscription list with `(pattern, subscriber)` identity;
//! - [`builder`]: bus construction with a pinned runtime and initial subscriptions;
//! - [`config`]: queue and feed capacities.

mod builder;
mod bus;
mod config;
mod registry;

pub use builder::EventBusBuilder;
pub use bus::EventBus;
pub use config::BusConfig;
pub use registry::SubscriptionInfo;
