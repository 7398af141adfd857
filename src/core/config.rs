//! # Event bus configuration.
//!
//! Provides [`BusConfig`] centralized settings for an [`EventBus`](crate::EventBus).
//!
//! Config is used in two ways:
//! 1. **Bus creation**: `EventBus::new(config)` / `EventBus::builder(config)`
//! 2. **Subscription defaults**: async subscriptions without an explicit
//!    `queue_capacity` use [`BusConfig::queue_capacity`]
//!
//! Hosts usually embed it in their own configuration file; every field has a
//! default, so partial tables deserialize.
//!
//! ## Example
//! ```rust
//! use mpf_rules::BusConfig;
//!
//! let cfg: BusConfig = serde_json::from_str(r#"{ "queue_capacity": 64 }"#).unwrap();
//! assert_eq!(cfg.queue_capacity, 64);
//! assert_eq!(cfg.feed_capacity, BusConfig::default().feed_capacity);
//! ```

use serde::Deserialize;

/// Global configuration for the event bus.
///
/// ## Field semantics
/// - `queue_capacity`: default per-subscription queue size for async delivery (min 1)
/// - `feed_capacity`: ring buffer size of the live feed (min 1)
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Default capacity of an async subscription's queue.
    ///
    /// When the queue is full, new events are dropped for that subscription only.
    pub queue_capacity: usize,

    /// Capacity of the live feed broadcast ring buffer.
    ///
    /// Feed receivers that lag behind more than `feed_capacity` events observe
    /// `Lagged` and skip older items.
    pub feed_capacity: usize,
}

impl BusConfig {
    /// Returns the async queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Returns the feed capacity clamped to a minimum of 1.
    #[inline]
    pub fn feed_capacity_clamped(&self) -> usize {
        self.feed_capacity.max(1)
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `queue_capacity = 1024`
    /// - `feed_capacity = 256`
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            feed_capacity: 256,
        }
    }
}
