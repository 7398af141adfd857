//! # Delivery options for a subscription.
//!
//! [`SubscriptionOptions`] decides **how** and **in which order** a matched event
//! reaches a subscription's handler:
//!
//! - [`DeliveryMode::Sync`] the handler runs inline; the publisher waits for it.
//! - [`DeliveryMode::Async`] the event is queued for the subscription's own worker;
//!   the publisher does not wait.
//! - `priority` higher values are delivered first; equal priorities keep
//!   registration order.
//! - `receive_own_events` lets a subscriber see events it published itself
//!   (self-echo is suppressed by default).
//!
//! ## Example
//! ```rust
//! use mpf_rules::{DeliveryMode, SubscriptionOptions};
//!
//! let opts = SubscriptionOptions::asynchronous().with_priority(10);
//! assert_eq!(opts.mode, DeliveryMode::Async);
//! assert_eq!(opts.priority, 10);
//! assert!(!opts.receive_own_events);
//! ```

/// How a matched event reaches the handler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Invoke inline, blocking the publisher until the handler returns (default).
    #[default]
    Sync,
    /// Enqueue for the subscription's worker; no ordering relative to the publisher.
    Async,
}

/// Per-subscription delivery settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubscriptionOptions {
    /// Sync or async delivery.
    pub mode: DeliveryMode,
    /// Delivery order among matching subscriptions (higher = earlier).
    pub priority: i32,
    /// Deliver events whose sender is this subscriber.
    pub receive_own_events: bool,
    /// Queue capacity for async delivery.
    ///
    /// - `None` → use [`BusConfig::queue_capacity`](crate::BusConfig::queue_capacity)
    /// - `Some(n)` → at most `n` queued events (clamped to a minimum of 1)
    ///
    /// Ignored for synchronous delivery.
    pub queue_capacity: Option<usize>,
}

impl SubscriptionOptions {
    /// Synchronous delivery, priority 0.
    pub fn synchronous() -> Self {
        Self::default()
    }

    /// Asynchronous delivery, priority 0.
    pub fn asynchronous() -> Self {
        Self {
            mode: DeliveryMode::Async,
            ..Self::default()
        }
    }

    /// Sets the priority.
    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets whether self-published events are delivered.
    #[inline]
    pub fn with_own_events(mut self, receive: bool) -> Self {
        self.receive_own_events = receive;
        self
    }

    /// Overrides the async queue capacity.
    #[inline]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// True for [`DeliveryMode::Async`].
    #[inline]
    pub fn is_async(&self) -> bool {
        matches!(self.mode, DeliveryMode::Async)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = SubscriptionOptions::default();
        assert_eq!(opts.mode, DeliveryMode::Sync);
        assert_eq!(opts.priority, 0);
        assert!(!opts.receive_own_events);
        assert_eq!(opts.queue_capacity, None);
    }

    #[test]
    fn test_builders() {
        let opts = SubscriptionOptions::asynchronous()
            .with_priority(-3)
            .with_own_events(true)
            .with_queue_capacity(16);
        assert!(opts.is_async());
        assert_eq!(opts.priority, -3);
        assert!(opts.receive_own_events);
        assert_eq!(opts.queue_capacity, Some(16));
    }
}
