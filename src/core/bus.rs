//! # EventBus: topic routing, priority ordering and delivery.
//!
//! The [`EventBus`] owns the subscription registry, the live [`Feed`] and the
//! cancellation token that stops async delivery workers. It is a cheap-to-clone
//! handle; every clone talks to the same registry.
//!
//! ## Key responsibilities
//! - validate patterns on `subscribe` and topics on `publish`
//! - keep one subscription per `(pattern, subscriber)` (upsert)
//! - route each published event to matching subscriptions, highest priority first
//! - suppress self-echo unless the subscription opted in
//! - isolate handler errors and panics from the publisher and from each other
//!
//! ## Dispatch
//! ```text
//! publish(topic, payload, sender)
//!   ├─ validate_topic(topic)                 → Err(InvalidTopic)
//!   ├─ snapshot = registry.snapshot()        (no lock held from here on)
//!   ├─ matched  = snapshot
//!   │               .filter(pattern.matches(topic))
//!   │               .filter(!(subscriber == sender && !receive_own_events))
//!   │               .stable_sort_by(priority desc)
//!   ├─ for sub in matched:
//!   │     ├─ Sync  → deliver(handler, &event).await         (publisher waits)
//!   │     ├─ Async → delivery.enqueue(Arc<Event>)           (full → drop + warn)
//!   │     └─ no handler → nothing to invoke
//!   ├─ feed.send(Arc<Event>)
//!   └─ Ok(matched.len())
//! ```
//!
//! Because dispatch works on a snapshot, handlers may call `subscribe`,
//! `unsubscribe` or `publish` on the same bus without deadlocking. Changes made by
//! a handler take effect for the *next* publish.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use mpf_rules::{payload, BusConfig, Event, EventBus, HandlerError, HandlerFn, SubscriptionOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::new(BusConfig::default());
//!
//!     bus.subscribe(
//!         "orders/**",
//!         "com.biiz.rules",
//!         Some(HandlerFn::arc("orders", |ev: Event| async move {
//!             println!("{} from {}", ev.topic(), ev.sender());
//!             Ok::<_, HandlerError>(())
//!         })),
//!         SubscriptionOptions::default().with_priority(10),
//!     )?;
//!
//!     let routed = bus
//!         .publish("orders/created", payload(json!({ "orderId": "o-1" })), "com.biiz.orders")
//!         .await?;
//!     assert_eq!(routed, 1);
//!
//!     bus.unsubscribe_all("com.biiz.rules");
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::core::config::BusConfig;
use crate::core::registry::{Registry, Subscription, SubscriptionInfo, Upsert};
use crate::error::BusError;
use crate::events::{validate_topic, Event, Feed, Payload, TopicPattern};
use crate::policies::SubscriptionOptions;
use crate::subscribers::worker::{deliver, AsyncDelivery};
use crate::subscribers::HandlerRef;

struct Inner {
    cfg: BusConfig,
    registry: Registry,
    feed: Feed,
    runtime: Option<Handle>,
    workers_token: CancellationToken,
    closed: AtomicBool,
}

/// Process-wide topic router.
///
/// ### Properties
/// - **Cloneable**: cheap to clone (internally an `Arc`).
/// - **Reentrant**: handlers may use the bus they are called from.
/// - **Fire-and-forget**: all matching handlers always run; there is no response protocol.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    /// Creates a bus.
    ///
    /// Async subscriptions spawn their workers on the tokio runtime current at
    /// `subscribe` time; use [`EventBus::builder`] to pin a runtime handle instead.
    pub fn new(cfg: BusConfig) -> Self {
        Self::with_parts(cfg, None)
    }

    /// Returns a builder for a bus with initial subscriptions or a pinned runtime.
    pub fn builder(cfg: BusConfig) -> super::builder::EventBusBuilder {
        super::builder::EventBusBuilder::new(cfg)
    }

    pub(crate) fn with_parts(cfg: BusConfig, runtime: Option<Handle>) -> Self {
        let feed = Feed::new(cfg.feed_capacity_clamped());
        Self {
            inner: Arc::new(Inner {
                cfg,
                registry: Registry::new(),
                feed,
                runtime,
                workers_token: CancellationToken::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Bus configuration.
    pub fn config(&self) -> &BusConfig {
        &self.inner.cfg
    }

    /// Registers (or replaces) the subscription `(pattern, subscriber_id)`.
    ///
    /// - `handler = None` registers interest only; such subscribers observe
    ///   traffic through [`EventBus::feed`].
    /// - Re-subscribing the same pair replaces handler and options and keeps the
    ///   original registration position. A replaced async subscription's queue is
    ///   closed; its worker drains what was already queued.
    ///
    /// # Errors
    /// - [`BusError::InvalidPattern`] for empty/malformed patterns (nothing is registered).
    /// - [`BusError::RuntimeUnavailable`] for async delivery outside a tokio runtime.
    /// - [`BusError::Closed`] after [`EventBus::shutdown`].
    pub fn subscribe(
        &self,
        pattern: &str,
        subscriber_id: &str,
        handler: Option<HandlerRef>,
        options: SubscriptionOptions,
    ) -> Result<(), BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        let pattern = TopicPattern::parse(pattern)?;
        let subscriber: Arc<str> = Arc::from(subscriber_id);

        let delivery = match (&handler, options.is_async()) {
            (Some(h), true) => {
                let runtime = self.runtime_handle()?;
                let capacity = options
                    .queue_capacity
                    .map_or_else(|| self.inner.cfg.queue_capacity_clamped(), |c| c.max(1));
                Some(AsyncDelivery::spawn(
                    &runtime,
                    subscriber.clone(),
                    Arc::from(pattern.as_str()),
                    Arc::clone(h),
                    capacity,
                    self.inner.workers_token.child_token(),
                ))
            }
            _ => None,
        };

        let id = Arc::clone(&subscriber);
        let pattern_str: Arc<str> = Arc::from(pattern.as_str());
        let upsert = self.inner.registry.upsert(Subscription {
            pattern,
            subscriber,
            options,
            handler,
            delivery,
        });
        match upsert {
            // lost the race with shutdown; dropping the entry closes its queue
            Upsert::Closed => return Err(BusError::Closed),
            Upsert::Replaced(old) => {
                tracing::debug!(subscriber = %old.subscriber, pattern = old.pattern.as_str(), "subscription replaced");
            }
            Upsert::Inserted => {}
        }
        tracing::debug!(
            subscriber = %id,
            pattern = %pattern_str,
            mode = ?options.mode,
            priority = options.priority,
            receive_own_events = options.receive_own_events,
            "subscribed"
        );
        Ok(())
    }

    /// Removes exactly one subscription.
    ///
    /// Returns `false` (and does nothing) when it was not registered.
    pub fn unsubscribe(&self, pattern: &str, subscriber_id: &str) -> bool {
        let removed = self.inner.registry.remove(pattern, subscriber_id).is_some();
        if removed {
            tracing::debug!(subscriber = subscriber_id, pattern, "unsubscribed");
        }
        removed
    }

    /// Removes every subscription owned by `subscriber_id`.
    ///
    /// Safe to call for subscribers that never subscribed. Returns how many
    /// subscriptions were removed.
    pub fn unsubscribe_all(&self, subscriber_id: &str) -> usize {
        let removed = self.inner.registry.remove_all(subscriber_id).len();
        tracing::debug!(subscriber = subscriber_id, removed, "unsubscribed all");
        removed
    }

    /// Publishes an event and delivers it to every matching subscription.
    ///
    /// Returns after every synchronous handler (in priority order) has returned;
    /// asynchronous deliveries are only queued. Handler failures are logged and
    /// never returned here.
    ///
    /// Returns the number of subscriptions the event was routed to (self-echo
    /// suppressed subscriptions are not counted).
    ///
    /// # Errors
    /// - [`BusError::InvalidTopic`] when `topic` is not concrete.
    /// - [`BusError::Closed`] after [`EventBus::shutdown`].
    pub async fn publish(&self, topic: &str, payload: Payload, sender_id: &str) -> Result<usize, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        validate_topic(topic)?;

        let event = Arc::new(Event::new(topic, payload, sender_id));
        let snapshot = self.inner.registry.snapshot();

        let mut matched: Vec<&Arc<Subscription>> = snapshot
            .iter()
            .filter(|s| s.pattern.matches(topic))
            .filter(|s| s.options.receive_own_events || &*s.subscriber != sender_id)
            .collect();
        // stable: equal priorities keep registration order
        matched.sort_by(|a, b| b.options.priority.cmp(&a.options.priority));

        tracing::trace!(seq = event.seq, topic, sender = sender_id, matched = matched.len(), "publish");

        for sub in &matched {
            match (&sub.delivery, &sub.handler) {
                (Some(delivery), _) => {
                    if let Err(reason) = delivery.enqueue(Arc::clone(&event)) {
                        tracing::warn!(
                            subscriber = %sub.subscriber,
                            pattern = sub.pattern.as_str(),
                            topic,
                            reason = reason.as_str(),
                            "async delivery dropped"
                        );
                    }
                }
                (None, Some(handler)) => {
                    deliver(handler.as_ref(), &sub.subscriber, sub.pattern.as_str(), &event).await;
                }
                (None, None) => {}
            }
        }

        self.inner.feed.send(Arc::clone(&event));
        Ok(matched.len())
    }

    /// Receiver for every event published after this call.
    ///
    /// This is the observation channel for handler-less subscribers.
    pub fn feed(&self) -> broadcast::Receiver<Arc<Event>> {
        self.inner.feed.subscribe()
    }

    /// Number of live feed receivers.
    pub fn feed_receiver_count(&self) -> usize {
        self.inner.feed.receiver_count()
    }

    /// All subscriptions owned by `subscriber_id`, in registration order.
    pub fn subscriptions_of(&self, subscriber_id: &str) -> Vec<SubscriptionInfo> {
        self.inner
            .registry
            .snapshot()
            .iter()
            .filter(|s| &*s.subscriber == subscriber_id)
            .map(|s| s.info())
            .collect()
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    /// True if no subscription is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True after [`EventBus::shutdown`].
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Shuts the bus down.
    ///
    /// 1. Marks the bus closed (further `subscribe`/`publish` fail with [`BusError::Closed`])
    /// 2. Removes every subscription
    /// 3. Cancels async workers (queued events are discarded) and awaits them
    pub async fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let removed = self.inner.registry.close();
        self.inner.workers_token.cancel();

        let workers: Vec<_> = removed
            .iter()
            .filter_map(|s| s.delivery.as_ref().and_then(|d| d.take_worker()))
            .collect();
        drop(removed);

        for w in workers {
            let _ = w.await;
        }
        tracing::debug!("event bus shut down");
    }

    fn runtime_handle(&self) -> Result<Handle, BusError> {
        match &self.inner.runtime {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|_| BusError::RuntimeUnavailable),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}
