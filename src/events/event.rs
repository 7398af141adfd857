//! # Events published on the bus.
//!
//! An [`Event`] carries a concrete topic, a structured [`Payload`] and the identity
//! of the sender. Events are immutable once published: the bus wraps each one in an
//! `Arc` and hands the same allocation to every matching subscription.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore publish order when asynchronous deliveries interleave.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use mpf_rules::{Event, payload};
//!
//! let ev = Event::new("orders/created", payload(json!({ "orderId": "o-1" })), "com.biiz.orders");
//!
//! assert_eq!(ev.topic(), "orders/created");
//! assert_eq!(ev.sender(), "com.biiz.orders");
//! assert_eq!(ev.str_field("orderId"), Some("o-1"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use serde_json::{Map, Value};

/// Structured key-value event data.
pub type Payload = Map<String, Value>;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Converts any JSON value into a [`Payload`].
///
/// Objects are used as-is; `null` becomes an empty payload; any other value is
/// stored under the `"value"` key.
pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        Value::Null => Payload::new(),
        other => {
            let mut map = Payload::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

/// Published event.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
///
/// Cloning is cheap: topic, payload and sender are shared.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    topic: Arc<str>,
    payload: Arc<Payload>,
    sender: Arc<str>,
}

impl Event {
    /// Creates an event with current timestamp and next sequence number.
    ///
    /// The topic is not validated here; [`EventBus::publish`](crate::EventBus::publish)
    /// rejects non-concrete topics before constructing the event.
    pub fn new(topic: impl Into<Arc<str>>, payload: Payload, sender: impl Into<Arc<str>>) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            topic: topic.into(),
            payload: Arc::new(payload),
            sender: sender.into(),
        }
    }

    /// Concrete topic the event was published on.
    #[inline]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Event data.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Identity of the publisher.
    #[inline]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Returns a payload field by key.
    #[inline]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Returns a string payload field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Returns a numeric payload field as `f64` (integers are widened).
    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.field(key).and_then(Value::as_f64)
    }
}
