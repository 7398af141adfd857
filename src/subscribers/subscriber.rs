//! # Subscription handler trait.
//!
//! Provides [`Subscribe`], the extension point for plugging event handlers into
//! the bus. A handler is attached to a subscription; every subscription receives
//! the same event shape (topic, payload, sender) regardless of which pattern matched.
//!
//! ## Architecture
//! ```text
//! publish() ─► matched subscriptions (priority order)
//!                 ├─ Sync  ─► handler.on_event().await      (publisher waits)
//!                 └─ Async ─► [bounded queue] ─► worker ─► handler.on_event()
//!                                              └─► error/panic logged, worker continues
//! ```
//!
//! ## Rules
//! - Errors returned by a handler are logged with the subscriber identity and topic.
//! - Panics are caught and logged the same way.
//! - Neither reaches the publisher nor stops delivery to other subscriptions.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use mpf_rules::{Event, HandlerError, Subscribe};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, ev: &Event) -> Result<(), HandlerError> {
//!         if ev.str_field("orderId").is_none() {
//!             return Err(HandlerError::rejected("missing orderId"));
//!         }
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "audit" }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::Event;

/// Shared handler handle stored by subscriptions.
pub type HandlerRef = Arc<dyn Subscribe>;

/// Event handler attached to a subscription.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Return errors instead of panicking.
/// - Handlers may publish, subscribe or unsubscribe on the same bus.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// For synchronous subscriptions this runs in the publisher's context; for
    /// asynchronous ones it runs on the subscription's worker, in FIFO order.
    async fn on_event(&self, event: &Event) -> Result<(), HandlerError>;

    /// Returns the handler name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
