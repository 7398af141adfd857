//! # Subscription handlers for the event bus.
//!
//! This module provides the [`Subscribe`] trait, the closure adapter
//! [`HandlerFn`], the delivery machinery shared by sync and async subscriptions,
//! and built-in handlers.
//!
//! ## Architecture
//! ```text
//! EventBus::publish(topic, payload, sender)
//!     │
//!     ├──► Sync  subscription ──► deliver() ──► Subscribe::on_event(&Event)
//!     │
//!     └──► Async subscription ──► AsyncDelivery [queue] ──► worker ──► deliver()
//! ```
//!
//! ## Handler types
//! - **Trait handlers** - types implementing [`Subscribe`] (rule engines, audit, ...)
//! - **Closure handlers** - [`HandlerFn`] for quick wiring and tests
//! - **Built-in** - `LogWriter` (feature `logging`) traces every event

#[cfg(feature = "logging")]
mod embedded;
mod handler_fn;
mod subscriber;
pub(crate) mod worker;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use handler_fn::HandlerFn;
pub use subscriber::{HandlerRef, Subscribe};
