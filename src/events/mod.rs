//! Bus events: data model, topic matching and the live feed.
//!
//! ## Contents
//! - [`Event`], [`Payload`] what gets published
//! - [`TopicPattern`] subscription pattern parsing and topic matching
//! - [`Feed`] thin wrapper over `tokio::sync::broadcast` carrying every published event
//!
//! See `core/mod.rs` for how the pieces are wired by [`EventBus`](crate::EventBus).

mod event;
mod feed;
mod topic;

pub use event::{payload, Event, Payload};
pub use feed::Feed;
pub use topic::{validate_topic, TopicPattern, SEPARATOR, WILDCARD};
