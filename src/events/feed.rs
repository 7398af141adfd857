//! # Live feed of every published event.
//!
//! [`Feed`] is a thin wrapper around [`tokio::sync::broadcast`]. The bus sends each
//! published event here after routing it to subscriptions, so listeners that did
//! not register a handler (UI panels, handler-less subscribers, debugging tools)
//! can still observe traffic.
//!
//! ## Rules
//! - **Non-blocking send**: `send()` never blocks and never fails the publisher.
//! - **Bounded capacity**: a single ring buffer shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no receivers at send time.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel of published events.
#[derive(Clone, Debug)]
pub struct Feed {
    tx: broadcast::Sender<Arc<Event>>,
}

impl Feed {
    /// Creates a new feed with the given capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Sends an event to all current receivers.
    pub fn send(&self, ev: Arc<Event>) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Event>> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Payload;

    #[tokio::test]
    async fn test_feed_delivers_to_each_receiver() {
        let feed = Feed::new(8);
        let mut a = feed.subscribe();
        let mut b = feed.subscribe();
        assert_eq!(feed.receiver_count(), 2);

        feed.send(Arc::new(Event::new("orders/created", Payload::new(), "x")));

        assert_eq!(a.recv().await.unwrap().topic(), "orders/created");
        assert_eq!(b.recv().await.unwrap().topic(), "orders/created");
    }

    #[test]
    fn test_send_without_receivers_is_silent() {
        let feed = Feed::new(0);
        feed.send(Arc::new(Event::new("t", Payload::new(), "x")));
        assert_eq!(feed.receiver_count(), 0);
    }
}
