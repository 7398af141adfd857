//! # Subscription registry - copy-on-write list of active subscriptions.
//!
//! Readers (every `publish`) take an immutable snapshot; writers (subscribe,
//! unsubscribe, unsubscribe-all) build a new list under a writer mutex and swap
//! it in atomically.
//!
//! ## Architecture
//! ```text
//! subscribe / unsubscribe / unsubscribe_all
//!     └─► write lock ─► clone list ─► modify ─► ArcSwap::store(new list)
//!
//! publish
//!     └─► ArcSwap::load_full() ─► Arc<Vec<Arc<Subscription>>>   (no lock held)
//!            └─► handlers run against this snapshot; they may mutate the registry
//! ```
//!
//! ## Rules
//! - Identity is `(pattern, subscriber)`; re-subscribing replaces the entry in place,
//!   so it keeps its registration position.
//! - List order is registration order; the dispatcher relies on it for stable
//!   priority ties.
//! - Removed entries stay alive while a snapshot still references them.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::events::TopicPattern;
use crate::policies::SubscriptionOptions;
use crate::subscribers::worker::AsyncDelivery;
use crate::subscribers::HandlerRef;

/// One registered subscription.
pub(crate) struct Subscription {
    pub(crate) pattern: TopicPattern,
    pub(crate) subscriber: Arc<str>,
    pub(crate) options: SubscriptionOptions,
    pub(crate) handler: Option<HandlerRef>,
    /// Present iff the subscription is async and has a handler.
    pub(crate) delivery: Option<AsyncDelivery>,
}

impl Subscription {
    fn is(&self, pattern: &str, subscriber: &str) -> bool {
        &*self.subscriber == subscriber && self.pattern.as_str() == pattern
    }

    pub(crate) fn info(&self) -> SubscriptionInfo {
        SubscriptionInfo {
            pattern: self.pattern.as_str().to_string(),
            subscriber: self.subscriber.to_string(),
            options: self.options,
            has_handler: self.handler.is_some(),
        }
    }
}

/// Read-only view of a subscription, for introspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionInfo {
    /// Pattern as subscribed.
    pub pattern: String,
    /// Owning subscriber identity.
    pub subscriber: String,
    /// Current delivery options.
    pub options: SubscriptionOptions,
    /// Whether a handler is attached.
    pub has_handler: bool,
}

pub(crate) type Snapshot = Arc<Vec<Arc<Subscription>>>;

/// Result of [`Registry::upsert`].
pub(crate) enum Upsert {
    Inserted,
    Replaced(Arc<Subscription>),
    Closed,
}

/// Copy-on-write registry of subscriptions.
pub(crate) struct Registry {
    entries: ArcSwap<Vec<Arc<Subscription>>>,
    /// Writer lock; the flag is set once the registry is closed.
    write: Mutex<bool>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
            write: Mutex::new(false),
        }
    }

    /// Consistent view of all subscriptions at this instant.
    pub(crate) fn snapshot(&self) -> Snapshot {
        self.entries.load_full()
    }

    /// Inserts or replaces the `(pattern, subscriber)` entry.
    ///
    /// Rejected once the registry is closed.
    pub(crate) fn upsert(&self, sub: Subscription) -> Upsert {
        let closed = self.write.lock();
        if *closed {
            return Upsert::Closed;
        }
        let mut list: Vec<Arc<Subscription>> = (**self.entries.load()).clone();
        let sub = Arc::new(sub);

        let outcome = match list
            .iter()
            .position(|s| s.is(sub.pattern.as_str(), &sub.subscriber))
        {
            Some(pos) => Upsert::Replaced(std::mem::replace(&mut list[pos], sub)),
            None => {
                list.push(sub);
                Upsert::Inserted
            }
        };

        self.entries.store(Arc::new(list));
        outcome
    }

    /// Removes one entry; `None` if it was not registered.
    pub(crate) fn remove(&self, pattern: &str, subscriber: &str) -> Option<Arc<Subscription>> {
        self.remove_where(|s| s.is(pattern, subscriber)).pop()
    }

    /// Removes every entry owned by `subscriber`.
    pub(crate) fn remove_all(&self, subscriber: &str) -> Vec<Arc<Subscription>> {
        self.remove_where(|s| &*s.subscriber == subscriber)
    }

    /// Removes everything and rejects later inserts.
    pub(crate) fn close(&self) -> Vec<Arc<Subscription>> {
        let mut closed = self.write.lock();
        *closed = true;
        Self::take_where(&self.entries, |_| true)
    }

    fn remove_where(&self, pred: impl Fn(&Subscription) -> bool) -> Vec<Arc<Subscription>> {
        let _guard = self.write.lock();
        Self::take_where(&self.entries, pred)
    }

    /// Caller holds the write lock.
    fn take_where(
        entries: &ArcSwap<Vec<Arc<Subscription>>>,
        pred: impl Fn(&Subscription) -> bool,
    ) -> Vec<Arc<Subscription>> {
        let current = entries.load_full();
        if !current.iter().any(|s| pred(&**s)) {
            return Vec::new();
        }

        let (removed, kept): (Vec<_>, Vec<_>) = current.iter().cloned().partition(|s| pred(&**s));
        entries.store(Arc::new(kept));
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.load().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(pattern: &str, subscriber: &str, priority: i32) -> Subscription {
        Subscription {
            pattern: TopicPattern::parse(pattern).unwrap(),
            subscriber: subscriber.into(),
            options: SubscriptionOptions::default().with_priority(priority),
            handler: None,
            delivery: None,
        }
    }

    fn patterns(snapshot: &Snapshot) -> Vec<(String, i32)> {
        snapshot
            .iter()
            .map(|s| (format!("{}@{}", s.pattern, s.subscriber), s.options.priority))
            .collect()
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let reg = Registry::new();
        assert!(matches!(reg.upsert(sub("a/**", "x", 1)), Upsert::Inserted));
        assert!(matches!(reg.upsert(sub("b", "x", 2)), Upsert::Inserted));
        let Upsert::Replaced(replaced) = reg.upsert(sub("a/**", "x", 7)) else {
            panic!("expected replacement");
        };
        assert_eq!(replaced.options.priority, 1);

        assert_eq!(
            patterns(&reg.snapshot()),
            vec![("a/**@x".to_string(), 7), ("b@x".to_string(), 2)]
        );
    }

    #[test]
    fn test_same_pattern_different_subscribers_are_distinct() {
        let reg = Registry::new();
        reg.upsert(sub("a", "x", 0));
        reg.upsert(sub("a", "y", 0));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_remove_and_remove_all() {
        let reg = Registry::new();
        reg.upsert(sub("a", "x", 0));
        reg.upsert(sub("b", "x", 0));
        reg.upsert(sub("a", "y", 0));

        assert!(reg.remove("missing", "x").is_none());
        assert!(reg.remove("a", "x").is_some());
        assert_eq!(reg.len(), 2);

        assert_eq!(reg.remove_all("nobody").len(), 0);
        assert_eq!(reg.remove_all("x").len(), 1);
        assert_eq!(patterns(&reg.snapshot()), vec![("a@y".to_string(), 0)]);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_writes() {
        let reg = Registry::new();
        reg.upsert(sub("a", "x", 0));
        let before = reg.snapshot();
        reg.upsert(sub("b", "x", 0));
        reg.close();

        assert_eq!(before.len(), 1);
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn test_closed_registry_rejects_inserts() {
        let reg = Registry::new();
        reg.upsert(sub("a", "x", 0));
        assert_eq!(reg.close().len(), 1);

        assert!(matches!(reg.upsert(sub("b", "x", 0)), Upsert::Closed));
        assert_eq!(reg.len(), 0);
        assert!(reg.remove_all("x").is_empty());
    }
}
