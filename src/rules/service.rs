//! # RulesService: in-memory rule store with change observers.
//!
//! ## Rules
//! - Ids are the first 8 characters of a v4 UUID.
//! - Every successful mutation notifies its specific observers (created,
//!   updated, deleted) first, then the list-changed observers.
//! - Observers run after the store lock is released, so they may read (or
//!   mutate) the store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::rule::{Rule, DEFAULT_STATUS};
use crate::events::Payload;

/// Handle returned by the `on_*` registration methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

type IdCallback = Arc<dyn Fn(&str) + Send + Sync>;
type ListCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Copy)]
enum Change {
    Created,
    Updated,
    Deleted,
}

#[derive(Default)]
struct Observers {
    created: BTreeMap<ObserverId, IdCallback>,
    updated: BTreeMap<ObserverId, IdCallback>,
    deleted: BTreeMap<ObserverId, IdCallback>,
    list_changed: BTreeMap<ObserverId, ListCallback>,
}

/// Rule store.
#[derive(Default)]
pub struct RulesService {
    rules: RwLock<Vec<Rule>>,
    observers: Mutex<Observers>,
    next_observer: AtomicU64,
}

impl RulesService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of all rules, in creation order.
    pub fn all_rules(&self) -> Vec<Payload> {
        self.rules.read().iter().map(Rule::to_record).collect()
    }

    /// Record of one rule; empty map if unknown.
    pub fn rule(&self, id: &str) -> Payload {
        self.rules
            .read()
            .iter()
            .find(|r| r.id == id)
            .map(Rule::to_record)
            .unwrap_or_default()
    }

    /// Creates a rule from `data` and returns its new id.
    pub fn create_rule(&self, data: &Payload) -> String {
        let mut rule = Rule::from_record(data);
        rule.id = generate_id();
        rule.created_at = Utc::now();
        rule.updated_at = rule.created_at;
        if rule.status.is_empty() {
            rule.status = DEFAULT_STATUS.to_string();
        }

        let id = rule.id.clone();
        self.rules.write().push(rule);
        tracing::debug!(rule = %id, "rule created");

        self.notify(Change::Created, &id);
        id
    }

    /// Applies the keys present in `data` to rule `id`.
    ///
    /// Returns false if the rule does not exist.
    pub fn update_rule(&self, id: &str, data: &Payload) -> bool {
        {
            let mut rules = self.rules.write();
            let Some(rule) = rules.iter_mut().find(|r| r.id == id) else {
                return false;
            };
            rule.apply(data);
            rule.updated_at = Utc::now();
        }
        self.notify(Change::Updated, id);
        true
    }

    /// Returns false if the rule does not exist.
    pub fn delete_rule(&self, id: &str) -> bool {
        {
            let mut rules = self.rules.write();
            let Some(pos) = rules.iter().position(|r| r.id == id) else {
                return false;
            };
            rules.remove(pos);
        }
        tracing::debug!(rule = id, "rule deleted");
        self.notify(Change::Deleted, id);
        true
    }

    pub fn update_status(&self, id: &str, status: &str) -> bool {
        let mut data = Payload::new();
        data.insert("status".into(), Value::from(status));
        self.update_rule(id, &data)
    }

    /// Records of rules whose status equals `status` exactly.
    pub fn rules_by_status(&self, status: &str) -> Vec<Payload> {
        self.rules
            .read()
            .iter()
            .filter(|r| r.status == status)
            .map(Rule::to_record)
            .collect()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    /// Sum of `quantity * price` over all rules.
    pub fn total_revenue(&self) -> f64 {
        self.rules.read().iter().map(Rule::total).sum()
    }

    pub fn on_created(&self, f: impl Fn(&str) + Send + Sync + 'static) -> ObserverId {
        let id = self.next_id();
        self.observers.lock().created.insert(id, Arc::new(f));
        id
    }

    pub fn on_updated(&self, f: impl Fn(&str) + Send + Sync + 'static) -> ObserverId {
        let id = self.next_id();
        self.observers.lock().updated.insert(id, Arc::new(f));
        id
    }

    pub fn on_deleted(&self, f: impl Fn(&str) + Send + Sync + 'static) -> ObserverId {
        let id = self.next_id();
        self.observers.lock().deleted.insert(id, Arc::new(f));
        id
    }

    /// Called after every successful mutation.
    pub fn on_list_changed(&self, f: impl Fn() + Send + Sync + 'static) -> ObserverId {
        let id = self.next_id();
        self.observers.lock().list_changed.insert(id, Arc::new(f));
        id
    }

    /// Unregisters an observer. Returns false if it was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut obs = self.observers.lock();
        obs.created.remove(&id).is_some()
            | obs.updated.remove(&id).is_some()
            | obs.deleted.remove(&id).is_some()
            | obs.list_changed.remove(&id).is_some()
    }

    /// Number of registered observers of any kind.
    pub fn observer_count(&self) -> usize {
        let obs = self.observers.lock();
        obs.created.len() + obs.updated.len() + obs.deleted.len() + obs.list_changed.len()
    }

    fn next_id(&self) -> ObserverId {
        ObserverId(self.next_observer.fetch_add(1, Ordering::Relaxed))
    }

    fn notify(&self, change: Change, rule_id: &str) {
        let (specific, list): (Vec<IdCallback>, Vec<ListCallback>) = {
            let obs = self.observers.lock();
            let specific = match change {
                Change::Created => &obs.created,
                Change::Updated => &obs.updated,
                Change::Deleted => &obs.deleted,
            };
            (specific.values().cloned().collect(), obs.list_changed.values().cloned().collect())
        };
        for f in specific {
            f(rule_id);
        }
        for f in list {
            f();
        }
    }
}

fn generate_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

impl std::fmt::Debug for RulesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulesService")
            .field("rules", &self.rule_count())
            .finish()
    }
}
