//! # RuleModel: filtered row view over a [`RulesService`].
//!
//! The model keeps a cached list of rule records, optionally filtered by
//! status, and rebuilds it whenever its store reports a change. Views register
//! listeners to learn when to re-read rows.
//!
//! ```text
//! RulesService ──list changed──► RuleModel::refresh()
//!                                    ├─ rows = all_rules() | rules_by_status(filter)
//!                                    ├─► ModelSignal::Reset
//!                                    └─► ModelSignal::CountChanged
//! ```
//!
//! Listeners run after the model lock is released and may read the model.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;

use super::service::{ObserverId, RulesService};
use crate::events::Payload;

/// Data roles exposed per row. Ids start at the first user role (257).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum Role {
    Id = 257,
    CustomerName,
    ProductName,
    Quantity,
    Price,
    Status,
    CreatedAt,
    UpdatedAt,
    Total,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::Id,
        Role::CustomerName,
        Role::ProductName,
        Role::Quantity,
        Role::Price,
        Role::Status,
        Role::CreatedAt,
        Role::UpdatedAt,
        Role::Total,
    ];

    /// Record key (and role name) for this role.
    pub fn name(self) -> &'static str {
        match self {
            Role::Id => "id",
            Role::CustomerName => "customerName",
            Role::ProductName => "productName",
            Role::Quantity => "quantity",
            Role::Price => "price",
            Role::Status => "status",
            Role::CreatedAt => "createdAt",
            Role::UpdatedAt => "updatedAt",
            Role::Total => "total",
        }
    }

    pub fn from_id(id: i32) -> Option<Role> {
        Role::ALL.into_iter().find(|r| *r as i32 == id)
    }
}

/// Change notifications emitted by [`RuleModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSignal {
    /// All rows were replaced.
    Reset,
    CountChanged,
    FilterStatusChanged,
    ServiceChanged,
}

type Listener = Arc<dyn Fn(ModelSignal) + Send + Sync>;

#[derive(Default)]
struct State {
    service: Option<Arc<RulesService>>,
    connection: Option<ObserverId>,
    filter_status: String,
    rows: Vec<Payload>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    listeners: Mutex<Vec<Listener>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let (Some(svc), Some(conn)) = (state.service.take(), state.connection.take()) {
            svc.remove_observer(conn);
        }
    }
}

/// Row model over a rule store.
#[derive(Default)]
pub struct RuleModel {
    inner: Arc<Inner>,
}

impl RuleModel {
    /// Model without a store; it has no rows until [`RuleModel::set_service`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(service: Arc<RulesService>) -> Self {
        let model = Self::new();
        model.set_service(Some(service));
        model
    }

    pub fn row_count(&self) -> usize {
        self.inner.state.lock().rows.len()
    }

    /// Value of `role` in `row`; `None` for an invalid row or unknown role.
    pub fn data(&self, row: usize, role: i32) -> Option<Value> {
        let role = Role::from_id(role)?;
        self.inner.state.lock().rows.get(row)?.get(role.name()).cloned()
    }

    /// Role id to role name.
    pub fn role_names(&self) -> BTreeMap<i32, &'static str> {
        Role::ALL.into_iter().map(|r| (r as i32, r.name())).collect()
    }

    /// Full record of `row`; empty map when out of range.
    pub fn get(&self, row: usize) -> Payload {
        self.inner.state.lock().rows.get(row).cloned().unwrap_or_default()
    }

    /// Current status filter; empty means no filtering.
    pub fn filter_status(&self) -> String {
        self.inner.state.lock().filter_status.clone()
    }

    /// Sets the status filter and rebuilds rows. No-op if unchanged.
    pub fn set_filter_status(&self, status: &str) {
        {
            let mut st = self.inner.state.lock();
            if st.filter_status == status {
                return;
            }
            st.filter_status = status.to_string();
        }
        self.refresh();
        self.emit(ModelSignal::FilterStatusChanged);
    }

    pub fn service(&self) -> Option<Arc<RulesService>> {
        self.inner.state.lock().service.clone()
    }

    /// Switches to another store (or none).
    ///
    /// Disconnects from the previous store's list-changed notifications and
    /// connects to the new one. No-op if it is the same store.
    pub fn set_service(&self, service: Option<Arc<RulesService>>) {
        let old = {
            let mut st = self.inner.state.lock();
            let same = match (&st.service, &service) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if same {
                return;
            }

            let old = st.service.take().zip(st.connection.take());
            if let Some(svc) = &service {
                let weak: Weak<Inner> = Arc::downgrade(&self.inner);
                st.connection = Some(svc.on_list_changed(move || {
                    if let Some(inner) = weak.upgrade() {
                        RuleModel { inner }.refresh();
                    }
                }));
            }
            st.service = service;
            old
        };
        if let Some((svc, conn)) = old {
            svc.remove_observer(conn);
        }

        self.refresh();
        self.emit(ModelSignal::ServiceChanged);
    }

    /// Rebuilds rows from the store.
    pub fn refresh(&self) {
        let (service, filter) = {
            let st = self.inner.state.lock();
            (st.service.clone(), st.filter_status.clone())
        };
        let rows = match service {
            None => Vec::new(),
            Some(svc) if filter.is_empty() => svc.all_rules(),
            Some(svc) => svc.rules_by_status(&filter),
        };
        self.inner.state.lock().rows = rows;

        self.emit(ModelSignal::Reset);
        self.emit(ModelSignal::CountChanged);
    }

    /// Registers a change listener for the model's lifetime.
    pub fn on_signal(&self, f: impl Fn(ModelSignal) + Send + Sync + 'static) {
        self.inner.listeners.lock().push(Arc::new(f));
    }

    fn emit(&self, signal: ModelSignal) {
        let listeners: Vec<Listener> = self.inner.listeners.lock().clone();
        for f in listeners {
            f(signal);
        }
    }
}

impl std::fmt::Debug for RuleModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.inner.state.lock();
        f.debug_struct("RuleModel")
            .field("rows", &st.rows.len())
            .field("filter_status", &st.filter_status)
            .field("has_service", &st.service.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::payload;
    use serde_json::json;

    fn store() -> Arc<RulesService> {
        let svc = Arc::new(RulesService::new());
        svc.create_rule(&payload(json!({ "customerName": "A", "quantity": 2, "price": 1.5, "status": "active" })));
        svc.create_rule(&payload(json!({ "customerName": "B" })));
        svc
    }

    fn recorder(model: &RuleModel) -> Arc<Mutex<Vec<ModelSignal>>> {
        let log: Arc<Mutex<Vec<ModelSignal>>> = Default::default();
        let l = log.clone();
        model.on_signal(move |s| l.lock().push(s));
        log
    }

    #[test]
    fn test_roles() {
        let model = RuleModel::new();
        let names = model.role_names();
        assert_eq!(names.len(), 9);
        assert_eq!(names[&257], "id");
        assert_eq!(names[&265], "total");
        assert_eq!(Role::from_id(256), None);
    }

    #[test]
    fn test_rows_and_data() {
        let model = RuleModel::with_service(store());
        assert_eq!(model.row_count(), 2);
        assert_eq!(model.data(0, Role::CustomerName as i32), Some(json!("A")));
        assert_eq!(model.data(0, Role::Total as i32), Some(json!(3.0)));
        assert_eq!(model.data(1, Role::Status as i32), Some(json!("pending")));
        assert_eq!(model.data(2, Role::Id as i32), None);
        assert_eq!(model.data(0, 9999), None);
        assert!(model.get(5).is_empty());
        assert_eq!(model.get(1)["customerName"], json!("B"));
    }

    #[test]
    fn test_no_service_means_no_rows() {
        let model = RuleModel::new();
        assert_eq!(model.row_count(), 0);
        model.refresh();
        assert_eq!(model.row_count(), 0);
    }

    #[test]
    fn test_filter_status() {
        let model = RuleModel::with_service(store());
        let log = recorder(&model);

        model.set_filter_status("active");
        assert_eq!(model.row_count(), 1);
        assert_eq!(
            *log.lock(),
            vec![ModelSignal::Reset, ModelSignal::CountChanged, ModelSignal::FilterStatusChanged]
        );

        log.lock().clear();
        model.set_filter_status("active");
        assert!(log.lock().is_empty());

        model.set_filter_status("");
        assert_eq!(model.row_count(), 2);
    }

    #[test]
    fn test_tracks_store_changes() {
        let svc = store();
        let model = RuleModel::with_service(svc.clone());
        svc.create_rule(&payload(json!({ "customerName": "C" })));
        assert_eq!(model.row_count(), 3);

        let id = model.data(0, Role::Id as i32).unwrap();
        svc.delete_rule(id.as_str().unwrap());
        assert_eq!(model.row_count(), 2);
    }

    #[test]
    fn test_set_service_disconnects_previous() {
        let first = store();
        let second = Arc::new(RulesService::new());
        let model = RuleModel::with_service(first.clone());
        let log = recorder(&model);

        model.set_service(Some(second.clone()));
        assert_eq!(model.row_count(), 0);
        assert_eq!(log.lock().last(), Some(&ModelSignal::ServiceChanged));

        log.lock().clear();
        first.create_rule(&payload(json!({})));
        assert!(log.lock().is_empty());

        second.create_rule(&payload(json!({})));
        assert_eq!(model.row_count(), 1);

        // same store again is a no-op
        log.lock().clear();
        model.set_service(Some(second));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_dropping_model_disconnects() {
        let svc = store();
        let model = RuleModel::with_service(svc.clone());
        assert_eq!(svc.observer_count(), 1);
        drop(model);
        assert_eq!(svc.observer_count(), 0);
        svc.create_rule(&payload(json!({})));
        assert_eq!(svc.rule_count(), 3);
    }
}
