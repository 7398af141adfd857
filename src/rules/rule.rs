//! Rule entity and its record (JSON map) form.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::events::Payload;

/// Status assigned when a rule is created without one.
pub const DEFAULT_STATUS: &str = "pending";

/// One business rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub customer_name: String,
    pub product_name: String,
    pub quantity: i64,
    pub price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    /// Derived `quantity * price`.
    pub fn total(&self) -> f64 {
        self.quantity as f64 * self.price
    }

    /// Record form: every field plus `total`, camelCase keys.
    pub fn to_record(&self) -> Payload {
        let mut rec = Payload::new();
        rec.insert("id".into(), self.id.clone().into());
        rec.insert("customerName".into(), self.customer_name.clone().into());
        rec.insert("productName".into(), self.product_name.clone().into());
        rec.insert("quantity".into(), self.quantity.into());
        rec.insert("price".into(), number(self.price));
        rec.insert("status".into(), self.status.clone().into());
        rec.insert("createdAt".into(), self.created_at.to_rfc3339().into());
        rec.insert("updatedAt".into(), self.updated_at.to_rfc3339().into());
        rec.insert("total".into(), number(self.total()));
        rec
    }

    /// Builds a rule from loosely-typed input.
    ///
    /// Missing or mistyped fields take their zero value; a missing status
    /// becomes [`DEFAULT_STATUS`]. Id and timestamps are taken as given (or
    /// left empty/now) and are normally overwritten by the store.
    pub fn from_record(data: &Payload) -> Self {
        let now = Utc::now();
        Self {
            id: as_string(data.get("id")),
            customer_name: as_string(data.get("customerName")),
            product_name: as_string(data.get("productName")),
            quantity: as_i64(data.get("quantity")),
            price: as_f64(data.get("price")),
            status: data
                .get("status")
                .map(|v| as_string(Some(v)))
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            created_at: as_time(data.get("createdAt")).unwrap_or(now),
            updated_at: as_time(data.get("updatedAt")).unwrap_or(now),
        }
    }

    /// Applies the editable keys present in `data`. Returns true if any was present.
    pub(crate) fn apply(&mut self, data: &Payload) -> bool {
        let mut touched = false;
        if let Some(v) = data.get("customerName") {
            self.customer_name = as_string(Some(v));
            touched = true;
        }
        if let Some(v) = data.get("productName") {
            self.product_name = as_string(Some(v));
            touched = true;
        }
        if let Some(v) = data.get("quantity") {
            self.quantity = as_i64(Some(v));
            touched = true;
        }
        if let Some(v) = data.get("price") {
            self.price = as_f64(Some(v));
            touched = true;
        }
        if let Some(v) = data.get("status") {
            self.status = as_string(Some(v));
            touched = true;
        }
        touched
    }
}

fn number(v: f64) -> Value {
    serde_json::Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

pub(crate) fn as_string(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => String::new(),
    }
}

pub(crate) fn as_f64(v: Option<&Value>) -> f64 {
    match v {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

fn as_i64(v: Option<&Value>) -> i64 {
    match v {
        Some(Value::Number(n)) => n.as_i64().unwrap_or_else(|| n.as_f64().map_or(0, |f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    }
}

fn as_time(v: Option<&Value>) -> Option<DateTime<Utc>> {
    v.and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::payload;
    use serde_json::json;

    #[test]
    fn test_from_record_defaults() {
        let rule = Rule::from_record(&payload(json!({ "customerName": "Rule A", "quantity": "3" })));
        assert_eq!(rule.customer_name, "Rule A");
        assert_eq!(rule.product_name, "");
        assert_eq!(rule.quantity, 3);
        assert_eq!(rule.price, 0.0);
        assert_eq!(rule.status, DEFAULT_STATUS);
    }

    #[test]
    fn test_record_has_total_and_camel_case_keys() {
        let rule = Rule::from_record(&payload(json!({ "quantity": 4, "price": 2.5, "status": "active" })));
        let rec = rule.to_record();
        assert_eq!(rec["total"], json!(10.0));
        assert_eq!(rec["status"], json!("active"));
        for key in ["id", "customerName", "productName", "quantity", "price", "createdAt", "updatedAt"] {
            assert!(rec.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_apply_is_partial() {
        let mut rule = Rule::from_record(&payload(json!({ "customerName": "A", "price": 1.0 })));
        assert!(rule.apply(&payload(json!({ "price": 9 }))));
        assert_eq!(rule.customer_name, "A");
        assert_eq!(rule.price, 9.0);
        assert!(!rule.apply(&payload(json!({ "unknown": 1 }))));
    }
}
