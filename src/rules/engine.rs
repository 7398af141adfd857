//! # Order checks driven by bus events.
//!
//! [`RuleEngine`] evaluates an `orders/created` payload against the configured
//! limits. Two handlers wire it to the bus:
//!
//! ```text
//! orders/created ──► OrderCheck (async, priority 10)
//!                      ├─ engine.check_order(payload)
//!                      └─ publish rules/check/completed { orderId, passed, reason, checkedAt }
//!
//! orders/**      ──► OrdersWatch (sync, priority 0)
//!                      ├─ log every orders event
//!                      └─ orders/status_changed + newStatus == "shipped" ─► shipping check
//! ```
//!
//! ## Rules
//! - Checks run in a fixed order; when several fail, the reason of the **last**
//!   failing check is reported.
//! - A missing `totalAmount` counts as 0; a missing `customerName` counts as empty.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rule::{as_f64, as_string};
use crate::core::EventBus;
use crate::error::HandlerError;
use crate::events::{Event, Payload};
use crate::subscribers::Subscribe;

/// Topic the check result is published on.
pub const CHECK_COMPLETED_TOPIC: &str = "rules/check/completed";

/// Configuration of the rules plugin.
///
/// ## Field semantics
/// - `max_order_amount`: orders strictly above it fail the amount check
/// - `seed_sample_rules`: create the two sample rules on start
/// - `check_priority`: priority of the `orders/created` subscription
/// - `watch_priority`: priority of the `orders/**` subscription
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub max_order_amount: f64,
    pub seed_sample_rules: bool,
    pub check_priority: i32,
    pub watch_priority: i32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_order_amount: 10_000.0,
            seed_sample_rules: true,
            check_priority: 10,
            watch_priority: 0,
        }
    }
}

/// Outcome of [`RuleEngine::check_order`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub passed: bool,
    /// Empty when `passed`.
    pub reason: String,
}

/// Stateless order checker.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    cfg: RulesConfig,
}

impl RuleEngine {
    pub fn new(cfg: RulesConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.cfg
    }

    /// Checks an order payload (`totalAmount`, `customerName`).
    pub fn check_order(&self, order: &Payload) -> CheckResult {
        let amount = as_f64(order.get("totalAmount"));
        let customer = as_string(order.get("customerName"));

        let mut result = CheckResult {
            passed: true,
            reason: String::new(),
        };
        if amount > self.cfg.max_order_amount {
            result.passed = false;
            result.reason = format!("order amount exceeds limit (${})", thousands(self.cfg.max_order_amount));
        }
        if customer.is_empty() {
            result.passed = false;
            result.reason = "customer name is empty".to_string();
        }
        result
    }
}

/// `10000.0` -> `10,000`; fractional limits keep two decimals.
///
/// Rounds to cents first so a carry reaches the integer part. Out-of-range
/// magnitudes saturate.
fn thousands(v: f64) -> String {
    let cents = (v * 100.0).round();
    let negative = cents < 0.0;
    // `as` saturates; NaN becomes 0
    let cents = cents.abs() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    if negative && cents > 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if frac > 0 {
        out.push_str(&format!(".{frac:02}"));
    }
    out
}

/// Checks newly created orders and publishes the verdict.
pub struct OrderCheck {
    engine: Arc<RuleEngine>,
    bus: EventBus,
    sender: String,
}

impl OrderCheck {
    /// `sender` is the identity results are published under.
    pub fn new(engine: Arc<RuleEngine>, bus: EventBus, sender: impl Into<String>) -> Self {
        Self {
            engine,
            bus,
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl Subscribe for OrderCheck {
    async fn on_event(&self, event: &Event) -> Result<(), HandlerError> {
        let order_id = event.str_field("orderId").unwrap_or_default().to_string();
        tracing::info!(
            order = %order_id,
            amount = event.f64_field("totalAmount").unwrap_or(0.0),
            "checking rules for new order"
        );

        let result = self.engine.check_order(event.payload());

        let mut out = Payload::new();
        out.insert("orderId".into(), Value::from(order_id.clone()));
        out.insert("passed".into(), Value::from(result.passed));
        out.insert("reason".into(), Value::from(result.reason.clone()));
        out.insert("checkedAt".into(), Value::from(chrono::Utc::now().timestamp_millis()));

        self.bus
            .publish(CHECK_COMPLETED_TOPIC, out, &self.sender)
            .await
            .map_err(|e| HandlerError::failed(e.to_string()))?;

        if result.passed {
            tracing::info!(order = %order_id, "rule check passed");
        } else {
            tracing::info!(order = %order_id, reason = %result.reason, "rule check failed");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "OrderCheck"
    }
}

/// Observes every orders event.
#[derive(Debug, Default)]
pub struct OrdersWatch;

#[async_trait]
impl Subscribe for OrdersWatch {
    async fn on_event(&self, event: &Event) -> Result<(), HandlerError> {
        tracing::debug!(topic = event.topic(), sender = event.sender(), "received orders event");

        if event.topic() == "orders/status_changed" && event.str_field("newStatus") == Some("shipped") {
            let order = event.str_field("orderId").unwrap_or_default();
            tracing::info!(order, "order shipped, checking shipping rules");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "OrdersWatch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BusConfig;
    use crate::events::payload;
    use crate::policies::SubscriptionOptions;
    use serde_json::json;
    use std::time::Duration;

    fn engine() -> RuleEngine {
        RuleEngine::new(RulesConfig::default())
    }

    #[test]
    fn test_order_within_limits_passes() {
        let r = engine().check_order(&payload(json!({ "totalAmount": 10000, "customerName": "Ann" })));
        assert!(r.passed);
        assert_eq!(r.reason, "");
    }

    #[test]
    fn test_amount_over_limit_fails() {
        let r = engine().check_order(&payload(json!({ "totalAmount": 10000.01, "customerName": "Ann" })));
        assert!(!r.passed);
        assert_eq!(r.reason, "order amount exceeds limit ($10,000)");
    }

    #[test]
    fn test_last_failing_check_wins() {
        let r = engine().check_order(&payload(json!({ "totalAmount": 20000 })));
        assert!(!r.passed);
        assert_eq!(r.reason, "customer name is empty");
    }

    #[test]
    fn test_custom_limit_in_reason() {
        let cfg = RulesConfig {
            max_order_amount: 2_500_000.5,
            ..RulesConfig::default()
        };
        let r = RuleEngine::new(cfg).check_order(&payload(json!({ "totalAmount": 3e6, "customerName": "A" })));
        assert_eq!(r.reason, "order amount exceeds limit ($2,500,000.50)");
    }

    #[test]
    fn test_thousands_formatting() {
        assert_eq!(thousands(10_000.0), "10,000");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(2_500_000.5), "2,500,000.50");
        assert_eq!(thousands(-1_234.25), "-1,234.25");
        assert_eq!(thousands(-0.001), "0");
    }

    #[test]
    fn test_thousands_rounding_carries_into_whole_part() {
        assert_eq!(thousands(10_000.999), "10,001");
        assert_eq!(thousands(0.996), "1");
        assert_eq!(thousands(999.999), "1,000");
    }

    #[test]
    fn test_thousands_extreme_values_do_not_panic() {
        assert!(thousands(-1e300).starts_with('-'));
        assert_eq!(thousands(f64::NAN), "0");
        assert_eq!(thousands(f64::INFINITY), thousands(1e300));
    }

    #[test]
    fn test_config_partial_deserialize() {
        let cfg: RulesConfig = serde_json::from_str(r#"{ "max_order_amount": 50 }"#).unwrap();
        assert_eq!(cfg.max_order_amount, 50.0);
        assert!(cfg.seed_sample_rules);
        assert_eq!(cfg.check_priority, 10);
    }

    #[tokio::test]
    async fn test_order_check_publishes_result() {
        let bus = EventBus::new(BusConfig::default());
        let mut feed = bus.feed();
        let check = Arc::new(OrderCheck::new(Arc::new(engine()), bus.clone(), "com.biiz.rules"));
        bus.subscribe("orders/created", "com.biiz.rules", Some(check), SubscriptionOptions::default())
            .unwrap();

        bus.publish(
            "orders/created",
            payload(json!({ "orderId": "o-7", "totalAmount": 99999, "customerName": "Ann" })),
            "com.biiz.orders",
        )
        .await
        .unwrap();

        // result is published from inside the handler, so it reaches the feed first
        let result = tokio::time::timeout(Duration::from_secs(1), feed.recv()).await.unwrap().unwrap();
        assert_eq!(result.topic(), CHECK_COMPLETED_TOPIC);
        assert_eq!(result.sender(), "com.biiz.rules");
        assert_eq!(result.str_field("orderId"), Some("o-7"));
        assert_eq!(result.field("passed"), Some(&json!(false)));
        assert_eq!(result.str_field("reason"), Some("order amount exceeds limit ($10,000)"));
        assert!(result.field("checkedAt").and_then(Value::as_i64).is_some());

        bus.unsubscribe_all("com.biiz.rules");
    }

    #[tokio::test]
    async fn test_orders_watch_accepts_any_orders_event() {
        let watch = OrdersWatch;
        for (topic, data) in [
            ("orders/updated", json!({})),
            ("orders/status_changed", json!({ "orderId": "o-1", "newStatus": "shipped" })),
            ("orders/items/added", json!({ "qty": 1 })),
        ] {
            let ev = Event::new(topic, payload(data), "com.biiz.orders");
            assert_eq!(watch.on_event(&ev).await, Ok(()));
        }
    }
}
