use tokio::runtime::Handle;

use crate::{
    core::BusConfig,
    error::BusError,
    policies::SubscriptionOptions,
    subscribers::HandlerRef,
};

use super::bus::EventBus;

struct Pending {
    pattern: String,
    subscriber: String,
    handler: Option<HandlerRef>,
    options: SubscriptionOptions,
}

/// Builder for constructing an [`EventBus`] with optional features.
pub struct EventBusBuilder {
    cfg: BusConfig,
    runtime: Option<Handle>,
    subscriptions: Vec<Pending>,
}

impl EventBusBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: BusConfig) -> Self {
        Self {
            cfg,
            runtime: None,
            subscriptions: Vec::new(),
        }
    }

    /// Pins the runtime async delivery workers are spawned on.
    ///
    /// Without it, the runtime current at `subscribe` time is used, and async
    /// subscriptions made outside a runtime fail.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Registers a subscription when the bus is built.
    ///
    /// Subscriptions are applied in call order, so equal priorities dispatch in
    /// this order too.
    pub fn with_subscription(
        mut self,
        pattern: impl Into<String>,
        subscriber_id: impl Into<String>,
        handler: Option<HandlerRef>,
        options: SubscriptionOptions,
    ) -> Self {
        self.subscriptions.push(Pending {
            pattern: pattern.into(),
            subscriber: subscriber_id.into(),
            handler,
            options,
        });
        self
    }

    /// Builds the bus and applies the initial subscriptions.
    ///
    /// Fails on the first subscription that [`EventBus::subscribe`] rejects.
    pub fn build(self) -> Result<EventBus, BusError> {
        let bus = EventBus::with_parts(self.cfg, self.runtime);
        for p in self.subscriptions {
            bus.subscribe(&p.pattern, &p.subscriber, p.handler, p.options)?;
        }
        Ok(bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::events::{Event, Payload};
    use crate::subscribers::HandlerFn;
    use std::time::Duration;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn test_initial_subscriptions_are_registered() {
        let bus = EventBus::builder(BusConfig::default())
            .with_subscription("orders/**", "ui", None, SubscriptionOptions::default())
            .with_subscription("orders/created", "ui", None, SubscriptionOptions::default())
            .build()
            .unwrap();

        let patterns: Vec<_> = bus.subscriptions_of("ui").into_iter().map(|s| s.pattern).collect();
        assert_eq!(patterns, vec!["orders/**", "orders/created"]);
    }

    #[tokio::test]
    async fn test_invalid_initial_subscription_fails_build() {
        let err = EventBus::builder(BusConfig::default())
            .with_subscription("a/**/b", "ui", None, SubscriptionOptions::default())
            .build()
            .unwrap_err();
        assert_eq!(err.as_label(), "bus_invalid_pattern");
    }

    #[test]
    fn test_pinned_runtime_allows_async_subscribe_outside_it() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();

        let (tx, mut rx) = unbounded_channel();
        let handler = HandlerFn::arc("fwd", move |ev: Event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(ev.topic().to_string());
                Ok::<_, HandlerError>(())
            }
        });

        let bus = EventBus::builder(BusConfig::default())
            .with_runtime(rt.handle().clone())
            .with_subscription("jobs/**", "w", Some(handler), SubscriptionOptions::asynchronous())
            .build()
            .unwrap();

        rt.block_on(async {
            bus.publish("jobs/a", Payload::new(), "p").await.unwrap();
            let got = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
            assert_eq!(got.as_deref(), Some("jobs/a"));
            bus.shutdown().await;
        });
    }
}
