//! # Handler invocation and asynchronous delivery workers.
//!
//! [`deliver`] runs one handler for one event, isolating errors and panics.
//! [`AsyncDelivery`] gives an asynchronous subscription its own bounded queue and
//! worker task.
//!
//! ## Architecture
//! ```text
//! enqueue(Arc<Event>)
//!     │  try_send (never blocks the publisher)
//!     ▼
//! [bounded queue] ──► worker ──► deliver() ──► handler.on_event()
//!                                   ├─ Err(e)  → warn!(subscriber, pattern, topic, error)
//!                                   └─ panic   → error!(subscriber, pattern, topic, panic)
//! ```
//!
//! ## Rules
//! - **Per-subscription FIFO**: events are processed in queue order.
//! - **No cross-subscription ordering**: worker A may handle event N while B handles N+5.
//! - **Overflow**: a full queue drops the *new* event for this subscription only.
//! - **Close**: dropping the sender lets the worker drain the queue and exit.
//! - **Cancel**: cancelling the token stops the worker immediately; queued events are discarded.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a handler uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::Event;
use crate::subscribers::{HandlerRef, Subscribe};

/// Outcome of a single handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Handled,
    Failed,
    Panicked,
}

/// Why an async delivery did not reach the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DropReason {
    Full,
    Closed,
}

impl DropReason {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            DropReason::Full => "full",
            DropReason::Closed => "closed",
        }
    }
}

/// Runs `handler` for `ev`, catching errors and panics.
pub(crate) async fn deliver(handler: &dyn Subscribe, subscriber: &str, pattern: &str, ev: &Event) -> Outcome {
    let fut = handler.on_event(ev);

    match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => Outcome::Handled,
        Ok(Err(err)) => {
            tracing::warn!(
                subscriber,
                pattern,
                topic = ev.topic(),
                handler = handler.name(),
                error = %err,
                label = err.as_label(),
                "event handler failed"
            );
            Outcome::Failed
        }
        Err(panic_err) => {
            tracing::error!(
                subscriber,
                pattern,
                topic = ev.topic(),
                handler = handler.name(),
                panic = %panic_message(&*panic_err),
                "event handler panicked"
            );
            Outcome::Panicked
        }
    }
}

fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Bounded queue plus worker task for one asynchronous subscription.
pub(crate) struct AsyncDelivery {
    sender: mpsc::Sender<Arc<Event>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncDelivery {
    /// Creates the queue and spawns the worker on `runtime`.
    ///
    /// Minimum queue capacity is 1 (enforced).
    pub(crate) fn spawn(
        runtime: &Handle,
        subscriber: Arc<str>,
        pattern: Arc<str>,
        handler: HandlerRef,
        capacity: usize,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<Arc<Event>>(capacity.max(1));

        let handle = runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Some(ev) => {
                            deliver(handler.as_ref(), &subscriber, &pattern, &ev).await;
                        }
                        None => break,
                    }
                }
            }
            tracing::trace!(subscriber = %subscriber, pattern = %pattern, "delivery worker stopped");
        });

        Self {
            sender: tx,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Queues an event without waiting.
    pub(crate) fn enqueue(&self, ev: Arc<Event>) -> Result<(), DropReason> {
        self.sender.try_send(ev).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DropReason::Full,
            mpsc::error::TrySendError::Closed(_) => DropReason::Closed,
        })
    }

    /// Takes the worker handle (once) so the owner can await it.
    pub(crate) fn take_worker(&self) -> Option<JoinHandle<()>> {
        self.worker.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::events::Payload;
    use crate::subscribers::HandlerFn;
    use std::time::Duration;
    use tokio::sync::mpsc::unbounded_channel;

    fn ev(topic: &str) -> Event {
        Event::new(topic, Payload::new(), "tester")
    }

    #[tokio::test]
    async fn test_deliver_reports_outcomes() {
        let ok = HandlerFn::new("ok", |_e: Event| async { Ok::<_, HandlerError>(()) });
        let failing = HandlerFn::new("failing", |_e: Event| async { Err::<(), _>(HandlerError::failed("nope")) });
        let panicking = HandlerFn::new("panicking", |e: Event| async move {
            if e.topic() == "t" {
                panic!("kaboom");
            }
            Ok::<_, HandlerError>(())
        });

        assert_eq!(deliver(&ok, "s", "p", &ev("t")).await, Outcome::Handled);
        assert_eq!(deliver(&failing, "s", "p", &ev("t")).await, Outcome::Failed);
        assert_eq!(deliver(&panicking, "s", "p", &ev("t")).await, Outcome::Panicked);
    }

    #[tokio::test]
    async fn test_worker_processes_fifo_and_drains_on_close() {
        let (seen_tx, mut seen_rx) = unbounded_channel();
        let handler: HandlerRef = HandlerFn::arc("recorder", move |e: Event| {
            let seen_tx = seen_tx.clone();
            async move {
                let _ = seen_tx.send(e.topic().to_string());
                Ok::<_, HandlerError>(())
            }
        });

        let delivery = AsyncDelivery::spawn(
            &Handle::current(),
            "sub".into(),
            "**".into(),
            handler,
            8,
            CancellationToken::new(),
        );
        for t in ["a", "b", "c"] {
            delivery.enqueue(Arc::new(ev(t))).unwrap();
        }
        let worker = delivery.take_worker().unwrap();
        drop(delivery);
        tokio::time::timeout(Duration::from_secs(1), worker).await.unwrap().unwrap();

        let mut seen = Vec::new();
        while let Ok(t) = seen_rx.try_recv() {
            seen.push(t);
        }
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_full_queue_drops_new_event() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let handler: HandlerRef = {
            let gate = gate.clone();
            HandlerFn::arc("blocked", move |_e: Event| {
                let gate = gate.clone();
                async move {
                    gate.notified().await;
                    Ok::<_, HandlerError>(())
                }
            })
        };
        let cancel = CancellationToken::new();
        let delivery = AsyncDelivery::spawn(&Handle::current(), "sub".into(), "**".into(), handler, 1, cancel.clone());

        // first event is taken by the worker, second fills the queue
        delivery.enqueue(Arc::new(ev("a"))).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        delivery.enqueue(Arc::new(ev("b"))).unwrap();
        assert_eq!(delivery.enqueue(Arc::new(ev("c"))), Err(DropReason::Full));

        cancel.cancel();
        gate.notify_waiters();
        let worker = delivery.take_worker().unwrap();
        tokio::time::timeout(Duration::from_secs(1), worker).await.unwrap().unwrap();
        assert_eq!(delivery.enqueue(Arc::new(ev("d"))), Err(DropReason::Closed));
    }
}
