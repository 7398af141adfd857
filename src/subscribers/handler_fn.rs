//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(Event) -> Fut`, producing a fresh future per
//! delivery. The closure receives an owned (cheaply cloned) [`Event`], so the future
//! can be `'static` and move it freely.
//!
//! ## Concurrency semantics
//! - Each delivery creates a **new** future that owns its state.
//! - No hidden mutation between deliveries; share state through `Arc<...>` captured
//!   explicitly inside the closure.
//!
//! ## Example
//! ```rust
//! use mpf_rules::{Event, HandlerError, HandlerFn, HandlerRef};
//!
//! let h: HandlerRef = HandlerFn::arc("printer", |ev: Event| async move {
//!     println!("{} from {}", ev.topic(), ev.sender());
//!     Ok::<_, HandlerError>(())
//! });
//!
//! assert_eq!(h.name(), "printer");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::Event;
use crate::subscribers::Subscribe;

/// Function-backed handler implementation.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`](crate::HandlerRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Subscribe for HandlerFn<F>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn on_event(&self, event: &Event) -> Result<(), HandlerError> {
        (self.f)(event.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Payload;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_closure_receives_event() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = {
            let hits = hits.clone();
            HandlerFn::arc("counter", move |ev: Event| {
                let hits = hits.clone();
                async move {
                    assert_eq!(ev.topic(), "orders/created");
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, HandlerError>(())
                }
            })
        };

        let ev = Event::new("orders/created", Payload::new(), "x");
        h.on_event(&ev).await.unwrap();
        h.on_event(&ev).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(h.name(), "counter");
    }

    #[tokio::test]
    async fn test_closure_error_is_returned() {
        let h = HandlerFn::new("failing", |_ev: Event| async { Err::<(), _>(HandlerError::failed("boom")) });
        let ev = Event::new("t", Payload::new(), "x");
        assert_eq!(h.on_event(&ev).await, Err(HandlerError::failed("boom")));
    }
}
