//! # LogWriter: event tracer
//!
//! A minimal handler that records every delivered [`Event`] through `tracing`.
//! Subscribe it to `**` to trace all bus traffic.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO mpf_rules: event seq=4 topic="orders/created" sender="com.biiz.orders" fields=3
//! INFO mpf_rules: event seq=5 topic="rules/check/completed" sender="com.biiz.rules" fields=4
//! ```

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::Event;
use crate::subscribers::Subscribe;

/// Event tracing handler.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) -> Result<(), HandlerError> {
        tracing::info!(
            seq = e.seq,
            topic = e.topic(),
            sender = e.sender(),
            fields = e.payload().len(),
            "event"
        );
        tracing::debug!(seq = e.seq, payload = ?e.payload(), "event payload");
        Ok(())
    }

    fn name(&self) -> &str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Payload;

    #[tokio::test]
    async fn test_log_writer_never_fails() {
        let w = LogWriter::new();
        let ev = Event::new("orders/created", Payload::new(), "com.biiz.orders");
        assert_eq!(w.on_event(&ev).await, Ok(()));
        assert_eq!(w.name(), "LogWriter");
    }
}
