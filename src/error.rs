//! Error types used by the event bus, subscription handlers and the rules plugin.
//!
//! This module defines three enums:
//!
//! - [`BusError`] errors raised by the bus itself (bad patterns/topics, missing runtime, shutdown).
//! - [`HandlerError`] errors returned by subscription handlers.
//! - [`PluginError`] errors raised by plugin lifecycle calls.
//!
//! All of them provide `as_label` for logs. Handler errors never reach a
//! publisher: they are caught and logged at the dispatch boundary.

use thiserror::Error;

/// # Errors produced by the event bus.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Subscription pattern is empty or malformed; no subscription was created.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Published topic is not a concrete topic.
    #[error("invalid topic {topic:?}: {reason}")]
    InvalidTopic {
        /// The rejected topic.
        topic: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Asynchronous delivery requires a tokio runtime and none was reachable.
    #[error("asynchronous delivery requires a running tokio runtime")]
    RuntimeUnavailable,

    /// The bus was shut down.
    #[error("event bus is shut down")]
    Closed,
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use mpf_rules::BusError;
    ///
    /// let err = BusError::InvalidPattern { pattern: "a/**/b".into(), reason: "wildcard must be the last segment" };
    /// assert_eq!(err.as_label(), "bus_invalid_pattern");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::InvalidPattern { .. } => "bus_invalid_pattern",
            BusError::InvalidTopic { .. } => "bus_invalid_topic",
            BusError::RuntimeUnavailable => "bus_runtime_unavailable",
            BusError::Closed => "bus_closed",
        }
    }
}

/// # Errors returned by subscription handlers.
///
/// The dispatcher logs them together with the subscriber identity and topic.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler could not process the event.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Handler refused the event (payload missing fields, wrong shape, ...).
    #[error("event rejected: {reason}")]
    Rejected {
        /// Why the event was refused.
        reason: String,
    },
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        HandlerError::Failed { error: error.into() }
    }

    /// Shorthand for [`HandlerError::Rejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        HandlerError::Rejected { reason: reason.into() }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Rejected { .. } => "handler_rejected",
        }
    }
}

/// # Errors produced by plugin lifecycle calls.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PluginError {
    /// The embedded plugin manifest could not be parsed.
    #[error("invalid plugin manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// A lifecycle method was called in the wrong state.
    #[error("cannot {action} plugin in state {state:?}")]
    InvalidState {
        /// The attempted lifecycle step.
        action: &'static str,
        /// The state the plugin was in.
        state: crate::plugin::PluginState,
    },

    /// The event bus rejected a subscription.
    #[error(transparent)]
    Bus(#[from] BusError),
}

impl PluginError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PluginError::Manifest(_) => "plugin_manifest",
            PluginError::InvalidState { .. } => "plugin_invalid_state",
            PluginError::Bus(_) => "plugin_bus",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_error_display() {
        let err = BusError::InvalidTopic {
            topic: "orders//x".into(),
            reason: "empty segment",
        };
        assert_eq!(err.to_string(), r#"invalid topic "orders//x": empty segment"#);
        assert_eq!(err.as_label(), "bus_invalid_topic");
    }

    #[test]
    fn test_handler_error_helpers() {
        assert_eq!(HandlerError::failed("boom").to_string(), "handler failed: boom");
        assert_eq!(HandlerError::rejected("no id").as_label(), "handler_rejected");
    }

    #[test]
    fn test_plugin_error_wraps_bus_error() {
        let err: PluginError = BusError::RuntimeUnavailable.into();
        assert_eq!(err.as_label(), "plugin_bus");
        assert!(err.to_string().contains("tokio runtime"));
    }
}
