//! # Plugin contract.
//!
//! A plugin is loaded by the host, handed a [`Host`] once, then started and
//! stopped. Each step is only valid from the state before it:
//!
//! ```text
//! Created ──initialize(host)──► Initialized ──start()──► Running ──stop()──► Stopped
//!                                    │                                  ▲
//!                                    └──────────────stop()──────────────┘
//! ```
//!
//! Calling a step out of order returns [`PluginError::InvalidState`] and leaves
//! the plugin unchanged.
//!
//! [`PluginError::InvalidState`]: crate::PluginError::InvalidState

mod host;
mod metadata;

pub use host::{Host, MenuItem, Menu, Navigation, ResourceProbe};
pub use metadata::{PluginMetadata, Requirement};

use crate::error::PluginError;

/// Lifecycle state of a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Created,
    Initialized,
    Running,
    Stopped,
}

impl PluginState {
    /// Returns the state after `action`, or [`PluginError::InvalidState`].
    pub fn advance(self, action: &'static str) -> Result<PluginState, PluginError> {
        use PluginState::*;
        match (self, action) {
            (Created, "initialize") => Ok(Initialized),
            (Initialized, "start") => Ok(Running),
            (Initialized | Running, "stop") => Ok(Stopped),
            (state, action) => Err(PluginError::InvalidState { action, state }),
        }
    }
}

/// A unit of functionality loaded into the host.
pub trait Plugin: Send + Sync + 'static {
    /// Parsed manifest.
    fn metadata(&self) -> &PluginMetadata;

    fn state(&self) -> PluginState;

    /// Receives the host services; no side effects visible to other plugins.
    fn initialize(&mut self, host: Host) -> Result<(), PluginError>;

    /// Registers routes, menu items and bus subscriptions.
    fn start(&mut self) -> Result<(), PluginError>;

    /// Undoes everything `start` registered on shared services.
    fn stop(&mut self) -> Result<(), PluginError>;

    fn id(&self) -> &str {
        &self.metadata().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let s = PluginState::Created.advance("initialize").unwrap();
        assert_eq!(s, PluginState::Initialized);
        assert_eq!(s.advance("start").unwrap(), PluginState::Running);
        assert_eq!(s.advance("stop").unwrap(), PluginState::Stopped);
        assert_eq!(PluginState::Running.advance("stop").unwrap(), PluginState::Stopped);
    }

    #[test]
    fn test_out_of_order_is_rejected() {
        let err = PluginState::Created.advance("start").unwrap_err();
        assert_eq!(err.as_label(), "plugin_invalid_state");
        assert!(PluginState::Stopped.advance("stop").is_err());
        assert!(PluginState::Running.advance("initialize").is_err());
    }
}
