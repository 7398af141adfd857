//! Plugin manifest parsing.
//!
//! Every plugin ships a JSON manifest describing itself to the host. Keys are
//! camelCase; everything except `id`, `name` and `version` is optional.
//!
//! ```json
//! {
//!   "id": "com.biiz.rules",
//!   "name": "Rules Plugin",
//!   "version": "1.0.0",
//!   "requires": [{ "type": "service", "id": "INavigation", "min": "1.0" }],
//!   "provides": ["RulesService"],
//!   "qmlModules": ["Biiz.Rules"],
//!   "priority": 20
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// A dependency declared in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Kind of dependency, e.g. `"service"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Identifier of the required item.
    pub id: String,
    /// Minimum version, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
}

/// Parsed plugin manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginMetadata {
    /// Reverse-DNS plugin id; also the plugin's subscriber identity on the bus.
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub requires: Vec<Requirement>,
    /// Services the plugin offers to others.
    #[serde(default)]
    pub provides: Vec<String>,
    #[serde(default)]
    pub qml_modules: Vec<String>,
    /// Load order hint; lower loads first.
    #[serde(default)]
    pub priority: i32,
}

impl PluginMetadata {
    /// Parses and validates a manifest.
    ///
    /// # Errors
    /// [`PluginError::Manifest`] for malformed JSON, missing required keys or
    /// an empty `id`/`name`/`version`.
    pub fn from_json(json: &str) -> Result<Self, PluginError> {
        let meta: PluginMetadata = serde_json::from_str(json)?;
        for (key, value) in [("id", &meta.id), ("name", &meta.name), ("version", &meta.version)] {
            if value.trim().is_empty() {
                return Err(PluginError::Manifest(<serde_json::Error as serde::de::Error>::custom(
                    format!("{key} must not be empty"),
                )));
            }
        }
        Ok(meta)
    }

    /// First declared QML module, if any.
    pub fn qml_module_uri(&self) -> Option<&str> {
        self.qml_modules.first().map(String::as_str)
    }

    /// True if the manifest requires the service `id`.
    pub fn requires_service(&self, id: &str) -> bool {
        self.requires.iter().any(|r| r.kind == "service" && r.id == id)
    }
}
