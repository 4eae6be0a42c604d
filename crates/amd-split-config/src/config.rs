//! High-level configuration structure for amd-split.
//!
//! This module provides the `SplitConfig` struct and JSON value merging.
//! For file discovery, see the `discovery` module.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result as ConfigResult};

/// Function called by the manifest statement appended to the primary output.
pub const DEFAULT_CONFIG_CALL: &str = "require.config";

/// Options for one split build: a primary output plus named bundles.
///
/// Keys use the camelCase spelling of the r.js optimizer options. Any
/// key not recognised here lands in `passthrough` and is handed to every
/// build invocation unchanged (`name`, `baseUrl`, `paths`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SplitConfig {
    /// Primary output name; the bundler picks its default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out: Option<String>,

    /// Bundle name to the module ids it should contain, in declaration order.
    #[serde(deserialize_with = "null_as_default")]
    pub bundles: IndexMap<String, Vec<String>>,

    /// Extra fields merged into the emitted manifest object.
    #[serde(deserialize_with = "null_as_default")]
    pub require_config: Map<String, Value>,

    #[serde(deserialize_with = "null_as_default")]
    pub bundle_suffix: String,

    #[serde(deserialize_with = "null_as_default")]
    pub bundle_prefix: String,

    /// Report written modules per build at info level.
    pub verbose: bool,

    /// Callee of the manifest statement, `require.config` unless overridden.
    pub config_call: String,

    /// Upper bound for a single build invocation, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_timeout_ms: Option<u64>,

    #[serde(flatten)]
    pub passthrough: Map<String, Value>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            out: None,
            bundles: IndexMap::new(),
            require_config: Map::new(),
            bundle_suffix: String::new(),
            bundle_prefix: String::new(),
            verbose: false,
            config_call: DEFAULT_CONFIG_CALL.to_string(),
            build_timeout_ms: None,
            passthrough: Map::new(),
        }
    }
}

impl SplitConfig {
    /// Create from serde_json::Value (for programmatic config from a build pipeline)
    ///
    /// # Example
    ///
    /// ```
    /// use amd_split_config::SplitConfig;
    /// use serde_json::json;
    ///
    /// let value = json!({
    ///     "out": "main",
    ///     "name": "app/main",
    ///     "bundles": { "editor": ["app/editor"], "admin": ["app/admin"] }
    /// });
    ///
    /// let config = SplitConfig::from_value(value).unwrap();
    /// let names: Vec<_> = config.bundles.keys().cloned().collect();
    /// assert_eq!(names, ["editor", "admin"]);
    /// assert_eq!(config.passthrough["name"], "app/main");
    /// ```
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        if !value.is_object() {
            return Err(ConfigError::InvalidValue {
                field: "config".to_string(),
                hint: Some("expected a JSON object at the top level".to_string()),
            });
        }
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    pub fn from_json_str(source: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(source).map_err(|e| ConfigError::InvalidValue {
            field: "json".to_string(),
            hint: Some(format!("Invalid JSON: {e}")),
        })?;
        Self::from_value(value)
    }

    /// Convert to serde_json::Value
    pub fn to_value(&self) -> ConfigResult<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Every module claimed by some bundle, in declaration order.
    ///
    /// A module listed by two bundles shows up twice.
    pub fn all_bundled_modules(&self) -> Vec<&str> {
        self.bundles
            .values()
            .flat_map(|modules| modules.iter().map(String::as_str))
            .collect()
    }

    pub fn build_timeout(&self) -> Option<std::time::Duration> {
        self.build_timeout_ms.map(std::time::Duration::from_millis)
    }
}

/// Deep-merge `update` into `target`.
///
/// Objects merge key by key (existing keys keep their position, new keys are
/// appended); any other value in `update` replaces the target slot.
pub fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
