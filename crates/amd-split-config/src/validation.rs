//! Schema validation for split configurations.
//!
//! Only the shape of the configuration is checked here. Output file name
//! collisions depend on name decoration and are checked when the build plan
//! is made.

use indexmap::IndexMap;
use tracing::warn;

use crate::config::SplitConfig;
use crate::error::{ConfigError, Result};

impl SplitConfig {
    /// Validate the configuration before any build is issued.
    ///
    /// A module declared by more than one bundle is allowed: each of those
    /// bundles will contain it. A warning is logged for every such module.
    ///
    /// # Example
    ///
    /// ```
    /// use amd_split_config::SplitConfig;
    ///
    /// let config = SplitConfig::from_json_str(r#"{ "bundles": { "": ["a"] } }"#).unwrap();
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.config_call.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "configCall".to_string(),
                hint: Some("Use a loader call such as 'require.config'".to_string()),
            });
        }

        if self.build_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "buildTimeoutMs".to_string(),
                hint: Some("Omit the field to disable the timeout".to_string()),
            });
        }

        let mut owners: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for (bundle, modules) in &self.bundles {
            if bundle.trim().is_empty() {
                return Err(ConfigError::EmptyBundleName);
            }
            for module in modules {
                if module.trim().is_empty() {
                    return Err(ConfigError::EmptyModuleId {
                        bundle: bundle.clone(),
                    });
                }
                let claimed_by = owners.entry(module.as_str()).or_default();
                if !claimed_by.contains(&bundle.as_str()) {
                    claimed_by.push(bundle.as_str());
                }
            }
        }

        for (module, bundles) in owners.iter().filter(|(_, b)| b.len() > 1) {
            warn!(
                module = %module,
                bundles = ?bundles,
                "module is declared by several bundles and will be written into each of them"
            );
        }

        Ok(())
    }
}
