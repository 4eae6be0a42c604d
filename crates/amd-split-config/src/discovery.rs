//! Locating split configuration next to a project.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::SplitConfig;
use crate::error::{ConfigError, Result};

/// Field of `package.json` holding an embedded configuration.
pub const PACKAGE_JSON_FIELD: &str = "amdSplit";

/// Looks for a split configuration in one project directory.
///
/// Build pipelines that already hold the options should call
/// `SplitConfig::from_value()` instead.
///
/// # Example
///
/// ```no_run
/// use amd_split_config::ConfigDiscovery;
///
/// let config = ConfigDiscovery::new("web").load().unwrap();
/// println!("{} bundles", config.bundles.len());
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of the first configuration source present under the root:
    /// 1. `amd-split.toml`
    /// 2. `amd-split.json`
    /// 3. `package.json` with an `amdSplit` field
    pub fn find(&self) -> Option<PathBuf> {
        for candidate in ["amd-split.toml", "amd-split.json"] {
            let path = self.root.join(candidate);
            if path.exists() {
                return Some(path);
            }
        }

        let pkg_path = self.root.join("package.json");
        let content = fs::read_to_string(&pkg_path).ok()?;
        let parsed: Value = serde_json::from_str(&content).ok()?;
        parsed
            .get(PACKAGE_JSON_FIELD)
            .is_some_and(|field| !field.is_null())
            .then_some(pkg_path)
    }

    /// Find and parse the configuration.
    ///
    /// Fails with `ConfigError::NotFound` when [`find`](Self::find) comes up empty.
    pub fn load(&self) -> Result<SplitConfig> {
        let path = self.find().ok_or_else(|| ConfigError::NotFound {
            root: self.root.clone(),
        })?;
        self.load_from(&path)
    }

    /// Parse one configuration file. The format follows the file name.
    ///
    /// Bundle declaration order is kept for both TOML and JSON sources.
    pub fn load_from(&self, path: &Path) -> Result<SplitConfig> {
        let content = fs::read_to_string(path)?;

        if path.file_name() == Some(std::ffi::OsStr::new("package.json")) {
            return load_from_package_json(&content);
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                let toml_val: toml::Value =
                    toml::from_str(&content).map_err(|e| ConfigError::InvalidValue {
                        field: "toml".to_string(),
                        hint: Some(format!("Invalid TOML syntax: {}", e)),
                    })?;

                let value =
                    serde_json::to_value(toml_val).map_err(|e| ConfigError::InvalidValue {
                        field: "toml".to_string(),
                        hint: Some(format!("TOML to JSON conversion failed: {}", e)),
                    })?;

                SplitConfig::from_value(value)
            }
            Some("json") => SplitConfig::from_json_str(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

fn load_from_package_json(content: &str) -> Result<SplitConfig> {
    let mut parsed: Value =
        serde_json::from_str(content).map_err(|e| ConfigError::InvalidValue {
            field: "package.json".to_string(),
            hint: Some(format!("Invalid JSON: {}", e)),
        })?;

    match parsed.get_mut(PACKAGE_JSON_FIELD).map(Value::take) {
        Some(value) if !value.is_null() => SplitConfig::from_value(value),
        _ => Err(ConfigError::InvalidValue {
            field: PACKAGE_JSON_FIELD.to_string(),
            hint: Some("Add an 'amdSplit' field to your package.json".to_string()),
        }),
    }
}
