//! Environment overrides for scalar options.
//!
//! Only plain values can be overridden this way. `bundles` and
//! `requireConfig` always come from the configuration source so that
//! declaration order survives.

use figment::Figment;
use figment::providers::Env;
use serde::{Deserialize, Deserializer};

use crate::config::SplitConfig;
use crate::error::{ConfigError, Result};

pub const ENV_PREFIX: &str = "AMD_SPLIT_";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvOverrides {
    #[serde(deserialize_with = "scalar_as_string")]
    out: Option<String>,
    verbose: Option<bool>,
    #[serde(deserialize_with = "scalar_as_string")]
    bundle_prefix: Option<String>,
    #[serde(deserialize_with = "scalar_as_string")]
    bundle_suffix: Option<String>,
    #[serde(deserialize_with = "scalar_as_string")]
    config_call: Option<String>,
    build_timeout_ms: Option<u64>,
}

/// `Env` parses `2024` or `true` as a number or a bool; text options take them back as written.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrScalar {
    String(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
}

fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrScalar>::deserialize(deserializer)?.map(|value| match value {
        StringOrScalar::String(text) => text,
        StringOrScalar::Unsigned(n) => n.to_string(),
        StringOrScalar::Signed(n) => n.to_string(),
        StringOrScalar::Float(n) => n.to_string(),
        StringOrScalar::Bool(b) => b.to_string(),
    }))
}

impl SplitConfig {
    /// Overlay `AMD_SPLIT_*` environment variables onto this configuration.
    ///
    /// `AMD_SPLIT_VERBOSE=true` turns on verbose reporting,
    /// `AMD_SPLIT_BUNDLE_SUFFIX=.min` decorates every bundle name, and so on.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_figment(Figment::from(Env::prefixed(ENV_PREFIX)))
    }

    /// Overlay any figment whose keys use the snake_case option names.
    pub fn apply_figment(&mut self, figment: Figment) -> Result<()> {
        let overrides: EnvOverrides =
            figment.extract().map_err(|e| ConfigError::InvalidValue {
                field: "environment".to_string(),
                hint: Some(e.to_string()),
            })?;

        if let Some(out) = overrides.out {
            self.out = Some(out);
        }
        if let Some(verbose) = overrides.verbose {
            self.verbose = verbose;
        }
        if let Some(prefix) = overrides.bundle_prefix {
            self.bundle_prefix = prefix;
        }
        if let Some(suffix) = overrides.bundle_suffix {
            self.bundle_suffix = suffix;
        }
        if let Some(call) = overrides.config_call {
            self.config_call = call;
        }
        if let Some(timeout) = overrides.build_timeout_ms {
            self.build_timeout_ms = Some(timeout);
        }
        Ok(())
    }
}
