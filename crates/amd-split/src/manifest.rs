//! The bundle manifest appended to the primary output.
//!
//! Module loaders read this statement at startup to learn which bundle file
//! provides which module, so key order follows bundle declaration order and
//! module order follows bundler write order.

use amd_split_config::merge_values;
use serde_json::{Map, Value};

use crate::Result;
use crate::module_set::ModuleId;

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    /// Decorated bundle name, the key loaders look modules up under.
    pub name: String,
    pub modules: Vec<ModuleId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// The `bundles` mapping on its own.
    pub fn bundles_value(&self) -> Value {
        let bundles: Map<String, Value> = self
            .entries
            .iter()
            .map(|entry| {
                let modules = entry
                    .modules
                    .iter()
                    .map(|id| Value::from(id.as_str()))
                    .collect();
                (entry.name.clone(), Value::Array(modules))
            })
            .collect();
        Value::Object(bundles)
    }

    /// Caller-supplied loader config deep-merged with `{ "bundles": ... }`.
    ///
    /// Floats with no fractional part become integers (`7.0` is written as
    /// `7`), matching how JavaScript loaders print numbers.
    pub fn to_value(&self, require_config: &Map<String, Value>) -> Value {
        let mut config = Value::Object(require_config.clone());
        let mut update = Map::new();
        update.insert("bundles".to_string(), self.bundles_value());
        merge_values(&mut config, &Value::Object(update));
        normalize_numbers(&mut config);
        config
    }

    /// Render the statement appended to the primary output:
    /// a newline, `call(<pretty JSON>);`, and a trailing newline.
    ///
    /// # Errors
    ///
    /// [`Error::Assembly`](crate::Error::Assembly) if serialization fails.
    /// A manifest built from JSON values always serializes today, so this
    /// only surfaces if the value model stops being plain JSON.
    pub fn render(&self, require_config: &Map<String, Value>, call: &str) -> Result<String> {
        let json = serde_json::to_string_pretty(&self.to_value(require_config))?;
        Ok(format!("\n{call}({json});\n"))
    }

    /// Parse the manifest object back out of a finished primary output.
    ///
    /// Returns `None` when the content does not end with a `call(...);`
    /// statement holding a JSON object.
    pub fn extract(content: &str, call: &str) -> Option<Value> {
        let body = content.trim_end().strip_suffix(");")?;
        let start = body.rfind(&format!("\n{call}("))? + call.len() + 2;
        let value: Value = serde_json::from_str(&body[start..]).ok()?;
        value.is_object().then_some(value)
    }
}

/// Largest integer an f64 holds exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn normalize_numbers(value: &mut Value) {
    if let Some(integral) = integral_float(value) {
        *value = Value::from(integral);
        return;
    }
    match value {
        Value::Array(items) => items.iter_mut().for_each(normalize_numbers),
        Value::Object(map) => map.values_mut().for_each(normalize_numbers),
        _ => {}
    }
}

fn integral_float(value: &Value) -> Option<i64> {
    let float = match value {
        Value::Number(number) if number.is_f64() => number.as_f64()?,
        _ => return None,
    };
    (float.fract() == 0.0 && float.abs() <= MAX_EXACT_INTEGER).then_some(float as i64)
}
