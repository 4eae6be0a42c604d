//! The seam to the external module bundler.
//!
//! amd-split never traces or writes modules itself. A [`ModuleBundler`]
//! receives a [`BundleRequest`], reports every module it writes through the
//! [`WriteRecorder`] handed to it, and yields the built file as the single
//! item of a [`BundleStream`].

use std::sync::Arc;

use futures::stream::BoxStream;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::error::BoxError;
use crate::module_set::ModuleId;
use crate::target::{BuildTarget, FileArtifact, TargetKind};

/// Output of one bundler invocation: exactly one file, or an error.
pub type BundleStream = BoxStream<'static, std::result::Result<FileArtifact, BoxError>>;

/// External bundler that resolves, traces and writes modules.
pub trait ModuleBundler: Send + Sync {
    fn bundle(&self, request: BundleRequest, recorder: WriteRecorder) -> BundleStream;
}

impl<F> ModuleBundler for F
where
    F: Fn(BundleRequest, WriteRecorder) -> BundleStream + Send + Sync,
{
    fn bundle(&self, request: BundleRequest, recorder: WriteRecorder) -> BundleStream {
        self(request, recorder)
    }
}

/// Collects the ids of modules written during a single invocation.
///
/// Each invocation gets a fresh recorder, so concurrent bundle builds never
/// see each other's writes.
#[derive(Debug, Clone, Default)]
pub struct WriteRecorder {
    written: Arc<Mutex<Vec<ModuleId>>>,
}

impl WriteRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the bundler each time it writes a module.
    pub fn record(&self, module: impl Into<ModuleId>) {
        self.written.lock().push(module.into());
    }

    pub fn len(&self) -> usize {
        self.written.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.written.lock().is_empty()
    }

    pub fn take(&self) -> Vec<ModuleId> {
        std::mem::take(&mut *self.written.lock())
    }
}

/// Module-resolution configuration for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleRequest {
    pub target: String,
    pub kind: TargetKind,
    pub out: Option<String>,
    pub include: Option<Vec<ModuleId>>,
    pub exclude_shallow: Vec<ModuleId>,
    /// Caller options passed through unchanged.
    pub options: Map<String, Value>,
}

impl BundleRequest {
    pub fn for_target(target: &BuildTarget, options: &Map<String, Value>) -> Self {
        Self {
            target: target.name.clone(),
            kind: target.kind,
            out: target.out.clone(),
            include: target.include.clone(),
            exclude_shallow: target.exclude.iter().cloned().collect(),
            options: options.clone(),
        }
    }

    /// Flatten into a single r.js-style options object.
    ///
    /// Passthrough options come first; `out`, `include` and `excludeShallow`
    /// override them when set. Bundles also clear `insertRequire`, which only
    /// makes sense for the primary output.
    pub fn to_resolver_config(&self) -> Value {
        let mut config = self.options.clone();
        if let Some(out) = &self.out {
            config.insert("out".to_string(), Value::from(out.as_str()));
        }
        if let Some(include) = &self.include {
            config.insert("include".to_string(), ids_to_value(include));
        }
        config.insert(
            "excludeShallow".to_string(),
            ids_to_value(&self.exclude_shallow),
        );
        if self.kind == TargetKind::Bundle {
            config.insert("insertRequire".to_string(), Value::Null);
        }
        Value::Object(config)
    }
}

fn ids_to_value(ids: &[ModuleId]) -> Value {
    Value::Array(ids.iter().map(|id| Value::from(id.as_str())).collect())
}
