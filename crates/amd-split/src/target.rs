//! Build targets and the artifacts they produce.

use std::fmt;

use crate::module_set::{ModuleId, ModuleSet};

/// Whether a target is the primary output or one of the named bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Primary,
    Bundle,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Primary => write!(f, "primary"),
            TargetKind::Bundle => write!(f, "bundle"),
        }
    }
}

/// One build invocation: what to include, what to leave out, where to write.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildTarget {
    /// Logical name: the bundle name, or the primary `out` option.
    pub name: String,
    pub kind: TargetKind,
    /// Resolved output file name. `None` lets the bundler pick its default.
    pub out: Option<String>,
    /// Explicit include list. Only bundles carry one.
    pub include: Option<Vec<ModuleId>>,
    /// Modules the bundler must not write (shallow exclusion).
    pub exclude: ModuleSet,
}

impl BuildTarget {
    pub fn is_primary(&self) -> bool {
        self.kind == TargetKind::Primary
    }
}

/// An output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArtifact {
    pub path: String,
    pub content: Vec<u8>,
}

impl FileArtifact {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Content as text, replacing invalid UTF-8.
    pub fn content_as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    pub(crate) fn append(&mut self, text: &str) {
        self.content.extend_from_slice(text.as_bytes());
    }
}

/// Outcome of one completed build invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildResult {
    pub target_name: String,
    pub artifact: FileArtifact,
    /// Modules in the order the bundler reported writing them.
    pub written_modules: Vec<ModuleId>,
}
