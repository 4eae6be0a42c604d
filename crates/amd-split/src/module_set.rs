//! Module identifiers and the set operations used to build exclusion lists.

use std::borrow::Borrow;
use std::fmt;

use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Opaque module identifier as understood by the bundler (`app/main`,
/// `text!tpl/row.html`, ...). Equality is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ModuleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Insertion-ordered set of module ids.
///
/// Exclusion only needs set semantics, but keeping first-seen order makes the
/// requests handed to the bundler deterministic.
pub type ModuleSet = IndexSet<ModuleId>;

/// Flatten several module collections into one set.
pub fn union<'a, I, S>(collections: I) -> ModuleSet
where
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = &'a ModuleId>,
{
    collections.into_iter().flatten().cloned().collect()
}

/// Modules of `from` that do not appear in `remove`.
pub fn difference<'a, A, B>(from: A, remove: B) -> ModuleSet
where
    A: IntoIterator<Item = &'a ModuleId>,
    B: IntoIterator<Item = &'a ModuleId>,
{
    let remove: FxHashSet<&ModuleId> = remove.into_iter().collect();
    from.into_iter()
        .filter(|id| !remove.contains(id))
        .cloned()
        .collect()
}
