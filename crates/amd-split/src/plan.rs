//! Per-target exclusion sets.
//!
//! The primary build excludes every module claimed by a bundle. Each bundle
//! build excludes everything the primary wrote plus every other bundle's
//! modules, but never its own declared modules.

use amd_split_config::{ConfigError, SplitConfig};
use rustc_hash::FxHashSet;

use crate::Result;
use crate::module_set::{ModuleId, ModuleSet, difference};
use crate::naming::BundleNaming;
use crate::target::{BuildTarget, TargetKind};

/// A bundle as declared in the configuration, with its names resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleDecl {
    /// Logical name, the key under `bundles`.
    pub name: String,
    /// Output file name.
    pub file_name: String,
    /// Key of this bundle in the manifest.
    pub manifest_name: String,
    /// Declared modules, in declaration order.
    pub modules: Vec<ModuleId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    naming: BundleNaming,
    primary: BuildTarget,
    bundles: Vec<BundleDecl>,
    all_bundled: ModuleSet,
}

impl SplitPlan {
    /// Validate `config` and resolve every target that can be known before
    /// the primary build runs.
    pub fn from_config(config: &SplitConfig) -> Result<Self> {
        config.validate()?;

        let naming = BundleNaming::new(&config.bundle_prefix, &config.bundle_suffix);
        let bundles: Vec<BundleDecl> = config
            .bundles
            .iter()
            .map(|(name, modules)| BundleDecl {
                name: name.clone(),
                file_name: naming.resolve(name),
                manifest_name: naming.decorate(name),
                modules: modules.iter().map(|m| ModuleId::from(m.as_str())).collect(),
            })
            .collect();
        let all_bundled: ModuleSet = config
            .all_bundled_modules()
            .into_iter()
            .map(ModuleId::from)
            .collect();

        let out = naming.resolve_primary(config.out.as_deref());
        check_output_collisions(out.as_deref(), &bundles)?;

        let primary = BuildTarget {
            name: primary_name(config),
            kind: TargetKind::Primary,
            out,
            include: None,
            exclude: all_bundled.clone(),
        };

        Ok(Self {
            naming,
            primary,
            bundles,
            all_bundled,
        })
    }

    pub fn naming(&self) -> &BundleNaming {
        &self.naming
    }

    pub fn primary(&self) -> &BuildTarget {
        &self.primary
    }

    pub fn bundles(&self) -> &[BundleDecl] {
        &self.bundles
    }

    /// Union of every bundle's declared modules.
    pub fn all_bundled_modules(&self) -> &ModuleSet {
        &self.all_bundled
    }

    /// Target for one bundle, once the primary build has reported what it wrote.
    pub fn bundle_target(&self, bundle: &BundleDecl, primary_written: &[ModuleId]) -> BuildTarget {
        // (primary written ∪ all bundled) minus this bundle's own modules
        let claimed = primary_written.iter().chain(&self.all_bundled);
        BuildTarget {
            name: bundle.name.clone(),
            kind: TargetKind::Bundle,
            out: Some(bundle.file_name.clone()),
            include: Some(bundle.modules.clone()),
            exclude: difference(claimed, &bundle.modules),
        }
    }
}

/// Name used for the primary build in logs and errors: the entry module
/// when one is configured, then the output name.
fn primary_name(config: &SplitConfig) -> String {
    config
        .passthrough
        .get("name")
        .and_then(|name| name.as_str())
        .or(config.out.as_deref())
        .filter(|name| !name.is_empty())
        .unwrap_or("primary")
        .to_string()
}

fn check_output_collisions(primary_out: Option<&str>, bundles: &[BundleDecl]) -> Result<()> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for file_name in primary_out.into_iter().chain(bundles.iter().map(|b| b.file_name.as_str())) {
        if !seen.insert(file_name) {
            return Err(ConfigError::OutputCollision {
                name: file_name.to_string(),
            }
            .into());
        }
    }
    Ok(())
}
