#![cfg_attr(docsrs, feature(doc_cfg))]

//! # amd-split
//!
//! Split an AMD application build into a primary output plus named bundles,
//! so that no module is written into more than one file, and append a
//! manifest to the primary output telling the module loader which bundle
//! holds which module.
//!
//! The module bundler itself (tracing dependencies, minifying, writing
//! content) stays outside this crate behind the [`ModuleBundler`] trait.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use amd_split::{BundleSplitter, ModuleBundler};
//! use amd_split_config::ConfigDiscovery;
//!
//! # async fn example(bundler: Arc<dyn ModuleBundler>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = ConfigDiscovery::new(".").load()?;
//! config.apply_env()?;
//!
//! let output = BundleSplitter::new(config, bundler)?.build().await?;
//! for artifact in output.artifacts() {
//!     std::fs::write(format!("dist/{}", artifact.path), &artifact.content)?;
//! }
//! # Ok(()) }
//! ```
//!
//! ### Streaming outputs
//!
//! Bundle files are available before the primary output is assembled:
//!
//! ```no_run
//! use futures::TryStreamExt;
//! # async fn example(
//! #     config: amd_split_config::SplitConfig,
//! #     bundler: std::sync::Arc<dyn amd_split::ModuleBundler>,
//! # ) -> amd_split::Result<()> {
//! let mut outputs = amd_split::split(config, bundler)?;
//! while let Some(artifact) = outputs.try_next().await? {
//!     println!("ready: {}", artifact.path);
//! }
//! # Ok(()) }
//! ```

pub mod backend;
pub mod invocation;
pub mod manifest;
pub mod module_set;
pub mod naming;
pub mod orchestrator;
pub mod plan;
pub mod stream;
pub mod target;

mod error;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

pub use backend::{BundleRequest, BundleStream, ModuleBundler, WriteRecorder};
pub use error::{BoxError, Error, Result};
pub use invocation::Invoker;
pub use manifest::{Manifest, ManifestEntry};
pub use module_set::{ModuleId, ModuleSet};
pub use naming::BundleNaming;
pub use orchestrator::{BundleSplitter, SplitPhase, split};
pub use plan::{BundleDecl, SplitPlan};
pub use stream::{ArtifactSlot, ArtifactStream, SplitHandles, SplitOutput};
pub use target::{BuildResult, BuildTarget, FileArtifact, TargetKind};
