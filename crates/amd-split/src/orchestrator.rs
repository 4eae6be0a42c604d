//! Sequencing of the primary build, the bundle builds, and manifest assembly.
//!
//! The primary build runs first. Once it has reported the modules it wrote,
//! every bundle build is spawned at the same time; bundle builds never wait
//! for each other. The primary output is finalized only after all of them
//! succeed. The first failure settles the primary output as failed, while
//! sibling builds already in flight run to completion.

use std::fmt;
use std::sync::Arc;

use amd_split_config::SplitConfig;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

use crate::backend::{BundleRequest, ModuleBundler};
use crate::error::{Error, Result};
use crate::invocation::Invoker;
use crate::manifest::{Manifest, ManifestEntry};
use crate::plan::SplitPlan;
use crate::stream::{ArtifactSlot, ArtifactStream, SplitHandles, SplitOutput};
use crate::target::FileArtifact;

/// Progress of one split build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPhase {
    Idle,
    PrimaryPending,
    PrimaryDone,
    BundlesPending,
    Assembling,
    Done,
    Failed,
}

impl SplitPhase {
    pub fn is_finished(self) -> bool {
        matches!(self, SplitPhase::Done | SplitPhase::Failed)
    }

    /// Whether `next` may directly follow `self`.
    pub fn can_advance_to(self, next: SplitPhase) -> bool {
        use SplitPhase::*;
        match (self, next) {
            (Idle, PrimaryPending)
            | (PrimaryPending, PrimaryDone)
            | (PrimaryDone, BundlesPending)
            | (BundlesPending, Assembling)
            | (Assembling, Done) => true,
            (current, Failed) => !current.is_finished(),
            _ => false,
        }
    }
}

impl fmt::Display for SplitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SplitPhase::Idle => "idle",
            SplitPhase::PrimaryPending => "primary-pending",
            SplitPhase::PrimaryDone => "primary-done",
            SplitPhase::BundlesPending => "bundles-pending",
            SplitPhase::Assembling => "assembling",
            SplitPhase::Done => "done",
            SplitPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct PhaseTracker {
    tx: watch::Sender<SplitPhase>,
}

impl PhaseTracker {
    fn advance(&self, next: SplitPhase) {
        let current = *self.tx.borrow();
        if !current.can_advance_to(next) {
            warn!(from = %current, to = %next, "unexpected split phase transition");
        }
        debug!(from = %current, to = %next, "split phase");
        self.tx.send_replace(next);
    }
}

/// Splits one application build into a primary output plus named bundles.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use amd_split::{BundleSplitter, ModuleBundler};
/// use amd_split_config::SplitConfig;
///
/// # async fn example(bundler: Arc<dyn ModuleBundler>) -> amd_split::Result<()> {
/// let config = SplitConfig::from_json_str(
///     r#"{ "out": "main", "name": "app/main", "bundles": { "editor": ["app/editor"] } }"#,
/// )?;
/// let output = BundleSplitter::new(config, bundler)?.build().await?;
/// for artifact in output.artifacts() {
///     println!("{} ({} bytes)", artifact.path, artifact.content.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BundleSplitter {
    config: Arc<SplitConfig>,
    plan: Arc<SplitPlan>,
    invoker: Invoker,
}

impl fmt::Debug for BundleSplitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleSplitter")
            .field("plan", &self.plan)
            .field("invoker", &self.invoker)
            .finish_non_exhaustive()
    }
}

impl BundleSplitter {
    /// Validate `config` and prepare the build plan. Nothing is built yet.
    pub fn new(config: SplitConfig, bundler: Arc<dyn ModuleBundler>) -> Result<Self> {
        let plan = SplitPlan::from_config(&config)?;
        let invoker = Invoker::new(bundler)
            .verbose(config.verbose)
            .timeout(config.build_timeout());

        Ok(Self {
            config: Arc::new(config),
            plan: Arc::new(plan),
            invoker,
        })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    pub fn plan(&self) -> &SplitPlan {
        &self.plan
    }

    /// Start the build on the current tokio runtime.
    ///
    /// Returns immediately with one result slot per bundle and one for the
    /// primary output.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn run(&self) -> SplitHandles {
        let (phase_tx, phase_rx) = watch::channel(SplitPhase::Idle);
        let (primary_tx, primary_rx) = oneshot::channel();

        let mut bundle_txs = Vec::with_capacity(self.plan.bundles().len());
        let mut bundle_slots = Vec::with_capacity(self.plan.bundles().len());
        for bundle in self.plan.bundles() {
            let (tx, rx) = oneshot::channel();
            bundle_txs.push(tx);
            bundle_slots.push(ArtifactSlot::new(bundle.name.clone(), rx));
        }

        let primary_slot = ArtifactSlot::new(self.plan.primary().name.clone(), primary_rx);
        let phases = PhaseTracker { tx: phase_tx };
        tokio::spawn(self.clone().drive(phases, primary_tx, bundle_txs));

        SplitHandles::new(bundle_slots, primary_slot, phase_rx)
    }

    /// Start the build and expose every output as one stream item.
    pub fn stream(&self) -> ArtifactStream {
        self.run().into_stream()
    }

    /// Build everything and wait for the complete output set.
    pub async fn build(&self) -> Result<SplitOutput> {
        self.run().join().await
    }

    async fn drive(
        self,
        phases: PhaseTracker,
        primary_tx: oneshot::Sender<Result<FileArtifact>>,
        bundle_txs: Vec<oneshot::Sender<Result<FileArtifact>>>,
    ) {
        phases.advance(SplitPhase::PrimaryPending);
        let primary_target = self.plan.primary();
        let request = BundleRequest::for_target(primary_target, &self.config.passthrough);
        let primary = match self.invoker.invoke(primary_target, request).await {
            Ok(primary) => primary,
            Err(err) => {
                phases.advance(SplitPhase::Failed);
                for (bundle, tx) in self.plan.bundles().iter().zip(bundle_txs) {
                    let _ = tx.send(Err(Error::PrimaryFailed {
                        bundle: bundle.name.clone(),
                    }));
                }
                let _ = primary_tx.send(Err(err));
                return;
            }
        };
        phases.advance(SplitPhase::PrimaryDone);

        let mut pending = FuturesUnordered::new();
        for (index, (bundle, tx)) in self.plan.bundles().iter().zip(bundle_txs).enumerate() {
            let target = self.plan.bundle_target(bundle, &primary.written_modules);
            let request = BundleRequest::for_target(&target, &self.config.passthrough);
            let invoker = self.invoker.clone();
            let manifest_name = bundle.manifest_name.clone();

            let handle = tokio::spawn(async move {
                match invoker.invoke(&target, request).await {
                    Ok(built) => {
                        let entry = ManifestEntry {
                            name: manifest_name,
                            modules: built.written_modules,
                        };
                        let _ = tx.send(Ok(built.artifact));
                        Ok(entry)
                    }
                    Err(err) => {
                        let _ = tx.send(Err(err));
                        Err(())
                    }
                }
            });
            pending.push(async move { (index, handle.await) });
        }
        phases.advance(SplitPhase::BundlesPending);

        let mut entries: Vec<Option<ManifestEntry>> = vec![None; self.plan.bundles().len()];
        while let Some((index, joined)) = pending.next().await {
            let bundle = &self.plan.bundles()[index].name;
            let failure = match joined {
                Ok(Ok(entry)) => {
                    entries[index] = Some(entry);
                    continue;
                }
                Ok(Err(())) => Error::BundleFailed {
                    bundle: bundle.clone(),
                },
                Err(join_err) => Error::TaskPanicked {
                    target: bundle.clone(),
                    message: join_err.to_string(),
                },
            };
            // Remaining bundle tasks keep running; only their results are dropped.
            phases.advance(SplitPhase::Failed);
            let _ = primary_tx.send(Err(failure));
            return;
        }

        phases.advance(SplitPhase::Assembling);
        let manifest = Manifest::new(entries.into_iter().flatten().collect());
        let assembled = manifest
            .render(&self.config.require_config, &self.config.config_call)
            .map(|statement| {
                let mut artifact = primary.artifact;
                artifact.append(&statement);
                artifact
            });

        phases.advance(if assembled.is_ok() {
            SplitPhase::Done
        } else {
            SplitPhase::Failed
        });
        let _ = primary_tx.send(assembled);
    }
}

/// Split a build and return its outputs as a stream: one item per bundle,
/// then the primary output carrying the manifest.
pub fn split(config: SplitConfig, bundler: Arc<dyn ModuleBundler>) -> Result<ArtifactStream> {
    Ok(BundleSplitter::new(config, bundler)?.stream())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_allowed() {
        let path = [
            SplitPhase::Idle,
            SplitPhase::PrimaryPending,
            SplitPhase::PrimaryDone,
            SplitPhase::BundlesPending,
            SplitPhase::Assembling,
            SplitPhase::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn any_unfinished_phase_may_fail() {
        assert!(SplitPhase::PrimaryPending.can_advance_to(SplitPhase::Failed));
        assert!(SplitPhase::BundlesPending.can_advance_to(SplitPhase::Failed));
        assert!(SplitPhase::Assembling.can_advance_to(SplitPhase::Failed));
        assert!(!SplitPhase::Done.can_advance_to(SplitPhase::Failed));
        assert!(!SplitPhase::Failed.can_advance_to(SplitPhase::Failed));
    }

    #[test]
    fn bundles_never_start_before_primary_is_done() {
        assert!(!SplitPhase::PrimaryPending.can_advance_to(SplitPhase::BundlesPending));
        assert!(!SplitPhase::Idle.can_advance_to(SplitPhase::Assembling));
        assert!(!SplitPhase::BundlesPending.can_advance_to(SplitPhase::Done));
    }
}
