//! Result slots for a running split build and their stream form.
//!
//! Each output (every bundle, then the manifest-carrying primary) settles
//! exactly once. Bundle slots settle as soon as their own build finishes;
//! the primary slot settles after assembly.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::try_join_all;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::{oneshot, watch};

use crate::error::{Error, Result};
use crate::orchestrator::SplitPhase;
use crate::target::FileArtifact;

/// All outputs of a split build as they become available.
///
/// A failed output appears as an `Err` item; consumers that stop at the first
/// error (`try_collect`, `try_for_each`) never see a partial output set.
pub type ArtifactStream = BoxStream<'static, Result<FileArtifact>>;

/// Future resolving to one output file.
#[derive(Debug)]
pub struct ArtifactSlot {
    target: String,
    rx: oneshot::Receiver<Result<FileArtifact>>,
}

impl ArtifactSlot {
    pub(crate) fn new(target: String, rx: oneshot::Receiver<Result<FileArtifact>>) -> Self {
        Self { target, rx }
    }

    /// Logical name of the build feeding this slot.
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Future for ArtifactSlot {
    type Output = Result<FileArtifact>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(Error::Abandoned {
                    target: this.target.clone(),
                })
            })
        })
    }
}

/// Handles to a running split build.
#[derive(Debug)]
pub struct SplitHandles {
    bundles: Vec<ArtifactSlot>,
    primary: ArtifactSlot,
    phase: watch::Receiver<SplitPhase>,
}

impl SplitHandles {
    pub(crate) fn new(
        bundles: Vec<ArtifactSlot>,
        primary: ArtifactSlot,
        phase: watch::Receiver<SplitPhase>,
    ) -> Self {
        Self {
            bundles,
            primary,
            phase,
        }
    }

    /// Current phase of the build.
    pub fn phase(&self) -> SplitPhase {
        *self.phase.borrow()
    }

    /// Receiver notified on every phase change.
    pub fn watch_phase(&self) -> watch::Receiver<SplitPhase> {
        self.phase.clone()
    }

    /// Bundle slots in declaration order, and the primary slot.
    pub fn into_parts(self) -> (Vec<ArtifactSlot>, ArtifactSlot) {
        (self.bundles, self.primary)
    }

    /// Merge every slot into one stream, yielding outputs in completion order.
    pub fn into_stream(self) -> ArtifactStream {
        let slots = self
            .bundles
            .into_iter()
            .chain(std::iter::once(self.primary))
            .map(stream::once);
        stream::select_all(slots).boxed()
    }

    /// Wait for the complete output set.
    ///
    /// Fails as soon as any build fails. When a bundle failure is what stopped
    /// the primary output, that bundle's own error is returned.
    pub async fn join(self) -> Result<SplitOutput> {
        let SplitHandles {
            bundles, primary, ..
        } = self;

        match primary.await {
            Ok(primary) => Ok(SplitOutput {
                bundles: try_join_all(bundles).await?,
                primary,
            }),
            Err(Error::BundleFailed { bundle }) => {
                let cause = match bundles.into_iter().find(|slot| slot.target() == bundle) {
                    Some(slot) => slot.await.err(),
                    None => None,
                };
                Err(cause.unwrap_or(Error::BundleFailed { bundle }))
            }
            Err(err) => Err(err),
        }
    }
}

/// The complete, consistent output set of a split build.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutput {
    /// Bundle files in declaration order.
    pub bundles: Vec<FileArtifact>,
    /// Primary file with the manifest appended.
    pub primary: FileArtifact,
}

impl SplitOutput {
    /// Bundles first, then the primary output.
    pub fn artifacts(&self) -> impl Iterator<Item = &FileArtifact> {
        self.bundles.iter().chain(std::iter::once(&self.primary))
    }

    pub fn into_artifacts(self) -> Vec<FileArtifact> {
        let mut artifacts = self.bundles;
        artifacts.push(self.primary);
        artifacts
    }

    pub fn get(&self, path: &str) -> Option<&FileArtifact> {
        self.artifacts().find(|artifact| artifact.path == path)
    }
}
