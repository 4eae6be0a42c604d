//! Runs one build through the external bundler and captures what it wrote.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, info};

use crate::backend::{BundleRequest, ModuleBundler, WriteRecorder};
use crate::error::{Error, Result};
use crate::target::{BuildResult, BuildTarget};

/// Issues build invocations against a shared bundler.
#[derive(Clone)]
pub struct Invoker {
    bundler: Arc<dyn ModuleBundler>,
    verbose: bool,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("verbose", &self.verbose)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Invoker {
    pub fn new(bundler: Arc<dyn ModuleBundler>) -> Self {
        Self {
            bundler,
            verbose: false,
            timeout: None,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build `target` and wait for its single output file.
    ///
    /// The first item of the bundler stream settles the invocation. An error
    /// item fails it; a stream that ends without any item fails with
    /// [`Error::EmptyOutput`].
    pub async fn invoke(
        &self,
        target: &BuildTarget,
        request: BundleRequest,
    ) -> Result<BuildResult> {
        let recorder = WriteRecorder::new();
        debug!(
            target = %target.name,
            kind = %target.kind,
            excluded = target.exclude.len(),
            "issuing build"
        );

        let mut stream = self.bundler.bundle(request, recorder.clone());
        let first = match self.timeout {
            Some(after) => tokio::time::timeout(after, stream.next())
                .await
                .map_err(|_| Error::Timeout {
                    target: target.name.clone(),
                    after,
                })?,
            None => stream.next().await,
        };

        let artifact = match first {
            Some(Ok(artifact)) => artifact,
            Some(Err(source)) => {
                return Err(Error::Build {
                    target: target.name.clone(),
                    kind: target.kind,
                    source,
                });
            }
            None => {
                return Err(Error::EmptyOutput {
                    target: target.name.clone(),
                });
            }
        };

        let written_modules = recorder.take();
        if self.verbose {
            info!(
                "Generated {} {} ({}), modules included:",
                target.kind,
                target.name,
                artifact.path
            );
            for module in &written_modules {
                info!(" > {}", module);
            }
        } else {
            debug!(
                target = %target.name,
                path = %artifact.path,
                modules = written_modules.len(),
                "build finished"
            );
        }

        Ok(BuildResult {
            target_name: target.name.clone(),
            artifact,
            written_modules,
        })
    }
}
