use std::time::Duration;

use crate::target::TargetKind;

/// Error reported by the external bundler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for amd-split operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration, detected before any build is issued.
    #[error("Invalid configuration: {0}")]
    Config(#[from] amd_split_config::ConfigError),

    /// The bundler reported an error for one build.
    #[error("{kind} build '{target}' failed: {source}")]
    Build {
        target: String,
        kind: TargetKind,
        #[source]
        source: BoxError,
    },

    /// The bundler finished without producing an output file.
    #[error("build '{target}' produced no output")]
    EmptyOutput { target: String },

    /// The bundler did not produce an output file in time.
    #[error("build '{target}' timed out after {after:?}")]
    Timeout { target: String, after: Duration },

    /// The bundle was never built because the primary build failed.
    #[error("bundle '{bundle}' skipped: primary build failed")]
    PrimaryFailed { bundle: String },

    /// The primary output cannot be finalized because a bundle failed.
    #[error("primary output abandoned: bundle '{bundle}' failed")]
    BundleFailed { bundle: String },

    /// The manifest could not be serialized. Reported on the primary slot.
    #[error("failed to assemble bundle manifest: {0}")]
    Assembly(#[from] serde_json::Error),

    /// A build task panicked.
    #[error("build task '{target}' panicked: {message}")]
    TaskPanicked { target: String, message: String },

    /// The task responsible for an output went away without a result.
    #[error("no result was produced for '{target}'")]
    Abandoned { target: String },
}

/// Result type alias for amd-split operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error was caused by another build failing first.
    pub fn is_secondary(&self) -> bool {
        matches!(self, Error::PrimaryFailed { .. } | Error::BundleFailed { .. })
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Config(_) => "INVALID_CONFIG",
            Error::Build { .. } => "BUILD_FAILURE",
            Error::EmptyOutput { .. } => "EMPTY_OUTPUT",
            Error::Timeout { .. } => "BUILD_TIMEOUT",
            Error::PrimaryFailed { .. } => "PRIMARY_FAILED",
            Error::BundleFailed { .. } => "BUNDLE_FAILED",
            Error::Assembly(_) => "ASSEMBLY_ERROR",
            Error::TaskPanicked { .. } => "TASK_PANICKED",
            Error::Abandoned { .. } => "ABANDONED",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Config(err) => Some(Box::new(format!(
                "Check the bundles, bundlePrefix and bundleSuffix options.\nError: {}",
                err
            ))),
            Error::EmptyOutput { target } => Some(Box::new(format!(
                "The bundler returned no file for '{}'. Check its entry point and output options.",
                target
            ))),
            Error::Timeout { .. } => Some(Box::new(
                "Raise buildTimeoutMs or remove it to wait indefinitely.",
            )),
            Error::PrimaryFailed { .. } | Error::BundleFailed { .. } => Some(Box::new(
                "Another build failed first. See the error reported for it.",
            )),
            Error::TaskPanicked { .. } => Some(Box::new(
                "The bundler panicked while building. Please report it.",
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn serialization_failure_is_an_assembly_error() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(cause);

        assert!(matches!(err, Error::Assembly(_)));
        assert!(!err.is_secondary());
        assert_eq!(err.code().unwrap().to_string(), "ASSEMBLY_ERROR");
        assert!(err.to_string().starts_with("failed to assemble bundle manifest"));
    }

    #[test]
    fn secondary_errors_point_at_the_first_failure() {
        let err = Error::BundleFailed { bundle: "a".to_string() };
        assert!(err.is_secondary());
        assert!(err.help().is_some());
    }
}
