//! Logging utilities for amd-split
//!
//! This module is only available with the `logging` feature.
//!
//! amd-split itself only emits tracing events. Applications that do not
//! install their own subscriber can use these functions.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log level for amd-split output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    /// Phase changes stay hidden; verbose module listings are shown.
    #[default]
    Info,
    /// Every phase change and build request.
    Debug,
}

impl LogLevel {
    /// Pick the level matching the `verbose` option.
    pub fn for_verbose(verbose: bool) -> Self {
        if verbose { LogLevel::Debug } else { LogLevel::Info }
    }

    fn directive(&self) -> &'static str {
        match self {
            LogLevel::Silent => "amd_split=off,amd_split_config=off",
            LogLevel::Error => "amd_split=error,amd_split_config=error",
            LogLevel::Warn => "amd_split=warn,amd_split_config=warn",
            LogLevel::Info => "amd_split=info,amd_split_config=info",
            LogLevel::Debug => "amd_split=debug,amd_split_config=debug",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "verbose" => Ok(LogLevel::Debug),
            other => Err(format!("Invalid log level: {}", other)),
        }
    }
}

/// Install a compact stderr subscriber at `level`.
///
/// Only the first call in a process has any effect. `RUST_LOG` directives
/// still apply on top of the chosen level.
///
/// ```rust,no_run
/// use amd_split::logging::{init_logging, LogLevel};
///
/// init_logging(LogLevel::for_verbose(true));
/// ```
pub fn init_logging(level: LogLevel) {
    INIT.call_once(|| install(EnvFilter::new(level.directive())));
}

/// Install a subscriber configured from `RUST_LOG`, falling back to `Info`.
pub fn init_logging_from_env() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LogLevel::Info.directive()));
        install(filter);
    });
}

fn install(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .init();
}
