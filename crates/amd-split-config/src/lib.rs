pub mod config;
pub mod discovery;
pub mod env;
pub mod error;
pub mod validation;

// Re-export main types
pub use config::*;
pub use error::*;

pub use discovery::{ConfigDiscovery, PACKAGE_JSON_FIELD};
pub use env::ENV_PREFIX;
