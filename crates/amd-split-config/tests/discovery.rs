//! Tests for locating and loading configuration files.

use amd_split_config::{ConfigDiscovery, ConfigError};
use std::fs;
use tempfile::TempDir;

fn bundle_names(config: &amd_split_config::SplitConfig) -> Vec<&str> {
    config.bundles.keys().map(String::as_str).collect()
}

#[test]
fn finds_nothing_in_empty_directory() {
    let dir = TempDir::new().expect("tempdir");
    let discovery = ConfigDiscovery::new(dir.path());
    assert!(discovery.find().is_none());
    assert!(matches!(
        discovery.load(),
        Err(ConfigError::NotFound { .. })
    ));
}

#[test]
fn loads_toml_preserving_bundle_order() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("amd-split.toml"),
        r#"
out = "main.js"
name = "app/main"
bundlePrefix = "bundles/"

[bundles]
zeta = ["app/zeta", "app/zeta-helpers"]
alpha = ["app/alpha"]

[requireConfig]
waitSeconds = 0
"#,
    )
    .expect("write config");

    let config = ConfigDiscovery::new(dir.path()).load().expect("load");

    assert_eq!(bundle_names(&config), ["zeta", "alpha"]);
    assert_eq!(config.out.as_deref(), Some("main.js"));
    assert_eq!(config.bundle_prefix, "bundles/");
    assert_eq!(config.require_config["waitSeconds"], 0);
    assert_eq!(config.passthrough["name"], "app/main");
}

#[test]
fn toml_takes_precedence_over_json() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("amd-split.toml"), "out = \"from-toml\"\n").expect("write toml");
    fs::write(dir.path().join("amd-split.json"), r#"{ "out": "from-json" }"#).expect("write json");

    let config = ConfigDiscovery::new(dir.path()).load().expect("load");
    assert_eq!(config.out.as_deref(), Some("from-toml"));
}

#[test]
fn loads_json_preserving_bundle_order() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("amd-split.json"),
        r#"{ "bundles": { "second": ["b"], "first": ["a"] }, "verbose": true }"#,
    )
    .expect("write config");

    let config = ConfigDiscovery::new(dir.path()).load().expect("load");
    assert_eq!(bundle_names(&config), ["second", "first"]);
    assert!(config.verbose);
}

#[test]
fn loads_embedded_package_json_config() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("package.json"),
        r#"{ "name": "site", "amdSplit": { "out": "main", "bundles": { "a": ["m1"] } } }"#,
    )
    .expect("write package.json");

    let config = ConfigDiscovery::new(dir.path()).load().expect("load");
    assert_eq!(config.out.as_deref(), Some("main"));
    assert_eq!(bundle_names(&config), ["a"]);
}

#[test]
fn ignores_package_json_without_field() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("package.json"), r#"{ "name": "site" }"#).expect("write");
    assert!(ConfigDiscovery::new(dir.path()).find().is_none());
}

#[test]
fn reports_invalid_toml() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("amd-split.toml");
    fs::write(&path, "bundles = [").expect("write");

    let err = ConfigDiscovery::new(dir.path())
        .load_from(&path)
        .unwrap_err();
    assert!(err.to_string().contains("toml"), "{err}");
}

#[test]
fn rejects_unknown_extension() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("amd-split.yaml");
    fs::write(&path, "out: main").expect("write");

    let err = ConfigDiscovery::new(dir.path())
        .load_from(&path)
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "yaml"));
}
