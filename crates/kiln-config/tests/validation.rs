//! Filesystem validation of loaded configuration.

use std::fs;

use kiln_config::{ConfigError, ConfigValidator, FsValidator, KilnConfig};
use tempfile::TempDir;

#[test]
fn missing_entry_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let result = FsValidator::new(dir.path()).validate(&KilnConfig::default());
    match result {
        Err(ConfigError::EntryNotFound { path }) => assert!(path.ends_with("src/main.js")),
        other => panic!("expected EntryNotFound, got {other:?}"),
    }
}

#[test]
fn missing_graph_manifest_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir(dir.path().join("src")).expect("src");
    fs::write(dir.path().join("src/main.js"), "").expect("entry");

    let result = FsValidator::new(dir.path()).validate(&KilnConfig::default());
    assert!(matches!(result, Err(ConfigError::GraphNotFound { .. })));
}

#[test]
fn complete_project_validates() {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir(dir.path().join("src")).expect("src");
    fs::write(dir.path().join("src/main.js"), "").expect("entry");
    fs::write(dir.path().join("kiln-graph.json"), r#"{ "modules": [] }"#).expect("graph");

    FsValidator::new(dir.path())
        .validate(&KilnConfig::default())
        .expect("valid project");
}
