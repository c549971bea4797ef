// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for configuration loading.
//!
//! Tests the Config module with realistic TOML configurations.

use std::fs;

use pushgate::config::{Config, ConfigLoader};
use pushgate::logging::LogLevel;

// =============================================================================
// Loading from TOML strings
// =============================================================================

#[test]
fn config_parse_empty() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.git.binary, "git");
    assert!(!config.scan.rules.is_empty());
}

#[test]
fn config_parse_server_setup() {
    let toml = r#"
[global]
log_level = 1
file_log_level = 5
log_file = "/var/log/pushgate/hook.log"

[git]
default_branch = "refs/heads/trunk"

[scan]
max_blob_size = 262144
exclude_paths = ["**/*.lock", "third_party/**"]

[settings]
file = "/etc/pushgate/repos.toml"
"#;
    let config = Config::parse(toml).unwrap();

    assert_eq!(config.global.log_level, LogLevel::ERROR);
    assert_eq!(config.global.file_log_level, LogLevel::TRACE);
    assert_eq!(config.git.default_branch, "refs/heads/trunk");
    assert_eq!(config.scan.max_blob_size, 262_144);
    assert_eq!(config.scan.exclude_paths.len(), 2);
    assert_eq!(
        config.settings.file,
        std::path::PathBuf::from("/etc/pushgate/repos.toml")
    );
}

#[test]
fn config_rule_requires_all_fields() {
    let toml = r#"
[[scan.rules]]
id = "partial"
pattern = "x"
"#;
    assert!(Config::parse(toml).is_err());
}

// =============================================================================
// Layering
// =============================================================================

#[test]
fn config_later_files_override_earlier() {
    let temp = tempfile::tempdir().unwrap();
    let system = temp.path().join("system.toml");
    let local = temp.path().join("local.toml");
    fs::write(&system, "[scan]\nmax_blob_size = 100\ntimeout = 5\n").unwrap();
    fs::write(&local, "[scan]\nmax_blob_size = 200\n").unwrap();

    let config = ConfigLoader::new()
        .add_toml_file(&system)
        .add_toml_file(&local)
        .build()
        .unwrap();

    assert_eq!(config.scan.max_blob_size, 200);
    assert_eq!(config.scan.timeout, 5);
}

#[test]
fn config_overrides_beat_files() {
    let temp = tempfile::tempdir().unwrap();
    let file = temp.path().join("pushgate.toml");
    fs::write(&file, "[settings]\nsecret_scanning_default = false\n").unwrap();

    let config = ConfigLoader::new()
        .add_toml_file(&file)
        .apply_overrides(&["settings.secret_scanning_default=true"])
        .unwrap()
        .build()
        .unwrap();

    assert!(config.settings.secret_scanning_default);
}

#[test]
fn config_optional_file_may_be_missing() {
    let temp = tempfile::tempdir().unwrap();
    let loader = ConfigLoader::new().add_toml_file_optional(temp.path().join("absent.toml"));

    assert!(loader.loaded_files().is_empty());
    assert!(loader.build().is_ok());
}

#[test]
fn config_invalid_toml_fails() {
    let temp = tempfile::tempdir().unwrap();
    let file = temp.path().join("broken.toml");
    fs::write(&file, "[scan\nmax_blob_size = ").unwrap();

    assert!(Config::from_file(&file).is_err());
}
