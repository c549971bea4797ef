// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for pushgate.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. pushgate.toml next to the executable
//! 3. PUSHGATETOML (path list)
//! 4. --config
//! 5. PUSHGATE_* env vars
//! 6. CLI overrides (--set, --log-level, ...)
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! PUSHGATE_GLOBAL__LOG_LEVEL=4           → global.log_level = 4
//! PUSHGATE_SCAN__MAX_BLOB_SIZE=65536     → scan.max_blob_size = 65536
//! PUSHGATE_SETTINGS__FILE=/etc/pg.toml   → settings.file = "/etc/pg.toml"
//! ```
//!
//! # Example
//!
//! ```toml
//! [git]
//! default_branch = "main"
//!
//! [scan]
//! exclude_paths = ["**/*.lock", "testdata/**"]
//!
//! [[scan.rules]]
//! id = "internal-token"
//! description = "Internal API token"
//! pattern = "\\b(itk_[0-9a-f]{32})\\b"
//! ```

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::{ConfigError, Result};

pub use loader::ConfigLoader;
pub use types::{GitConfig, GlobalConfig, ScanConfig, SettingsConfig};

/// Environment variable prefix read by the loader.
pub const ENV_PREFIX: &str = "PUSHGATE";

/// Variable holding extra configuration files, in `PATH` list syntax.
///
/// Not under `PUSHGATE_`, whose variables map to configuration keys.
pub const CONFIG_LIST_VAR: &str = "PUSHGATETOML";

/// Name of the configuration file looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "pushgate.toml";

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Git backend options.
    pub git: GitConfig,
    /// Scanner options.
    pub scan: ScanConfig,
    /// Repository settings store.
    pub settings: SettingsConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pushgate::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file("/etc/pushgate/pushgate.toml")
    ///     .add_toml_file_optional("pushgate.local.toml")
    ///     .with_env_prefix("PUSHGATE")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file (simple API).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Checks values serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let invalid = |section: &str, key: &str, message: String| ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            message,
        };

        if self.git.binary.trim().is_empty() {
            return Err(invalid("git", "binary", "must not be empty".to_string()));
        }

        if self.scan.rules.is_empty() {
            return Err(invalid(
                "scan",
                "rules",
                "at least one rule is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for rule in &self.scan.rules {
            if rule.id.trim().is_empty() {
                return Err(invalid("scan", "rules", "rule id must not be empty".to_string()));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(invalid(
                    "scan",
                    "rules",
                    format!("duplicate rule id '{}'", rule.id),
                ));
            }
        }

        for pattern in &self.scan.exclude_paths {
            wax::Glob::new(pattern).map_err(|e| {
                invalid("scan", "exclude_paths", format!("invalid glob '{pattern}': {e}"))
            })?;
        }

        Ok(())
    }

    /// Format configuration options for display.
    ///
    /// Rule patterns are listed by id only. Output is deterministically ordered
    /// using `BTreeMap`.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_git_options(&mut options);
        self.format_scan_options(&mut options);
        self.format_settings_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "global.log_level".into(),
            self.global.log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file".into(),
            self.global
                .log_file
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );
        options.insert("global.log_json".into(), self.global.log_json.to_string());
    }

    fn format_git_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("git.binary".into(), self.git.binary.clone());
        options.insert(
            "git.default_branch".into(),
            self.git.default_branch.clone(),
        );
    }

    fn format_scan_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "scan.max_blob_size".into(),
            self.scan.max_blob_size.to_string(),
        );
        options.insert(
            "scan.exclude_paths".into(),
            self.scan.exclude_paths.join(", "),
        );
        options.insert("scan.timeout".into(), self.scan.timeout.to_string());
        let ids: Vec<&str> = self.scan.rules.iter().map(|r| r.id.as_str()).collect();
        options.insert("scan.rules".into(), ids.join(", "));
    }

    fn format_settings_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "settings.file".into(),
            self.settings.file.display().to_string(),
        );
        options.insert(
            "settings.secret_scanning_default".into(),
            self.settings.secret_scanning_default.to_string(),
        );
    }
}
