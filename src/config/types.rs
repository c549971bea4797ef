// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types for pushgate.
//!
//! # Config Structure
//!
//! ```text
//! Config: GlobalConfig, GitConfig, ScanConfig, SettingsConfig
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LogLevel;
use crate::scan::{DEFAULT_MAX_BLOB_SIZE, RuleConfig, default_rules};
use crate::settings::DEFAULT_SECRET_SCANNING_ENABLED;

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for stderr output (0-6).
    pub log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file, none disables file logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Write the log file as JSON lines.
    pub log_json: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::WARN,
            file_log_level: LogLevel::DEBUG,
            log_file: None,
            log_json: false,
        }
    }
}

/// Git backend options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    /// Git executable, resolved through `PATH` when not absolute.
    pub binary: String,
    /// Branch new references are compared against; empty means `HEAD`'s branch.
    pub default_branch: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            default_branch: String::new(),
        }
    }
}

/// Secret scanner options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Largest number of bytes read from one blob.
    pub max_blob_size: u64,
    /// Glob patterns of paths that are never scanned.
    pub exclude_paths: Vec<String>,
    /// Seconds a whole push evaluation may take, 0 for no limit.
    pub timeout: u64,
    /// Detection rules; the built-in set when not configured.
    pub rules: Vec<RuleConfig>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
            exclude_paths: vec!["**/*.lock".to_string()],
            timeout: 0,
            rules: default_rules(),
        }
    }
}

impl ScanConfig {
    /// The evaluation deadline, if one is configured.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout))
        }
    }
}

/// Repository settings store options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsConfig {
    /// TOML file holding per-repository settings.
    pub file: PathBuf,
    /// Whether scanning is on for repositories the file does not mention.
    pub secret_scanning_default: bool,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("settings.toml"),
            secret_scanning_default: DEFAULT_SECRET_SCANNING_ENABLED,
        }
    }
}
