// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-repository settings.
//!
//! ```text
//! SettingsStore::get_bool(repo_id, key, default)
//!        |
//!        v
//! FileSettingsStore (TOML, re-read on every lookup)
//!   [repos."<repo-id>"]  key = bool   (1st)
//!   [defaults]           key = bool   (2nd)
//!   default argument                  (3rd)
//! ```
//!
//! Values are never cached: settings may change between pushes.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::SettingsError;

/// Key of the "secret scanning enabled" repository setting.
pub const KEY_SECRET_SCANNING_ENABLED: &str = "secret_scanning_enabled";

/// Value used when no setting is stored for a repository.
pub const DEFAULT_SECRET_SCANNING_ENABLED: bool = false;

/// Keyed repository settings lookup.
pub trait SettingsStore: Send + Sync {
    /// Returns the boolean setting `key` of a repository, or `default` when
    /// the setting is unset.
    fn get_bool(
        &self,
        repo_id: &str,
        key: &str,
        default: bool,
    ) -> impl Future<Output = Result<bool, SettingsError>> + Send;
}

/// On-disk layout of the settings file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    defaults: HashMap<String, config::Value>,
    repos: HashMap<String, HashMap<String, config::Value>>,
}

impl SettingsFile {
    fn parse(content: &str, path: &Path) -> Result<Self, SettingsError> {
        let parse_error = |e: config::ConfigError| SettingsError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()
            .map_err(parse_error)?
            .try_deserialize()
            .map_err(parse_error)
    }

    fn lookup(&self, repo_id: &str, key: &str) -> Option<&config::Value> {
        self.repos
            .get(repo_id)
            .or_else(|| self.repos.get(&repo_id.to_lowercase()))
            .and_then(|settings| settings.get(key))
            .or_else(|| self.defaults.get(key))
    }
}

/// Settings stored in a TOML file.
///
/// ```toml
/// [defaults]
/// secret_scanning_enabled = false
///
/// [repos."acme/payments"]
/// secret_scanning_enabled = true
/// ```
///
/// A missing file means every setting is unset.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Option<SettingsFile>, SettingsError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => SettingsFile::parse(&content, &self.path).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "settings file not found");
                Ok(None)
            }
            Err(source) => Err(SettingsError::Read {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }
}

impl SettingsStore for FileSettingsStore {
    async fn get_bool(&self, repo_id: &str, key: &str, default: bool) -> Result<bool, SettingsError> {
        let Some(file) = self.load().await? else {
            return Ok(default);
        };
        let Some(value) = file.lookup(repo_id, key) else {
            debug!(repo_id, key, default, "setting unset, using default");
            return Ok(default);
        };

        value
            .clone()
            .into_bool()
            .map_err(|_| SettingsError::NotABool {
                repo_id: repo_id.to_string(),
                key: key.to_string(),
            })
    }
}
