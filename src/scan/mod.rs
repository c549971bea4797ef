// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Secret scanning over a commit range.
//!
//! ```text
//! scan_secrets(repo, env, base, rev)
//!   |
//!   v
//! git rev-list --reverse rev ^base        (oldest first)
//!   |
//!   v  per commit
//! git diff-tree -r --root -z              (added/modified blobs; merges:
//!   |                                      blobs differing from every parent)
//!   |  - exclude_paths globs
//!   |  - blobs already seen in this range
//!   v
//! BatchSession (cat-file --batch, max_blob_size)
//!   |  - binary content skipped
//!   v
//! RuleSet::detect  -> lines already present in the previous blob are ignored
//!   |
//!   v
//! Vec<Finding> (secrets redacted)
//! ```
//!
//! Each scan call owns its batch session; sessions are never shared between
//! calls.

pub mod rules;

use std::collections::HashSet;
use std::future::Future;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use wax::{Glob, Program};

use crate::error::{BatchError, ScanError};
use crate::git::backend::{ChangedBlob, ShellBackend};
use crate::git::batch::BatchSession;
use crate::git::{ObjectId, ScanEnvironment};

pub use rules::{RuleConfig, RuleMatch, RuleSet, default_rules, redact};

/// Default size limit for scanned blob content (1 MiB).
pub const DEFAULT_MAX_BLOB_SIZE: u64 = 1024 * 1024;

/// A detected secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub rule_id: String,
    pub description: String,
    /// First commit of the range that introduced the secret.
    pub commit: ObjectId,
    pub path: String,
    /// 1-based line number inside the file.
    pub line: usize,
    /// Redacted secret.
    pub secret: String,
}

/// Scans a commit range for secrets.
pub trait SecretScanner: Send + Sync {
    /// Scans the commits in `(base, rev]`; without a base the whole history
    /// of `rev` is scanned.
    fn scan_secrets(
        &self,
        repo: &Path,
        env: &ScanEnvironment,
        base: Option<&ObjectId>,
        rev: &ObjectId,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<Finding>, ScanError>> + Send;
}

/// Scanner built on the git CLI and the batch object reader.
#[derive(Debug)]
pub struct GitSecretScanner {
    git: ShellBackend,
    rules: RuleSet,
    max_blob_size: u64,
    exclude_paths: Vec<String>,
}

impl GitSecretScanner {
    #[must_use]
    pub const fn new(git: ShellBackend, rules: RuleSet) -> Self {
        Self {
            git,
            rules,
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
            exclude_paths: Vec::new(),
        }
    }

    /// Limits how many bytes of each blob are scanned; zero scans everything.
    #[must_use]
    pub const fn with_max_blob_size(mut self, max_blob_size: u64) -> Self {
        self.max_blob_size = max_blob_size;
        self
    }

    /// Skips paths matching any of the glob patterns.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::InvalidExclude` for the first invalid pattern.
    pub fn with_exclude_paths(mut self, patterns: Vec<String>) -> Result<Self, ScanError> {
        for pattern in &patterns {
            Glob::new(pattern).map_err(|e| ScanError::InvalidExclude {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        }
        self.exclude_paths = patterns;
        Ok(self)
    }

    /// Drops blobs whose path matches an exclusion glob.
    fn retain_included(&self, blobs: &mut Vec<ChangedBlob>) {
        let globs: Vec<Glob<'_>> = self
            .exclude_paths
            .iter()
            .filter_map(|pattern| Glob::new(pattern).ok())
            .collect();
        blobs.retain(|blob| {
            let excluded = globs.iter().any(|glob| glob.is_match(blob.path.as_str()));
            if excluded {
                trace!(path = %blob.path, "path excluded");
            }
            !excluded
        });
    }

    /// Reads a blob as text; `None` for binary content.
    async fn read_text(
        &self,
        session: &mut BatchSession,
        id: &ObjectId,
    ) -> Result<Option<String>, BatchError> {
        let mut reader = session.read_blob(id, self.max_blob_size).await?;
        let content = reader.read_content().await?;
        if reader.is_truncated() {
            debug!(
                blob = %id,
                size = reader.declared_size(),
                limit = self.max_blob_size,
                "blob truncated to size limit"
            );
        }
        reader.close().await?;

        if content.contains(&0) {
            trace!(blob = %id, "binary blob skipped");
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&content).into_owned()))
    }
}

/// Returns an open session, replacing one torn down by a truncated read.
fn live_session<'s>(
    slot: &'s mut Option<BatchSession>,
    git: &ShellBackend,
    repo: &Path,
    env: &ScanEnvironment,
    cancel: &CancellationToken,
) -> Result<&'s mut BatchSession, BatchError> {
    if slot.as_ref().is_none_or(BatchSession::is_closed) {
        *slot = Some(BatchSession::open(git, repo, env, cancel.clone())?);
    }
    slot.as_mut().ok_or(BatchError::SessionClosed)
}

impl SecretScanner for GitSecretScanner {
    async fn scan_secrets(
        &self,
        repo: &Path,
        env: &ScanEnvironment,
        base: Option<&ObjectId>,
        rev: &ObjectId,
        cancel: &CancellationToken,
    ) -> Result<Vec<Finding>, ScanError> {
        let commits = self.git.rev_list(repo, env, base, rev, cancel).await?;
        debug!(commits = commits.len(), "scanning commit range");

        let mut session: Option<BatchSession> = None;
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut findings = Vec::new();

        for commit in commits {
            let mut blobs = self.git.changed_blobs(repo, env, &commit, cancel).await?;
            self.retain_included(&mut blobs);

            for blob in blobs {
                if !seen.insert(blob.blob) {
                    continue;
                }

                let current = live_session(&mut session, &self.git, repo, env, cancel)?;
                let Some(text) = self.read_text(current, &blob.blob).await? else {
                    continue;
                };
                let matches = self.rules.detect(&text);
                if matches.is_empty() {
                    continue;
                }

                let previous = match &blob.previous {
                    Some(previous) => {
                        let current = live_session(&mut session, &self.git, repo, env, cancel)?;
                        self.read_text(current, previous).await?.unwrap_or_default()
                    }
                    None => String::new(),
                };
                let known: HashSet<&str> = previous.lines().collect();

                for found in matches {
                    if known.contains(found.line) {
                        continue;
                    }
                    trace!(rule = found.rule_id, path = %blob.path, line = found.line_number, "secret found");
                    findings.push(Finding {
                        rule_id: found.rule_id.to_string(),
                        description: found.description.to_string(),
                        commit,
                        path: blob.path.clone(),
                        line: found.line_number,
                        secret: redact(found.secret),
                    });
                }
            }
        }

        if let Some(session) = session {
            session.close().await?;
        }
        debug!(findings = findings.len(), "scan complete");
        Ok(findings)
    }
}
