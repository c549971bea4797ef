// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Base discovery for newly created references.
//!
//! ```text
//! DefaultBranchFallback
//!   1. default branch (configured, else HEAD's branch)
//!        exists and is not the reference being created -> its tip
//!   2. first other update of the push with an old value -> that old value
//!   3. nothing                                          -> None (full scan)
//! ```
//!
//! References are read from the primary store, so they still hold their
//! pre-push values while the hook runs.

use std::future::Future;

use tracing::trace;

use crate::error::GitResult;
use crate::git::backend::GixBackend;
use crate::git::{ObjectId, ReferenceUpdate, Repository, ScanEnvironment};

/// Picks the commit a new reference is compared against.
pub trait FallbackFinder: Send + Sync {
    /// Returns a base for `current`, or `None` when the full history of the
    /// new reference must be scanned.
    fn find_fallback_base(
        &self,
        repo: &Repository,
        env: &ScanEnvironment,
        all: &[ReferenceUpdate],
        current: &ReferenceUpdate,
    ) -> impl Future<Output = GitResult<Option<ObjectId>>> + Send;
}

/// Uses the default branch, then the other references of the push.
#[derive(Debug, Clone, Default)]
pub struct DefaultBranchFallback {
    default_branch: Option<String>,
}

impl DefaultBranchFallback {
    /// Creates a finder; a blank name means "the branch `HEAD` points to".
    ///
    /// Short names are expanded to `refs/heads/<name>`.
    #[must_use]
    pub fn new(default_branch: Option<&str>) -> Self {
        let default_branch = default_branch
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                if name.starts_with("refs/") {
                    name.to_string()
                } else {
                    format!("refs/heads/{name}")
                }
            });
        Self { default_branch }
    }

    fn default_ref(&self, repo: &Repository) -> GitResult<Option<String>> {
        match &self.default_branch {
            Some(name) => Ok(Some(name.clone())),
            None => GixBackend::head_ref_name(repo.path()),
        }
    }
}

impl FallbackFinder for DefaultBranchFallback {
    async fn find_fallback_base(
        &self,
        repo: &Repository,
        _env: &ScanEnvironment,
        all: &[ReferenceUpdate],
        current: &ReferenceUpdate,
    ) -> GitResult<Option<ObjectId>> {
        if let Some(default_ref) = self.default_ref(repo)?
            && default_ref != current.name
        {
            if let Some(tip) = GixBackend::resolve_reference(repo.path(), &default_ref)? {
                trace!(reference = %default_ref, tip = %tip, "using default branch tip");
                return Ok(Some(tip));
            }
            trace!(reference = %default_ref, "default branch does not exist");
        }

        let sibling = all
            .iter()
            .find(|update| update.name != current.name && !update.is_creation());
        if let Some(update) = sibling {
            trace!(reference = %update.name, "using old value of pushed reference");
        }
        Ok(sibling.map(|update| update.old))
    }
}
