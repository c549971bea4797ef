// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pre-receive scan gate.
//!
//! ```text
//! evaluate(push)
//!   |
//!   v
//! settings.get_bool(repo, "secret_scanning_enabled")
//!   |  error    -> GateError::Settings
//!   |  disabled -> Decision::allow()
//!   v
//! for update in push order
//!   |  new == nil            -> skip
//!   |  old != nil            -> base = old
//!   |  old == nil            -> FallbackBase (finder runs at most once per push)
//!   v
//! scanner.scan_secrets(repo, env, base, new)  -- error -> GateError::Scan
//!   |
//!   v
//! findings empty -> Decision::allow()
//! otherwise      -> rendered messages + block reason (still Ok)
//! ```
//!
//! A block is a [`Decision`], never an error. Every collaborator call races
//! the cancellation token; a cancelled evaluation is `GateError::Cancelled`.

pub mod fallback;
pub mod render;

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span};

use crate::error::GateError;
use crate::git::{ObjectId, ReferenceUpdate, Repository, ScanEnvironment};
use crate::scan::{Finding, SecretScanner};
use crate::settings::{DEFAULT_SECRET_SCANNING_ENABLED, KEY_SECRET_SCANNING_ENABLED, SettingsStore};

pub use fallback::{DefaultBranchFallback, FallbackFinder};
pub use render::BLOCK_MESSAGE;

/// Everything the gate needs to know about one push.
#[derive(Debug, Clone)]
pub struct PushInput {
    pub repository: Repository,
    pub ref_updates: Vec<ReferenceUpdate>,
    pub environment: ScanEnvironment,
}

impl PushInput {
    #[must_use]
    pub const fn new(
        repository: Repository,
        ref_updates: Vec<ReferenceUpdate>,
        environment: ScanEnvironment,
    ) -> Self {
        Self {
            repository,
            ref_updates,
            environment,
        }
    }
}

/// Push-scoped memo of the base used for newly created references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackBase {
    /// The finder has not run yet.
    #[default]
    Unresolved,
    /// New references are scanned from this commit.
    Resolved(ObjectId),
    /// No usable base exists; new references are scanned from the root.
    ResolvedToNone,
}

impl FallbackBase {
    #[must_use]
    pub const fn from_lookup(found: Option<ObjectId>) -> Self {
        match found {
            Some(id) => Self::Resolved(id),
            None => Self::ResolvedToNone,
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    /// The scan base, `None` meaning "from the root".
    #[must_use]
    pub const fn base(&self) -> Option<ObjectId> {
        match self {
            Self::Resolved(id) => Some(*id),
            Self::Unresolved | Self::ResolvedToNone => None,
        }
    }
}

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    /// Lines shown to the pushing user, in order.
    pub messages: Vec<String>,
    /// Set when the push must be rejected.
    pub block_reason: Option<String>,
}

impl Decision {
    /// A decision that lets the push through silently.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            messages: Vec::new(),
            block_reason: None,
        }
    }

    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        self.block_reason.is_some()
    }
}

/// The pre-receive gate over its three collaborators.
#[derive(Debug)]
pub struct Gate<S, F, X> {
    settings: S,
    fallback: F,
    scanner: X,
    default_enabled: bool,
}

impl<S, F, X> Gate<S, F, X>
where
    S: SettingsStore,
    F: FallbackFinder,
    X: SecretScanner,
{
    #[must_use]
    pub const fn new(settings: S, fallback: F, scanner: X) -> Self {
        Self {
            settings,
            fallback,
            scanner,
            default_enabled: DEFAULT_SECRET_SCANNING_ENABLED,
        }
    }

    /// Overrides the value used when a repository has no enable setting.
    #[must_use]
    pub const fn with_default_enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    /// Evaluates one push.
    ///
    /// # Errors
    ///
    /// Returns a `GateError` when the evaluation itself fails: settings lookup,
    /// fallback discovery, scanning, or cancellation. Findings never produce
    /// an error.
    pub async fn evaluate(
        &self,
        push: &PushInput,
        cancel: &CancellationToken,
    ) -> Result<Decision, GateError> {
        let repo_id = push.repository.id();
        let enabled = cancellable(
            cancel,
            self.settings
                .get_bool(repo_id, KEY_SECRET_SCANNING_ENABLED, self.default_enabled),
        )
        .await?
        .map_err(|e| failure(cancel, GateError::Settings(e)))?;

        if !enabled {
            debug!(repo_id, "secret scanning disabled");
            return Ok(Decision::allow());
        }

        let mut fallback = FallbackBase::Unresolved;
        let mut findings: Vec<Finding> = Vec::new();

        for update in &push.ref_updates {
            let span = debug_span!(
                "ref",
                name = %update.name,
                old = %update.old,
                new = %update.new
            );
            let found = self
                .scan_reference(push, update, &mut fallback, cancel)
                .instrument(span)
                .await?;
            findings.extend(found);
        }

        if findings.is_empty() {
            debug!(repo_id, "no secrets found");
            return Ok(Decision::allow());
        }

        debug!(repo_id, findings = findings.len(), "push blocked");
        Ok(render::blocked(&findings))
    }

    async fn scan_reference(
        &self,
        push: &PushInput,
        update: &ReferenceUpdate,
        fallback: &mut FallbackBase,
        cancel: &CancellationToken,
    ) -> Result<Vec<Finding>, GateError> {
        if update.is_deletion() {
            debug!("skip deleted reference");
            return Ok(Vec::new());
        }

        let base = if update.is_creation() {
            if !fallback.is_resolved() {
                let found = cancellable(
                    cancel,
                    self.fallback.find_fallback_base(
                        &push.repository,
                        &push.environment,
                        &push.ref_updates,
                        update,
                    ),
                )
                .await?
                .map_err(|source| {
                    failure(
                        cancel,
                        GateError::Fallback {
                            reference: update.name.clone(),
                            source,
                        },
                    )
                })?;
                *fallback = FallbackBase::from_lookup(found);
                match found {
                    Some(id) => debug!(fallback = %id, "found fallback base"),
                    None => debug!("no fallback base available, scanning full history"),
                }
            }
            fallback.base()
        } else {
            Some(update.old)
        };

        debug!(base = ?base.map(|id| id.to_string()), "scan for secrets");
        let findings = cancellable(
            cancel,
            self.scanner.scan_secrets(
                push.repository.path(),
                &push.environment,
                base.as_ref(),
                &update.new,
                cancel,
            ),
        )
        .await?
        .map_err(|source| {
            failure(
                cancel,
                GateError::Scan {
                    reference: update.name.clone(),
                    source,
                },
            )
        })?;

        if findings.is_empty() {
            debug!("no new secrets found");
        } else {
            debug!(count = findings.len(), "found new secrets");
        }
        Ok(findings)
    }
}

/// Runs a collaborator call unless the token fires first.
async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = T>,
) -> Result<T, GateError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(GateError::Cancelled),
        value = call => Ok(value),
    }
}

/// Reports collaborator failures caused by cancellation as cancellation.
fn failure(cancel: &CancellationToken, error: GateError) -> GateError {
    if cancel.is_cancelled() {
        debug!(error = %error, "collaborator failed after cancellation");
        GateError::Cancelled
    } else {
        error
    }
}
