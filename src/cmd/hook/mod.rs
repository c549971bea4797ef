// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `pre-receive` command.
//!
//! ```text
//! stdin "<old> <new> <ref>"* --> ReferenceUpdate::parse_all
//! process env                --> ScanEnvironment (quarantine alternates)
//!                                 |
//!                                 v
//!          Gate<FileSettingsStore, DefaultBranchFallback, GitSecretScanner>
//!                                 |
//!                                 v
//!          Decision --> stdout (plain lines or JSON)
//!                   --> Err(PushBlocked) when blocked (non-zero exit)
//! ```

use std::io::Write;

use anyhow::Context;
use serde_json::json;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use super::{interrupt_token, locate_git, repository_path};
use crate::cli::PreReceiveArgs;
use crate::config::Config;
use crate::error::{PushBlocked, Result};
use crate::gate::{Decision, DefaultBranchFallback, Gate, PushInput};
use crate::git::{ReferenceUpdate, Repository, ScanEnvironment};
use crate::scan::{GitSecretScanner, RuleSet};
use crate::settings::FileSettingsStore;

/// The gate as the hook runs it.
pub type HookGate = Gate<FileSettingsStore, DefaultBranchFallback, GitSecretScanner>;

/// Main handler for the `pre-receive` command.
///
/// # Errors
///
/// Returns an error if stdin cannot be parsed, the gate cannot be built, the
/// evaluation fails, or the push is blocked (`PushBlocked`).
pub async fn run_pre_receive_command(args: &PreReceiveArgs, config: &Config) -> Result<()> {
    let ref_updates = read_ref_updates(tokio::io::stdin()).await?;
    let repo_path = repository_path(args.repo.as_deref())?;
    let push = PushInput::new(
        Repository::new(args.repo_id.clone(), repo_path),
        ref_updates,
        ScanEnvironment::from_process_env(),
    );
    info!(
        repo_id = %args.repo_id,
        updates = push.ref_updates.len(),
        alternates = push.environment.alternate_object_dirs().len(),
        "pre-receive started"
    );

    let gate = build_gate(config)?;
    let cancel_token = interrupt_token(config.scan.timeout());
    let decision = gate
        .evaluate(&push, &cancel_token)
        .await
        .context("secret scan failed, rejecting push")?;

    let mut stdout = std::io::stdout().lock();
    write_decision(&mut stdout, &decision, args.json)?;
    stdout.flush().context("failed to flush stdout")?;

    match decision.block_reason {
        Some(reason) => Err(PushBlocked { reason }.into()),
        None => {
            debug!("push allowed");
            Ok(())
        }
    }
}

/// Reads and parses git's pre-receive input.
///
/// # Errors
///
/// Returns an error if the input cannot be read or a line is malformed.
pub async fn read_ref_updates<R: AsyncRead + Unpin>(mut input: R) -> Result<Vec<ReferenceUpdate>> {
    let mut text = String::new();
    input
        .read_to_string(&mut text)
        .await
        .context("failed to read reference updates from stdin")?;
    Ok(ReferenceUpdate::parse_all(&text)?)
}

/// Builds the gate from configuration.
///
/// # Errors
///
/// Returns an error if git cannot be located or a rule or exclusion pattern
/// does not compile.
pub fn build_gate(config: &Config) -> Result<HookGate> {
    let git = locate_git(config)?;
    let rules = RuleSet::compile(&config.scan.rules)?;
    let scanner = GitSecretScanner::new(git, rules)
        .with_max_blob_size(config.scan.max_blob_size)
        .with_exclude_paths(config.scan.exclude_paths.clone())?;
    let fallback = DefaultBranchFallback::new(Some(config.git.default_branch.as_str()));
    let settings = FileSettingsStore::new(config.settings.file.clone());

    Ok(Gate::new(settings, fallback, scanner)
        .with_default_enabled(config.settings.secret_scanning_default))
}

/// Writes a decision in the hook's output format.
///
/// Plain output is one message per line; JSON output is a single object.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_decision<W: Write>(out: &mut W, decision: &Decision, as_json: bool) -> Result<()> {
    if as_json {
        let value = decision_json(decision);
        writeln!(out, "{value}").context("failed to write decision")?;
    } else {
        for line in &decision.messages {
            writeln!(out, "{line}").context("failed to write decision")?;
        }
    }
    Ok(())
}

/// JSON form of a decision.
#[must_use]
pub fn decision_json(decision: &Decision) -> serde_json::Value {
    json!({
        "blocked": decision.is_blocked(),
        "reason": decision.block_reason,
        "messages": decision.messages,
    })
}
