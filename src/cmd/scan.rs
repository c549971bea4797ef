// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `scan` command: runs the scanner over a range outside of a push.

use super::{interrupt_token, locate_git, repository_path};
use crate::cli::ScanArgs;
use crate::config::Config;
use crate::error::Result;
use crate::gate::render::findings_messages;
use crate::git::ScanEnvironment;
use crate::scan::{GitSecretScanner, RuleSet, SecretScanner};

/// Main handler for the `scan` command.
///
/// Findings are printed in the same layout the hook uses; finding secrets
/// is not an error.
///
/// # Errors
///
/// Returns an error if a revision does not resolve or the scan fails.
pub async fn run_scan_command(args: &ScanArgs, config: &Config) -> Result<()> {
    let repo = repository_path(args.repo.as_deref())?;
    let git = locate_git(config)?;
    let env = ScanEnvironment::from_process_env();
    let cancel_token = interrupt_token(config.scan.timeout());

    let rev = git.rev_parse(&repo, &env, &args.rev, &cancel_token).await?;
    let base = match &args.base {
        Some(base) => Some(git.rev_parse(&repo, &env, base, &cancel_token).await?),
        None => None,
    };

    let scanner = GitSecretScanner::new(git, RuleSet::compile(&config.scan.rules)?)
        .with_max_blob_size(config.scan.max_blob_size)
        .with_exclude_paths(config.scan.exclude_paths.clone())?;
    let findings = scanner
        .scan_secrets(&repo, &env, base.as_ref(), &rev, &cancel_token)
        .await?;

    if findings.is_empty() {
        println!("No secrets found");
    } else {
        for line in findings_messages(&findings) {
            println!("{line}");
        }
    }
    Ok(())
}
