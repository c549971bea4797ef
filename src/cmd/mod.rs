// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers
//!   config (options, configs), hook (pre-receive), blob (cat-blob), scan
//! ```

pub mod blob;
pub mod config;
pub mod hook;
pub mod scan;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Result;
use crate::git::backend::ShellBackend;

/// Returns a token cancelled on Ctrl+C or once `timeout` elapses.
pub(crate) fn interrupt_token(timeout: Option<Duration>) -> CancellationToken {
    let cancel_token = CancellationToken::new();

    let on_interrupt = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, cancelling");
            on_interrupt.cancel();
        }
    });

    if let Some(timeout) = timeout {
        let on_timeout = cancel_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = on_timeout.cancelled() => {}
                () = tokio::time::sleep(timeout) => {
                    tracing::warn!(timeout_secs = timeout.as_secs(), "evaluation timed out, cancelling");
                    on_timeout.cancel();
                }
            }
        });
    }

    cancel_token
}

/// The repository a command works on: `--repo`, else the current directory.
pub(crate) fn repository_path(repo: Option<&Path>) -> Result<PathBuf> {
    match repo {
        Some(path) => Ok(path.to_path_buf()),
        None => std::env::current_dir().context("failed to determine the current directory"),
    }
}

/// Locates the configured git binary.
pub(crate) fn locate_git(config: &Config) -> Result<ShellBackend> {
    ShellBackend::locate(&config.git.binary)
        .with_context(|| format!("failed to locate git binary '{}'", config.git.binary))
}
