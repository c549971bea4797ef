// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `cat-blob` command: streams one blob through a cat-file session.

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{interrupt_token, locate_git, repository_path};
use crate::cli::CatBlobArgs;
use crate::config::Config;
use crate::error::Result;
use crate::git::batch::BatchSession;
use crate::git::{ScanEnvironment, parse_object_id};

/// Main handler for the `cat-blob` command.
///
/// # Errors
///
/// Returns an error if the id is invalid, the object is missing or not a
/// blob, or the backend fails while streaming.
pub async fn run_cat_blob_command(args: &CatBlobArgs, config: &Config) -> Result<()> {
    let id = parse_object_id(&args.id)?;
    let repo = repository_path(args.repo.as_deref())?;
    let git = locate_git(config)?;
    let env = ScanEnvironment::from_process_env();
    let cancel_token = interrupt_token(None);

    let mut session = BatchSession::open(&git, &repo, &env, cancel_token)?;
    let mut reader = session.read_blob(&id, args.limit).await?;
    debug!(
        blob = %id,
        size = reader.declared_size(),
        delivered = reader.delivered_size(),
        "streaming blob"
    );

    let mut stdout = tokio::io::stdout();
    let copied = tokio::io::copy(&mut reader, &mut stdout)
        .await
        .context("failed to stream blob to stdout")?;
    stdout.flush().await.context("failed to flush stdout")?;
    reader.close().await?;
    session.close().await?;

    debug!(blob = %id, bytes = copied, "blob streamed");
    Ok(())
}
