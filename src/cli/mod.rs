// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for pushgate using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! pushgate [global options] <command>
//! version
//! options
//! configs
//! pre-receive --repo-id ID [--repo DIR] [--json]
//! cat-blob ID [--limit N] [--repo DIR]
//! scan REV [--base REV] [--repo DIR]
//! ```

pub mod global;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use crate::cli::global::GlobalOptions;
use clap::{Args, Parser, Subcommand};

/// Pre-receive secret scanning gate.
#[derive(Debug, Parser)]
#[command(
    name = "pushgate",
    author,
    version,
    about = "Pre-receive secret scanning gate",
    long_about = "pushgate Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Rejects pushes that introduce secrets.\n\n\
                  Install `pushgate pre-receive --repo-id <id>` as the repository's\n\
                  pre-receive hook. Git feeds the pushed reference updates on stdin;\n\
                  the new commits are scanned before any reference moves.",
    after_help = "CONFIG FILES:\n\n\
                  pushgate reads `pushgate.toml` next to the executable, then every\n\
                  file listed in PUSHGATETOML, then every --config file. Later\n\
                  files override earlier ones. PUSHGATE_<SECTION>__<KEY> environment\n\
                  variables and --set come last."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Lists all options and their effective values.
    Options,

    /// Lists the configuration files that were loaded.
    Configs,

    /// Runs as git's pre-receive hook.
    #[command(name = "pre-receive")]
    PreReceive(PreReceiveArgs),

    /// Streams one blob from the object store to stdout.
    #[command(name = "cat-blob")]
    CatBlob(CatBlobArgs),

    /// Scans a commit range and prints the findings.
    Scan(ScanArgs),
}

/// Arguments of `pre-receive`.
#[derive(Debug, Clone, Args)]
pub struct PreReceiveArgs {
    /// Identifier used to look up the repository's settings.
    #[arg(long = "repo-id", value_name = "ID")]
    pub repo_id: String,

    /// Repository directory (defaults to the current directory, where git runs hooks).
    #[arg(long = "repo", value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Prints the decision as JSON instead of plain messages.
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `cat-blob`.
#[derive(Debug, Clone, Args)]
pub struct CatBlobArgs {
    /// Full hexadecimal object id of the blob.
    #[arg(value_name = "ID")]
    pub id: String,

    /// Stops after this many bytes (0 reads the whole blob).
    #[arg(short = 'n', long, value_name = "BYTES", default_value_t = 0)]
    pub limit: u64,

    /// Repository directory.
    #[arg(long = "repo", value_name = "DIR")]
    pub repo: Option<PathBuf>,
}

/// Arguments of `scan`.
#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// Revision whose new history is scanned.
    #[arg(value_name = "REV")]
    pub rev: String,

    /// Revision already known to be clean; omitted scans from the root.
    #[arg(long, value_name = "REV")]
    pub base: Option<String>,

    /// Repository directory.
    #[arg(long = "repo", value_name = "DIR")]
    pub repo: Option<PathBuf>,
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
