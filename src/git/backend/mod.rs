// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git backend layer.
//!
//! ```text
//! GixBackend   (pure Rust gix, refs only)  --> head_ref_name / resolve_reference
//! ShellBackend (git CLI, sees quarantine)  --> rev_parse / rev_list / changed_blobs / batch
//! ```
//!
//! References are never quarantined, so gix can read them directly from the
//! primary repository. Object reads go through git itself because objects of
//! an in-flight push only exist in the alternate directories.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::core::process::builder::{ProcessBuilder, StreamFlags};
use crate::error::{GitError, GitResult, GixError, ProcessError};

use super::types::{ObjectId, ScanEnvironment, parse_object_id};

// --- GixBackend Implementation (Pure Rust) ---

/// Pure Rust git backend using gix.
///
/// Reads references without spawning subprocesses.
pub struct GixBackend;

impl GixBackend {
    fn open(path: &Path) -> GitResult<gix::Repository> {
        gix::open(path).map_err(|e| GitError::Gix(GixError::Open(Box::new(e))))
    }

    /// Returns the full name of the branch `HEAD` points to.
    ///
    /// Returns `None` when `HEAD` is detached.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the repository cannot be opened or `HEAD`
    /// cannot be read.
    pub fn head_ref_name(path: &Path) -> GitResult<Option<String>> {
        let repo = Self::open(path)?;
        let head = repo
            .head_name()
            .map_err(|e| GitError::Gix(GixError::Head(e)))?;
        Ok(head.map(|name| name.as_bstr().to_string()))
    }

    /// Resolves a reference to the object it points to directly.
    ///
    /// Returns `None` if the reference does not exist or is symbolic.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the repository cannot be opened or the
    /// reference store cannot be read.
    pub fn resolve_reference(path: &Path, name: &str) -> GitResult<Option<ObjectId>> {
        let repo = Self::open(path)?;
        let reference = repo
            .try_find_reference(name)
            .map_err(|e| GitError::Gix(GixError::FindReference(e)))?;
        Ok(reference.and_then(|r| r.inner.target.try_id().map(ToOwned::to_owned)))
    }
}

// --- ShellBackend Implementation (Git CLI) ---

/// A blob introduced by a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedBlob {
    /// Path of the file in the commit's tree.
    pub path: String,
    /// Blob id after the change.
    pub blob: ObjectId,
    /// Blob id before the change; `None` for added files.
    pub previous: Option<ObjectId>,
}

/// Mode of gitlink (submodule) entries; they reference commits, not blobs.
const GITLINK_MODE: &str = "160000";

/// Shell-based git backend using the git CLI.
#[derive(Debug, Clone)]
pub struct ShellBackend {
    program: PathBuf,
}

impl ShellBackend {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolves the git binary via PATH.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::ExecutableNotFound` if the binary cannot be found.
    pub fn locate(binary: &str) -> Result<Self, ProcessError> {
        ProcessBuilder::which(binary).map(|builder| Self::new(builder.program().clone()))
    }

    /// Returns the git binary path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Prepares a git command for a repository.
    ///
    /// Sets `GCM_INTERACTIVE=never` and `GIT_TERMINAL_PROMPT=0`. The hook's
    /// `GIT_DIR` and `GIT_OBJECT_DIRECTORY` are dropped so the repository path
    /// is authoritative; push objects are reached through the alternates of
    /// `env` instead.
    #[must_use]
    pub fn command(&self, repo: &Path, env: &ScanEnvironment) -> ProcessBuilder {
        let builder = ProcessBuilder::new(&self.program)
            .cwd(repo)
            .env_var("GCM_INTERACTIVE", "never")
            .env_var("GIT_TERMINAL_PROMPT", "0")
            .env_remove("GIT_DIR")
            .env_remove("GIT_OBJECT_DIRECTORY")
            .stderr_flags(StreamFlags::FORWARD_TO_LOG);
        match env.alternates_var() {
            Some(alternates) => builder.env_var("GIT_ALTERNATE_OBJECT_DIRECTORIES", alternates),
            None => builder.env_remove("GIT_ALTERNATE_OBJECT_DIRECTORIES"),
        }
    }

    async fn run(
        &self,
        repo: &Path,
        env: &ScanEnvironment,
        args: &[&str],
        cancel: &CancellationToken,
    ) -> GitResult<Vec<u8>> {
        let output = self
            .command(repo, env)
            .args(args)
            .name(format!("git {}", args.first().copied().unwrap_or_default()))
            .run_with_cancellation(cancel)
            .await
            .map_err(|e| match e {
                ProcessError::NonZeroExit {
                    command, stderr, ..
                } => GitError::CommandFailed {
                    command,
                    message: stderr,
                },
                other => GitError::Process(other),
            })?;
        if !output.stderr().is_empty() {
            trace!(stderr = output.stderr(), "git warnings");
        }
        Ok(output.into_stdout())
    }

    /// Resolves a revision expression to the commit it names.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if git cannot resolve `rev` to a
    /// commit.
    pub async fn rev_parse(
        &self,
        repo: &Path,
        env: &ScanEnvironment,
        rev: &str,
        cancel: &CancellationToken,
    ) -> GitResult<ObjectId> {
        let rev_arg = format!("{rev}^{{commit}}");
        let stdout = self
            .run(
                repo,
                env,
                &["rev-parse", "--verify", "--quiet", "--end-of-options", &rev_arg],
                cancel,
            )
            .await?;
        let line = String::from_utf8_lossy(&stdout);
        let line = line.trim();
        parse_object_id(line).map_err(|_| GitError::UnexpectedOutput {
            command: "git rev-parse".to_string(),
            message: format!("not an object id: '{line}'"),
        })
    }

    /// Lists the commits in `(base, rev]`, oldest first.
    ///
    /// Without a base every commit reachable from `rev` is listed.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if `git rev-list` fails or prints something that
    /// is not an object id.
    pub async fn rev_list(
        &self,
        repo: &Path,
        env: &ScanEnvironment,
        base: Option<&ObjectId>,
        rev: &ObjectId,
        cancel: &CancellationToken,
    ) -> GitResult<Vec<ObjectId>> {
        let rev_arg = format!("{rev}^{{commit}}");
        let base_arg = base.map(|base| format!("^{base}^{{commit}}"));

        let mut args = vec!["rev-list", "--reverse", rev_arg.as_str()];
        if let Some(base_arg) = base_arg.as_deref() {
            args.push(base_arg);
        }

        let stdout = self.run(repo, env, &args, cancel).await?;
        String::from_utf8_lossy(&stdout)
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                parse_object_id(line).map_err(|_| GitError::UnexpectedOutput {
                    command: "git rev-list".to_string(),
                    message: format!("not an object id: '{line}'"),
                })
            })
            .collect()
    }

    /// Lists blobs added or modified by a commit.
    ///
    /// Root commits report every file. A merge reports only the blobs that
    /// differ from every parent, which is the content written while resolving
    /// it. Deletions and submodule entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if `git diff-tree` fails or its output is malformed.
    pub async fn changed_blobs(
        &self,
        repo: &Path,
        env: &ScanEnvironment,
        commit: &ObjectId,
        cancel: &CancellationToken,
    ) -> GitResult<Vec<ChangedBlob>> {
        let commit_arg = commit.to_string();
        let stdout = self
            .run(
                repo,
                env,
                &[
                    "diff-tree",
                    "-r",
                    "--root",
                    "--no-commit-id",
                    "--no-renames",
                    "-z",
                    &commit_arg,
                ],
                cancel,
            )
            .await?;
        let blobs = parse_diff_tree(&stdout)?;
        // diff-tree prints nothing for a merge commit.
        if !blobs.is_empty() {
            return Ok(blobs);
        }

        let parents = self.parents(repo, env, commit, cancel).await?;
        if parents.len() < 2 {
            return Ok(blobs);
        }
        self.merge_resolution_blobs(repo, env, commit, &parents, cancel)
            .await
    }

    /// Returns the parents of a commit, first parent first.
    async fn parents(
        &self,
        repo: &Path,
        env: &ScanEnvironment,
        commit: &ObjectId,
        cancel: &CancellationToken,
    ) -> GitResult<Vec<ObjectId>> {
        let commit_arg = commit.to_string();
        let stdout = self
            .run(repo, env, &["rev-list", "--parents", "-n", "1", &commit_arg], cancel)
            .await?;
        String::from_utf8_lossy(&stdout)
            .split_whitespace()
            .skip(1)
            .map(|id| {
                parse_object_id(id).map_err(|_| GitError::UnexpectedOutput {
                    command: "git rev-list".to_string(),
                    message: format!("not an object id: '{id}'"),
                })
            })
            .collect()
    }

    /// Diffs a merge against each parent and keeps the entries common to all.
    ///
    /// `previous` comes from the first-parent diff.
    async fn merge_resolution_blobs(
        &self,
        repo: &Path,
        env: &ScanEnvironment,
        commit: &ObjectId,
        parents: &[ObjectId],
        cancel: &CancellationToken,
    ) -> GitResult<Vec<ChangedBlob>> {
        let commit_arg = commit.to_string();
        let mut diffs = Vec::with_capacity(parents.len());
        for parent in parents {
            let parent_arg = parent.to_string();
            let stdout = self
                .run(
                    repo,
                    env,
                    &[
                        "diff-tree",
                        "-r",
                        "--no-renames",
                        "-z",
                        &parent_arg,
                        &commit_arg,
                    ],
                    cancel,
                )
                .await?;
            diffs.push(parse_diff_tree(&stdout)?);
        }

        let mut diffs = diffs.into_iter();
        let first = diffs.next().unwrap_or_default();
        let others: Vec<Vec<ChangedBlob>> = diffs.collect();
        Ok(first
            .into_iter()
            .filter(|blob| {
                others.iter().all(|diff| {
                    diff.iter()
                        .any(|other| other.path == blob.path && other.blob == blob.blob)
                })
            })
            .collect())
    }
}

/// Parses `git diff-tree -r -z` raw output.
///
/// Each entry is `:<src mode> <dst mode> <src id> <dst id> <status>\0<path>\0`.
pub(crate) fn parse_diff_tree(output: &[u8]) -> GitResult<Vec<ChangedBlob>> {
    let malformed = |message: String| GitError::UnexpectedOutput {
        command: "git diff-tree".to_string(),
        message,
    };

    let mut blobs = Vec::new();
    let mut fields = output.split(|b| *b == 0).filter(|field| !field.is_empty());
    while let Some(meta) = fields.next() {
        let meta = String::from_utf8_lossy(meta);
        let path = fields
            .next()
            .ok_or_else(|| malformed(format!("missing path after '{meta}'")))?;
        let path = String::from_utf8_lossy(path).into_owned();

        let parts: Vec<&str> = meta.trim_start_matches(':').split(' ').collect();
        let [src_mode, dst_mode, src_id, dst_id, status] = parts.as_slice() else {
            return Err(malformed(format!("unexpected entry '{meta}'")));
        };

        if status.starts_with('D') || *dst_mode == GITLINK_MODE {
            continue;
        }
        let invalid = |_| malformed(format!("invalid blob id in '{meta}'"));
        let blob = parse_object_id(dst_id).map_err(invalid)?;
        if blob.is_null() {
            continue;
        }
        let previous = parse_object_id(src_id).map_err(invalid)?;
        let previous = (!previous.is_null() && *src_mode != GITLINK_MODE).then_some(previous);
        blobs.push(ChangedBlob {
            path,
            blob,
            previous,
        });
    }
    Ok(blobs)
}
