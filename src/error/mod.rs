// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!                  GateError
//!                      |
//!      +---------+-----+------+-----------+
//!      v         v            v           v
//!  Settings   Fallback      Scan      Cancelled
//!  Error      (GitError)  (ScanError)
//!                             |
//!                  +----------+----------+
//!                  v          v          v
//!              GitError   BatchError   InvalidRule
//!                  |          |
//!                  v          v
//!           ProcessError  Transport / ProtocolMismatch /
//!           GixError      UnexpectedObjectType / ...
//!
//! Command layer: anyhow::Result + PushBlocked
//! ```
//!
//! Policy blocks are never errors: the gate reports them through
//! [`crate::gate::Decision`]. `PushBlocked` only exists at the binary
//! boundary to turn a block into a non-zero exit status.

use thiserror::Error;

use crate::git::ObjectId;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type for git operations.
pub type GitResult<T> = std::result::Result<T, GitError>;

// --- Gix Errors ---

/// Wrapper for gix-specific errors.
///
/// Large error types are boxed to keep enum size manageable.
#[derive(Debug, Error)]
pub enum GixError {
    /// Failed to open repository.
    #[error("failed to open repository: {0}")]
    Open(#[from] Box<gix::open::Error>),

    /// Failed to look up a reference.
    #[error("failed to find reference: {0}")]
    FindReference(#[from] gix::reference::find::Error),

    /// Failed to get HEAD reference.
    #[error("failed to get head reference: {0}")]
    Head(#[from] gix::reference::find::existing::Error),
}

// --- Git Errors ---

/// Git operation errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Git command execution failed.
    #[error("git command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    /// Error from gix library.
    #[error("gix error: {0}")]
    Gix(#[from] GixError),

    /// Error from the git child process.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// A value is not a valid hex object id.
    #[error("invalid object id '{value}'")]
    InvalidObjectId { value: String },

    /// A pre-receive input line could not be parsed.
    #[error("invalid reference update '{line}': {message}")]
    InvalidRefUpdate { line: String, message: String },

    /// Git produced output that could not be parsed.
    #[error("unexpected output from {command}: {message}")]
    UnexpectedOutput { command: String, message: String },
}

// --- Batch (object stream) Errors ---

/// Errors from a `git cat-file --batch` session.
///
/// `ProtocolMismatch`, `UnexpectedObjectType` and `MalformedResponse` leave
/// the session torn down; any later read fails with `SessionClosed`.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The backend process could not be started.
    #[error("failed to start cat-file backend: {0}")]
    Spawn(#[source] ProcessError),

    /// Reading from or writing to the backend failed.
    #[error("cat-file transport failure: {context}")]
    Transport {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The backend answered for a different object than requested.
    #[error("cat-file returned object '{actual}' but expected '{expected}'")]
    ProtocolMismatch { expected: String, actual: String },

    /// The object exists but has a different kind than requested.
    #[error("cat-file returned object type '{actual}' for '{id}' but expected '{expected}'")]
    UnexpectedObjectType {
        id: ObjectId,
        expected: String,
        actual: String,
    },

    /// The backend response violates the batch wire format.
    #[error("malformed cat-file response: {detail}")]
    MalformedResponse { detail: String },

    /// The object does not exist in the store or its alternates.
    #[error("object '{id}' not found")]
    ObjectNotFound { id: ObjectId },

    /// The session was torn down by an earlier failure or partial read.
    #[error("cat-file session is closed")]
    SessionClosed,

    /// The caller cancelled the read.
    #[error("cat-file read cancelled")]
    Cancelled,
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },

    /// A `--set` override is not of the form `key=value`.
    #[error("invalid override '{0}', expected KEY=VALUE")]
    InvalidOverride(String),
}

// --- Settings Errors ---

/// Repository settings lookup errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings store could not be read.
    #[error("failed to read settings from '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The settings store content is not valid.
    #[error("failed to parse settings from '{path}': {message}")]
    Parse { path: String, message: String },

    /// A setting exists but has the wrong type.
    #[error("setting '{key}' for repository '{repo_id}' is not a boolean")]
    NotABool { repo_id: String, key: String },

    /// The settings backend is not reachable.
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
}

// --- Scan Errors ---

/// Errors from the secret scanner.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Listing commits or changed files failed.
    #[error("git error: {0}")]
    Git(#[from] GitError),

    /// Reading blob content failed.
    #[error("object read failed: {0}")]
    Batch(#[from] BatchError),

    /// A rule pattern does not compile.
    #[error("invalid rule '{id}': {source}")]
    InvalidRule {
        id: String,
        #[source]
        source: regex::Error,
    },

    /// An exclusion pattern is not a valid glob.
    #[error("invalid exclude pattern '{pattern}': {message}")]
    InvalidExclude { pattern: String, message: String },
}

// --- Process Errors ---

/// Process execution errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Executable not found in PATH.
    #[error("executable not found: '{name}' (not in PATH)")]
    ExecutableNotFound { name: String },

    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with non-zero status.
    #[error("process '{command}' exited with code {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },

    /// Failed to collect process output.
    #[error("failed to read output from process '{command}': {source}")]
    OutputError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A piped stream was not available after spawning.
    #[error("process '{command}' has no {stream} pipe")]
    MissingPipe {
        command: String,
        stream: &'static str,
    },

    /// Process was killed because the caller cancelled.
    #[error("process '{command}' was cancelled")]
    Cancelled { command: String },
}

// --- Gate Errors ---

/// Evaluation-level failures of the pre-receive gate.
///
/// Any of these rejects the push as an infrastructure failure, which callers
/// must report differently from a policy block.
#[derive(Debug, Error)]
pub enum GateError {
    /// The enable flag could not be looked up.
    #[error("failed to check settings whether secret scanning is enabled: {0}")]
    Settings(#[source] SettingsError),

    /// Fallback base discovery failed for a new reference.
    #[error("failed to get fallback sha for '{reference}': {source}")]
    Fallback {
        reference: String,
        #[source]
        source: GitError,
    },

    /// The scanner failed for a reference.
    #[error("failed to detect secret leaks in '{reference}': {source}")]
    Scan {
        reference: String,
        #[source]
        source: ScanError,
    },

    /// The evaluation was cancelled before it completed.
    #[error("secret scan cancelled")]
    Cancelled,
}

/// A push rejected by policy, carried to the binary boundary for the exit status.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct PushBlocked {
    pub reason: String,
}

#[cfg(test)]
mod tests;
