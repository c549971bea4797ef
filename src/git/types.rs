// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Push-scoped git value types.
//!
//! ```text
//! stdin: "<old> <new> <refname>\n" ...
//!              |
//!              v
//!   ReferenceUpdate { name, old, new }
//!     old == nil  -> creation
//!     new == nil  -> deletion (never scanned)
//!
//! env: GIT_OBJECT_DIRECTORY + GIT_ALTERNATE_OBJECT_DIRECTORIES
//!              |
//!              v
//!   ScanEnvironment { alternate_object_dirs }
//! ```

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{GitError, GitResult};

pub use gix::ObjectId;

/// Parses a full hex object id (SHA-1 or SHA-256).
///
/// # Errors
///
/// Returns `GitError::InvalidObjectId` if the value is not a full hex id.
pub fn parse_object_id(value: &str) -> GitResult<ObjectId> {
    ObjectId::from_hex(value.trim().as_bytes()).map_err(|_| GitError::InvalidObjectId {
        value: value.to_string(),
    })
}

/// The kind of a git object as reported by `cat-file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reference change of a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceUpdate {
    /// Full reference name, e.g. `refs/heads/main`.
    pub name: String,
    /// Value before the push; nil when the reference is created.
    pub old: ObjectId,
    /// Value after the push; nil when the reference is deleted.
    pub new: ObjectId,
}

impl ReferenceUpdate {
    #[must_use]
    pub fn new(name: impl Into<String>, old: ObjectId, new: ObjectId) -> Self {
        Self {
            name: name.into(),
            old,
            new,
        }
    }

    /// Returns true if the push deletes the reference.
    #[must_use]
    pub fn is_deletion(&self) -> bool {
        self.new.is_null()
    }

    /// Returns true if the reference did not exist before the push.
    #[must_use]
    pub fn is_creation(&self) -> bool {
        self.old.is_null()
    }

    /// Parses one line of pre-receive input: `<old> <new> <refname>`.
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidRefUpdate` if the line does not have three
    /// fields or either id is not valid hex.
    pub fn parse_line(line: &str) -> GitResult<Self> {
        let invalid = |message: &str| GitError::InvalidRefUpdate {
            line: line.to_string(),
            message: message.to_string(),
        };

        let mut fields = line.trim_end_matches(['\r', '\n']).splitn(3, ' ');
        let (Some(old), Some(new), Some(name)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(invalid("expected '<old> <new> <refname>'"));
        };
        if name.is_empty() {
            return Err(invalid("empty reference name"));
        }

        let old = parse_object_id(old).map_err(|_| invalid("invalid old object id"))?;
        let new = parse_object_id(new).map_err(|_| invalid("invalid new object id"))?;
        if old.kind() != new.kind() {
            return Err(invalid("old and new ids use different hash kinds"));
        }

        Ok(Self::new(name, old, new))
    }

    /// Parses the whole pre-receive stdin, skipping blank lines.
    ///
    /// # Errors
    ///
    /// Returns the first line that fails to parse.
    pub fn parse_all(input: &str) -> GitResult<Vec<Self>> {
        input
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(Self::parse_line)
            .collect()
    }
}

/// Push-scoped object storage locations that are not yet part of the
/// primary store (the quarantine directory and inherited alternates).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanEnvironment {
    alternate_object_dirs: Vec<PathBuf>,
}

impl ScanEnvironment {
    #[must_use]
    pub const fn new(alternate_object_dirs: Vec<PathBuf>) -> Self {
        Self {
            alternate_object_dirs,
        }
    }

    /// Builds the environment from the hook process variables.
    #[must_use]
    pub fn from_process_env() -> Self {
        Self::from_vars(
            std::env::var_os("GIT_OBJECT_DIRECTORY").as_deref(),
            std::env::var_os("GIT_ALTERNATE_OBJECT_DIRECTORIES").as_deref(),
        )
    }

    /// Builds the environment from `GIT_OBJECT_DIRECTORY` and
    /// `GIT_ALTERNATE_OBJECT_DIRECTORIES` values.
    ///
    /// The object directory comes first; duplicates are dropped.
    #[must_use]
    pub fn from_vars(object_dir: Option<&OsStr>, alternates: Option<&OsStr>) -> Self {
        let mut dirs: Vec<PathBuf> = Vec::new();
        let candidates = object_dir
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .into_iter()
            .chain(alternates.into_iter().flat_map(std::env::split_paths));
        for dir in candidates {
            if !dir.as_os_str().is_empty() && !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        Self::new(dirs)
    }

    /// Returns the alternate object directories.
    #[must_use]
    pub fn alternate_object_dirs(&self) -> &[PathBuf] {
        &self.alternate_object_dirs
    }

    /// Returns the value for `GIT_ALTERNATE_OBJECT_DIRECTORIES`, if any.
    #[must_use]
    pub fn alternates_var(&self) -> Option<OsString> {
        if self.alternate_object_dirs.is_empty() {
            return None;
        }
        std::env::join_paths(&self.alternate_object_dirs).ok()
    }
}

/// A repository the gate operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    id: String,
    path: PathBuf,
}

impl Repository {
    #[must_use]
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    /// Identifier used for settings lookups.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Location of the repository on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
