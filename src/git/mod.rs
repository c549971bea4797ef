// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git access for the gate.
//!
//! ```text
//!   types.rs   ReferenceUpdate, ScanEnvironment, ObjectKind
//!        |
//!        v
//!  ,--------------------------------,
//!  |            backend             |
//!  '-----+-------------------+------'
//!        |                   |
//!        v                   v
//!   GixBackend          ShellBackend ----> batch.rs
//!   (gix, refs)         (git CLI)          BatchSession
//!   .head_ref_name      .rev_list          "git cat-file --batch"
//!   .resolve_reference  .changed_blobs     .read_object -> BlobReader
//! ```
//!
//! **`GixBackend`**: pure Rust, no subprocess, reference reads only.
//! **`ShellBackend`**: git CLI, honours the push quarantine through
//! `GIT_ALTERNATE_OBJECT_DIRECTORIES`.

pub mod backend;
pub mod batch;
pub mod types;

pub use types::{
    ObjectId, ObjectKind, ReferenceUpdate, Repository, ScanEnvironment, parse_object_id,
};

#[cfg(test)]
pub(crate) mod fixture;
