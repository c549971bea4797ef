// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Temporary git repositories for unit tests.

use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

use super::types::{ObjectId, parse_object_id};

/// A throwaway repository with a `main` branch.
pub(crate) struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let repo = Self { dir };
        repo.git(&["init", "-q", "-b", "main"]);
        repo.git(&["config", "user.email", "test@test.com"]);
        repo.git(&["config", "user.name", "Test"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new("git");
        command
            .args(args)
            .current_dir(self.path())
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_AUTHOR_NAME", "Test")
            .env("GIT_AUTHOR_EMAIL", "test@test.com")
            .env("GIT_COMMITTER_NAME", "Test")
            .env("GIT_COMMITTER_EMAIL", "test@test.com")
            .env_remove("GIT_DIR")
            .env_remove("GIT_OBJECT_DIRECTORY")
            .env_remove("GIT_ALTERNATE_OBJECT_DIRECTORIES");
        command
    }

    /// Runs git and returns trimmed stdout; panics on failure.
    pub(crate) fn git(&self, args: &[&str]) -> String {
        let output = self.command(args).output().expect("failed to run git");
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    pub(crate) fn rev_parse(&self, rev: &str) -> ObjectId {
        parse_object_id(&self.git(&["rev-parse", rev])).expect("rev-parse output is an id")
    }

    /// Writes the files, stages everything and commits.
    pub(crate) fn commit_files(&self, files: &[(&str, &str)], message: &str) -> ObjectId {
        for (path, content) in files {
            let full = self.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).expect("failed to create directories");
            }
            fs::write(full, content).expect("failed to write file");
        }
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "--allow-empty", "-m", message]);
        self.rev_parse("HEAD")
    }

    /// Deletes a tracked file and commits.
    pub(crate) fn remove_file(&self, path: &str, message: &str) -> ObjectId {
        self.git(&["rm", "-q", path]);
        self.git(&["commit", "-q", "-m", message]);
        self.rev_parse("HEAD")
    }

    /// Stores a loose blob and returns its id.
    pub(crate) fn write_blob(&self, content: &[u8]) -> ObjectId {
        let mut child = self
            .command(&["hash-object", "-w", "--stdin"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .expect("failed to spawn git hash-object");
        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(content)
            .expect("failed to write blob content");
        let output = child.wait_with_output().expect("git hash-object failed");
        assert!(output.status.success());
        parse_object_id(&String::from_utf8_lossy(&output.stdout)).expect("blob id")
    }
}
