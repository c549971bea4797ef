// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process execution and lifecycle management.
//!
//! ```text
//! run_with_cancellation(token)          spawn_piped()
//!              |                              |
//!              v                              v
//!      build_command()                build_command()
//!   args, cwd, env, kill_on_drop     stdin/stdout piped
//!              |                     stderr per StreamFlags
//!              v                              |
//!   select! wait_with_output                  v
//!           | token.cancelled          Child (caller owns)
//!           v                          stderr --> trace! task
//!   validate exit_code
//!              |
//!              v
//!       ProcessOutput
//!    { stdout, stderr }
//! ```

use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use super::builder::{ProcessBuilder, ProcessOutput, StreamFlags};
use crate::error::ProcessError;

impl ProcessBuilder {
    /// Returns the display name for this process.
    fn display_name(&self) -> String {
        self.name_override().map_or_else(
            || {
                self.program().file_stem().map_or_else(
                    || "process".to_string(),
                    |s| s.to_string_lossy().into_owned(),
                )
            },
            String::from,
        )
    }

    /// Returns the full command line as a string (for logging).
    pub(crate) fn command_line(&self) -> String {
        use std::fmt::Write as _;

        let mut cmd = format!("{}", self.program().display());
        for arg in self.args_slice() {
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    /// Runs the process to completion, capturing stdout and stderr.
    ///
    /// When the token is cancelled the child is killed and
    /// `ProcessError::Cancelled` is returned; cancellation never looks like
    /// an empty successful run.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Spawning the child process fails.
    /// - Collecting output fails.
    /// - The process exits with a non-zero status.
    /// - The token is cancelled before the process exits.
    pub async fn run_with_cancellation(
        self,
        token: &CancellationToken,
    ) -> Result<ProcessOutput, ProcessError> {
        let name = self.display_name();
        let cmd_line = self.command_line();

        if token.is_cancelled() {
            return Err(ProcessError::Cancelled { command: cmd_line });
        }

        if let Some(cwd) = self.working_dir() {
            debug!(cwd = %cwd.display(), "cd");
        }
        debug!(cmd = %cmd_line, "exec");

        let mut command = self.build_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command
            .spawn()
            .map_err(|source| ProcessError::SpawnFailed {
                command: cmd_line.clone(),
                source,
            })?;
        trace!(process = %name, pid = ?child.id(), "spawned");

        // Dropping the wait future drops the child, and kill_on_drop reaps it.
        let waited = tokio::select! {
            output = child.wait_with_output() => Some(output),
            () = token.cancelled() => None,
        };
        let Some(output) = waited else {
            warn!(process = %name, "cancellation requested, process killed");
            return Err(ProcessError::Cancelled { command: cmd_line });
        };
        let output = output.map_err(|source| ProcessError::OutputError {
            command: cmd_line.clone(),
            source,
        })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            if !stderr.is_empty() {
                error!(process = %name, stderr = %stderr, "process error output");
            }
            return Err(ProcessError::NonZeroExit {
                command: cmd_line,
                code: exit_code,
                stderr,
            });
        }

        trace!(process = %name, exit_code, "completed");
        Ok(ProcessOutput::new(output.stdout, stderr))
    }

    /// Spawns a long-lived child with piped stdin and stdout.
    ///
    /// The caller owns the child and its pipes. Stderr follows the builder's
    /// [`StreamFlags`]; with `FORWARD_TO_LOG` a background task relays each
    /// line to the trace log until the child exits.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::SpawnFailed` if the child cannot be started.
    pub fn spawn_piped(self) -> Result<Child, ProcessError> {
        let name = self.display_name();
        let cmd_line = self.command_line();
        debug!(cmd = %cmd_line, "spawn");

        let stderr_flags = self.stderr_config();
        let mut command = self.build_command();
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Self::stdio_from_flags(stderr_flags));

        let mut child = command
            .spawn()
            .map_err(|source| ProcessError::SpawnFailed {
                command: cmd_line,
                source,
            })?;
        trace!(process = %name, pid = ?child.id(), "spawned");

        if stderr_flags.contains(StreamFlags::FORWARD_TO_LOG)
            && let Some(stderr) = child.stderr.take()
        {
            tokio::spawn(forward_stderr(stderr, name));
        }

        Ok(child)
    }

    /// Builds the tokio Command from this builder's configuration.
    fn build_command(&self) -> Command {
        let mut command = Command::new(self.program());

        command.args(self.args_slice());

        if let Some(cwd) = self.working_dir() {
            command.current_dir(cwd);
        }

        for (key, value) in self.env_changes() {
            match value {
                Some(value) => command.env(key, value),
                None => command.env_remove(key),
            };
        }

        // Kill on drop for safety
        command.kill_on_drop(true);

        command
    }

    /// Converts `StreamFlags` to Stdio configuration.
    fn stdio_from_flags(flags: StreamFlags) -> Stdio {
        if flags.contains(StreamFlags::BIT_BUCKET) {
            Stdio::null()
        } else {
            Stdio::piped()
        }
    }
}

/// Relays stderr lines of a piped child to the trace log.
async fn forward_stderr(stderr: ChildStderr, process_name: String) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                trace!(process = %process_name, stream = "stderr", line = %line, "output");
            }
            Ok(None) => break,
            Err(e) => {
                warn!(process = %process_name, error = %e, "error reading stderr");
                break;
            }
        }
    }
}
