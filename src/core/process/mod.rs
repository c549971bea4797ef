// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Async process spawning and management.
//!
//! ```text
//! ProcessBuilder::new("git")
//!   .args() .cwd() .env_var() .env_remove()
//!   .run_with_cancellation(token)   short commands
//!       --> ProcessOutput { stdout, stderr }
//!   .spawn_piped()                  long-lived children
//!       --> tokio::process::Child (stdin/stdout piped)
//! ```

pub mod builder;
mod runner;
#[cfg(test)]
mod tests;
