// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |         pre-receive / cat-blob / scan
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |          config           |
//!              |  TOML, env, CLI overrides |
//!              '-------------+-------------'
//!                            v
//!                          gate
//!             settings -> fallback -> scanner
//!                |           |          |
//!                v           v          v
//!            settings     git (gix)   scan (rules)
//!            (TOML)                     |
//!                                       v
//!                             git::batch (cat-file)
//!
//!   +-----------------------------------------+
//!   |  core   process                         |
//!   +-----------------------------------------+
//!   |  foundation   error, logging            |
//!   +-----------------------------------------+
//! ```

pub mod cli;
pub mod cmd;
pub mod config;
pub mod core;
pub mod error;
pub mod gate;
pub mod git;
pub mod logging;
pub mod scan;
pub mod settings;
