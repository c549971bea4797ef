// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::cli::{Cli, Command};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_parse_version() {
    let cli = Cli::try_parse_from(["pushgate", "version"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn test_parse_global_options() {
    let cli = Cli::try_parse_from([
        "pushgate",
        "-l",
        "5",
        "-c",
        "/etc/pushgate.toml",
        "--config",
        "local.toml",
        "-s",
        "scan.timeout=10",
        "options",
    ])
    .unwrap();

    assert_eq!(cli.global.log_level, Some(5));
    assert_eq!(
        cli.global.configs,
        [
            PathBuf::from("/etc/pushgate.toml"),
            PathBuf::from("local.toml")
        ]
    );
    assert_eq!(
        cli.global.to_config_overrides(),
        ["scan.timeout=10", "global.log_level=5"]
    );
    assert!(matches!(cli.command, Some(Command::Options)));
}

#[test]
fn test_log_level_out_of_range() {
    assert!(Cli::try_parse_from(["pushgate", "-l", "7", "version"]).is_err());
}

#[test]
fn test_overrides_from_log_flags() {
    let cli = Cli::try_parse_from([
        "pushgate",
        "--file-log-level",
        "4",
        "--log-file",
        "/var/log/pushgate.log",
        "version",
    ])
    .unwrap();

    let overrides = cli.global.to_config_overrides();
    assert_eq!(
        overrides,
        ["global.file_log_level=4", "global.log_file=/var/log/pushgate.log"]
    );
}

#[test]
fn test_parse_pre_receive() {
    let cli = Cli::try_parse_from(["pushgate", "pre-receive", "--repo-id", "42", "--json"]).unwrap();
    let Some(Command::PreReceive(args)) = cli.command else {
        panic!("expected pre-receive");
    };
    assert_eq!(args.repo_id, "42");
    assert!(args.repo.is_none());
    assert!(args.json);
}

#[test]
fn test_pre_receive_requires_repo_id() {
    assert!(Cli::try_parse_from(["pushgate", "pre-receive"]).is_err());
}

#[test]
fn test_parse_cat_blob() {
    let cli = Cli::try_parse_from([
        "pushgate",
        "cat-blob",
        "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391",
        "-n",
        "16",
        "--repo",
        "/srv/git/app.git",
    ])
    .unwrap();
    let Some(Command::CatBlob(args)) = cli.command else {
        panic!("expected cat-blob");
    };
    assert_eq!(args.id, "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    assert_eq!(args.limit, 16);
    assert_eq!(args.repo, Some(PathBuf::from("/srv/git/app.git")));
}

#[test]
fn test_parse_scan() {
    let cli = Cli::try_parse_from(["pushgate", "scan", "HEAD", "--base", "HEAD~3"]).unwrap();
    let Some(Command::Scan(args)) = cli.command else {
        panic!("expected scan");
    };
    assert_eq!(args.rev, "HEAD");
    assert_eq!(args.base.as_deref(), Some("HEAD~3"));
}
