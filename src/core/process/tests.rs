// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::builder::ProcessBuilder;
use crate::error::ProcessError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_process_echo() {
    let output = ProcessBuilder::new("echo")
        .arg("hello")
        .run_with_cancellation(&CancellationToken::new())
        .await
        .expect("echo should succeed");

    let stdout = String::from_utf8_lossy(&output.into_stdout()).into_owned();
    insta::assert_snapshot!(stdout.trim(), @"hello");
}

#[tokio::test]
async fn test_process_non_zero_exit_is_error() {
    let err = ProcessBuilder::raw("echo broken >&2; exit 42")
        .run_with_cancellation(&CancellationToken::new())
        .await
        .expect_err("exit 42 should fail");

    match err {
        ProcessError::NonZeroExit { code, stderr, .. } => {
            assert_eq!(code, 42);
            assert_eq!(stderr, "broken");
        }
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
}

#[tokio::test]
async fn test_process_env_changes() {
    let output = ProcessBuilder::raw("echo \"$PUSHGATE_SET-${PUSHGATE_REMOVED:-unset}\"")
        .env_var("PUSHGATE_SET", "value")
        .env_remove("PUSHGATE_REMOVED")
        .run_with_cancellation(&CancellationToken::new())
        .await
        .expect("process should succeed");

    assert_eq!(String::from_utf8_lossy(&output.into_stdout()).trim(), "value-unset");
}

#[tokio::test]
async fn test_process_cancelled_before_start() {
    let token = CancellationToken::new();
    token.cancel();

    let err = ProcessBuilder::new("echo")
        .arg("never")
        .run_with_cancellation(&token)
        .await
        .expect_err("cancelled token should abort");
    assert!(matches!(err, ProcessError::Cancelled { .. }));
}

#[tokio::test]
async fn test_process_cancelled_while_running() {
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let err = ProcessBuilder::new("sleep")
        .arg("30")
        .run_with_cancellation(&token)
        .await
        .expect_err("sleep should be cancelled");

    assert!(matches!(err, ProcessError::Cancelled { .. }));
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
}

#[tokio::test]
async fn test_spawn_piped_round_trip() {
    let mut child = ProcessBuilder::new("cat")
        .quiet()
        .spawn_piped()
        .expect("cat should spawn");

    let mut stdin = child.stdin.take().expect("stdin is piped");
    let stdout = child.stdout.take().expect("stdout is piped");
    let mut lines = BufReader::new(stdout).lines();

    stdin.write_all(b"ping\n").await.unwrap();
    stdin.flush().await.unwrap();
    assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("ping"));

    drop(stdin);
    assert_eq!(lines.next_line().await.unwrap(), None);
    assert!(child.wait().await.unwrap().success());
}

#[test]
fn test_executable_lookup() {
    let builder = ProcessBuilder::which("sh").expect("sh should be in PATH");
    assert!(builder.program().exists());

    let err = ProcessBuilder::which("nonexistent_program_12345")
        .expect_err("unknown program should not resolve");
    assert!(matches!(err, ProcessError::ExecutableNotFound { .. }));
}

#[test]
fn test_command_line_quotes_spaces() {
    let builder = ProcessBuilder::new("git").args(["log", "--format=%H %s"]);
    assert_eq!(builder.command_line(), "git log \"--format=%H %s\"");
}
