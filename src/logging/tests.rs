// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{LogConfig, LogLevel};
use tracing::Level;

#[test]
fn test_log_level_conversion() {
    assert_eq!(LogLevel::from_int(-3), LogLevel::SILENT);
    assert_eq!(LogLevel::from_int(0), LogLevel::SILENT);
    assert_eq!(LogLevel::from_int(3), LogLevel::INFO);
    assert_eq!(LogLevel::from_int(5), LogLevel::TRACE);
    assert_eq!(LogLevel::from_int(100), LogLevel::DUMP);
}

#[test]
fn test_log_level_bounds() {
    assert!(LogLevel::new(6).is_ok());
    let err = LogLevel::new(7).expect_err("7 is out of range");
    let message = err.to_string();
    insta::assert_snapshot!(message, @"invalid value for 'log_level' in section '[global]': log level must be 0-6, got 7");
    assert_eq!(LogLevel::from_u8(7), None);
    assert_eq!(LogLevel::try_from(4).ok(), Some(LogLevel::DEBUG));
    assert_eq!(u8::from(LogLevel::ERROR), 1);
}

#[test]
fn test_tracing_level() {
    assert_eq!(LogLevel::SILENT.to_tracing_level(), None);
    assert_eq!(LogLevel::WARN.to_tracing_level(), Some(Level::WARN));
    assert_eq!(LogLevel::DUMP.to_tracing_level(), Some(Level::TRACE));
}

#[test]
fn test_filter_strings_scope_to_crate() {
    assert_eq!(LogLevel::SILENT.to_filter_string(), "off");
    assert_eq!(LogLevel::WARN.to_filter_string(), "warn");
    assert_eq!(LogLevel::DEBUG.to_filter_string(), "warn,pushgate=debug");
    assert_eq!(LogLevel::DUMP.to_filter_string(), "trace");
}

#[test]
fn test_log_level_serde() {
    let level: LogLevel = serde_json::from_str("4").expect("valid level");
    assert_eq!(level, LogLevel::DEBUG);
    assert!(serde_json::from_str::<LogLevel>("9").is_err());
    assert_eq!(serde_json::to_string(&LogLevel::TRACE).expect("serialize"), "5");
}

#[test]
fn test_log_config_defaults() {
    let config = LogConfig::default();
    assert_eq!(config.console_level(), LogLevel::WARN);
    assert_eq!(config.file_level(), LogLevel::DEBUG);
    assert_eq!(config.log_file(), None);
    assert!(!config.json_file());
}

#[test]
fn test_log_config_builder() {
    let config = LogConfig::builder()
        .with_console_level(LogLevel::ERROR)
        .with_log_file("hook.log".to_string())
        .with_json_file(true)
        .build();
    assert_eq!(config.console_level(), LogLevel::ERROR);
    assert_eq!(config.log_file(), Some("hook.log"));
    assert!(config.json_file());
}
