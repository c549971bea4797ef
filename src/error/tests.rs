// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{BatchError, ConfigError, GateError, PushBlocked, SettingsError};

#[test]
fn test_config_error_display() {
    let err = ConfigError::InvalidValue {
        section: "scan".to_string(),
        key: "max_blob_size".to_string(),
        message: "must be a number".to_string(),
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for 'max_blob_size' in section '[scan]': must be a number"
    );
}

#[test]
fn test_protocol_mismatch_names_both_ids() {
    let err = BatchError::ProtocolMismatch {
        expected: "aaaa".to_string(),
        actual: "bbbb".to_string(),
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"cat-file returned object 'bbbb' but expected 'aaaa'"
    );
}

#[test]
fn test_gate_settings_error_keeps_source() {
    let err = GateError::Settings(SettingsError::Unavailable("db down".to_string()));
    assert_eq!(
        err.to_string(),
        "failed to check settings whether secret scanning is enabled: settings store unavailable: db down"
    );
    let source = std::error::Error::source(&err).expect("settings error should be the source");
    assert_eq!(source.to_string(), "settings store unavailable: db down");
}

#[test]
fn test_push_blocked_displays_reason_only() {
    let err = PushBlocked {
        reason: "Changes blocked by security scan results".to_string(),
    };
    assert_eq!(err.to_string(), "Changes blocked by security scan results");
}

