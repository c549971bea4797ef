// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Human-readable output for blocked pushes.

use super::Decision;
use crate::scan::Finding;

/// Block reason reported for pushes with findings.
pub const BLOCK_MESSAGE: &str = "Changes blocked by security scan results";

/// Formats findings as hook output lines.
///
/// One block per finding, each followed by a blank line.
#[must_use]
pub fn findings_messages(findings: &[Finding]) -> Vec<String> {
    let noun = if findings.len() == 1 { "secret" } else { "secrets" };
    let mut messages = vec![
        format!("Push contains {} {noun}:", findings.len()),
        String::new(),
    ];
    for finding in findings {
        messages.extend([
            format!("  Rule:   {} ({})", finding.description, finding.rule_id),
            format!("  Commit: {}", finding.commit),
            format!("  File:   {}:{}", finding.path, finding.line),
            format!("  Secret: {}", finding.secret),
            String::new(),
        ]);
    }
    messages
}

/// Builds the blocking decision for a non-empty set of findings.
pub(crate) fn blocked(findings: &[Finding]) -> Decision {
    let mut messages = findings_messages(findings);
    messages.extend([String::new(), String::new()]);
    Decision {
        messages,
        block_reason: Some(BLOCK_MESSAGE.to_string()),
    }
}
