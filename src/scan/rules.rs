// pushgate: pre-receive secret scanning gate
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Regex detection rules.
//!
//! A rule reports capture group 1 when the pattern has one, the whole match
//! otherwise.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScanError;

/// A rule as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub id: String,
    pub description: String,
    pub pattern: String,
}

impl RuleConfig {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            pattern: pattern.into(),
        }
    }
}

/// Built-in rules used when the configuration names none.
#[must_use]
pub fn default_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig::new(
            "aws-access-key-id",
            "AWS access key ID",
            r"\b((?:AKIA|ASIA)[0-9A-Z]{16})\b",
        ),
        RuleConfig::new(
            "github-pat",
            "GitHub personal access token",
            r"\b(gh[pousr]_[0-9A-Za-z]{36})\b",
        ),
        RuleConfig::new(
            "private-key",
            "Private key",
            r"-----BEGIN (?:RSA |EC |DSA |OPENSSH |PGP |ENCRYPTED )?PRIVATE KEY(?: BLOCK)?-----",
        ),
        RuleConfig::new(
            "slack-token",
            "Slack token",
            r"\b(xox[abposr]-[0-9A-Za-z-]{10,72})\b",
        ),
    ]
}

#[derive(Debug)]
struct Rule {
    id: String,
    description: String,
    regex: Regex,
}

/// One rule hit inside scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    pub rule_id: &'a str,
    pub description: &'a str,
    /// 1-based line number.
    pub line_number: usize,
    pub line: &'a str,
    pub secret: &'a str,
}

/// Compiled detection rules.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compiles rule patterns.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::InvalidRule` for the first pattern that does not compile.
    pub fn compile(configs: &[RuleConfig]) -> Result<Self, ScanError> {
        let rules = configs
            .iter()
            .map(|config| {
                Regex::new(&config.pattern)
                    .map(|regex| Rule {
                        id: config.id.clone(),
                        description: config.description.clone(),
                        regex,
                    })
                    .map_err(|source| ScanError::InvalidRule {
                        id: config.id.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(rules = rules.len(), "compiled scan rules");
        Ok(Self { rules })
    }

    /// Runs every rule over every line, in line order then rule order.
    #[must_use]
    pub fn detect<'a>(&'a self, content: &'a str) -> Vec<RuleMatch<'a>> {
        let mut matches = Vec::new();
        for (index, line) in content.lines().enumerate() {
            for rule in &self.rules {
                for captures in rule.regex.captures_iter(line) {
                    let Some(secret) = captures.get(1).or_else(|| captures.get(0)) else {
                        continue;
                    };
                    matches.push(RuleMatch {
                        rule_id: &rule.id,
                        description: &rule.description,
                        line_number: index + 1,
                        line,
                        secret: secret.as_str(),
                    });
                }
            }
        }
        matches
    }
}

/// Masks a secret, keeping a short prefix for identification.
#[must_use]
pub fn redact(secret: &str) -> String {
    const VISIBLE: usize = 4;
    const MASK: &str = "****";

    if secret.chars().count() <= VISIBLE * 2 {
        return MASK.to_string();
    }
    let prefix: String = secret.chars().take(VISIBLE).collect();
    format!("{prefix}{MASK}")
}
