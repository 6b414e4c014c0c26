// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge.
//!
//! Turns figment extraction failures into miette diagnostics. Unknown keys
//! carry a "did you mean?" hint computed with Jaro-Winkler similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::Diagnostic;
use thiserror::Error;

/// Keys scoring below this against every valid key get no suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem reported at startup or by `draftline config check`.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no section declares.
    #[error("unknown configuration key `{key}`{}", section_suffix(.section))]
    #[diagnostic(
        code(draftline::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        section: Option<String>,
        suggestion: Option<String>,
        valid_keys: String,
    },

    /// A value of the wrong type.
    #[error("invalid type for `{key}`: found {found}")]
    #[diagnostic(code(draftline::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
    },

    /// A required key was not supplied.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(draftline::config::missing_key),
        help("set `{key}` in draftline.toml or through a DRAFTLINE_* variable")
    )]
    MissingKey { key: String },

    /// A value that parsed but makes no sense.
    #[error("validation error: {message}")]
    #[diagnostic(code(draftline::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(draftline::config::other))]
    Other(String),
}

fn section_suffix(section: &Option<String>) -> String {
    match section {
        Some(s) if !s.is_empty() => format!(" in [{s}]"),
        _ => String::new(),
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error carried by a `figment::Error` into a [`ConfigError`].
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path = error.path.join(".");
            match &error.kind {
                Kind::UnknownField(field, expected) => ConfigError::UnknownKey {
                    key: field.clone(),
                    section: (!path.is_empty()).then(|| path.clone()),
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                },
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: if path.is_empty() {
                        field.to_string()
                    } else {
                        format!("{path}.{field}")
                    },
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: path,
                    found: actual.to_string(),
                    expected: expected.to_string(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Best Jaro-Winkler match for `unknown` among `valid_keys`, if any clears the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_key() {
        let valid = &["max_messages_per_run", "user_limit", "cron", "draft_endpoint"];
        assert_eq!(
            suggest_key("max_mesages_per_run", valid),
            Some("max_messages_per_run".to_string())
        );
    }

    #[test]
    fn suggests_secret_typo() {
        let valid = &["host", "port", "cron_secret", "internal_secret"];
        assert_eq!(
            suggest_key("internal_secert", valid),
            Some("internal_secret".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_key() {
        let valid = &["api_key", "base_url"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn unknown_key_message_names_section() {
        let err = ConfigError::UnknownKey {
            key: "bogus".into(),
            section: Some("gateway".into()),
            suggestion: None,
            valid_keys: "host, port".into(),
        };
        assert_eq!(err.to_string(), "unknown configuration key `bogus` in [gateway]");
    }
}
