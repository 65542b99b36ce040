// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment and validation failures become [`ConfigError`]s that miette
//! renders against the `fleet.toml` line that caused them, with a
//! "did you mean" hint for misspelled keys.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a known key needs before it is offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A TOML document that fed the configuration, as `(display name, content)`.
///
/// Sources are listed highest precedence first.
pub type ConfigSource = (String, String);

/// A configuration problem, with the offending location when it is known.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(fleet::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys the section accepts.
        valid_keys: String,
        #[label("not a fleet setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for `{key}`: {detail}")]
    #[diagnostic(code(fleet::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path, e.g. `hub.mailbox_capacity`.
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that parsed but breaks a rule, such as the keepalive bound.
    #[error("validation error: {message}")]
    #[diagnostic(code(fleet::config::validation))]
    Validation {
        /// Dotted path of the setting to change.
        key: String,
        message: String,
        #[label("set here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("configuration error: {0}")]
    #[diagnostic(code(fleet::config::other))]
    Other(String),
}

impl ConfigError {
    /// A validation failure for `key`, not yet tied to a source file.
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            key: key.into(),
            message: message.into(),
            span: None,
            src: None,
        }
    }

    /// The dotted key this error is about, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::UnknownKey { key, .. }
            | ConfigError::InvalidType { key, .. }
            | ConfigError::Validation { key, .. } => Some(key),
            ConfigError::Other(_) => None,
        }
    }

    /// Whether miette has a source line to underline.
    pub fn has_span(&self) -> bool {
        match self {
            ConfigError::UnknownKey { span, .. }
            | ConfigError::InvalidType { span, .. }
            | ConfigError::Validation { span, .. } => span.is_some(),
            ConfigError::Other(_) => false,
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error inside a `figment::Error` into a [`ConfigError`].
pub fn figment_to_config_errors(err: figment::Error, sources: &[ConfigSource]) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = locate(sources, &join_key(&error.path, field)).unzip();
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::InvalidType(actual, expected) => {
                let key = error.path.join(".");
                let (span, src) = locate(sources, &key).unzip();
                ConfigError::InvalidType {
                    detail: format!("found {actual}, expected {expected}"),
                    expected: expected.to_string(),
                    key,
                    span,
                    src,
                }
            }
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Point validation errors at the line that set their key.
///
/// Keys that come from defaults or env vars have no line and stay unspanned.
pub fn attach_sources(errors: &mut [ConfigError], sources: &[ConfigSource]) {
    for error in errors.iter_mut() {
        if let ConfigError::Validation { key, span, src, .. } = error {
            if let Some((at, named)) = locate(sources, key) {
                *span = Some(at);
                *src = Some(named);
            }
        }
    }
}

fn join_key(path: &[String], field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", path.join("."))
    }
}

/// The highest-precedence source that sets `dotted`, with a span over the key.
fn locate(sources: &[ConfigSource], dotted: &str) -> Option<(SourceSpan, NamedSource<String>)> {
    let field = dotted.rsplit_once('.').map_or(dotted, |(_, field)| field);
    sources.iter().find_map(|(name, content)| {
        let offset = key_offset(content, dotted)?;
        Some((
            SourceSpan::new(offset.into(), field.len()),
            NamedSource::new(name, content.clone()),
        ))
    })
}

/// Byte offset of a dotted key such as `hub.op_buffer` in a TOML document.
///
/// Understands `[section]` headers and `key = value` lines, which is all
/// `fleet.toml` uses. Top-level keys are matched before the first header.
pub fn key_offset(content: &str, dotted: &str) -> Option<usize> {
    let (section, field) = dotted.rsplit_once('.').unwrap_or(("", dotted));
    let mut current = "";
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let body = line.trim_start();
        let trimmed = body.trim_end();
        if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            current = header.trim();
        } else if current == section {
            if let Some((name, _)) = body.split_once('=') {
                if name.trim_end() == field {
                    return Some(offset + (line.len() - body.len()));
                }
            }
        }
        offset += line.len();
    }
    None
}

/// The known key closest to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render errors to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = "port = 1\n\n[server]\nport = 80\n\n[hub]\n  op_bufer = 4\nmailbox_capacity=8\n";

    fn at(offset: usize, len: usize) -> &'static str {
        &TOML[offset..offset + len]
    }

    #[test]
    fn suggests_close_keys_only() {
        assert_eq!(suggest_key("prot", &["host", "port"]), Some("port".to_string()));
        assert_eq!(
            suggest_key("mailbox_capacty", &["mailbox_capacity", "op_buffer"]),
            Some("mailbox_capacity".to_string())
        );
        assert_eq!(suggest_key("zzzzzz", &["queue_capacity", "workers"]), None);
    }

    #[test]
    fn key_offset_respects_sections() {
        assert_eq!(key_offset(TOML, "port"), Some(0));
        let server = key_offset(TOML, "server.port").unwrap();
        assert_eq!(at(server, 4), "port");
        assert_ne!(server, 0);
        let indented = key_offset(TOML, "hub.op_bufer").unwrap();
        assert_eq!(at(indented, 8), "op_bufer");
        let tight = key_offset(TOML, "hub.mailbox_capacity").unwrap();
        assert_eq!(at(tight, 16), "mailbox_capacity");
    }

    #[test]
    fn key_offset_misses_absent_keys() {
        assert!(key_offset(TOML, "hub.port").is_none());
        assert!(key_offset(TOML, "storage.wal_mode").is_none());
        // A key of the same name in another section is not a match.
        assert!(key_offset("[server]\nworkers = 1\n", "persistence.workers").is_none());
    }

    #[test]
    fn validation_errors_pick_up_the_first_source_that_sets_the_key() {
        let sources = vec![
            ("local.toml".to_string(), "[server]\nhost = \"x\"\n".to_string()),
            (
                "user.toml".to_string(),
                "[hub]\nkeepalive_interval_secs = 59\n".to_string(),
            ),
        ];
        let mut errors = vec![
            ConfigError::validation("hub.keepalive_interval_secs", "too long"),
            ConfigError::validation("persistence.workers", "must be at least 1"),
        ];
        attach_sources(&mut errors, &sources);

        assert!(errors[0].has_span());
        match &errors[0] {
            ConfigError::Validation { src: Some(src), .. } => assert_eq!(src.name(), "user.toml"),
            other => panic!("expected spanned validation error, got {other:?}"),
        }
        assert!(!errors[1].has_span());
        assert_eq!(errors[1].key(), Some("persistence.workers"));
    }

    #[test]
    fn unknown_key_help_lists_suggestion() {
        let help = unknown_key_help(Some("port"), "host, port");
        assert!(help.contains("did you mean `port`"));
        assert_eq!(unknown_key_help(None, "host"), "valid keys: host");
    }
}
