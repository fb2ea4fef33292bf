// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment deserialization failures and post-merge validation failures both
//! end up as [`ConfigError`] values, rendered by miette with source spans and
//! "did you mean?" suggestions for misspelled keys.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use memoria_core::MemoriaError;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler score for a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error. Each variant names the offending key path.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(memoria::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(memoria::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A required key is absent, or empty, after merging with defaults.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(memoria::config::missing_key),
        help("set `{key}` in memoria.toml or in the configuration passed to resolve")
    )]
    MissingKey { key: String },

    #[error("validation error at `{key}`: {message}")]
    #[diagnostic(code(memoria::config::validation))]
    Validation { key: String, message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(memoria::config::other))]
    Other(String),
}

impl ConfigError {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    pub fn invalid_type(
        key: impl Into<String>,
        expected: impl Into<String>,
        found: &serde_json::Value,
    ) -> Self {
        let expected = expected.into();
        Self::InvalidType {
            key: key.into(),
            detail: format!("found {}, expected {expected}", json_kind(found)),
            expected,
            span: None,
            src: None,
        }
    }

    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Dotted path of the offending key, when the variant carries one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::UnknownKey { key, .. }
            | Self::InvalidType { key, .. }
            | Self::MissingKey { key }
            | Self::Validation { key, .. } => Some(key),
            Self::Other(_) => None,
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Collapses a list of configuration errors into one [`MemoriaError::Validation`].
pub fn into_memoria_error(errors: &[ConfigError]) -> MemoriaError {
    let joined = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    MemoriaError::Validation(joined)
}

/// Convert a `figment::Error` into configuration diagnostics.
///
/// `toml_sources` holds `(path, content)` pairs for the files that were
/// layered, used to point at the offending line of an unknown key.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    let mut errors = Vec::new();

    for error in err {
        let config_error = match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid_keys: Vec<&str> = expected.to_vec();
                let suggestion = suggest_key(field, &valid_keys);
                let (span, src) = find_source_span(&error, field, toml_sources);
                let mut path: Vec<String> = error.path.clone();
                path.push(field.clone());

                ConfigError::UnknownKey {
                    key: path.join("."),
                    suggestion,
                    valid_keys: valid_keys.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
                span: None,
                src: None,
            },
            _ => ConfigError::Other(format!("{error}")),
        };

        errors.push(config_error);
    }

    errors
}

fn find_source_span(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let source = source_path.as_ref().and_then(|path| {
        toml_sources
            .iter()
            .find(|(p, _)| p == path)
            .map(|(p, content)| (p.as_str(), content.as_str()))
    });

    if let Some((path, content)) = source {
        if let Some(offset) = find_key_offset(content, &error.path, field) {
            let span = SourceSpan::new(offset.into(), field.len());
            return (Some(span), Some(NamedSource::new(path, content.to_string())));
        }
    }

    (None, None)
}

/// Byte offset of `field` in TOML `content`, searched after the table
/// header named by `path` (dotted, e.g. `[vectorStore.config]`).
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let search_start = if path.is_empty() {
        0
    } else {
        let header = format!("[{}]", path.join("."));
        content.find(&header).map(|pos| pos + header.len())?
    };

    let remaining = &content[search_start..];
    let mut byte_offset = 0;
    for line in remaining.lines() {
        let trimmed = line.trim_start();
        if let Some(after) = trimmed.strip_prefix(field) {
            if after.starts_with(' ') || after.starts_with('=') || after.starts_with('\t') {
                let field_start_in_line = line.len() - trimmed.len();
                return Some(search_start + byte_offset + field_start_in_line);
            }
        }
        byte_offset += line.len() + 1;
    }

    None
}

/// Closest valid key by Jaro-Winkler similarity, if any clears the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    let mut best_score = SUGGESTION_THRESHOLD;
    let mut best_match = None;

    for &key in valid_keys {
        let score = strsim::jaro_winkler(unknown, key);
        if score > best_score {
            best_score = score;
            best_match = Some(key.to_string());
        }
    }

    best_match
}

/// Render errors to stderr with miette's graphical handler.
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
    fn suggests_collection_name_for_typo() {
        let valid = &["collectionName", "dimension", "dbPath"];
        assert_eq!(
            suggest_key("colectionName", valid),
            Some("collectionName".to_string())
        );
    }

    #[test]
    fn suggests_api_key_for_swapped_letters() {
        let valid = &["apiKey", "model", "accountId", "url"];
        assert_eq!(suggest_key("apiKye", valid), Some("apiKey".to_string()));
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["provider", "config"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_nested_table() {
        let content = "[embedder]\nprovider = \"openai\"\n\n[embedder.config]\napiKye = \"x\"\n";
        let path = vec!["embedder".to_string(), "config".to_string()];
        let o = find_key_offset(content, &path, "apiKye").unwrap();
        assert_eq!(&content[o..o + 6], "apiKye");
    }

    #[test]
    fn errors_collapse_into_one_validation_error() {
        let errors = vec![
            ConfigError::missing("embedder.config.apiKey"),
            ConfigError::missing("vectorStore.config.url"),
        ];
        let err = into_memoria_error(&errors);
        let msg = err.to_string();
        assert!(msg.contains("embedder.config.apiKey"));
        assert!(msg.contains("vectorStore.config.url"));
        assert!(matches!(err, MemoriaError::Validation(_)));
    }

    #[test]
    fn invalid_type_reports_found_kind() {
        let err = ConfigError::invalid_type(
            "vectorStore.config.dimension",
            "positive integer",
            &serde_json::json!("big"),
        );
        assert_eq!(err.key(), Some("vectorStore.config.dimension"));
        assert!(err.to_string().contains("found string"));
    }
}
