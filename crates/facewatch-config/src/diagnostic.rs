// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Converts Figment deserialization errors into miette diagnostics with
//! source spans, valid key listings, and "did you mean?" suggestions using
//! Jaro-Winkler string similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("config file `{path}` not found")]
    #[diagnostic(
        code(facewatch::config::missing_file),
        help("create it or pass --config <path>")
    )]
    MissingFile { path: String },

    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(facewatch::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Suggested correction via fuzzy matching, if any.
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(facewatch::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(facewatch::config::missing_key),
        help("add \"{key}\" to your config.json")
    )]
    MissingKey { key: String },

    /// A validation error for a config value.
    #[error("validation error: {message}")]
    #[diagnostic(code(facewatch::config::validation))]
    Validation { message: String },

    /// Catch-all for other configuration errors, including malformed JSON.
    #[error("configuration error: {0}")]
    #[diagnostic(code(facewatch::config::other))]
    Other(String),
}

fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert a `figment::Error` into a list of `ConfigError` diagnostics.
///
/// `sources` holds `(path, content)` pairs used to attach source spans to
/// unknown-key errors.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid_keys: Vec<&str> = expected.to_vec();
                let (span, src) = find_source_span(&error, field, sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, &valid_keys),
                    valid_keys: valid_keys.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: dotted(&error.path, field),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

fn dotted(path: &[String], field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", path.join("."))
    }
}

/// Find the source span of an unknown key in the loaded JSON files.
fn find_source_span(
    error: &figment::error::Error,
    field: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let source = source_path
        .and_then(|path| sources.iter().find(|(p, _)| *p == path))
        .or_else(|| sources.first());

    if let Some((path, content)) = source
        && let Some(offset) = find_key_offset(content, &error.path, field)
    {
        // +2 covers the surrounding quotes.
        let span = SourceSpan::new(offset.into(), field.len() + 2);
        return (Some(span), Some(NamedSource::new(path, content.clone())));
    }

    (None, None)
}

/// Find the byte offset of a quoted key in JSON content.
///
/// For `path = ["media"]` and `field = "stor_path"`, finds the `"media"` key
/// and then the first `"stor_path"` key after it. The offset points at the
/// opening quote.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let mut start = 0;
    for section in path {
        start = find_json_key(content, start, section)? + section.len() + 2;
    }
    find_json_key(content, start, field)
}

/// Offset of `"key"` followed by optional whitespace and `:`.
fn find_json_key(content: &str, from: usize, key: &str) -> Option<usize> {
    let needle = format!("\"{key}\"");
    let mut search = from;
    while let Some(pos) = content.get(search..)?.find(&needle) {
        let at = search + pos;
        let after = &content[at + needle.len()..];
        if after.trim_start().starts_with(':') {
            return Some(at);
        }
        search = at + needle.len();
    }
    None
}

/// Suggest a similar key name using Jaro-Winkler string similarity.
///
/// Returns the best match above the similarity threshold, or `None` if
/// no valid key is close enough to the unknown key.
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

/// Render a list of `ConfigError`s to stderr using miette's graphical handler.
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
    fn suggest_store_path_for_typo() {
        let valid = &["allowed_extensions", "store_path", "live_recency_secs"];
        assert_eq!(suggest_key("stor_path", valid), Some("store_path".to_string()));
    }

    #[test]
    fn suggest_min_matching_faces() {
        let valid = &["known_faces_dir", "confidence_threshold", "min_matching_faces"];
        assert_eq!(
            suggest_key("min_matching_face", valid),
            Some("min_matching_faces".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["name", "group"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "{\n  \"media\": {\n    \"stor_path\": \"x\"\n  }\n}";
        let path = vec!["media".to_string()];
        let offset = find_key_offset(content, &path, "stor_path").unwrap();
        assert_eq!(&content[offset..offset + 11], "\"stor_path\"");
    }

    #[test]
    fn find_key_offset_skips_values_with_same_text() {
        let content = r#"{"log": {"level": "name"}, "name": 1}"#;
        let offset = find_key_offset(content, &[], "name").unwrap();
        assert_eq!(&content[offset..offset + 7], "\"name\":");
    }
}
