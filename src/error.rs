use std::path::Path;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::span::Span;

#[derive(Debug, Error, Diagnostic)]
pub enum CodemodError {
    #[error("Failed to read file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize response JSON: {source}")]
    ResponseSerialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid config file '{path}': {message}")]
    Config { path: String, message: String },

    #[error("No parser available for extension '{extension}'")]
    NoProvider {
        extension: String,
        supported_extensions: Vec<String>,
    },

    #[error("Tree-sitter language initialization failed: {message}")]
    LanguageSetup { message: String },

    #[error("Provider '{provider}' failed to parse input: {message}")]
    ParseFailure {
        provider: &'static str,
        message: String,
    },

    #[error("Conflicting rewrites: {first} partially overlaps {second}")]
    ConflictingEdits { first: Span, second: Span },
}

impl CodemodError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let (error_type, suggestion) = match self {
            Self::NoProvider {
                supported_extensions,
                ..
            } => (
                "no_provider",
                Some(format!(
                    "Supported extensions: {}",
                    supported_extensions
                        .iter()
                        .map(|extension| format!(".{extension}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
            ),
            Self::InvalidRequest { .. } => ("invalid_request", None),
            Self::Config { .. } => (
                "invalid_config",
                Some("Known keys: skipImportDetection, testFunctionName".to_string()),
            ),
            Self::ParseFailure { .. } | Self::LanguageSetup { .. } => ("parse_failure", None),
            Self::ConflictingEdits { .. } => (
                "conflicting_edits",
                Some("Report the input file; the rest of the batch is unaffected".to_string()),
            ),
            Self::Io { .. } => ("io_error", None),
            Self::ResponseSerialization { .. } => ("serialization_error", None),
        };

        ErrorResponse {
            error: ErrorBody {
                r#type: error_type.to_string(),
                message: self.to_string(),
                suggestion,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub r#type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::CodemodError;
    use crate::span::Span;

    fn assert_error_type(
        error: CodemodError,
        expected_type: &str,
        expected_suggestion_substring: Option<&str>,
    ) {
        let response = error.to_error_response();
        assert_eq!(response.error.r#type, expected_type);

        match (
            response.error.suggestion.as_deref(),
            expected_suggestion_substring,
        ) {
            (Some(actual), Some(expected_substring)) => {
                assert!(
                    actual.contains(expected_substring),
                    "suggestion should contain '{expected_substring}', got '{actual}'"
                );
            }
            (None, None) => {}
            (actual, expected) => {
                panic!("suggestion mismatch; actual={actual:?}, expected_contains={expected:?}")
            }
        }
    }

    #[test]
    fn no_provider_lists_supported_extensions() {
        assert_error_type(
            CodemodError::NoProvider {
                extension: "py".to_string(),
                supported_extensions: vec!["js".to_string(), "ts".to_string()],
            },
            "no_provider",
            Some(".js, .ts"),
        );
    }

    #[test]
    fn parse_and_language_errors_share_parse_failure_type() {
        assert_error_type(
            CodemodError::ParseFailure {
                provider: "tree-sitter-javascript",
                message: "syntax error".to_string(),
            },
            "parse_failure",
            None,
        );
        assert_error_type(
            CodemodError::LanguageSetup {
                message: "abi mismatch".to_string(),
            },
            "parse_failure",
            None,
        );
    }

    #[test]
    fn config_error_points_at_known_keys() {
        assert_error_type(
            CodemodError::Config {
                path: "codemod.toml".to_string(),
                message: "unknown field `skip`".to_string(),
            },
            "invalid_config",
            Some("skipImportDetection"),
        );
    }

    #[test]
    fn conflicting_edits_message_names_both_spans() {
        let error = CodemodError::ConflictingEdits {
            first: Span { start: 0, end: 10 },
            second: Span { start: 5, end: 12 },
        };
        assert_eq!(
            error.to_string(),
            "Conflicting rewrites: [0, 10) partially overlaps [5, 12)"
        );
        assert_error_type(error, "conflicting_edits", Some("rest of the batch"));
    }

    #[test]
    fn io_error_has_no_suggestion() {
        assert_error_type(
            CodemodError::Io {
                path: "spec.js".to_string(),
                source: std::io::Error::other("boom"),
            },
            "io_error",
            None,
        );
    }
}
