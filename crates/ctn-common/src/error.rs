//! Unified error types for the ctn workspace.
//!
//! Every stage of the pipeline (lexing, parsing, interpreting, resolving)
//! reports through [`CtnError`] so callers get one taxonomy with enough
//! context (name, line, token kind) to locate the offending statement.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CtnError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// No token pattern matched at the current offset.
    #[error("unexpected character '{character}' on line {line}")]
    Lexical {
        /// The character that could not be tokenized.
        character: char,
        /// One-based source line.
        line: usize,
    },

    /// A token appeared where the grammar did not allow it.
    #[error("syntax error on line {line}: unexpected {token}, {message}")]
    Syntax {
        /// Kind of the offending token.
        token: String,
        /// One-based source line of the offending token.
        line: usize,
        /// What the parser expected instead.
        message: String,
    },

    /// A statement is well-formed but cannot be applied to the namespace.
    #[error("{message}")]
    Semantic {
        /// Description of the violated rule.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A known service could not be produced.
    #[error("could not resolve service \"{service}\": {message}")]
    Resolution {
        /// Name of the requested service.
        service: String,
        /// Why resolution failed.
        message: String,
    },

    /// An AST node was used in a way its shape does not allow.
    #[error("logic error: {message}")]
    Logic {
        /// Description of the misuse.
        message: String,
    },

    /// A registered constructor or construction action failed.
    #[error("failed to construct {class}: {message}")]
    Construction {
        /// Logical class name being constructed.
        class: String,
        /// Failure reported by the constructor.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl CtnError {
    /// Shorthand for a [`CtnError::Semantic`] error.
    pub fn semantic(message: impl Into<String>) -> Self {
        Self::Semantic {
            message: message.into(),
        }
    }

    /// Shorthand for a [`CtnError::Logic`] error.
    pub fn logic(message: impl Into<String>) -> Self {
        Self::Logic {
            message: message.into(),
        }
    }

    /// Shorthand for a [`CtnError::Resolution`] error.
    pub fn resolution(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            service: service.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CtnError>;
