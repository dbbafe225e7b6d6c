//! Error types for socratic-core.

use std::path::Path;

use thiserror::Error;

/// Result type alias using socratic-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while maintaining premises and drawing conclusions.
#[derive(Error, Debug)]
pub enum Error {
    /// Premise text was empty or otherwise malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Challenge of a premise that is not in the store
    #[error("Premise not found: {0}")]
    NotFound(String),

    /// Conclusion requested with no premises
    #[error("Empty state: {0}")]
    EmptyState(String),

    /// Generation backend failure, surfaced verbatim
    #[error("Generation error: {backend} - {message}")]
    Generation { backend: String, message: String },

    /// Durable storage read/write failure
    #[error("Persistence error at {path}: {message}")]
    Persistence { path: String, message: String },

    /// Conclusion failed the validation gate
    #[error("Invalid conclusion: {0}")]
    InvalidConclusion(String),

    /// Logic expression could not be parsed
    #[error("Expression parse error at {position} in '{input}': {message}")]
    ExpressionParse {
        input: String,
        position: usize,
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a generation error.
    pub fn generation(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a persistence error for the given path.
    pub fn persistence(path: impl AsRef<Path>, message: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create an expression parse error.
    pub fn expression_parse(
        input: impl Into<String>,
        position: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::ExpressionParse {
            input: input.into(),
            position,
            message: message.into(),
        }
    }

    /// Whether this condition is recovered locally (journaled, never raised).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound(_)
                | Self::EmptyState(_)
                | Self::InvalidConclusion(_)
        )
    }

    /// Short machine-readable name for journal entries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::EmptyState(_) => "empty_state",
            Self::Generation { .. } => "generation",
            Self::Persistence { .. } => "persistence",
            Self::InvalidConclusion(_) => "invalid_conclusion",
            Self::ExpressionParse { .. } => "expression_parse",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_taxonomy() {
        assert!(Error::Validation("empty".into()).is_recoverable());
        assert!(Error::NotFound("P".into()).is_recoverable());
        assert!(Error::EmptyState("none".into()).is_recoverable());
        assert!(Error::InvalidConclusion("C".into()).is_recoverable());
        assert!(!Error::generation("openai", "timeout").is_recoverable());
        assert!(!Error::persistence("/tmp/x", "denied").is_recoverable());
    }

    #[test]
    fn test_display_includes_context() {
        let err = Error::persistence("/state/premises.json", "disk full");
        assert_eq!(
            err.to_string(),
            "Persistence error at /state/premises.json: disk full"
        );
        assert_eq!(err.kind(), "persistence");
    }
}
