//! Error types for the crate.
//!
//! Failures fall into three layers: configuration problems detected before
//! any network call ([`ConfigError`]), typed remote-service failures at the
//! completion boundary ([`RemoteError`]), and the top-level [`Error`] that
//! the prediction entry point returns.

use thiserror::Error;

/// Configuration-related errors with structured variants.
///
/// All of these are detected eagerly, before any prompt is built or any
/// request is sent, and are never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("provide either a `prompt_template` or a `question_column` (with an optional `context_column`), but not both")]
    AmbiguousPromptMode,

    #[error("`context_column` is only valid together with `question_column`")]
    ContextWithoutQuestion,

    #[error("prompt template contains no {{{{column}}}} placeholders")]
    MalformedTemplate,

    #[error("expected column '{column}' in the input table")]
    MissingTableColumn { column: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Typed classification of remote completion-service failures.
///
/// Adapters map raw transport and payload errors into these kinds; the
/// engine decides what to retry based on them.
#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    /// The request contained more prompts than the service currently allows.
    ///
    /// Expected during batch-size discovery; the numeric limit is parsed out
    /// of the message.
    #[error("batch size limit exceeded: {message}")]
    SizeLimit { message: String },

    /// The request-rate or token-rate ceiling was hit.
    #[error("rate limited by the completion service")]
    RateLimited,

    /// A failure expected to succeed on retry (timeouts, 5xx responses).
    #[error("transient service error: {0}")]
    Transient(String),

    /// A failure retry cannot fix (malformed request, auth rejection).
    #[error("completion service rejected the request: {0}")]
    Fatal(String),
}

impl RemoteError {
    /// Whether a retry may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Transient(_))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("missing API key: set `api_key` in the config or the OPENAI_API_KEY environment variable")]
    MissingCredential,

    #[error("column '{column}' not found while rendering row {row}")]
    MissingColumn { column: String, row: usize },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: RemoteError,
    },

    /// The assembled output does not line up with the input prompts.
    ///
    /// Indicates a dispatcher or assembler bug, never a user mistake; it is
    /// surfaced rather than silently corrected.
    #[error("completion count mismatch: expected {expected}, got {actual}")]
    CompletionCountMismatch { expected: usize, actual: usize },

    #[error("internal dispatcher failure: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_and_transient_are_retriable() {
        assert!(RemoteError::RateLimited.is_retriable());
        assert!(RemoteError::Transient("503".into()).is_retriable());
    }

    #[test]
    fn size_limit_and_fatal_are_not_retriable() {
        let size = RemoteError::SizeLimit {
            message: "too many prompts".into(),
        };
        assert!(!size.is_retriable());
        assert!(!RemoteError::Fatal("bad request".into()).is_retriable());
    }

    #[test]
    fn malformed_template_message_shows_placeholder_syntax() {
        let err = ConfigError::MalformedTemplate;
        assert!(err.to_string().contains("{{column}}"));
    }

    #[test]
    fn retries_exhausted_reports_attempts_and_cause() {
        let err = Error::RetriesExhausted {
            attempts: 10,
            last: RemoteError::RateLimited,
        };
        let text = err.to_string();
        assert!(text.contains("10 attempts"));
        assert!(text.contains("rate limited"));
    }
}
