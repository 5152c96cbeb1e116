//! Error types for the matching engine.
//!
//! A failed match is a plain `false`; these errors only describe broken
//! configuration discovered while evaluating an expectation.

/// Configuration errors raised while evaluating an expectation.
///
/// These are fatal for the evaluation that triggered them: the dispatcher
/// surfaces them as a server error response instead of silently skipping
/// the expectation.
#[derive(Debug, thiserror::Error)]
pub enum ExpectationError {
    #[error("expectation declares a scenario state but no scenario name")]
    MissingScenarioName,
    #[error("unknown matcher kind: {0}")]
    UnknownMatcher(String),
    #[error("unknown input source kind: {0}")]
    UnknownInputSource(String),
    #[error("header input source requires a header name")]
    MissingHeaderName,
    #[error("invalid regex pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid JSON in condition value: {0}")]
    InvalidJsonCondition(String),
}
