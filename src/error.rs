//! Error kinds surfaced by the redaction pipeline.
//!
//! Every variant carries only non-PHI context (a filter id, an elapsed
//! duration, a `String` cause drawn from the underlying error's `Display`).
//! None of these ever carry the matched substring itself - a caller handling
//! a `RedactionError` must not be able to recover PHI from the error alone.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedactionError {
    #[error("policy validation failed: {reason}")]
    PolicyValidation { reason: String },

    #[error("dictionary unavailable: {reason}")]
    DictionaryUnavailable { reason: String },

    #[error("filter '{filter}' failed: {cause}")]
    FilterFailure { filter: String, cause: String },

    #[error("filter '{filter}' exceeded its deadline")]
    Timeout { filter: String },

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error (trace {trace_token})")]
    Internal { trace_token: String },
}

impl RedactionError {
    /// A process-local, deterministic-per-call counter dressed up as an
    /// opaque trace token. Not a real backtrace - this crate has no reason
    /// to carry a backtrace dependency the teacher never pulled in.
    pub fn internal(trace_token: impl Into<String>) -> Self {
        RedactionError::Internal {
            trace_token: trace_token.into(),
        }
    }

    /// Whether this failure should leave the caller with the original text
    /// and an empty token map, per the "never leak a half-redacted document"
    /// rule.
    pub fn discards_partial_output(&self) -> bool {
        matches!(self, RedactionError::Internal { .. } | RedactionError::Cancelled)
    }
}

pub type RedactionResult<T> = Result<T, RedactionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_never_echoes_a_filter_name_as_the_cause() {
        let err = RedactionError::FilterFailure {
            filter: "ssn".to_string(),
            cause: "regex backtrack limit".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("ssn"));
        assert!(text.contains("regex backtrack limit"));
    }

    #[test]
    fn internal_and_cancelled_discard_partial_output() {
        assert!(RedactionError::internal("abc123").discards_partial_output());
        assert!(RedactionError::Cancelled.discards_partial_output());
        assert!(!RedactionError::Timeout { filter: "name".into() }.discards_partial_output());
    }
}
