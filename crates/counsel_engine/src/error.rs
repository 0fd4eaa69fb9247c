//! Engine error taxonomy
//!
//! Errors here never cross the public `QueryEngine::answer` boundary; they
//! steer the control flow (advance, retry, fall back) and are logged along
//! the way.

use thiserror::Error;

/// Failure talking to the inference oracle
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("oracle response malformed: {0}")]
    Malformed(String),
}

/// Failure while consulting a single capability
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("unknown capability: {0}")]
    Unknown(String),

    #[error("capability fetch failed: {0}")]
    Fetch(String),

    #[error("capability timed out after {0}s")]
    Timeout(u64),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Failure while merging a parallel group's results
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("synthesis produced an empty answer")]
    EmptyAnswer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CapabilityError::Unknown("nope".to_string());
        assert_eq!(err.to_string(), "unknown capability: nope");

        let err = CapabilityError::Timeout(30);
        assert_eq!(err.to_string(), "capability timed out after 30s");

        let err = SynthesisError::EmptyAnswer;
        assert!(err.to_string().contains("empty answer"));
    }

    #[test]
    fn test_oracle_error_wraps_into_capability_error() {
        let inner = OracleError::Malformed("not json".to_string());
        let outer: CapabilityError = inner.into();
        assert!(outer.to_string().contains("not json"));
    }
}
