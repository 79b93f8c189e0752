//! Error types for profile resolution.
//!
//! `ResolveError` is what a caller of the resolver sees. `UpstreamError` never leaves
//! the orchestrator: every upstream fault downgrades the current strategy to
//! "produced nothing".

use thiserror::Error;

use crate::extract::CandidateIdentifier;

/// Terminal outcomes of a resolution that did not yield an accepted identifier.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    #[error("Not a profile URL: {url}")]
    InvalidProfileUrl { url: String },

    #[error("No candidate identifier found")]
    NoCandidateFound,

    #[error("No candidate passed validation; best guess is '{}'", .best_guess.canonical)]
    AmbiguousCandidate { best_guess: CandidateIdentifier },

    #[error("Resolution cancelled")]
    Cancelled,
}

impl ResolveError {
    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            reason: reason.into(),
        }
    }

    /// The unvalidated first candidate, if the resolution ended on one.
    /// Whether to use it is the caller's policy.
    pub fn best_guess(&self) -> Option<&CandidateIdentifier> {
        match self {
            Self::AmbiguousCandidate { best_guess } => Some(best_guess),
            _ => None,
        }
    }
}

/// Faults raised by the fetch collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream call timed out")]
    Timeout,

    #[error("unexpected upstream status {0}")]
    Status(u16),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Origin, Technique};

    #[test]
    fn best_guess_only_for_ambiguous() {
        let cand = CandidateIdentifier::new("jdoe", "jdoe", Origin::PrimarySearch, Technique::Link);
        let err = ResolveError::AmbiguousCandidate { best_guess: cand };
        assert_eq!(err.best_guess().map(|c| c.canonical.as_str()), Some("jdoe"));
        assert!(err.to_string().contains("jdoe"));

        assert!(ResolveError::NoCandidateFound.best_guess().is_none());
        assert!(ResolveError::invalid_query("empty").best_guess().is_none());
    }
}
