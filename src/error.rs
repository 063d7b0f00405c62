//! Error types for the matching engine.
//!
//! "No match" is never an error: an empty result list is a normal outcome.
//! Everything here is reported to callers through the error-marker response
//! convention in [`crate::api`].

use thiserror::Error;

/// Errors produced by a matching call
#[derive(Debug, Error)]
pub enum MatchError {
    /// A match mode that is recognized but not implemented (currently `regex`)
    #[error("match mode '{0}' is not supported")]
    UnsupportedMode(String),

    /// A match or highlight mode name that is not recognized at all
    #[error("unknown {kind} '{value}'")]
    UnknownMode { kind: &'static str, value: String },

    /// The request was built against a different request version
    #[error("unsupported request version {found} (expected {expected}); rebuild the caller")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// The request carried an option this build does not know about
    #[error("unrecognized option: {0}; the caller may be built against a newer option set")]
    UnrecognizedOption(String),

    /// The request could not be decoded
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The worker pool could not be created
    #[error("failed to start matcher threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A worker panicked
    #[error("internal error: {0}")]
    Internal(String),
}

impl MatchError {
    /// Classify a request decoding failure.
    ///
    /// serde reports unknown fields with a stable "unknown field" prefix, which
    /// is the only case that gets its own variant.
    pub fn from_decode(err: serde_json::Error) -> Self {
        let message = err.to_string();
        if message.starts_with("unknown field") {
            MatchError::UnrecognizedOption(message)
        } else {
            MatchError::InvalidRequest(message)
        }
    }

    /// Whether the error stems from caller configuration rather than the engine
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MatchError::UnsupportedMode(_)
                | MatchError::UnknownMode { .. }
                | MatchError::UnsupportedVersion { .. }
                | MatchError::UnrecognizedOption(_)
                | MatchError::InvalidRequest(_)
        )
    }
}
