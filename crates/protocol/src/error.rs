//! Error types for the protocol crate.

use thiserror::Error;

/// Protocol error type covering all possible failure modes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// A tunnel frame's payload does not match its tag's encoding.
    #[error("malformed {kind} frame: {detail}")]
    MalformedFrame {
        /// Frame kind whose payload failed to parse.
        kind: &'static str,
        /// Human-readable parse failure description.
        detail: String,
    },
}

impl ProtocolError {
    /// Convenience constructor used throughout the codec.
    pub(crate) fn malformed(kind: &'static str, detail: impl Into<String>) -> Self {
        ProtocolError::MalformedFrame {
            kind,
            detail: detail.into(),
        }
    }
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
