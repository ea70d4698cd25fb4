//! Error types for the bridge crate.

use protocol::ProtocolError;
use thiserror::Error;

/// Fatal session errors surfaced to the caller of an attach.
///
/// Benign terminations (caller cancellation, clean end-of-stream, peer
/// unavailable, tunnel normal closure) are never represented here; the
/// pumps classify them away before an error can propagate.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Tunnel dial or handshake failed; the session never became active.
    ///
    /// `status` carries the relay's HTTP status when the handshake was
    /// rejected at the application level, and is `None` for network-level
    /// dial failures.
    #[error("tunnel connect failed: {detail}")]
    Connect {
        /// HTTP status from a rejected handshake, if any.
        status: Option<u16>,
        /// Human-readable failure description.
        detail: String,
    },

    /// A received frame's payload violated its encoding.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A read/write/receive/send failure not matching a benign pattern.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A pump task could not be joined (panicked or was aborted).
    #[error("session task failed: {0}")]
    Task(String),
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_display() {
        let err = BridgeError::Connect {
            status: Some(403),
            detail: "relay rejected handshake: 403 Forbidden".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "tunnel connect failed: relay rejected handshake: 403 Forbidden"
        );
    }

    #[test]
    fn test_protocol_error_passes_through() {
        let err: BridgeError = protocol::framing::decode(b"resize,x;y").unwrap_err().into();
        assert!(err.to_string().starts_with("malformed resize frame"));
    }

    #[test]
    fn test_transport_error_display() {
        let err = BridgeError::Transport("connection reset by peer".to_string());
        assert_eq!(err.to_string(), "transport failure: connection reset by peer");
    }
}
