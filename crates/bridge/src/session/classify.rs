//! Benign/fatal classification shared by both pumps.
//!
//! Both pump loops end for many reasons; only some of them are failures.
//! The mapping lives here, in one place, so the two directions cannot
//! drift apart in what they treat as a clean shutdown.

use crate::error::BridgeError;
use crate::stream::StreamError;
use crate::tunnel::TunnelError;

/// How a pump reacts to a terminal condition.
#[derive(Debug)]
pub enum Disposition {
    /// Expected end of session; terminate without error.
    Benign,
    /// Real failure; terminate and propagate.
    Fatal(BridgeError),
}

impl Disposition {
    /// Collapses the disposition into the pump's return value.
    pub fn into_result(self) -> Result<(), BridgeError> {
        match self {
            Disposition::Benign => Ok(()),
            Disposition::Fatal(err) => Err(err),
        }
    }
}

/// Classifies an engine-stream failure.
///
/// Caller cancellation and a vanished peer end the session silently;
/// anything else is a transport failure.
pub fn classify_stream(err: StreamError) -> Disposition {
    match err {
        StreamError::Cancelled => Disposition::Benign,
        StreamError::Unavailable(_) => Disposition::Benign,
        StreamError::Failed(detail) => Disposition::Fatal(BridgeError::Transport(detail)),
    }
}

/// Classifies a tunnel read failure.
///
/// Normal closure never reaches here: [`crate::tunnel::TunnelReader`]
/// surfaces it as end-of-stream. Everything that does arrive is fatal.
pub fn classify_tunnel(err: TunnelError) -> Disposition {
    Disposition::Fatal(BridgeError::Transport(err.to_string()))
}
