//! The engine-stream seam.
//!
//! The bridge never establishes the engine's RPC session itself; it is
//! handed the two halves of an already-established bidirectional stream.
//! This module abstracts those halves as traits so the RPC glue, the local
//! job adapter, and test doubles can all plug into the same pumps.

use std::future::Future;

use protocol::SessionMessage;
use thiserror::Error;

/// Failure modes of the engine's session stream.
///
/// The split between variants is what drives the bridge's benign/fatal
/// classification: `Cancelled` and `Unavailable` end a session silently,
/// `Failed` aborts it.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The caller canceled the attach request.
    #[error("stream canceled by caller")]
    Cancelled,

    /// The peer went away (e.g. the engine's client disconnected).
    #[error("peer unavailable: {0}")]
    Unavailable(String),

    /// Any other receive/send failure.
    #[error("stream failure: {0}")]
    Failed(String),
}

/// Receiving half of the engine's session stream.
pub trait EngineReader: Send {
    /// Receives the next message, suspending until one is available.
    ///
    /// `Ok(None)` is clean end-of-stream.
    fn recv(
        &mut self,
    ) -> impl Future<Output = Result<Option<SessionMessage>, StreamError>> + Send;
}

/// Sending half of the engine's session stream.
pub trait EngineWriter: Send {
    /// Sends one message toward the engine.
    fn send(
        &mut self,
        message: SessionMessage,
    ) -> impl Future<Output = Result<(), StreamError>> + Send;
}
