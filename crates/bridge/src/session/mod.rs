//! Terminal session coordination.
//!
//! A [`TerminalSession`] owns one attach end-to-end: it derives the
//! session identifier, performs the tunnel handshake against the relay,
//! runs the two directional pumps concurrently, and reduces their outcomes
//! to a single result. The pumps share the tunnel strictly by direction
//! (outbound writes, inbound reads), so the data path needs no locking;
//! only the close handshake is shared, behind the tunnel's close-once
//! guard.

mod classify;
mod inbound;
mod outbound;

pub use classify::{classify_stream, classify_tunnel, Disposition};

use tokio::task::JoinError;
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::error::BridgeError;
use crate::stream::{EngineReader, EngineWriter};
use crate::tunnel;

/// Lifecycle of a single attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Deriving the identifier and performing the tunnel handshake.
    Connecting,
    /// Both pumps running.
    Active,
    /// Terminal; the tunnel is closed.
    Closed,
}

/// One remote terminal session, ephemeral, one per attach request.
pub struct TerminalSession {
    id: String,
    state: SessionState,
}

impl TerminalSession {
    /// Creates a session with a fresh opaque identifier.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: SessionState::Connecting,
        }
    }

    /// The identifier used to route the tunnel handshake.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bridges the engine stream to the relay until the session ends.
    ///
    /// Returns the first non-benign error from either pump, or `Ok(())`
    /// when the session terminated cleanly (job exit, caller cancellation,
    /// relay-side normal closure). The tunnel is closed by the time this
    /// returns, whichever pump finished first.
    pub async fn attach<R, W>(
        &mut self,
        relay: &RelayConfig,
        engine_rx: R,
        engine_tx: W,
    ) -> Result<(), BridgeError>
    where
        R: EngineReader + 'static,
        W: EngineWriter + 'static,
    {
        // Operator-visible hint: a matching external client connects to the
        // relay with this identifier.
        tracing::info!(
            session_id = %self.id,
            "remote terminal session started\n\nssh -p {} {}@{}",
            relay.ssh_port,
            self.id,
            relay.ssh_host,
        );

        let url = relay.session_url(&self.id);
        let (tunnel, reader) = tunnel::connect(&url).await?;
        self.state = SessionState::Active;
        tracing::debug!(session_id = %self.id, "tunnel established, pumps starting");

        let outbound = tokio::spawn(outbound::run(engine_rx, tunnel.clone()));
        let inbound = tokio::spawn(inbound::run(reader, engine_tx, tunnel));

        let (outbound_result, inbound_result) = tokio::join!(outbound, inbound);
        self.state = SessionState::Closed;
        tracing::debug!(session_id = %self.id, "session closed");

        // One terminal error per session, preferring the outbound pump's.
        flatten(outbound_result).and(flatten(inbound_result))
    }
}

impl Default for TerminalSession {
    fn default() -> Self {
        Self::new()
    }
}

fn flatten(joined: Result<Result<(), BridgeError>, JoinError>) -> Result<(), BridgeError> {
    joined.unwrap_or_else(|err| Err(BridgeError::Task(err.to_string())))
}
