//! Outbound pump: engine stream → tunnel.
//!
//! Drains session messages from the engine and writes them to the relay
//! as frames. Output delivery is best-effort: a failed stdout/stderr write
//! is logged and the pump keeps going, because one dropped chunk must not
//! tear down an interactive session. The job's exit is the canonical end
//! of the session and triggers the tunnel's normal-closure handshake.

use protocol::{framing, SessionMessage};

use crate::error::BridgeError;
use crate::session::classify::classify_stream;
use crate::stream::EngineReader;
use crate::tunnel::Tunnel;

/// Runs the pump to completion, then drives the tunnel close exactly once.
///
/// The close handshake is control-path: if the pump itself ended cleanly
/// but the close fails, the close failure is the pump's result.
pub(crate) async fn run<R: EngineReader>(mut engine: R, tunnel: Tunnel) -> Result<(), BridgeError> {
    let result = pump(&mut engine, &tunnel).await;
    let closed = tunnel
        .close()
        .await
        .map_err(|err| BridgeError::Transport(format!("tunnel close: {}", err)));
    result.and(closed)
}

async fn pump<R: EngineReader>(engine: &mut R, tunnel: &Tunnel) -> Result<(), BridgeError> {
    loop {
        let message = match engine.recv().await {
            Ok(Some(message)) => message,
            Ok(None) => {
                tracing::debug!("engine stream ended");
                return Ok(());
            }
            Err(err) => {
                tracing::debug!(error = %err, "engine stream receive failed");
                return classify_stream(err).into_result();
            }
        };

        match message {
            SessionMessage::Stdout(_) | SessionMessage::Stderr(_) => {
                let kind = message.kind();
                if let Err(err) = tunnel.send(framing::encode(&message)).await {
                    tracing::warn!(kind, error = %err, "dropping output chunk after tunnel write failure");
                }
            }
            SessionMessage::Exit(code) => {
                if let Err(err) = tunnel.send(framing::encode(&message)).await {
                    tracing::warn!(code, error = %err, "tunnel write failed for exit frame");
                }
                tracing::debug!(code, "job exited, closing tunnel");
                return Ok(());
            }
            other => {
                // Stdin/Resize only legitimately flow inbound.
                tracing::trace!(kind = other.kind(), "ignoring inbound-only message on outbound stream");
            }
        }
    }
}
