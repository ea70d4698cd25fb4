//! Inbound pump: tunnel → engine stream.
//!
//! Reads frames from the relay and forwards operator input to the engine.
//! Unknown frame tags are skipped so newer relays can add kinds without
//! breaking older bridges; a malformed resize payload is fatal because
//! resize framing is a contract, not advisory. Engine-side send failures
//! mirror the outbound pump's best-effort policy for data messages.

use protocol::{framing, DecodedFrame, SessionMessage};

use crate::error::BridgeError;
use crate::session::classify::classify_tunnel;
use crate::stream::EngineWriter;
use crate::tunnel::{Tunnel, TunnelReader};

/// Runs the pump to completion, then drives the idempotent tunnel close so
/// the tunnel is down whichever pump finishes first.
pub(crate) async fn run<W: EngineWriter>(
    mut reader: TunnelReader,
    mut engine: W,
    tunnel: Tunnel,
) -> Result<(), BridgeError> {
    let result = pump(&mut reader, &mut engine).await;
    if let Err(err) = tunnel.close().await {
        tracing::debug!(error = %err, "tunnel close after inbound pump exit");
    }
    result
}

async fn pump<W: EngineWriter>(
    reader: &mut TunnelReader,
    engine: &mut W,
) -> Result<(), BridgeError> {
    loop {
        let frame = match reader.next_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!("tunnel closed by relay");
                return Ok(());
            }
            Err(err) => {
                tracing::debug!(error = %err, "tunnel read failed");
                return classify_tunnel(err).into_result();
            }
        };

        match framing::decode(&frame)? {
            DecodedFrame::Message(
                message @ (SessionMessage::Stdin(_) | SessionMessage::Resize { .. }),
            ) => {
                let kind = message.kind();
                if let Err(err) = engine.send(message).await {
                    tracing::warn!(kind, error = %err, "dropping operator input after engine send failure");
                }
            }
            DecodedFrame::Message(other) => {
                tracing::trace!(kind = other.kind(), "ignoring outbound-only frame from relay");
            }
            DecodedFrame::Unknown => {
                tracing::trace!(len = frame.len(), "ignoring frame with unknown tag");
            }
        }
    }
}
