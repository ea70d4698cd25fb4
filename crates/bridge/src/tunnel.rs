//! WebSocket tunnel to the terminal relay.
//!
//! The tunnel is one duplex socket per session, addressed as
//! `<relay-base-url>/<session-id>`. After the handshake it is split by
//! direction: the outbound pump writes frames through [`Tunnel`], the
//! inbound pump reads them through [`TunnelReader`]. Closing is an
//! application-level handshake (a normal-closure control frame before
//! teardown) and is idempotent, so either pump's shutdown path may drive
//! it without coordinating with the other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::BridgeError;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Errors surfaced by tunnel reads and writes after the handshake.
#[derive(Debug, Error)]
pub enum TunnelError {
    /// The relay closed the tunnel without a normal-closure code.
    #[error("tunnel closed abnormally ({code}): {reason}")]
    AbnormalClose {
        /// WebSocket close code sent by the peer.
        code: u16,
        /// Close reason text, possibly empty.
        reason: String,
    },

    /// Underlying WebSocket transport failure.
    #[error("tunnel transport: {0}")]
    Transport(String),
}

/// Writing half of the tunnel, shared with both pumps' close paths.
///
/// Cloning is cheap; all clones refer to the same connection and the same
/// close-once guard.
#[derive(Clone)]
pub struct Tunnel {
    sink: Arc<Mutex<WsSink>>,
    closed: Arc<AtomicBool>,
}

/// Reading half of the tunnel, owned exclusively by the inbound pump.
pub struct TunnelReader {
    source: WsSource,
}

/// Dials the relay and performs the WebSocket handshake.
///
/// A handshake the relay rejects surfaces as [`BridgeError::Connect`] with
/// the relay's HTTP status retained; a network-level dial failure surfaces
/// the same variant without a status.
pub async fn connect(url: &str) -> Result<(Tunnel, TunnelReader), BridgeError> {
    let (ws_stream, _) = connect_async(url).await.map_err(|err| match err {
        WsError::Http(response) => {
            let status = response.status();
            BridgeError::Connect {
                status: Some(status.as_u16()),
                detail: format!("relay rejected handshake: {}", status),
            }
        }
        other => BridgeError::Connect {
            status: None,
            detail: format!("dial {}: {}", url, other),
        },
    })?;

    let (sink, source) = ws_stream.split();
    let tunnel = Tunnel {
        sink: Arc::new(Mutex::new(sink)),
        closed: Arc::new(AtomicBool::new(false)),
    };
    Ok((tunnel, TunnelReader { source }))
}

impl Tunnel {
    /// Writes one binary frame to the relay.
    pub async fn send(&self, frame: Vec<u8>) -> Result<(), TunnelError> {
        let mut sink = self.sink.lock().await;
        sink.send(WsMessage::Binary(frame))
            .await
            .map_err(|err| TunnelError::Transport(err.to_string()))
    }

    /// Performs the normal-closure handshake and closes the connection.
    ///
    /// Idempotent: only the first caller performs the handshake, every
    /// later or concurrent call is a no-op. Errors from a connection the
    /// peer already tore down are swallowed; anything else is a real
    /// control-path failure and propagates.
    pub async fn close(&self) -> Result<(), TunnelError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut sink = self.sink.lock().await;
        let close_frame = WsMessage::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        }));
        match sink.send(close_frame).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {}
            Err(err) => return Err(TunnelError::Transport(err.to_string())),
        }
        match sink.close().await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(err) => Err(TunnelError::Transport(err.to_string())),
        }
    }

    /// Whether the close handshake has been initiated.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl TunnelReader {
    /// Reads the next frame from the relay.
    ///
    /// Returns `Ok(None)` when the tunnel ended with a normal closure (or
    /// a clean stream end after one); control frames are skipped. A close
    /// frame with any other code is an [`TunnelError::AbnormalClose`].
    pub async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TunnelError> {
        loop {
            match self.source.next().await {
                Some(Ok(WsMessage::Binary(data))) => return Ok(Some(data)),
                Some(Ok(WsMessage::Text(text))) => return Ok(Some(text.into_bytes())),
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => continue,
                Some(Ok(WsMessage::Close(frame))) => {
                    return match frame {
                        Some(frame) if frame.code != CloseCode::Normal => {
                            Err(TunnelError::AbnormalClose {
                                code: frame.code.into(),
                                reason: frame.reason.into_owned(),
                            })
                        }
                        _ => Ok(None),
                    };
                }
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => return Ok(None),
                Some(Err(err)) => return Err(TunnelError::Transport(err.to_string())),
                None => return Ok(None),
            }
        }
    }
}
