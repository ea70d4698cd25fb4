//! End-to-end tests for the terminal-session bridge.
//!
//! These tests run a real in-process WebSocket relay (a tokio listener
//! accepting one tunnel per test) and drive the engine side through
//! channel-backed stream doubles, verifying:
//! - frame delivery and the exit-triggered close handshake
//! - operator input forwarding (stdin, resize)
//! - benign/fatal termination classification
//! - connect failures and close idempotency

use std::future::Future;

use bridge::config::RelayConfig;
use bridge::{
    BridgeError, EngineReader, EngineWriter, SessionState, StreamError, TerminalSession,
};
use futures_util::{SinkExt, StreamExt};
use protocol::{ProtocolError, SessionMessage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

// =============================================================================
// Test Harness
// =============================================================================

/// Relay config pointing at a local listener.
fn local_relay(port: u16) -> RelayConfig {
    RelayConfig {
        url: format!("ws://127.0.0.1:{}", port),
        ..Default::default()
    }
}

async fn bind_relay() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

async fn accept_tunnel(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    tokio_tungstenite::accept_async(stream).await.unwrap()
}

fn normal_close() -> Option<CloseFrame<'static>> {
    Some(CloseFrame {
        code: CloseCode::Normal,
        reason: "".into(),
    })
}

/// Engine-stream receive half scripted from a channel. The channel sender
/// drives the pump: queued items are returned in order, and dropping the
/// sender is clean end-of-stream.
struct ScriptedReader {
    rx: mpsc::UnboundedReceiver<Result<Option<SessionMessage>, StreamError>>,
}

fn scripted_reader() -> (
    mpsc::UnboundedSender<Result<Option<SessionMessage>, StreamError>>,
    ScriptedReader,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ScriptedReader { rx })
}

impl EngineReader for ScriptedReader {
    fn recv(
        &mut self,
    ) -> impl Future<Output = Result<Option<SessionMessage>, StreamError>> + Send {
        async move {
            match self.rx.recv().await {
                Some(item) => item,
                None => Ok(None),
            }
        }
    }
}

/// Engine-stream send half that hands every message to the test.
struct CollectingWriter {
    tx: mpsc::UnboundedSender<SessionMessage>,
}

fn collecting_writer() -> (CollectingWriter, mpsc::UnboundedReceiver<SessionMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CollectingWriter { tx }, rx)
}

impl EngineWriter for CollectingWriter {
    fn send(
        &mut self,
        message: SessionMessage,
    ) -> impl Future<Output = Result<(), StreamError>> + Send {
        let result = self
            .tx
            .send(message)
            .map_err(|_| StreamError::Failed("engine receiver dropped".to_string()));
        async move { result }
    }
}

// =============================================================================
// Outbound Direction
// =============================================================================

#[tokio::test]
async fn test_exit_writes_frame_and_closes_tunnel() {
    let (listener, port) = bind_relay().await;
    let relay = tokio::spawn(async move {
        let mut ws = accept_tunnel(&listener).await;
        let mut frames = Vec::new();
        let mut close_code = None;
        while let Some(message) = ws.next().await {
            match message {
                Ok(WsMessage::Binary(data)) => frames.push(data),
                Ok(WsMessage::Close(frame)) => {
                    close_code = frame.map(|f| u16::from(f.code));
                    let _ = ws.close(None).await;
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        (frames, close_code)
    });

    let (script, reader) = scripted_reader();
    let (writer, _engine_rx) = collecting_writer();
    script
        .send(Ok(Some(SessionMessage::Stdout(b"hello".to_vec()))))
        .unwrap();
    script
        .send(Ok(Some(SessionMessage::Stderr(b"warn: x".to_vec()))))
        .unwrap();
    script.send(Ok(Some(SessionMessage::Exit(0)))).unwrap();

    let mut session = TerminalSession::new();
    session
        .attach(&local_relay(port), reader, writer)
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Closed);

    let (frames, close_code) = relay.await.unwrap();
    assert_eq!(
        frames,
        vec![
            b"\x01,hello".to_vec(),
            b"\x02,warn: x".to_vec(),
            b"exit,0".to_vec(),
        ]
    );
    assert_eq!(close_code, Some(1000), "close must use the normal code");
}

#[tokio::test]
async fn test_cancellation_is_benign_and_closes_tunnel() {
    let (listener, port) = bind_relay().await;
    let relay = tokio::spawn(async move {
        let mut ws = accept_tunnel(&listener).await;
        let mut saw_close = false;
        while let Some(message) = ws.next().await {
            match message {
                Ok(WsMessage::Close(_)) => {
                    saw_close = true;
                    let _ = ws.close(None).await;
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        saw_close
    });

    let (script, reader) = scripted_reader();
    let (writer, _engine_rx) = collecting_writer();
    script.send(Err(StreamError::Cancelled)).unwrap();

    let mut session = TerminalSession::new();
    let result = session.attach(&local_relay(port), reader, writer).await;
    assert!(result.is_ok(), "cancellation must not surface as a failure");
    assert!(relay.await.unwrap(), "tunnel must still be closed");
}

#[tokio::test]
async fn test_unavailable_peer_is_benign() {
    let (listener, port) = bind_relay().await;
    let relay = tokio::spawn(async move {
        let mut ws = accept_tunnel(&listener).await;
        while let Some(message) = ws.next().await {
            if matches!(message, Ok(WsMessage::Close(_)) | Err(_)) {
                let _ = ws.close(None).await;
                break;
            }
        }
    });

    let (script, reader) = scripted_reader();
    let (writer, _engine_rx) = collecting_writer();
    script
        .send(Err(StreamError::Unavailable("client quit".to_string())))
        .unwrap();

    let mut session = TerminalSession::new();
    let result = session.attach(&local_relay(port), reader, writer).await;
    assert!(result.is_ok());
    relay.await.unwrap();
}

#[tokio::test]
async fn test_stream_failure_propagates_while_inbound_ends_benignly() {
    let (listener, port) = bind_relay().await;
    let relay = tokio::spawn(async move {
        let mut ws = accept_tunnel(&listener).await;
        while let Some(message) = ws.next().await {
            if matches!(message, Ok(WsMessage::Close(_)) | Err(_)) {
                let _ = ws.close(None).await;
                break;
            }
        }
    });

    let (script, reader) = scripted_reader();
    let (writer, _engine_rx) = collecting_writer();
    script
        .send(Err(StreamError::Failed("rpc receive failed".to_string())))
        .unwrap();

    let mut session = TerminalSession::new();
    let err = session
        .attach(&local_relay(port), reader, writer)
        .await
        .unwrap_err();
    match err {
        BridgeError::Transport(detail) => assert_eq!(detail, "rpc receive failed"),
        other => panic!("expected transport error, got {:?}", other),
    }
    relay.await.unwrap();
}

// =============================================================================
// Inbound Direction
// =============================================================================

#[tokio::test]
async fn test_operator_input_reaches_engine() {
    let (listener, port) = bind_relay().await;
    let relay = tokio::spawn(async move {
        let mut ws = accept_tunnel(&listener).await;
        ws.send(WsMessage::Binary(b"\x00,ls\n".to_vec()))
            .await
            .unwrap();
        ws.send(WsMessage::Binary(b"resize,120;40".to_vec()))
            .await
            .unwrap();
        ws.close(normal_close()).await.unwrap();
        while let Some(message) = ws.next().await {
            if message.is_err() {
                break;
            }
        }
    });

    let (script, reader) = scripted_reader();
    let (writer, mut engine_rx) = collecting_writer();

    let attach = tokio::spawn(async move {
        let mut session = TerminalSession::new();
        session.attach(&local_relay(port), reader, writer).await
    });

    assert_eq!(
        engine_rx.recv().await,
        Some(SessionMessage::Stdin(b"ls\n".to_vec()))
    );
    assert_eq!(
        engine_rx.recv().await,
        Some(SessionMessage::Resize { cols: 120, rows: 40 })
    );

    // Inbound work is done; end the engine stream to release the outbound pump.
    script.send(Ok(None)).unwrap();

    attach.await.unwrap().unwrap();
    relay.await.unwrap();
}

#[tokio::test]
async fn test_unknown_frame_tag_is_skipped() {
    let (listener, port) = bind_relay().await;
    let relay = tokio::spawn(async move {
        let mut ws = accept_tunnel(&listener).await;
        ws.send(WsMessage::Binary(b"bogus,xyz".to_vec()))
            .await
            .unwrap();
        ws.send(WsMessage::Binary(b"\x00,still alive".to_vec()))
            .await
            .unwrap();
        ws.close(normal_close()).await.unwrap();
        while let Some(message) = ws.next().await {
            if message.is_err() {
                break;
            }
        }
    });

    let (script, reader) = scripted_reader();
    let (writer, mut engine_rx) = collecting_writer();

    let attach = tokio::spawn(async move {
        let mut session = TerminalSession::new();
        session.attach(&local_relay(port), reader, writer).await
    });

    // The unknown frame is skipped and the next stdin frame still arrives.
    assert_eq!(
        engine_rx.recv().await,
        Some(SessionMessage::Stdin(b"still alive".to_vec()))
    );
    script.send(Ok(None)).unwrap();

    attach.await.unwrap().unwrap();
    relay.await.unwrap();
}

#[tokio::test]
async fn test_malformed_resize_is_fatal() {
    let (listener, port) = bind_relay().await;
    let relay = tokio::spawn(async move {
        let mut ws = accept_tunnel(&listener).await;
        ws.send(WsMessage::Binary(b"resize,abc;24".to_vec()))
            .await
            .unwrap();
        while let Some(message) = ws.next().await {
            if matches!(message, Ok(WsMessage::Close(_)) | Err(_)) {
                let _ = ws.close(None).await;
                break;
            }
        }
    });

    let (script, reader) = scripted_reader();
    let (writer, _engine_rx) = collecting_writer();
    // End the engine stream right away; the failure under test is inbound.
    script.send(Ok(None)).unwrap();

    let mut session = TerminalSession::new();
    let err = session
        .attach(&local_relay(port), reader, writer)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Protocol(ProtocolError::MalformedFrame { kind: "resize", .. })
    ));
    relay.await.unwrap();
}

// =============================================================================
// Connect Failures
// =============================================================================

#[tokio::test]
async fn test_dial_failure_surfaces_connect_error() {
    // Bind and immediately drop to get a port with no listener.
    let (listener, port) = bind_relay().await;
    drop(listener);

    let (_script, reader) = scripted_reader();
    let (writer, _engine_rx) = collecting_writer();

    let mut session = TerminalSession::new();
    let err = session
        .attach(&local_relay(port), reader, writer)
        .await
        .unwrap_err();
    match err {
        BridgeError::Connect { status, .. } => assert_eq!(status, None),
        other => panic!("expected connect error, got {:?}", other),
    }
    // The session never reached the active state.
    assert_eq!(session.state(), SessionState::Connecting);
}

#[tokio::test]
async fn test_rejected_handshake_retains_status() {
    let (listener, port) = bind_relay().await;
    let relay = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        stream
            .write_all(b"HTTP/1.1 403 Forbidden\r\ncontent-length: 0\r\n\r\n")
            .await
            .unwrap();
    });

    let (_script, reader) = scripted_reader();
    let (writer, _engine_rx) = collecting_writer();

    let mut session = TerminalSession::new();
    let err = session
        .attach(&local_relay(port), reader, writer)
        .await
        .unwrap_err();
    match err {
        BridgeError::Connect { status, detail } => {
            assert_eq!(status, Some(403));
            assert!(detail.contains("403"), "detail was: {}", detail);
        }
        other => panic!("expected connect error, got {:?}", other),
    }
    relay.await.unwrap();
}

// =============================================================================
// Close Idempotency
// =============================================================================

#[tokio::test]
async fn test_concurrent_double_close_is_a_noop() {
    let (listener, port) = bind_relay().await;
    let relay = tokio::spawn(async move {
        let mut ws = accept_tunnel(&listener).await;
        while let Some(message) = ws.next().await {
            if matches!(message, Ok(WsMessage::Close(_)) | Err(_)) {
                let _ = ws.close(None).await;
                break;
            }
        }
    });

    let url = format!("ws://127.0.0.1:{}/session", port);
    let (tunnel, _reader) = bridge::tunnel::connect(&url).await.unwrap();

    let other = tunnel.clone();
    let (first, second) = tokio::join!(tunnel.close(), other.close());
    first.unwrap();
    second.unwrap();
    assert!(tunnel.is_closed());

    // A later call is still a no-op.
    tunnel.close().await.unwrap();
    relay.await.unwrap();
}
