//! Tunnel frame codec.
//!
//! # Frame Format
//!
//! Each frame is one binary message on the relay tunnel: a fixed tag
//! prefix immediately followed by the payload. Output and input chunks
//! carry their bytes unmodified; Exit carries the decimal ASCII exit code;
//! Resize carries ASCII `"<cols>;<rows>"`.
//!
//! The codec is pure and stateless. Unknown tags decode to
//! [`DecodedFrame::Unknown`] rather than an error so that receivers can
//! skip frame kinds introduced by newer relays.

use crate::error::{ProtocolError, Result};
use crate::messages::SessionMessage;

/// Tag prefix for stdin frames (operator input toward the job).
pub const STDIN_PREFIX: &[u8] = b"\x00,";

/// Tag prefix for stdout frames.
pub const STDOUT_PREFIX: &[u8] = b"\x01,";

/// Tag prefix for stderr frames.
pub const STDERR_PREFIX: &[u8] = b"\x02,";

/// Tag prefix for terminal resize frames.
pub const RESIZE_PREFIX: &[u8] = b"resize,";

/// Tag prefix for job exit frames.
pub const EXIT_PREFIX: &[u8] = b"exit,";

/// Outcome of decoding one tunnel frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    /// The frame mapped onto a session message.
    Message(SessionMessage),
    /// The tag is not part of this protocol revision; receivers skip it.
    Unknown,
}

/// Encodes a session message into its tunnel frame bytes.
///
/// Total and lossless for every variant: `decode(encode(m))` yields `m`
/// back for all well-formed messages.
pub fn encode(message: &SessionMessage) -> Vec<u8> {
    match message {
        SessionMessage::Stdout(data) => with_prefix(STDOUT_PREFIX, data),
        SessionMessage::Stderr(data) => with_prefix(STDERR_PREFIX, data),
        SessionMessage::Stdin(data) => with_prefix(STDIN_PREFIX, data),
        SessionMessage::Exit(code) => with_prefix(EXIT_PREFIX, code.to_string().as_bytes()),
        SessionMessage::Resize { cols, rows } => {
            with_prefix(RESIZE_PREFIX, format!("{};{}", cols, rows).as_bytes())
        }
    }
}

/// Decodes one tunnel frame.
///
/// Returns [`DecodedFrame::Unknown`] for unrecognized tags. A Resize
/// payload that does not split into exactly two integer fields, or an Exit
/// payload that is not a decimal integer, is a
/// [`ProtocolError::MalformedFrame`].
pub fn decode(frame: &[u8]) -> Result<DecodedFrame> {
    if let Some(payload) = frame.strip_prefix(STDIN_PREFIX) {
        return Ok(DecodedFrame::Message(SessionMessage::Stdin(
            payload.to_vec(),
        )));
    }
    if let Some(payload) = frame.strip_prefix(STDOUT_PREFIX) {
        return Ok(DecodedFrame::Message(SessionMessage::Stdout(
            payload.to_vec(),
        )));
    }
    if let Some(payload) = frame.strip_prefix(STDERR_PREFIX) {
        return Ok(DecodedFrame::Message(SessionMessage::Stderr(
            payload.to_vec(),
        )));
    }
    if let Some(payload) = frame.strip_prefix(RESIZE_PREFIX) {
        return decode_resize(payload).map(DecodedFrame::Message);
    }
    if let Some(payload) = frame.strip_prefix(EXIT_PREFIX) {
        let code = parse_field::<i32>(payload, "exit")?;
        return Ok(DecodedFrame::Message(SessionMessage::Exit(code)));
    }
    Ok(DecodedFrame::Unknown)
}

fn with_prefix(prefix: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(prefix.len() + payload.len());
    frame.extend_from_slice(prefix);
    frame.extend_from_slice(payload);
    frame
}

fn decode_resize(payload: &[u8]) -> Result<SessionMessage> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| ProtocolError::malformed("resize", "payload is not valid UTF-8"))?;
    let Some((cols, rows)) = text.split_once(';') else {
        return Err(ProtocolError::malformed(
            "resize",
            format!("expected \"cols;rows\", got {:?}", text),
        ));
    };
    Ok(SessionMessage::Resize {
        cols: parse_field(cols.as_bytes(), "resize")?,
        rows: parse_field(rows.as_bytes(), "resize")?,
    })
}

fn parse_field<T: std::str::FromStr>(payload: &[u8], kind: &'static str) -> Result<T> {
    std::str::from_utf8(payload)
        .map_err(|_| ProtocolError::malformed(kind, "payload is not valid UTF-8"))?
        .parse::<T>()
        .map_err(|_| {
            ProtocolError::malformed(
                kind,
                format!("{:?} is not an integer", String::from_utf8_lossy(payload)),
            )
        })
}
