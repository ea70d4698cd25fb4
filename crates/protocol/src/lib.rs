//! # TermLink Protocol Library
//!
//! This crate provides the message definitions and tunnel frame codec for
//! TermLink's terminal-attach bridge.
//!
//! ## Overview
//!
//! The protocol crate is the foundation of TermLink's communication layer,
//! providing:
//!
//! - **Message Definitions**: the five-variant session message union that
//!   flows on the engine's bidirectional RPC stream
//! - **Frame Codec**: tag-prefixed binary framing for the relay tunnel
//! - **Error Types**: decode failures surfaced to the bridge
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          Session Messages               │  Stdout/Stderr/Exit/Stdin/Resize
//! ├─────────────────────────────────────────┤
//! │              Framing                    │  tag prefix + payload
//! ├─────────────────────────────────────────┤
//! │        Transport (WebSocket)            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{framing, DecodedFrame, SessionMessage};
//!
//! let frame = framing::encode(&SessionMessage::Resize { cols: 80, rows: 24 });
//! assert_eq!(frame, b"resize,80;24");
//!
//! match framing::decode(&frame).unwrap() {
//!     DecodedFrame::Message(message) => assert_eq!(message.kind(), "resize"),
//!     DecodedFrame::Unknown => unreachable!(),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`messages`]: session message definitions
//! - [`framing`]: tunnel frame codec
//! - [`error`]: error types

pub mod error;
pub mod framing;
pub mod messages;

pub use error::{ProtocolError, Result};
pub use framing::{
    decode, encode, DecodedFrame, EXIT_PREFIX, RESIZE_PREFIX, STDERR_PREFIX, STDIN_PREFIX,
    STDOUT_PREFIX,
};
pub use messages::SessionMessage;
