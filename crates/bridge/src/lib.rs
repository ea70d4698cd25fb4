//! # TermLink Bridge Library
//!
//! This crate attaches an interactive terminal to a running job inside a
//! pipeline engine by bridging the engine's bidirectional RPC session
//! stream to a duplex WebSocket tunnel terminated by a remote relay.
//!
//! ## Overview
//!
//! One bridge instance handles exactly one session end-to-end:
//!
//! - **Session Coordinator**: derives the session identifier, performs the
//!   tunnel handshake, runs both pumps, reduces their outcomes
//! - **Outbound Pump**: engine messages → tunnel frames (stdout, stderr,
//!   exit)
//! - **Inbound Pump**: tunnel frames → engine messages (stdin, resize)
//! - **Job Adapter**: a local process exposed through the same seam the
//!   engine's RPC glue uses
//!
//! ## Architecture
//!
//! ```text
//!            ┌──────────────────────────────────────────┐
//!            │            TerminalSession               │
//!            ├──────────────────────────────────────────┤
//!  engine    │  ┌───────────────┐   ┌───────────────┐   │    relay
//!  stream ──▶│  │ Outbound Pump │   │ Inbound Pump  │   │◀── tunnel
//!  (recv)    │  └───────┬───────┘   └───────▲───────┘   │  (WebSocket)
//!  stream ◀──│          │ frame codec       │           │
//!  (send)    │          ▼ (protocol)        │           │
//!            │  ┌──────────────────────────────────┐    │
//!            │  │     Tunnel (close-once guard)    │    │
//!            │  └──────────────────────────────────┘    │
//!            └──────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`]: configuration loading and defaults
//! - [`stream`]: the engine-stream seam (traits + classified errors)
//! - [`tunnel`]: WebSocket tunnel with idempotent close
//! - [`session`]: pumps, coordinator, and benign/fatal classification
//! - [`job`]: local child-process adapter
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod job;
pub mod session;
pub mod stream;
pub mod tunnel;

// Re-export protocol for convenience
pub use protocol;

// Re-export config types for convenience
pub use config::{Config, RelayConfig};

// Re-export error types for convenience
pub use error::{BridgeError, Result};

// Re-export session types for convenience
pub use session::{SessionState, TerminalSession};

// Re-export stream types for convenience
pub use stream::{EngineReader, EngineWriter, StreamError};

// Re-export tunnel types for convenience
pub use tunnel::{Tunnel, TunnelError, TunnelReader};
