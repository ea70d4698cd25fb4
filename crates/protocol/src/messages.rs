//! Session message definitions for TermLink.
//!
//! This module defines the structured messages that flow on the engine's
//! bidirectional session stream while a terminal is attached to a job.
//! Stdout/Stderr/Exit travel from the engine toward the relay; Stdin and
//! Resize travel the other way.

use serde::{Deserialize, Serialize};

/// One structured unit on the engine's session stream.
///
/// The five variants map one-to-one onto tunnel frame kinds (see
/// [`crate::framing`]). Output payloads are raw byte chunks straight from
/// the job's pipes; no re-chunking or re-encoding happens on the way
/// through the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionMessage {
    /// Output chunk from the job's standard output.
    Stdout(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Output chunk from the job's standard error.
    Stderr(#[serde(with = "serde_bytes")] Vec<u8>),
    /// The job's process has exited; no further output follows.
    Exit(i32),
    /// Input chunk destined for the job's standard input.
    Stdin(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Terminal dimension change from the operator's side.
    Resize {
        /// New terminal width in columns.
        cols: u32,
        /// New terminal height in rows.
        rows: u32,
    },
}

impl SessionMessage {
    /// Short lowercase name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionMessage::Stdout(_) => "stdout",
            SessionMessage::Stderr(_) => "stderr",
            SessionMessage::Exit(_) => "exit",
            SessionMessage::Stdin(_) => "stdin",
            SessionMessage::Resize { .. } => "resize",
        }
    }
}
