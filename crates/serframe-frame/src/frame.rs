use std::fmt;

use bytes::Bytes;
use serde::Serialize;

/// Why a frame was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// A terminator byte arrived.
    Terminator,
    /// The line stayed quiet for the idle period.
    Idle,
    /// The buffer was full when another byte arrived.
    Overflow,
    /// The framer stopped with bytes still pending.
    Shutdown,
}

impl CloseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::Terminator => "terminator",
            CloseReason::Idle => "idle",
            CloseReason::Overflow => "overflow",
            CloseReason::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed frame: an immutable copy of the buffer at close time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Close order within the framer, starting at 0.
    pub seq: u64,
    /// Frame content, terminator excluded.
    pub payload: Bytes,
    pub reason: CloseReason,
}

impl Frame {
    pub fn new(seq: u64, payload: impl Into<Bytes>, reason: CloseReason) -> Self {
        Self {
            seq,
            payload: payload.into(),
            reason,
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
