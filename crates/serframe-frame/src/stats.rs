use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::frame::CloseReason;

/// Producer-side counters.
///
/// Overflow and queue saturation are never reported to the byte source;
/// these counters are the only place they become visible.
#[derive(Debug, Default)]
pub struct FramerStats {
    bytes_received: AtomicU64,
    bytes_dropped: AtomicU64,
    frames_terminated: AtomicU64,
    frames_idle: AtomicU64,
    frames_overflow: AtomicU64,
    frames_shutdown: AtomicU64,
    frames_enqueued: AtomicU64,
    frames_dropped: AtomicU64,
    empty_suppressed: AtomicU64,
}

/// Point-in-time copy of [`FramerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub bytes_received: u64,
    pub bytes_dropped: u64,
    pub frames_terminated: u64,
    pub frames_idle: u64,
    pub frames_overflow: u64,
    pub frames_shutdown: u64,
    pub frames_enqueued: u64,
    pub frames_dropped: u64,
    pub empty_suppressed: u64,
}

impl StatsSnapshot {
    /// Frames closed with content, whether or not the queue accepted them.
    pub fn frames_closed(&self) -> u64 {
        self.frames_terminated + self.frames_idle + self.frames_overflow + self.frames_shutdown
    }
}

impl FramerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_bytes(&self, n: usize) {
        self.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_byte_dropped(&self) {
        self.bytes_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_close(&self, reason: CloseReason) {
        let counter = match reason {
            CloseReason::Terminator => &self.frames_terminated,
            CloseReason::Idle => &self.frames_idle,
            CloseReason::Overflow => &self.frames_overflow,
            CloseReason::Shutdown => &self.frames_shutdown,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_enqueued(&self) {
        self.frames_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_empty_suppressed(&self) {
        self.empty_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_dropped: self.bytes_dropped.load(Ordering::Relaxed),
            frames_terminated: self.frames_terminated.load(Ordering::Relaxed),
            frames_idle: self.frames_idle.load(Ordering::Relaxed),
            frames_overflow: self.frames_overflow.load(Ordering::Relaxed),
            frames_shutdown: self.frames_shutdown.load(Ordering::Relaxed),
            frames_enqueued: self.frames_enqueued.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            empty_suppressed: self.empty_suppressed.load(Ordering::Relaxed),
        }
    }
}
