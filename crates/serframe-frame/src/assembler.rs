use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::buffer::{FrameBuffer, Push};
use crate::config::FramerConfig;
use crate::frame::{CloseReason, Frame};
use crate::queue::{Enqueue, FrameQueue};
use crate::stats::FramerStats;
use crate::timer::IdleTimer;

/// Frame state machine: the capture path and the idle handler.
///
/// An assembler has exactly one owner, the framer worker, so byte arrival
/// and idle expiry are serialized by construction. Nothing here is shared
/// except the output queue and the counters.
#[derive(Debug)]
pub struct FrameAssembler {
    config: FramerConfig,
    buffer: FrameBuffer,
    timer: IdleTimer,
    idle: bool,
    next_seq: u64,
    queue: Arc<FrameQueue>,
    stats: Arc<FramerStats>,
}

impl FrameAssembler {
    pub fn new(config: FramerConfig, queue: Arc<FrameQueue>, stats: Arc<FramerStats>) -> Self {
        Self {
            buffer: FrameBuffer::new(config.capacity),
            timer: IdleTimer::new(config.idle_period),
            idle: false,
            next_seq: 0,
            config,
            queue,
            stats,
        }
    }

    /// Capture a batch of bytes that arrived at `at`.
    ///
    /// A quiet gap that ended before `at` is handled first, so frames close
    /// on the timing of the line rather than the timing of delivery.
    pub fn on_bytes(&mut self, bytes: &[u8], at: Instant) {
        self.poll_idle(at);
        self.stats.record_bytes(bytes.len());
        for &byte in bytes {
            self.capture(byte, at);
        }
    }

    pub fn on_byte(&mut self, byte: u8, at: Instant) {
        self.on_bytes(&[byte], at);
    }

    fn capture(&mut self, byte: u8, at: Instant) {
        if self.idle {
            // First byte after a quiet period starts a new frame.
            self.idle = false;
            self.close_current_frame(CloseReason::Idle);
        }

        self.timer.arm(at);

        if self.config.is_terminator(byte) {
            self.close_current_frame(CloseReason::Terminator);
            return;
        }

        if self.buffer.push(byte) == Push::Full {
            self.stats.record_byte_dropped();
            trace!(byte, "frame buffer full; byte dropped");
            self.close_current_frame(CloseReason::Overflow);
        }
    }

    /// Run the idle handler if the idle period ended at or before `now`.
    pub fn poll_idle(&mut self, now: Instant) -> bool {
        if !self.timer.poll(now) {
            return false;
        }
        self.on_idle_expired();
        true
    }

    /// Idle handler: the line has been quiet for the idle period.
    ///
    /// The timer is not rearmed here; the next byte rearms it.
    pub fn on_idle_expired(&mut self) {
        self.idle = true;
        self.close_current_frame(CloseReason::Idle);
    }

    /// Close the pending frame and hand a copy to the queue.
    ///
    /// Empty frames are never emitted. Returns `None` when there was nothing
    /// to close.
    pub fn close_current_frame(&mut self, reason: CloseReason) -> Option<Enqueue> {
        if self.buffer.is_empty() {
            if reason == CloseReason::Terminator {
                self.stats.record_empty_suppressed();
            }
            return None;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let frame = Frame::new(seq, self.buffer.take(), reason);
        let len = frame.len();
        self.stats.record_close(reason);

        let outcome = self.queue.enqueue(frame);
        match outcome {
            Enqueue::Accepted => {
                self.stats.record_enqueued();
                debug!(seq, %reason, len, "frame closed");
            }
            Enqueue::Dropped => {
                self.stats.record_frame_dropped();
                warn!(seq, %reason, len, "frame queue full; frame dropped");
            }
        }
        Some(outcome)
    }

    /// Flush whatever is pending and stop the idle timer.
    pub fn shutdown(&mut self) {
        self.timer.cancel();
        self.close_current_frame(CloseReason::Shutdown);
    }

    /// When the idle handler is due, if the timer is armed.
    pub fn idle_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Whether the line went quiet and no byte has arrived since.
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// Bytes of the frame currently being received.
    pub fn pending(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    pub fn stats(&self) -> &Arc<FramerStats> {
        &self.stats
    }

    pub fn queue(&self) -> &Arc<FrameQueue> {
        &self.queue
    }
}
