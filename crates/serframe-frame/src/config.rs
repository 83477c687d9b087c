use std::time::Duration;

use crate::error::{FrameError, Result};

/// Default frame buffer capacity in bytes (one slot reserved).
pub const DEFAULT_CAPACITY: usize = 32;

/// Default quiet interval after which a pending frame is closed.
pub const DEFAULT_IDLE_PERIOD: Duration = Duration::from_millis(1000);

/// Default number of completed frames the queue holds.
pub const DEFAULT_QUEUE_DEPTH: usize = 10;

/// Default terminator set: LF and CR.
pub const DEFAULT_TERMINATORS: [u8; 2] = [b'\n', b'\r'];

/// Configuration for a framer instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramerConfig {
    /// Frame buffer capacity. Frames carry at most `capacity - 1` bytes.
    pub capacity: usize,
    /// Quiet interval that closes a non-terminated frame.
    pub idle_period: Duration,
    /// Maximum number of completed frames waiting for the consumer.
    pub queue_depth: usize,
    /// Bytes that unconditionally close the current frame.
    pub terminators: Vec<u8>,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            idle_period: DEFAULT_IDLE_PERIOD,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            terminators: DEFAULT_TERMINATORS.to_vec(),
        }
    }
}

impl FramerConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_idle_period(mut self, idle_period: Duration) -> Self {
        self.idle_period = idle_period;
        self
    }

    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth;
        self
    }

    pub fn with_terminators(mut self, terminators: impl Into<Vec<u8>>) -> Self {
        self.terminators = terminators.into();
        self
    }

    /// Largest payload a single frame can carry.
    pub fn max_frame_len(&self) -> usize {
        self.capacity.saturating_sub(1)
    }

    pub fn is_terminator(&self, byte: u8) -> bool {
        self.terminators.contains(&byte)
    }

    /// Check the constraints every framer relies on.
    pub fn validate(&self) -> Result<()> {
        if self.capacity < 2 {
            return Err(FrameError::InvalidConfig(format!(
                "capacity must be at least 2 bytes (got {})",
                self.capacity
            )));
        }
        if self.queue_depth == 0 {
            return Err(FrameError::InvalidConfig(
                "queue depth must be at least 1".to_string(),
            ));
        }
        if self.idle_period.is_zero() {
            return Err(FrameError::InvalidConfig(
                "idle period must be greater than zero".to_string(),
            ));
        }
        if self.terminators.is_empty() {
            return Err(FrameError::InvalidConfig(
                "at least one terminator byte is required".to_string(),
            ));
        }
        Ok(())
    }
}
