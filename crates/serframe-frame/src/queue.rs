use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::{FrameError, Result};
use crate::frame::Frame;

/// Outcome of a non-blocking enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Enqueue {
    Accepted,
    /// The queue was full or closed; the frame was discarded.
    Dropped,
}

#[derive(Debug)]
struct QueueState {
    frames: VecDeque<Frame>,
    closed: bool,
}

/// Bounded FIFO handoff from the framer to a consumer.
///
/// Producers never block: enqueueing into a full queue drops the new frame.
/// Consumers block in [`dequeue`](FrameQueue::dequeue) until a frame arrives,
/// the timeout elapses, or the queue is closed and drained.
#[derive(Debug)]
pub struct FrameQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    capacity: usize,
    dropped: AtomicU64,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                frames: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            available: Condvar::new(),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `frame` unless the queue is full or closed. Never blocks.
    pub fn enqueue(&self, frame: Frame) -> Enqueue {
        let mut state = self.lock();
        if state.closed || state.frames.len() >= self.capacity {
            drop(state);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Enqueue::Dropped;
        }
        state.frames.push_back(frame);
        drop(state);
        self.available.notify_one();
        Enqueue::Accepted
    }

    /// Wait for the oldest frame. `None` waits indefinitely.
    ///
    /// Returns [`FrameError::Timeout`] when the wait elapses and
    /// [`FrameError::QueueClosed`] once the queue is closed and empty.
    pub fn dequeue(&self, timeout: Option<Duration>) -> Result<Frame> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();
        loop {
            if let Some(frame) = state.frames.pop_front() {
                return Ok(frame);
            }
            if state.closed {
                return Err(FrameError::QueueClosed);
            }
            state = match (deadline, timeout) {
                (Some(deadline), Some(timeout)) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(FrameError::Timeout(timeout));
                    }
                    self.available
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                _ => self
                    .available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    /// Take the oldest frame if one is ready.
    pub fn try_dequeue(&self) -> Option<Frame> {
        self.lock().frames.pop_front()
    }

    /// Reject further frames and wake blocked consumers.
    ///
    /// Frames already queued stay available to [`dequeue`](FrameQueue::dequeue).
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames rejected because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
