//! Terminator and idle-gap framing for serial byte streams.
//!
//! Bytes arrive one chunk at a time from a [`ByteSource`](serframe_transport::ByteSource)
//! and are grouped into frames. A frame closes when:
//! - a terminator byte arrives (default `\n` or `\r`; the terminator is not kept)
//! - the line stays quiet for the idle period (default 1000 ms)
//! - the buffer fills (default capacity 32, so at most 31 bytes per frame)
//! - the framer shuts down with bytes pending
//!
//! Completed frames go into a bounded [`FrameQueue`] that never blocks the
//! producer: when it is full the newest frame is dropped and counted.

#[cfg(feature = "async")]
pub mod async_framer;
pub mod assembler;
pub mod buffer;
pub mod config;
pub mod consumer;
pub mod error;
pub mod frame;
pub mod framer;
pub mod queue;
pub mod stats;
pub mod timer;

#[cfg(feature = "async")]
pub use async_framer::{AsyncCaptureHandle, AsyncFramer};
pub use assembler::FrameAssembler;
pub use buffer::{FrameBuffer, Push};
pub use config::{
    FramerConfig, DEFAULT_CAPACITY, DEFAULT_IDLE_PERIOD, DEFAULT_QUEUE_DEPTH, DEFAULT_TERMINATORS,
};
pub use consumer::{run_consumer, EchoHandler, FrameHandler, ECHO_PREAMBLE, GREETING, LINE_END};
pub use error::{FrameError, Result};
pub use frame::{CloseReason, Frame};
pub use framer::{CaptureHandle, Framer};
pub use queue::{Enqueue, FrameQueue};
pub use stats::{FramerStats, StatsSnapshot};
pub use timer::IdleTimer;
