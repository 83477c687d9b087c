//! Tokio-driven framer.
//!
//! Same ownership model as [`Framer`](crate::Framer): one task owns the
//! [`FrameAssembler`] and reacts to an inbox of received bytes. The idle
//! deadline is a `tokio::time` sleep, so tests can drive it with a paused
//! clock.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use serframe_transport::{ByteSource, RxHandler, RxThread, TransportError};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::assembler::FrameAssembler;
use crate::config::FramerConfig;
use crate::error::{FrameError, Result};
use crate::queue::FrameQueue;
use crate::stats::{FramerStats, StatsSnapshot};

#[derive(Debug)]
enum Input {
    Rx { bytes: Bytes, at: std::time::Instant },
    SourceClosed,
}

/// Producer-side handle into an [`AsyncFramer`]. Never blocks or awaits.
#[derive(Debug, Clone)]
pub struct AsyncCaptureHandle {
    tx: mpsc::UnboundedSender<Input>,
}

impl AsyncCaptureHandle {
    pub fn push(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let input = Input::Rx {
            bytes: Bytes::copy_from_slice(bytes),
            at: Instant::now().into_std(),
        };
        let _ = self.tx.send(input);
    }

    pub fn push_byte(&self, byte: u8) {
        self.push(&[byte]);
    }
}

impl RxHandler for AsyncCaptureHandle {
    fn on_rx(&mut self, bytes: &[u8]) {
        self.push(bytes);
    }

    fn on_close(&mut self) {
        let _ = self.tx.send(Input::SourceClosed);
    }
}

/// A framer running as a tokio task.
pub struct AsyncFramer {
    tx: mpsc::UnboundedSender<Input>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    queue: Arc<FrameQueue>,
    stats: Arc<FramerStats>,
    config: FramerConfig,
}

impl AsyncFramer {
    /// Validate `config` and spawn the framer task on the current runtime.
    pub fn spawn(config: FramerConfig) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| FrameError::WorkerSpawn(io::Error::other(e)))?;

        let queue = Arc::new(FrameQueue::new(config.queue_depth));
        let stats = Arc::new(FramerStats::new());
        let assembler = FrameAssembler::new(config.clone(), Arc::clone(&queue), Arc::clone(&stats));
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = runtime.spawn(run_task(assembler, rx, cancel.clone()));
        info!(
            capacity = config.capacity,
            idle_ms = config.idle_period.as_millis() as u64,
            queue_depth = config.queue_depth,
            "async framer started"
        );

        Ok(Self {
            tx,
            cancel,
            task: Some(task),
            queue,
            stats,
            config,
        })
    }

    pub fn capture_handle(&self) -> AsyncCaptureHandle {
        AsyncCaptureHandle {
            tx: self.tx.clone(),
        }
    }

    /// Register this framer as the receive callback of `source`.
    pub fn attach<S: ByteSource>(&self, source: S) -> Result<RxThread> {
        if !source.is_ready() {
            return Err(TransportError::NotReady {
                name: source.name().to_string(),
            }
            .into());
        }
        debug!(device = source.name(), "attaching byte source");
        Ok(source.start(Box::new(self.capture_handle()))?)
    }

    pub fn queue(&self) -> &Arc<FrameQueue> {
        &self.queue
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    /// Token that stops the framer when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Flush the pending frame, close the queue, and wait for the task.
    pub async fn shutdown(mut self) -> StatsSnapshot {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if task.await.is_err() {
                self.queue.close();
            }
        }
        self.stats.snapshot()
    }
}

impl Drop for AsyncFramer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn idle_expiry(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => sleep_until(Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

async fn run_task(
    mut assembler: FrameAssembler,
    mut inbox: mpsc::UnboundedReceiver<Input>,
    cancel: CancellationToken,
) {
    loop {
        let input = match inbox.try_recv() {
            Ok(input) => input,
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {
                let deadline = assembler.idle_deadline();
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    input = inbox.recv() => match input {
                        Some(input) => input,
                        None => break,
                    },
                    _ = idle_expiry(deadline) => {
                        assembler.poll_idle(Instant::now().into_std());
                        continue;
                    }
                }
            }
        };

        match input {
            Input::Rx { bytes, at } => assembler.on_bytes(&bytes, at),
            Input::SourceClosed => {
                debug!("byte source closed");
                break;
            }
        }
    }

    // Bytes already delivered still belong to the final frame.
    inbox.close();
    while let Ok(input) = inbox.try_recv() {
        if let Input::Rx { bytes, at } = input {
            assembler.on_bytes(&bytes, at);
        }
    }

    assembler.shutdown();
    assembler.queue().close();
    let stats = assembler.stats().snapshot();
    info!(
        bytes_received = stats.bytes_received,
        frames_enqueued = stats.frames_enqueued,
        frames_dropped = stats.frames_dropped,
        "async framer stopped"
    );
}
