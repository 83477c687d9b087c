use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use bytes::Bytes;
use serframe_transport::{ByteSource, RxHandler, RxThread, TransportError};
use tracing::{debug, info};

use crate::assembler::FrameAssembler;
use crate::config::FramerConfig;
use crate::error::{FrameError, Result};
use crate::queue::FrameQueue;
use crate::stats::{FramerStats, StatsSnapshot};

/// Inbox messages for the framer worker.
#[derive(Debug)]
enum Event {
    /// Bytes received at `at`.
    Rx { bytes: Bytes, at: Instant },
    /// The byte source reached end of stream.
    SourceClosed,
    Shutdown,
}

/// Producer-side handle into a running framer.
///
/// Pushing never blocks: bytes are timestamped and posted to the worker's
/// inbox. Safe to call from any receive context.
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    tx: mpsc::Sender<Event>,
}

impl CaptureHandle {
    /// Deliver a chunk of received bytes.
    pub fn push(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let event = Event::Rx {
            bytes: Bytes::copy_from_slice(bytes),
            at: Instant::now(),
        };
        // A stopped framer has nowhere to put the bytes; the source can't retry.
        let _ = self.tx.send(event);
    }

    pub fn push_byte(&self, byte: u8) {
        self.push(&[byte]);
    }
}

impl RxHandler for CaptureHandle {
    fn on_rx(&mut self, bytes: &[u8]) {
        self.push(bytes);
    }

    fn on_close(&mut self) {
        let _ = self.tx.send(Event::SourceClosed);
    }
}

/// A framer instance: one worker thread that owns all frame state.
///
/// Byte arrival and idle expiry both reach the worker through its inbox, so
/// the frame buffer is never touched by two contexts. Completed frames go to
/// the [`FrameQueue`]; when the framer stops, it flushes the pending frame
/// and closes the queue.
pub struct Framer {
    tx: mpsc::Sender<Event>,
    worker: Option<JoinHandle<()>>,
    queue: Arc<FrameQueue>,
    stats: Arc<FramerStats>,
    config: FramerConfig,
}

impl Framer {
    /// Validate `config` and start a framer with its own queue.
    pub fn spawn(config: FramerConfig) -> Result<Self> {
        let queue = Arc::new(FrameQueue::new(config.queue_depth));
        Self::spawn_with_queue(config, queue)
    }

    /// Start a framer that produces into an existing queue.
    pub fn spawn_with_queue(config: FramerConfig, queue: Arc<FrameQueue>) -> Result<Self> {
        config.validate()?;

        let stats = Arc::new(FramerStats::new());
        let assembler = FrameAssembler::new(config.clone(), Arc::clone(&queue), Arc::clone(&stats));
        let (tx, rx) = mpsc::channel();

        let worker = std::thread::Builder::new()
            .name("serframe-framer".to_string())
            .spawn(move || run_worker(assembler, rx))
            .map_err(FrameError::WorkerSpawn)?;

        info!(
            capacity = config.capacity,
            idle_ms = config.idle_period.as_millis() as u64,
            queue_depth = config.queue_depth,
            "framer started"
        );

        Ok(Self {
            tx,
            worker: Some(worker),
            queue,
            stats,
            config,
        })
    }

    /// A new producer handle for this framer.
    pub fn capture_handle(&self) -> CaptureHandle {
        CaptureHandle {
            tx: self.tx.clone(),
        }
    }

    /// Register this framer as the receive callback of `source`.
    ///
    /// Fails with [`TransportError::NotReady`] if the device is not ready.
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

    /// Whether the worker is still processing input.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map(|worker| !worker.is_finished())
            .unwrap_or(false)
    }

    /// Flush the pending frame, close the queue, and wait for the worker.
    pub fn shutdown(mut self) -> StatsSnapshot {
        self.stop();
        self.stats.snapshot()
    }

    fn stop(&mut self) {
        let _ = self.tx.send(Event::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                // The worker can't close the queue if it panicked.
                self.queue.close();
            }
        }
    }
}

impl Drop for Framer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(mut assembler: FrameAssembler, inbox: mpsc::Receiver<Event>) {
    loop {
        // Drain queued input before judging the line idle: queued bytes
        // carry their own arrival time.
        let event = match inbox.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => match assembler.idle_deadline() {
                None => match inbox.recv() {
                    Ok(event) => event,
                    Err(_) => break,
                },
                Some(deadline) => {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match inbox.recv_timeout(wait) {
                        Ok(event) => event,
                        Err(RecvTimeoutError::Timeout) => {
                            assembler.poll_idle(Instant::now());
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            },
        };

        match event {
            Event::Rx { bytes, at } => assembler.on_bytes(&bytes, at),
            Event::SourceClosed => {
                debug!("byte source closed");
                break;
            }
            Event::Shutdown => break,
        }
    }

    assembler.shutdown();
    assembler.queue().close();
    let stats = assembler.stats().snapshot();
    info!(
        bytes_received = stats.bytes_received,
        frames_enqueued = stats.frames_enqueued,
        frames_dropped = stats.frames_dropped,
        bytes_dropped = stats.bytes_dropped,
        "framer stopped"
    );
}
