use std::thread::JoinHandle;

use crate::error::{Result, TransportError};

/// Common surface of every serial device endpoint.
pub trait Device {
    /// Device name for diagnostics (e.g. `stdin`, a socket path).
    fn name(&self) -> &str;

    /// Whether the device can transfer data right now.
    ///
    /// Consumers check this once at startup; a device that is not ready is
    /// fatal to framer initialization.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Receive callback registered with a [`ByteSource`].
///
/// Runs on the source's receive context. Implementations must not block:
/// the source has no backpressure channel and cannot retry.
pub trait RxHandler: Send + 'static {
    /// Called with every chunk drained from the device, in arrival order.
    fn on_rx(&mut self, bytes: &[u8]);

    /// Called once when the source reaches end of stream or fails.
    fn on_close(&mut self) {}
}

impl<F> RxHandler for F
where
    F: FnMut(&[u8]) + Send + 'static,
{
    fn on_rx(&mut self, bytes: &[u8]) {
        self(bytes)
    }
}

/// A device that delivers received bytes through a registered callback.
///
/// The framer never polls a source; it registers a handler and reacts.
pub trait ByteSource: Device {
    /// Start delivering bytes to `handler` and return the receive context.
    fn start(self, handler: Box<dyn RxHandler>) -> Result<RxThread>;
}

/// A device that accepts output one byte at a time.
pub trait ByteSink: Device {
    /// Write one byte, blocking until the device accepts it.
    fn put_byte(&mut self, byte: u8) -> Result<()>;

    /// Write a run of bytes in order.
    fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.put_byte(byte)?;
        }
        Ok(())
    }

    /// Flush whatever the device buffers internally.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory sink, mostly useful for capturing output.
impl Device for Vec<u8> {
    fn name(&self) -> &str {
        "memory"
    }
}

impl ByteSink for Vec<u8> {
    fn put_byte(&mut self, byte: u8) -> Result<()> {
        self.push(byte);
        Ok(())
    }
}

/// Handle to the receive context started by a [`ByteSource`].
#[derive(Debug)]
pub struct RxThread {
    name: String,
    handle: JoinHandle<()>,
}

impl RxThread {
    pub(crate) fn new(name: impl Into<String>, handle: JoinHandle<()>) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }

    /// Name of the device feeding this context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the source has stopped delivering bytes.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the source to reach end of stream.
    pub fn join(self) -> Result<()> {
        self.handle.join().map_err(|_| {
            TransportError::Io(std::io::Error::other(format!(
                "receive thread for {} panicked",
                self.name
            )))
        })
    }
}
