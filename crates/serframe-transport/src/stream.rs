use std::io::{ErrorKind, Read, Stdin, Stdout, Write};

use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, ByteSource, Device, RxHandler, RxThread};

/// UART FIFOs are small; draining in short chunks keeps delivery close to
/// character-at-a-time without a syscall per byte.
const READ_CHUNK_SIZE: usize = 64;

/// Byte source over any blocking `Read`.
///
/// Starting the source spawns a receive thread that plays the role of the
/// UART receive interrupt: it drains whatever is available and hands it to
/// the registered handler.
pub struct StreamSource<R> {
    inner: R,
    name: String,
}

impl<R: Read + Send + 'static> StreamSource<R> {
    /// Wrap a reader under a diagnostic name.
    pub fn new(name: impl Into<String>, inner: R) -> Self {
        Self {
            inner,
            name: name.into(),
        }
    }

    /// Consume the source and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> Device for StreamSource<R> {
    fn name(&self) -> &str {
        &self.name
    }
}

impl<R: Read + Send + 'static> ByteSource for StreamSource<R> {
    fn start(self, mut handler: Box<dyn RxHandler>) -> Result<RxThread> {
        let name = self.name.clone();
        let handle = std::thread::Builder::new()
            .name("serframe-rx".to_string())
            .spawn(move || {
                let StreamSource { mut inner, name } = self;
                drain(&mut inner, &name, handler.as_mut());
                handler.on_close();
            })?;
        debug!(device = %name, "receive thread started");
        Ok(RxThread::new(name, handle))
    }
}

fn drain(inner: &mut impl Read, name: &str, handler: &mut dyn RxHandler) {
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        match inner.read(&mut chunk) {
            Ok(0) => {
                debug!(device = %name, "end of stream");
                return;
            }
            Ok(n) => handler.on_rx(&chunk[..n]),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(device = %name, error = %err, "receive failed");
                return;
            }
        }
    }
}

/// Byte sink over any blocking `Write`.
pub struct StreamSink<W> {
    inner: W,
    name: String,
}

impl<W: Write> StreamSink<W> {
    /// Wrap a writer under a diagnostic name.
    pub fn new(name: impl Into<String>, inner: W) -> Self {
        Self {
            inner,
            name: name.into(),
        }
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consume the sink and return the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W> Device for StreamSink<W> {
    fn name(&self) -> &str {
        &self.name
    }
}

impl<W: Write> ByteSink for StreamSink<W> {
    fn put_byte(&mut self, byte: u8) -> Result<()> {
        loop {
            match self.inner.write(&[byte]) {
                Ok(0) => return Err(TransportError::Shutdown),
                Ok(_) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.put_byte(byte)?;
        }
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

/// Process stdin/stdout as a serial line.
pub fn stdio() -> (StreamSource<Stdin>, StreamSink<Stdout>) {
    (
        StreamSource::new("stdin", std::io::stdin()),
        StreamSink::new("stdout", std::io::stdout()),
    )
}
