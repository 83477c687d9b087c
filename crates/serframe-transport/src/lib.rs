//! Byte-level serial transport abstraction.
//!
//! The framer never talks to hardware directly. It consumes two collaborators:
//! - a [`ByteSource`] that pushes received bytes into a registered [`RxHandler`]
//! - a [`ByteSink`] that accepts one byte at a time, blocking until accepted
//!
//! Concrete devices provided here:
//! - [`StreamSource`] / [`StreamSink`] over any `Read` / `Write` (stdio, files, pipes)
//! - [`UnixSerial`] for serial lines carried over Unix domain sockets
//!   (e.g. a QEMU `-serial unix:<path>,server` UART)

pub mod error;
pub mod stream;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use stream::{stdio, StreamSink, StreamSource};
pub use traits::{ByteSink, ByteSource, Device, RxHandler, RxThread};

#[cfg(unix)]
pub use uds::{UnixSerial, UnixSerialListener};
