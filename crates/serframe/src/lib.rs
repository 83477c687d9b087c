//! Serial line framing by terminator byte and idle gap.
//!
//! Bytes from a serial device are grouped into frames that close on a
//! terminator (`\n` or `\r` by default), after a quiet period, when the
//! frame buffer fills, or at shutdown. Completed frames are handed to a
//! consumer through a bounded queue that never blocks the receive path.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte sources and sinks (stdio, Unix-socket serial lines)
//! - [`frame`]: frame assembly, idle timing, the frame queue and consumers
//!
//! ```no_run
//! use serframe::frame::{run_consumer, EchoHandler, Framer, FramerConfig};
//! use serframe::transport::stdio;
//!
//! # fn main() -> serframe::frame::Result<()> {
//! let framer = Framer::spawn(FramerConfig::default())?;
//! let (source, sink) = stdio();
//! let _rx = framer.attach(source)?;
//!
//! let mut echo = EchoHandler::new(sink)?;
//! echo.greet()?;
//! run_consumer(framer.queue(), &mut echo)?;
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use serframe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use serframe_frame::*;
}
