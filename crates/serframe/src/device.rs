use std::io::Stdout;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

use serframe_frame::Framer;
#[cfg(unix)]
use serframe_transport::{UnixSerial, UnixSerialListener};
use serframe_transport::{stdio, ByteSink, Device, RxThread, StreamSink, TransportError};

use crate::exit::{frame_error, transport_error, CliError, CliResult, USAGE};

/// Device argument that selects stdin/stdout.
pub const STDIO: &str = "-";

/// An opened serial line, not yet attached to a framer.
pub enum Line {
    Stdio,
    #[cfg(unix)]
    Unix(UnixSerial),
}

impl Line {
    /// Open `device`: `-` for stdio, otherwise a Unix socket path.
    ///
    /// With `listen`, bind the path and block until the device connects.
    pub fn open(device: &str, listen: bool) -> CliResult<Self> {
        if device == STDIO {
            if listen {
                return Err(CliError::new(USAGE, "--listen requires a socket path"));
            }
            return Ok(Line::Stdio);
        }
        open_socket(device, listen)
    }

    pub fn name(&self) -> &str {
        match self {
            Line::Stdio => "stdin",
            #[cfg(unix)]
            Line::Unix(serial) => serial.name(),
        }
    }

    /// Start feeding `framer` and return the transmit side of the line.
    pub fn attach(self, framer: &Framer) -> CliResult<(RxThread, LineSink)> {
        match self {
            Line::Stdio => {
                let (source, sink) = stdio();
                let rx = framer
                    .attach(source)
                    .map_err(|err| frame_error("attach failed", err))?;
                Ok((rx, LineSink::Stdout(sink)))
            }
            #[cfg(unix)]
            Line::Unix(serial) => {
                if !serial.is_ready() {
                    let err = TransportError::NotReady {
                        name: serial.name().to_string(),
                    };
                    return Err(transport_error("attach failed", err));
                }
                let (source, sink) = serial
                    .split()
                    .map_err(|err| transport_error("attach failed", err))?;
                let rx = framer
                    .attach(source)
                    .map_err(|err| frame_error("attach failed", err))?;
                Ok((rx, LineSink::Unix(sink)))
            }
        }
    }
}

#[cfg(unix)]
fn open_socket(path: &str, listen: bool) -> CliResult<Line> {
    let serial = if listen {
        let listener =
            UnixSerialListener::bind(path).map_err(|err| transport_error("bind failed", err))?;
        listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?
    } else {
        UnixSerial::connect(path).map_err(|err| transport_error("connect failed", err))?
    };
    Ok(Line::Unix(serial))
}

#[cfg(not(unix))]
fn open_socket(path: &str, _listen: bool) -> CliResult<Line> {
    Err(CliError::new(
        USAGE,
        format!("socket devices are not supported on this platform: {path}"),
    ))
}

/// Transmit side of an attached [`Line`].
pub enum LineSink {
    Stdout(StreamSink<Stdout>),
    #[cfg(unix)]
    Unix(StreamSink<UnixStream>),
}

impl Device for LineSink {
    fn name(&self) -> &str {
        match self {
            LineSink::Stdout(sink) => sink.name(),
            #[cfg(unix)]
            LineSink::Unix(sink) => sink.name(),
        }
    }

    fn is_ready(&self) -> bool {
        match self {
            LineSink::Stdout(sink) => sink.is_ready(),
            #[cfg(unix)]
            LineSink::Unix(sink) => sink.is_ready(),
        }
    }
}

impl ByteSink for LineSink {
    fn put_byte(&mut self, byte: u8) -> serframe_transport::Result<()> {
        match self {
            LineSink::Stdout(sink) => sink.put_byte(byte),
            #[cfg(unix)]
            LineSink::Unix(sink) => sink.put_byte(byte),
        }
    }

    fn put_bytes(&mut self, bytes: &[u8]) -> serframe_transport::Result<()> {
        match self {
            LineSink::Stdout(sink) => sink.put_bytes(bytes),
            #[cfg(unix)]
            LineSink::Unix(sink) => sink.put_bytes(bytes),
        }
    }

    fn flush(&mut self) -> serframe_transport::Result<()> {
        match self {
            LineSink::Stdout(sink) => sink.flush(),
            #[cfg(unix)]
            LineSink::Unix(sink) => sink.flush(),
        }
    }
}
