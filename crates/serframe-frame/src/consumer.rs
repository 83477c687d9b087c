use serframe_transport::{ByteSink, TransportError};
use tracing::debug;

use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::queue::FrameQueue;

/// Written before each echoed frame.
pub const ECHO_PREAMBLE: &[u8] = b"Echo: ";

/// Written after each echoed frame.
pub const LINE_END: &[u8] = b"\r\n";

/// Banner the echo consumer writes before its first frame.
pub const GREETING: &[u8] = b"Hello! I'm your echo bot.\r\nTell me something and press enter:\r\n";

/// Application processing for completed frames.
pub trait FrameHandler {
    fn handle(&mut self, frame: &Frame) -> Result<()>;
}

impl<F> FrameHandler for F
where
    F: FnMut(&Frame) -> Result<()>,
{
    fn handle(&mut self, frame: &Frame) -> Result<()> {
        self(frame)
    }
}

/// Echoes each frame back to a byte sink as `Echo: <frame>\r\n`.
pub struct EchoHandler<S> {
    sink: S,
    echoed: u64,
}

impl<S: ByteSink> EchoHandler<S> {
    /// Fails with [`TransportError::NotReady`] if the sink is not ready.
    pub fn new(sink: S) -> Result<Self> {
        if !sink.is_ready() {
            return Err(TransportError::NotReady {
                name: sink.name().to_string(),
            }
            .into());
        }
        Ok(Self { sink, echoed: 0 })
    }

    /// Write the greeting banner.
    pub fn greet(&mut self) -> Result<()> {
        self.sink.put_bytes(GREETING)?;
        self.sink.flush()?;
        Ok(())
    }

    /// Frames echoed so far.
    pub fn echoed(&self) -> u64 {
        self.echoed
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: ByteSink> FrameHandler for EchoHandler<S> {
    fn handle(&mut self, frame: &Frame) -> Result<()> {
        self.sink.put_bytes(ECHO_PREAMBLE)?;
        self.sink.put_bytes(&frame.payload)?;
        self.sink.put_bytes(LINE_END)?;
        self.sink.flush()?;
        self.echoed += 1;
        Ok(())
    }
}

/// Consumer loop: block for frames and hand each one to `handler`.
///
/// Runs until the queue is closed and drained, returning the number of
/// frames handled. A handler error stops the loop.
pub fn run_consumer<H>(queue: &FrameQueue, handler: &mut H) -> Result<u64>
where
    H: FrameHandler + ?Sized,
{
    let mut handled = 0u64;
    loop {
        let frame = match queue.dequeue(None) {
            Ok(frame) => frame,
            Err(FrameError::QueueClosed) => {
                debug!(handled, "frame queue closed; consumer stopping");
                return Ok(handled);
            }
            Err(err) => return Err(err),
        };
        handler.handle(&frame)?;
        handled += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serframe_transport::Device;

    use super::*;
    use crate::config::FramerConfig;
    use crate::frame::CloseReason;
    use crate::framer::Framer;
    use crate::queue::Enqueue;

    #[test]
    fn echo_writes_preamble_payload_and_crlf() {
        let mut echo = EchoHandler::new(Vec::new()).unwrap();
        echo.handle(&Frame::new(0, &b"hello"[..], CloseReason::Terminator))
            .unwrap();
        echo.handle(&Frame::new(1, &b"xyz"[..], CloseReason::Idle))
            .unwrap();

        assert_eq!(echo.echoed(), 2);
        assert_eq!(echo.into_sink(), b"Echo: hello\r\nEcho: xyz\r\n");
    }

    #[test]
    fn greeting_banner() {
        let mut echo = EchoHandler::new(Vec::new()).unwrap();
        echo.greet().unwrap();
        assert_eq!(
            String::from_utf8(echo.into_sink()).unwrap(),
            "Hello! I'm your echo bot.\r\nTell me something and press enter:\r\n"
        );
    }

    #[test]
    fn consumer_drains_in_order_then_stops_on_close() {
        let queue = FrameQueue::new(4);
        for (seq, text) in ["one", "two", "three"].iter().enumerate() {
            let frame = Frame::new(seq as u64, text.as_bytes().to_vec(), CloseReason::Terminator);
            assert_eq!(queue.enqueue(frame), Enqueue::Accepted);
        }
        queue.close();

        let mut echo = EchoHandler::new(Vec::new()).unwrap();
        let handled = run_consumer(&queue, &mut echo).unwrap();

        assert_eq!(handled, 3);
        assert_eq!(
            echo.into_sink(),
            b"Echo: one\r\nEcho: two\r\nEcho: three\r\n"
        );
    }

    #[test]
    fn closures_are_frame_handlers() {
        let queue = FrameQueue::new(2);
        let _ = queue.enqueue(Frame::new(0, &b"a"[..], CloseReason::Idle));
        queue.close();

        let mut seen = Vec::new();
        let mut handler = |frame: &Frame| -> Result<()> {
            seen.push(frame.seq);
            Ok(())
        };
        run_consumer(&queue, &mut handler).unwrap();
        assert_eq!(seen, vec![0]);
    }

    #[test]
    fn handler_error_stops_consumer() {
        let queue = FrameQueue::new(2);
        let _ = queue.enqueue(Frame::new(0, &b"a"[..], CloseReason::Idle));
        let _ = queue.enqueue(Frame::new(1, &b"b"[..], CloseReason::Idle));

        let mut handler =
            |_frame: &Frame| -> Result<()> { Err(TransportError::Shutdown.into()) };
        let err = run_consumer(&queue, &mut handler).unwrap_err();

        assert!(matches!(err, FrameError::Transport(TransportError::Shutdown)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn echo_pipeline_end_to_end() {
        let framer = Framer::spawn(
            FramerConfig::default().with_idle_period(Duration::from_millis(50)),
        )
        .unwrap();
        let queue = Arc::clone(framer.queue());
        let consumer = std::thread::spawn(move || {
            let mut echo = EchoHandler::new(Vec::new()).unwrap();
            run_consumer(&queue, &mut echo).unwrap();
            echo.into_sink()
        });

        let handle = framer.capture_handle();
        handle.push(b"hi\r\n");
        handle.push(b"quiet");
        std::thread::sleep(Duration::from_millis(200));
        framer.shutdown();

        assert_eq!(consumer.join().unwrap(), b"Echo: hi\r\nEcho: quiet\r\n");
    }

    struct OfflineSink;

    impl Device for OfflineSink {
        fn name(&self) -> &str {
            "uart1"
        }

        fn is_ready(&self) -> bool {
            false
        }
    }

    impl ByteSink for OfflineSink {
        fn put_byte(&mut self, _byte: u8) -> serframe_transport::Result<()> {
            Err(TransportError::Shutdown)
        }
    }

    #[test]
    fn echo_requires_ready_sink() {
        assert!(matches!(
            EchoHandler::new(OfflineSink),
            Err(FrameError::Transport(TransportError::NotReady { .. }))
        ));
    }
}
