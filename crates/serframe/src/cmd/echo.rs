use std::sync::Arc;

use serframe_frame::{run_consumer, EchoHandler, FrameQueue, Framer};

use crate::cmd::EchoArgs;
use crate::device::Line;
use crate::exit::{frame_error, CliError, CliResult, INTERNAL, SUCCESS};

pub fn run(args: EchoArgs) -> CliResult<i32> {
    let config = args.framer.to_config()?;
    let line = Line::open(&args.device.device, args.device.listen)?;
    let device = line.name().to_string();

    let framer = Framer::spawn(config).map_err(|err| frame_error("framer start failed", err))?;
    let (_rx, sink) = line.attach(&framer)?;

    let mut echo = EchoHandler::new(sink).map_err(|err| frame_error("sink not usable", err))?;
    if !args.no_greeting {
        echo.greet()
            .map_err(|err| frame_error("greeting failed", err))?;
    }

    install_ctrlc_handler(Arc::clone(framer.queue()))?;
    tracing::info!(%device, "echo console ready");

    let result = run_consumer(framer.queue(), &mut echo);
    let stats = framer.shutdown();
    tracing::info!(
        %device,
        echoed = echo.echoed(),
        bytes_received = stats.bytes_received,
        bytes_dropped = stats.bytes_dropped,
        frames_dropped = stats.frames_dropped,
        "echo console stopped"
    );

    result.map_err(|err| frame_error("echo failed", err))?;
    Ok(SUCCESS)
}

/// Ctrl-C closes the queue; the consumer drains what is left and returns.
pub(crate) fn install_ctrlc_handler(queue: Arc<FrameQueue>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        queue.close();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
