use std::sync::Arc;

use serframe_frame::{FrameError, Framer};

use crate::cmd::echo::install_ctrlc_handler;
use crate::cmd::ListenArgs;
use crate::device::Line;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, print_stats, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.framer.to_config()?;
    let line = Line::open(&args.device.device, args.device.listen)?;
    let device = line.name().to_string();

    let framer = Framer::spawn(config).map_err(|err| frame_error("framer start failed", err))?;
    // Frames are printed, never sent back; the transmit side goes unused.
    let (_rx, _sink) = line.attach(&framer)?;
    install_ctrlc_handler(Arc::clone(framer.queue()))?;

    let mut printed = 0usize;
    loop {
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
        let frame = match framer.queue().dequeue(None) {
            Ok(frame) => frame,
            Err(FrameError::QueueClosed) => break,
            Err(err) => return Err(frame_error("receive failed", err)),
        };

        print_frame(&frame, &device, format);
        printed = printed.saturating_add(1);
    }

    let stats = framer.shutdown();
    tracing::debug!(%device, printed, "listen finished");
    if args.stats {
        print_stats(&stats, format);
    }

    Ok(SUCCESS)
}
