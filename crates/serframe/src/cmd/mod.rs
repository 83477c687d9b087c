use std::time::Duration;

use clap::{Args, Subcommand};
use serframe_frame::{FramerConfig, DEFAULT_CAPACITY, DEFAULT_QUEUE_DEPTH};

use crate::exit::{frame_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod echo;
pub mod listen;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Greet the line, then echo every frame back as `Echo: <frame>`.
    Echo(EchoArgs),
    /// Print received frames.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Echo(args) => echo::run(args),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Serial device: `-` for stdin/stdout, or a Unix socket path.
    pub device: String,
    /// Bind the socket path and wait for the device to connect.
    #[arg(long)]
    pub listen: bool,
}

#[derive(Args, Debug)]
pub struct FramerArgs {
    /// Quiet interval that closes a pending frame (e.g. 1000ms, 2s).
    #[arg(long, env = "SERFRAME_IDLE", default_value = "1000ms")]
    pub idle: String,
    /// Frame buffer capacity; frames carry at most capacity - 1 bytes.
    #[arg(long, env = "SERFRAME_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,
    /// Completed frames held for the consumer before new ones are dropped.
    #[arg(long, env = "SERFRAME_QUEUE_DEPTH", default_value_t = DEFAULT_QUEUE_DEPTH)]
    pub queue_depth: usize,
    /// Terminator bytes, comma-separated (`\n`, `\r`, `\t`, `\0`, `0x1b`, or one character).
    #[arg(long, env = "SERFRAME_TERMINATORS", default_value = "\\n,\\r")]
    pub terminators: String,
}

impl FramerArgs {
    pub fn to_config(&self) -> CliResult<FramerConfig> {
        let config = FramerConfig::default()
            .with_idle_period(parse_duration(&self.idle)?)
            .with_capacity(self.capacity)
            .with_queue_depth(self.queue_depth)
            .with_terminators(parse_terminators(&self.terminators)?);
        config
            .validate()
            .map_err(|err| frame_error("invalid framer settings", err))?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    #[command(flatten)]
    pub framer: FramerArgs,
    /// Skip the greeting banner.
    #[arg(long)]
    pub no_greeting: bool,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    #[command(flatten)]
    pub framer: FramerArgs,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Print the framer counters on exit.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

pub fn parse_terminators(input: &str) -> CliResult<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let byte = match token {
            "\\n" => b'\n',
            "\\r" => b'\r',
            "\\t" => b'\t',
            "\\0" => 0,
            _ => {
                if let Some(hex) = token
                    .strip_prefix("0x")
                    .or_else(|| token.strip_prefix("0X"))
                {
                    u8::from_str_radix(hex, 16).map_err(|_| {
                        CliError::new(USAGE, format!("invalid terminator byte: {token}"))
                    })?
                } else if token.len() == 1 {
                    token.as_bytes()[0]
                } else {
                    return Err(CliError::new(
                        USAGE,
                        format!("invalid terminator: {token}"),
                    ));
                }
            }
        };
        if !bytes.contains(&byte) {
            bytes.push(byte);
        }
    }

    if bytes.is_empty() {
        return Err(CliError::new(USAGE, "at least one terminator is required"));
    }
    Ok(bytes)
}
