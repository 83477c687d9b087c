use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serframe_frame::{CloseReason, Frame, StatsSnapshot};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    seq: u64,
    reason: CloseReason,
    size: usize,
    payload: String,
    device: &'a str,
    timestamp: String,
}

pub fn print_frame(frame: &Frame, device: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                seq: frame.seq,
                reason: frame.reason,
                size: frame.len(),
                payload: payload_preview(frame.payload.as_ref()),
                device,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "REASON", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    frame.seq.to_string(),
                    frame.reason.to_string(),
                    frame.len().to_string(),
                    payload_preview(frame.payload.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{} {} size={} device={} payload={}",
                frame.seq,
                frame.reason,
                frame.len(),
                device,
                payload_preview(frame.payload.as_ref())
            );
        }
        OutputFormat::Raw => {
            let mut line = frame.payload.to_vec();
            line.push(b'\n');
            print_raw(&line);
        }
    }
}

pub fn print_stats(stats: &StatsSnapshot, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(stats).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COUNTER", "VALUE"]);
            for (name, value) in stat_rows(stats) {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for (name, value) in stat_rows(stats) {
                println!("{name}={value}");
            }
        }
    }
}

fn stat_rows(stats: &StatsSnapshot) -> [(&'static str, u64); 9] {
    [
        ("bytes_received", stats.bytes_received),
        ("bytes_dropped", stats.bytes_dropped),
        ("frames_terminated", stats.frames_terminated),
        ("frames_idle", stats.frames_idle),
        ("frames_overflow", stats.frames_overflow),
        ("frames_shutdown", stats.frames_shutdown),
        ("frames_enqueued", stats.frames_enqueued),
        ("frames_dropped", stats.frames_dropped),
        ("empty_suppressed", stats.empty_suppressed),
    ]
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
