#![cfg(feature = "cli")]

use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

fn serframe() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_serframe"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn run_with_input(args: &[&str], input: &[u8]) -> std::process::Output {
    let mut child = serframe()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("serframe should start");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input)
        .expect("stdin should accept input");

    child.wait_with_output().expect("serframe should exit")
}

fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect()
}

#[test]
fn echo_greets_then_echoes_each_line() {
    let output = run_with_input(&["echo", "-"], b"hello\nworld\r\n");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Hello! I'm your echo bot.\r\n\
         Tell me something and press enter:\r\n\
         Echo: hello\r\n\
         Echo: world\r\n"
    );
}

#[test]
fn echo_flushes_unterminated_tail_at_end_of_input() {
    let output = run_with_input(&["echo", "-", "--no-greeting"], b"tail");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Echo: tail\r\n");
}

#[test]
fn listen_prints_frames_as_json() {
    let output = run_with_input(&["--format", "json", "listen", "-"], b"ab\ncd\n");

    assert!(output.status.success());
    let frames = json_lines(&output.stdout);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["seq"], 0);
    assert_eq!(frames[0]["payload"], "ab");
    assert_eq!(frames[0]["reason"], "terminator");
    assert_eq!(frames[1]["payload"], "cd");
    assert_eq!(frames[1]["device"], "stdin");
}

#[test]
fn listen_splits_long_lines_at_capacity() {
    let input = [b'z'; 40];
    let output = run_with_input(
        &["--format", "json", "listen", "-", "--capacity", "16", "--stats"],
        &input,
    );

    assert!(output.status.success());
    let lines = json_lines(&output.stdout);
    // 15 + 15 stored, two bytes dropped at overflow, 8 flushed at shutdown.
    assert_eq!(lines[0]["size"], 15);
    assert_eq!(lines[0]["reason"], "overflow");
    assert_eq!(lines[1]["size"], 15);
    assert_eq!(lines[2]["size"], 8);
    assert_eq!(lines[2]["reason"], "shutdown");

    let stats = &lines[3];
    assert_eq!(stats["bytes_received"], 40);
    assert_eq!(stats["bytes_dropped"], 2);
    assert_eq!(stats["frames_overflow"], 2);
}

#[test]
fn listen_closes_quiet_line_after_idle_period() {
    let mut child = serframe()
        .args(["--format", "json", "listen", "-", "--idle", "100ms", "--count", "1"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("serframe should start");

    // Keep stdin open so only the idle gap can close the frame.
    let mut stdin = child.stdin.take().expect("stdin should be piped");
    stdin.write_all(b"xyz").expect("stdin should accept input");
    stdin.flush().expect("stdin should flush");

    let mut line = String::new();
    BufReader::new(child.stdout.take().expect("stdout should be piped"))
        .read_line(&mut line)
        .expect("one frame should be printed");
    let frame: serde_json::Value = serde_json::from_str(&line).expect("frame should be json");
    assert_eq!(frame["payload"], "xyz");
    assert_eq!(frame["reason"], "idle");

    let status = child.wait().expect("serframe should exit after --count");
    assert!(status.success());
    drop(stdin);
}

#[test]
fn invalid_framer_settings_exit_64() {
    let output = run_with_input(&["echo", "-", "--capacity", "1"], b"");
    assert_eq!(output.status.code(), Some(64));

    let output = run_with_input(&["listen", "-", "--terminators", "ab"], b"");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn stdio_cannot_listen() {
    let output = run_with_input(&["echo", "-", "--listen"], b"");
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--listen requires a socket path"));
}

#[test]
fn terminators_can_come_from_environment() {
    let mut child = serframe()
        .args(["--format", "json", "listen", "-"])
        .env("SERFRAME_TERMINATORS", ";")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("serframe should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(b"a\nb;")
        .expect("stdin should accept input");
    let output = child.wait_with_output().expect("serframe should exit");

    let frames = json_lines(&output.stdout);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["payload"], "a\nb");
}

#[test]
fn version_reports_package_version() {
    let output = serframe()
        .arg("version")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("serframe {}", env!("CARGO_PKG_VERSION"))
    );
}
