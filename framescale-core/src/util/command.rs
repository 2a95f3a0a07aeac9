//! Blocking execution of external programs.
//!
//! Used for the image resizer, which is invoked once per frame from the
//! upscale worker pool. The runner captures stdout/stderr on reader threads,
//! polls the child so it can enforce a timeout, and kills the child as soon
//! as its cancellation token trips.

use crate::error::FailureKind;
use crate::util::cancel::CancellationToken;

use log::{debug, info};

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often a running child is polled for exit, timeout and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Number of trailing output lines kept for error reports.
pub const OUTPUT_TAIL_LINES: usize = 40;

/// Why an external invocation did not succeed.
#[derive(Debug)]
pub enum RunError {
    /// The process failed on its own.
    Failed(FailureKind),
    /// The process was killed because its cancellation token tripped.
    Cancelled,
}

/// Per-invocation execution options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub timeout: Option<Duration>,
    /// Surface the command line and captured output at `info` instead of `debug`.
    pub verbose: bool,
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs a program to completion.
///
/// Implementations must be usable from several worker threads at once.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        options: &RunOptions,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, RunError>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        options: &RunOptions,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, RunError> {
        log_command_line(program, args, options.verbose);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RunError::Failed(FailureKind::Spawn(e.to_string())))?;

        let stdout_handle = child.stdout.take().map(spawn_reader);
        let stderr_handle = child.stderr.take().map(spawn_reader);

        let status = match wait_for_child(&mut child, options.timeout, cancel) {
            WaitOutcome::Exited(status) => status,
            // Killed: a grandchild may still hold the pipes open, so the
            // reader threads are left to finish on their own.
            outcome => return Err(killed_error(outcome)),
        };

        let stdout = join_reader(stdout_handle);
        let stderr = join_reader(stderr_handle);
        log_tool_output(program, &stdout, &stderr, options.verbose);

        if status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            Err(RunError::Failed(FailureKind::Exit {
                code: status.code(),
                stderr: tail_lines(&stderr, OUTPUT_TAIL_LINES),
            }))
        }
    }
}

fn killed_error(outcome: WaitOutcome) -> RunError {
    match outcome {
        WaitOutcome::TimedOut(limit) => RunError::Failed(FailureKind::Timeout(limit)),
        WaitOutcome::Cancelled => RunError::Cancelled,
        WaitOutcome::WaitFailed(e) => RunError::Failed(FailureKind::Spawn(format!(
            "error waiting for process: {e}"
        ))),
        WaitOutcome::Exited(status) => RunError::Failed(FailureKind::Exit {
            code: status.code(),
            stderr: String::new(),
        }),
    }
}

enum WaitOutcome {
    Exited(std::process::ExitStatus),
    TimedOut(Duration),
    Cancelled,
    WaitFailed(std::io::Error),
}

fn wait_for_child(
    child: &mut Child,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> WaitOutcome {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return WaitOutcome::Exited(status),
            Ok(None) => {}
            Err(e) => {
                kill_child(child);
                return WaitOutcome::WaitFailed(e);
            }
        }

        if cancel.is_cancelled() {
            kill_child(child);
            return WaitOutcome::Cancelled;
        }

        if let Some(limit) = timeout {
            if start.elapsed() >= limit {
                kill_child(child);
                return WaitOutcome::TimedOut(limit);
            }
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn kill_child(child: &mut Child) {
    // The child may already have exited between polls.
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_reader<R: Read + Send + 'static>(stream: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut collected = String::new();
        for line in BufReader::new(stream).lines().map_while(Result::ok) {
            collected.push_str(&line);
            collected.push('\n');
        }
        collected
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Joins a program and its arguments into a single display string.
pub fn format_command_line(program: &Path, args: &[String]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}

pub(crate) fn log_command_line(program: &Path, args: &[String], verbose: bool) {
    let line = format_command_line(program, args);
    if verbose {
        info!("Running command: {line}");
    } else {
        debug!("Running command: {line}");
    }
}

fn log_tool_output(program: &Path, stdout: &str, stderr: &str, verbose: bool) {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());
    for (stream, text) in [("stdout", stdout), ("stderr", stderr)] {
        let text = text.trim_end();
        if text.is_empty() {
            continue;
        }
        if verbose {
            info!("[{name} {stream}]\n{text}");
        } else {
            debug!("[{name} {stream}]\n{text}");
        }
    }
}

/// Keeps the last `max` lines of `text`.
pub fn tail_lines(text: &str, max: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(max);
    lines[start..].join("\n")
}

/// Rolling buffer of the most recent output lines of a streaming process.
#[derive(Debug, Clone)]
pub struct OutputTail {
    lines: VecDeque<String>,
    max: usize,
}

impl OutputTail {
    pub fn new(max: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max),
            max,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.max {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn contents(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_command_line_quotes_spaced_args() {
        let line = format_command_line(
            Path::new("/opt/ImageResizer"),
            &["/resize".to_string(), "XBR 2x".to_string()],
        );
        assert_eq!(line, "/opt/ImageResizer /resize \"XBR 2x\"");
    }

    #[test]
    fn test_tail_lines_keeps_last_lines() {
        assert_eq!(tail_lines("a\nb\nc\nd", 2), "c\nd");
        assert_eq!(tail_lines("a", 5), "a");
    }

    #[test]
    fn test_output_tail_drops_oldest() {
        let mut tail = OutputTail::new(2);
        tail.push("one");
        tail.push("two");
        tail.push("three");
        assert_eq!(tail.contents(), "two\nthree");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_echo() {
        let runner = SystemCommandRunner;
        let output = runner
            .run(
                Path::new("echo"),
                &["test".to_string()],
                &RunOptions::default(),
                &CancellationToken::new(),
            )
            .expect("echo should succeed");
        assert_eq!(output.stdout.trim(), "test");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_carries_code_and_stderr() {
        let runner = SystemCommandRunner;
        let result = runner.run(
            Path::new("sh"),
            &["-c".to_string(), "echo broken >&2; exit 3".to_string()],
            &RunOptions::default(),
            &CancellationToken::new(),
        );
        match result {
            Err(RunError::Failed(FailureKind::Exit { code, stderr })) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("expected exit failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let runner = SystemCommandRunner;
        let options = RunOptions {
            timeout: Some(Duration::from_millis(200)),
            verbose: false,
        };
        let start = Instant::now();
        let result = runner.run(
            Path::new("sleep"),
            &["5".to_string()],
            &options,
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(RunError::Failed(FailureKind::Timeout(_)))));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_cancelled_token_kills_child() {
        let runner = SystemCommandRunner;
        let token = CancellationToken::new();
        token.cancel();
        let result = runner.run(
            Path::new("sleep"),
            &["5".to_string()],
            &RunOptions::default(),
            &token,
        );
        assert!(matches!(result, Err(RunError::Cancelled)));
    }

    #[test]
    fn test_missing_program_is_spawn_failure() {
        let runner = SystemCommandRunner;
        let result = runner.run(
            Path::new("/definitely/not/a/real/program"),
            &[],
            &RunOptions::default(),
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(RunError::Failed(FailureKind::Spawn(_)))));
    }
}
