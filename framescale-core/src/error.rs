// ============================================================================
// framescale-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for framescale-core
//
// This module defines the error taxonomy of a pipeline run. Every stage that
// shells out to an external tool reports a `ToolFailure` that names the
// offending command and says how it failed (could not start, non-zero exit,
// timeout, missing or unusable output).
//
// KEY COMPONENTS:
// - CoreError: the error enum returned by every public operation
// - ToolFailure / FailureKind: how an external invocation failed
// - CoreResult: result alias used throughout the crate

// ---- External crate imports ----
use thiserror::Error;

// ---- Standard library imports ----
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// EXTERNAL TOOL FAILURES
// ============================================================================

/// How a single external invocation failed.
#[derive(Error, Debug)]
pub enum FailureKind {
    #[error("failed to start: {0}")]
    Spawn(String),

    #[error("exited with {}{}", format_exit_code(.code), format_stderr(.stderr))]
    Exit { code: Option<i32>, stderr: String },

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("finished without output: {0}")]
    NoOutput(String),

    #[error("produced unusable output: {0}")]
    InvalidOutput(String),
}

fn format_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

/// A failed external invocation together with the command line that caused it.
#[derive(Debug)]
pub struct ToolFailure {
    /// The command line, joined with spaces for display.
    pub command: String,
    pub kind: FailureKind,
}

impl ToolFailure {
    pub fn new(command: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            command: command.into(),
            kind,
        }
    }

    /// Returns true when the failure is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, FailureKind::Timeout(_))
    }
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.command, self.kind)
    }
}

impl std::error::Error for ToolFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

// ============================================================================
// CORE ERROR
// ============================================================================

/// Errors produced by framescale-core.
///
/// `Config`, `Extraction`, `Upscale`/`UpscaleSummary` and `Encoding` map to the
/// four pipeline stages. None of them are retried; the pipeline cleans up its
/// working directory and hands the error back to the caller.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("ffprobe failed for {}: {message}", .path.display())]
    Probe { path: PathBuf, message: String },

    #[error("Frame extraction failed: {0}")]
    Extraction(ToolFailure),

    #[error("Upscaling frame {index} failed: {failure}")]
    Upscale { index: usize, failure: ToolFailure },

    #[error("Upscaling failed for {} of {total} frames: {}", .failed.len(), format_indices(.failed))]
    UpscaleSummary { failed: Vec<usize>, total: usize },

    #[error("Encoding failed: {0}")]
    Encoding(ToolFailure),

    #[error("Interrupted by user")]
    Interrupted,

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl CoreError {
    /// The name of the stage an error belongs to, used in user-facing output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "ConfigError",
            CoreError::DependencyNotFound(_) => "DependencyError",
            CoreError::Probe { .. } | CoreError::Extraction(_) => "ExtractionError",
            CoreError::Upscale { .. } | CoreError::UpscaleSummary { .. } => "UpscaleError",
            CoreError::Encoding(_) => "EncodingError",
            CoreError::Interrupted => "Interrupted",
            CoreError::Io(_) | CoreError::PathError(_) | CoreError::OperationFailed(_) => {
                "InternalError"
            }
        }
    }

    /// The failing frame index for single-frame upscale errors.
    pub fn frame_index(&self) -> Option<usize> {
        match self {
            CoreError::Upscale { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Collapses sorted frame indices into ranges, e.g. `0-3, 7, 9-10`.
pub fn format_indices(indices: &[usize]) -> String {
    let mut parts = Vec::new();
    let mut iter = indices.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{start}-{end}"));
        }
    }
    parts.join(", ")
}

/// Result type for framescale-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
