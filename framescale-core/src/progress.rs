//! Progress reporting hooks.
//!
//! The pipeline reports stage boundaries and per-stage progress through
//! [`ProgressReporter`]. The CLI renders them with indicatif; library users
//! and tests can use [`NoopProgress`] or record the calls.

use std::fmt;

/// The long-running pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extracting,
    Upscaling,
    Encoding,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Extracting => "Extracting frames",
            Stage::Upscaling => "Upscaling frames",
            Stage::Encoding => "Encoding video",
        };
        f.write_str(label)
    }
}

/// Receives progress from the pipeline. All methods default to no-ops.
///
/// The upscale stage calls [`ProgressReporter::stage_advance`] from worker
/// threads, hence the `Send + Sync` bound.
pub trait ProgressReporter: Send + Sync {
    /// A stage began. `total` is the number of frames when known up front.
    fn stage_started(&self, _stage: Stage, _total: Option<u64>) {}

    /// Absolute frame position reported by ffmpeg.
    fn stage_position(&self, _stage: Stage, _position: u64) {}

    /// `delta` more frames finished.
    fn stage_advance(&self, _stage: Stage, _delta: u64) {}

    /// A stage ended, successfully or not.
    fn stage_finished(&self, _stage: Stage, _success: bool) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {}
