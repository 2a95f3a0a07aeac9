//! The three processing stages of a run.
//!
//! Each stage is a free function over trait-bound collaborators so the
//! pipeline can drive the real tools and tests can drive mocks:
//!
//! - [`extract`]: ffmpeg decodes the input into numbered PNG frames
//! - [`upscale`]: the image resizer enlarges every frame on a worker pool
//! - [`reassemble`]: ffmpeg encodes the upscaled frames and muxes the source audio

pub mod extract;
pub mod reassemble;
pub mod upscale;

pub use extract::{build_extract_args, extract_frames};
pub use reassemble::{build_encode_args, reassemble, target_dimensions};
pub use upscale::{build_resize_args, upscale_frames};

use crate::error::{CoreError, FailureKind};
use crate::progress::ProgressReporter;
use crate::util::cancel::CancellationToken;
use crate::util::command::RunError;

/// State shared by every stage of one run.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub cancel: &'a CancellationToken,
    pub verbose: bool,
    pub progress: &'a dyn ProgressReporter,
}

/// Cancellation always surfaces as [`CoreError::Interrupted`]; tool failures
/// are wrapped into the stage's own error variant.
pub(crate) fn map_run_error<W>(err: RunError, wrap: W) -> CoreError
where
    W: FnOnce(FailureKind) -> CoreError,
{
    match err {
        RunError::Cancelled => CoreError::Interrupted,
        RunError::Failed(kind) => wrap(kind),
    }
}
