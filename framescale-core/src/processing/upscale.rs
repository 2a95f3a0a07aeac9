// ============================================================================
// framescale-core/src/processing/upscale.rs
// ============================================================================
//
// FRAME UPSCALING: Running the image resizer over every frame in parallel
//
// Frames are independent, so they are distributed over a dedicated rayon
// pool sized by the `workers` setting (CPU count by default). Each frame is
// one resizer invocation reading `raw/frame_N.png` and writing
// `upscaled/frame_N.png`.
//
// Failure handling follows the configured policy:
// - fail-fast: the first failure cancels the stage; in-flight resizers are
//   killed and queued frames are skipped
// - best-effort: every frame is attempted and the failed indices are
//   reported together at the end

use crate::config::{Config, FailurePolicy};
use crate::error::{CoreError, CoreResult, FailureKind, ToolFailure};
use crate::frames::Frame;
use crate::processing::{StageContext, map_run_error};
use crate::progress::Stage;
use crate::util::cancel::CancellationToken;
use crate::util::command::{CommandRunner, RunOptions, format_command_line};

use log::{debug, error, info};
use rayon::prelude::*;

use std::sync::{Mutex, PoisonError};

/// Builds the resizer argument list for a single frame.
///
/// The algorithm and factor are passed as one argument, e.g. `XBR 2x`.
pub fn build_resize_args(config: &Config, frame: &Frame) -> Vec<String> {
    vec![
        "/load".to_string(),
        frame.raw.display().to_string(),
        "/resize".to_string(),
        "auto".to_string(),
        format!("{} {}x", config.algorithm, config.magnification_factor),
        "/save".to_string(),
        frame.upscaled.display().to_string(),
    ]
}

/// Upscales all `frames` with the configured resizer.
///
/// Returns once every frame has an upscaled counterpart, or with the error
/// selected by the failure policy. A user interrupt always wins and is
/// reported as [`CoreError::Interrupted`].
pub fn upscale_frames<R: CommandRunner>(
    runner: &R,
    config: &Config,
    frames: &[Frame],
    ctx: StageContext<'_>,
) -> CoreResult<()> {
    if frames.is_empty() {
        return Ok(());
    }

    let workers = config.worker_count().min(frames.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("upscale-{i}"))
        .build()
        .map_err(|e| CoreError::OperationFailed(format!("failed to start upscale workers: {e}")))?;

    info!(
        "Upscaling {} frames with {} {}x on {} workers",
        frames.len(),
        config.algorithm,
        config.magnification_factor,
        workers
    );

    // Child token: a failing frame cancels its siblings without looking
    // like a user interrupt to the caller.
    let stage_cancel = ctx.cancel.child();
    let options = RunOptions {
        timeout: config.timeout,
        verbose: ctx.verbose,
    };
    let fail_fast = config.failure_policy == FailurePolicy::FailFast;
    let first_error: Mutex<Option<CoreError>> = Mutex::new(None);
    let failed: Mutex<Vec<usize>> = Mutex::new(Vec::new());

    ctx.progress
        .stage_started(Stage::Upscaling, Some(frames.len() as u64));

    pool.install(|| {
        frames.par_iter().for_each(|frame| {
            if stage_cancel.is_cancelled() {
                return;
            }

            let err = match upscale_frame(runner, config, frame, &options, &stage_cancel) {
                Ok(()) => {
                    ctx.progress.stage_advance(Stage::Upscaling, 1);
                    return;
                }
                Err(err) => err,
            };

            if ctx.cancel.is_cancelled() {
                return;
            }
            if matches!(err, CoreError::Interrupted) {
                // Killed because a sibling failed first.
                debug!("Frame {} cancelled", frame.index);
                return;
            }

            error!("{err}");
            if fail_fast {
                let mut slot = first_error.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.is_none() {
                    *slot = Some(err);
                }
                drop(slot);
                stage_cancel.cancel();
            } else {
                failed
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(frame.index);
            }
        });
    });

    let outcome = if ctx.cancel.is_cancelled() {
        Err(CoreError::Interrupted)
    } else if let Some(err) = first_error
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
    {
        Err(err)
    } else {
        let mut failed = failed.into_inner().unwrap_or_else(PoisonError::into_inner);
        if failed.is_empty() {
            Ok(())
        } else {
            failed.sort_unstable();
            Err(CoreError::UpscaleSummary {
                failed,
                total: frames.len(),
            })
        }
    };

    ctx.progress.stage_finished(Stage::Upscaling, outcome.is_ok());
    outcome
}

fn upscale_frame<R: CommandRunner>(
    runner: &R,
    config: &Config,
    frame: &Frame,
    options: &RunOptions,
    cancel: &CancellationToken,
) -> CoreResult<()> {
    let args = build_resize_args(config, frame);
    let wrap = |kind: FailureKind| CoreError::Upscale {
        index: frame.index,
        failure: ToolFailure::new(format_command_line(&config.resizer_path, &args), kind),
    };

    runner
        .run(&config.resizer_path, &args, options, cancel)
        .map_err(|e| map_run_error(e, &wrap))?;

    if !frame.upscaled.is_file() {
        return Err(wrap(FailureKind::NoOutput(format!(
            "{} was not written",
            frame.upscaled.display()
        ))));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn config() -> Config {
        Config::parse(
            r#"
            [upscaler]
            magnification_factor = 4
            algorithm = "hqx"

            [ffmpeg]
            args = ""

            [output]
            container = "mkv"
            scale_factor = 400

            [imageresizer]
            path = "/opt/ImageResizer"
            "#,
            Path::new("test.toml"),
        )
        .unwrap()
    }

    #[test]
    fn test_resize_args_pass_spec_as_single_argument() {
        let frame = Frame {
            index: 3,
            raw: PathBuf::from("/w/raw/frame_000003.png"),
            upscaled: PathBuf::from("/w/upscaled/frame_000003.png"),
        };
        assert_eq!(
            build_resize_args(&config(), &frame),
            vec![
                "/load",
                "/w/raw/frame_000003.png",
                "/resize",
                "auto",
                "HQX 4x",
                "/save",
                "/w/upscaled/frame_000003.png",
            ]
        );
    }
}
