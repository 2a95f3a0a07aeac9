// ============================================================================
// framescale-core/src/processing/extract.rs
// ============================================================================
//
// FRAME EXTRACTION: Decoding the input video into numbered PNG frames
//
// ffmpeg writes every frame of the first video stream into the raw frame
// directory with passthrough timing, so no frame is dropped or duplicated.
// The directory is then scanned to confirm ffmpeg actually produced a
// gap-free sequence starting at index 0.

use crate::error::{CoreError, CoreResult, FailureKind, ToolFailure};
use crate::external::{FfmpegSpawner, run_ffmpeg};
use crate::frames::{self, FRAME_PATTERN, Frame};
use crate::processing::{StageContext, map_run_error};
use crate::progress::Stage;
use crate::temp_files::WorkDir;
use crate::util::command::format_command_line;

use std::path::Path;

/// Builds the ffmpeg argument list for extracting `input` into `raw_dir`.
pub fn build_extract_args(input: &Path, raw_dir: &Path) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-y".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-fps_mode".to_string(),
        "passthrough".to_string(),
        "-start_number".to_string(),
        "0".to_string(),
        raw_dir.join(FRAME_PATTERN).display().to_string(),
    ]
}

/// Extracts every frame of `input` into the work directory's raw frame folder.
///
/// `expected_frames` only sizes the progress display. The returned frames
/// are ordered by index and cover `0..N` with `N >= 1`.
pub fn extract_frames<S: FfmpegSpawner>(
    spawner: &S,
    input: &Path,
    work_dir: &WorkDir,
    expected_frames: Option<u64>,
    ctx: StageContext<'_>,
) -> CoreResult<Vec<Frame>> {
    let args = build_extract_args(input, work_dir.raw_dir());
    let command = format_command_line(Path::new("ffmpeg"), &args);

    ctx.progress.stage_started(Stage::Extracting, expected_frames);
    let outcome = run_ffmpeg(spawner, &args, ctx.cancel, ctx.verbose, |frame| {
        ctx.progress.stage_position(Stage::Extracting, frame)
    })
    .map_err(|e| map_run_error(e, |kind| CoreError::Extraction(ToolFailure::new(&command, kind))))
    .and_then(|()| collect_raw_frames(work_dir, &command));
    ctx.progress.stage_finished(Stage::Extracting, outcome.is_ok());

    let frames = outcome?;
    log::info!("Extracted {} frames", frames.len());
    Ok(frames)
}

fn collect_raw_frames(work_dir: &WorkDir, command: &str) -> CoreResult<Vec<Frame>> {
    let indices = frames::scan_frame_indices(work_dir.raw_dir())?;

    if indices.is_empty() {
        return Err(CoreError::Extraction(ToolFailure::new(
            command,
            FailureKind::NoOutput("no frames were written".to_string()),
        )));
    }

    frames::check_contiguous(&indices).map_err(|msg| {
        CoreError::Extraction(ToolFailure::new(command, FailureKind::InvalidOutput(msg)))
    })?;

    Ok(work_dir.frames(indices.len()))
}
