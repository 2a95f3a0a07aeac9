// ============================================================================
// framescale-core/src/processing/reassemble.rs
// ============================================================================
//
// REASSEMBLY: Encoding the upscaled frames back into a video
//
// The upscaled PNG sequence is fed to ffmpeg at the source frame rate as the
// first input. The original video is the second input and only contributes
// its audio streams. When the configured output size differs from the
// resizer's magnification a lanczos scale filter brings the frames to their
// final dimensions. User encoder arguments follow, then the output path.

use crate::config::Config;
use crate::error::{CoreError, CoreResult, FailureKind, ToolFailure};
use crate::external::{FfmpegSpawner, VideoProperties, run_ffmpeg};
use crate::frames::{self, FRAME_PATTERN};
use crate::processing::{StageContext, map_run_error};
use crate::progress::Stage;
use crate::util::command::format_command_line;

use log::{info, warn};

use std::fs;
use std::path::Path;

/// Final output dimensions, or `None` when the upscaled frames are already
/// the requested size.
///
/// Dimensions are rounded to the nearest even number, which most encoders
/// require for 4:2:0 chroma subsampling.
pub fn target_dimensions(properties: &VideoProperties, config: &Config) -> Option<(u32, u32)> {
    if !config.needs_rescale() {
        return None;
    }
    let scale = config.output_scale();
    Some((
        even_dimension(properties.width, scale),
        even_dimension(properties.height, scale),
    ))
}

fn even_dimension(source: u32, scale: f64) -> u32 {
    let halves = (f64::from(source) * scale / 2.0).round();
    ((halves as u32) * 2).max(2)
}

/// Builds the ffmpeg argument list for the encode stage.
///
/// Pure function of its inputs: identical inputs always give identical arguments.
pub fn build_encode_args(
    config: &Config,
    properties: &VideoProperties,
    input: &Path,
    upscaled_dir: &Path,
    output: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".to_string(),
        "-y".to_string(),
        "-framerate".to_string(),
        properties.frame_rate.clone(),
        "-start_number".to_string(),
        "0".to_string(),
        "-i".to_string(),
        upscaled_dir.join(FRAME_PATTERN).display().to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
    ];

    if properties.has_audio {
        args.push("-map".to_string());
        args.push("1:a".to_string());
    }

    let mut encoder_args = config.encoder_arg_list();
    if let Some((width, height)) = target_dimensions(properties, config) {
        let scale = format!("scale={width}:{height}:flags=lanczos");
        // ffmpeg keeps only the last -vf, so a user filter chain gets the
        // scale appended instead of being replaced by it.
        match user_video_filter(&encoder_args) {
            Some(value) => {
                let chain = format!("{},{scale}", encoder_args[value]);
                encoder_args[value] = chain;
            }
            None => {
                args.push("-vf".to_string());
                args.push(scale);
            }
        }
    }

    args.extend(encoder_args);
    args.push(output.display().to_string());
    args
}

/// Index of the value of the last `-vf`/`-filter:v` option in `args`.
fn user_video_filter(args: &[String]) -> Option<usize> {
    args.iter()
        .rposition(|a| a == "-vf" || a == "-filter:v")
        .map(|flag| flag + 1)
        .filter(|&value| value < args.len())
}

/// True when the encoder arguments build their own filter graph, which the
/// rescale filter cannot be merged into.
fn uses_filter_complex(args: &[String]) -> bool {
    args.iter()
        .any(|a| a == "-filter_complex" || a == "-lavfi")
}

/// Encodes `frame_count` upscaled frames from `upscaled_dir` into `output`.
///
/// Refuses to start when any upscaled frame is missing. A partially written
/// output is removed when ffmpeg fails or is interrupted.
#[allow(clippy::too_many_arguments)]
pub fn reassemble<S: FfmpegSpawner>(
    spawner: &S,
    config: &Config,
    properties: &VideoProperties,
    input: &Path,
    upscaled_dir: &Path,
    frame_count: usize,
    output: &Path,
    ctx: StageContext<'_>,
) -> CoreResult<()> {
    let missing = frames::missing_frames(upscaled_dir, frame_count);
    if !missing.is_empty() {
        return Err(CoreError::UpscaleSummary {
            failed: missing,
            total: frame_count,
        });
    }

    if config.uses_default_encoder_args() {
        warn!(
            "No ffmpeg arguments configured, using defaults: {}",
            config.encoder_arg_list().join(" ")
        );
    }

    if target_dimensions(properties, config).is_some()
        && uses_filter_complex(&config.encoder_arg_list())
    {
        warn!(
            "ffmpeg args define a filter graph; the {}% output scale may not be applied",
            config.scale_factor
        );
    }

    let args = build_encode_args(config, properties, input, upscaled_dir, output);
    let command = format_command_line(Path::new("ffmpeg"), &args);

    ctx.progress
        .stage_started(Stage::Encoding, Some(frame_count as u64));
    let outcome = run_ffmpeg(spawner, &args, ctx.cancel, ctx.verbose, |frame| {
        ctx.progress.stage_position(Stage::Encoding, frame)
    })
    .map_err(|e| map_run_error(e, |kind| CoreError::Encoding(ToolFailure::new(&command, kind))))
    .and_then(|()| verify_output(output, &command));
    ctx.progress.stage_finished(Stage::Encoding, outcome.is_ok());

    if let Err(err) = outcome {
        remove_partial_output(output);
        return Err(err);
    }

    info!("Encoded {} frames into {}", frame_count, output.display());
    Ok(())
}

fn verify_output(output: &Path, command: &str) -> CoreResult<()> {
    let size = fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err(CoreError::Encoding(ToolFailure::new(
            command,
            FailureKind::NoOutput(format!("{} is missing or empty", output.display())),
        )));
    }
    Ok(())
}

fn remove_partial_output(output: &Path) {
    if output.exists() {
        match fs::remove_file(output) {
            Ok(()) => info!("Removed partial output {}", output.display()),
            Err(e) => warn!("Failed to remove partial output {}: {}", output.display(), e),
        }
    }
}
