//! FFprobe integration for reading the source video's properties.
//!
//! The pipeline needs the frame rate (to feed the frame sequence back to
//! ffmpeg at the original speed), the dimensions (to compute the final scale)
//! and whether there is an audio stream to carry over.

use crate::error::{CoreError, CoreResult};

use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;

/// Properties of the source video relevant to the pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VideoProperties {
    pub width: u32,
    pub height: u32,
    /// Frame rate as reported by ffprobe, e.g. `"30000/1001"`.
    pub frame_rate: String,
    pub has_audio: bool,
    pub duration_secs: Option<f64>,
    /// Container-reported frame count. A hint only; extraction is authoritative.
    pub frame_count: Option<u64>,
}

/// Trait for probing media files, injectable for tests.
pub trait FfprobeExecutor {
    fn get_video_properties(&self, input_path: &Path) -> CoreResult<VideoProperties>;
}

/// [`FfprobeExecutor`] backed by the `ffprobe` crate.
#[derive(Debug, Clone, Default)]
pub struct CrateFfprobeExecutor;

impl CrateFfprobeExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl FfprobeExecutor for CrateFfprobeExecutor {
    fn get_video_properties(&self, input_path: &Path) -> CoreResult<VideoProperties> {
        log::debug!(
            "Running ffprobe (via crate) for video properties on: {}",
            input_path.display()
        );
        if !input_path.is_file() {
            return Err(probe_error(input_path, "input video file not found"));
        }

        let metadata = ffprobe(input_path).map_err(|err| {
            log::error!(
                "ffprobe failed for video properties on {}: {:?}",
                input_path.display(),
                err
            );
            map_ffprobe_error(input_path, err)
        })?;

        let video_stream = metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| probe_error(input_path, "no video stream found"))?;

        let (width, height) = match (video_stream.width, video_stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w as u32, h as u32),
            (w, h) => {
                return Err(probe_error(
                    input_path,
                    &format!("invalid video dimensions: width={w:?}, height={h:?}"),
                ));
            }
        };

        let frame_rate = [&video_stream.r_frame_rate, &video_stream.avg_frame_rate]
            .into_iter()
            .find(|rate| parse_frame_rate(rate).is_some())
            .cloned()
            .ok_or_else(|| {
                probe_error(
                    input_path,
                    &format!(
                        "could not determine frame rate (r_frame_rate={}, avg_frame_rate={})",
                        video_stream.r_frame_rate, video_stream.avg_frame_rate
                    ),
                )
            })?;

        let has_audio = metadata
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"));

        let duration_secs = metadata
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok());

        let frame_count = video_stream
            .nb_frames
            .as_deref()
            .and_then(|f| f.parse::<u64>().ok());

        Ok(VideoProperties {
            width,
            height,
            frame_rate,
            has_audio,
            duration_secs,
            frame_count,
        })
    }
}

/// Parses an ffprobe rational (`"24000/1001"`) or decimal (`"25"`) frame rate.
/// Returns `None` for zero, negative or malformed rates such as `"0/0"`.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.trim().split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

fn probe_error(path: &Path, message: &str) -> CoreError {
    CoreError::Probe {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn map_ffprobe_error(path: &Path, err: FfProbeError) -> CoreError {
    let message = match err {
        FfProbeError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
            return CoreError::DependencyNotFound("ffprobe".to_string());
        }
        FfProbeError::Io(io_err) => format!("failed to run ffprobe: {io_err}"),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            format!("ffprobe exited with {}: {}", output.status, stderr.trim())
        }
        FfProbeError::Deserialize(err) => format!("could not parse ffprobe output: {err}"),
        other => format!("unknown ffprobe error: {other:?}"),
    };
    probe_error(path, &message)
}
