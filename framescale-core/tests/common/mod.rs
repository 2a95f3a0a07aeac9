// framescale-core/tests/common/mod.rs
//
// Test doubles for the external tools. ffmpeg and ffprobe are replaced by
// mocks that create the files the real tools would; the resizer mock
// "upscales" by writing the target file.

#![allow(dead_code)]

use framescale_core::error::{CoreResult, FailureKind};
use framescale_core::external::{FfmpegEvent, FfmpegProcess, FfmpegSpawner, FfprobeExecutor, VideoProperties};
use framescale_core::frames::{frame_file_name, parse_frame_index};
use framescale_core::progress::{ProgressReporter, Stage};
use framescale_core::util::{CancellationToken, CommandOutput, CommandRunner, RunError, RunOptions};
use framescale_core::Config;

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Mutex;

// --- ffmpeg ---

pub struct MockFfmpegProcess {
    events: Vec<FfmpegEvent>,
    exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        for event in self.events.drain(..) {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }

    fn kill(&mut self) -> CoreResult<()> {
        Ok(())
    }
}

/// Writes `frame_count` frames on extraction and a small output file on encode.
#[derive(Default)]
pub struct MockFfmpegSpawner {
    pub frame_count: usize,
    pub extract_exit_code: Option<i32>,
    pub encode_exit_code: Option<i32>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl MockFfmpegSpawner {
    pub fn with_frames(frame_count: usize) -> Self {
        Self {
            frame_count,
            ..Default::default()
        }
    }

    /// Extraction exits with `code` and writes no frames.
    pub fn failing_extract(frame_count: usize, code: i32) -> Self {
        Self {
            frame_count,
            extract_exit_code: Some(code),
            ..Default::default()
        }
    }

    /// Encoding writes a partial file, then exits with `code`.
    pub fn failing_encode(frame_count: usize, code: i32) -> Self {
        Self {
            frame_count,
            encode_exit_code: Some(code),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    pub fn encode_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|args| !is_extraction(args))
            .collect()
    }
}

fn is_extraction(args: &[String]) -> bool {
    args.iter().any(|a| a == "-fps_mode")
}

#[cfg(unix)]
fn exit_status(code: Option<i32>) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code.unwrap_or(0) << 8)
}

#[cfg(windows)]
fn exit_status(code: Option<i32>) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code.unwrap_or(0) as u32)
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, args: &[String]) -> CoreResult<Self::Process> {
        self.calls.borrow_mut().push(args.to_vec());
        let target = PathBuf::from(args.last().cloned().unwrap_or_default());

        let code = if is_extraction(args) {
            if self.extract_exit_code.is_none() {
                let dir = target.parent().unwrap();
                for i in 0..self.frame_count {
                    fs::write(dir.join(frame_file_name(i)), b"raw png")?;
                }
            }
            self.extract_exit_code
        } else {
            if self.encode_exit_code.is_none() {
                fs::write(&target, b"encoded video")?;
            } else {
                fs::write(&target, b"partial")?;
            }
            self.encode_exit_code
        };

        let events = match code {
            Some(_) => vec![FfmpegEvent::Error("Conversion failed!".to_string())],
            None => vec![],
        };
        Ok(MockFfmpegProcess {
            events,
            exit_status: exit_status(code),
        })
    }
}

// --- ffprobe ---

pub struct MockFfprobe {
    pub properties: VideoProperties,
}

impl MockFfprobe {
    pub fn new(has_audio: bool) -> Self {
        Self {
            properties: VideoProperties {
                width: 320,
                height: 240,
                frame_rate: "30000/1001".to_string(),
                has_audio,
                duration_secs: Some(1.0),
                frame_count: Some(10),
            },
        }
    }
}

impl FfprobeExecutor for MockFfprobe {
    fn get_video_properties(&self, _input_path: &Path) -> CoreResult<VideoProperties> {
        Ok(self.properties.clone())
    }
}

// --- image resizer ---

/// What the mock resizer does with a frame it was told to fail.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FrameFault {
    ExitCode(i32),
    Timeout,
    NoOutput,
}

#[derive(Default)]
pub struct MockResizer {
    faults: Vec<(usize, FrameFault)>,
    /// Trips this token when the given frame is processed, like a Ctrl-C mid-run.
    interrupt: Option<(usize, CancellationToken)>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockResizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, index: usize, fault: FrameFault) -> Self {
        self.faults.push((index, fault));
        self
    }

    pub fn interrupting_at(mut self, index: usize, token: CancellationToken) -> Self {
        self.interrupt = Some((index, token));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn processed_indices(&self) -> HashSet<usize> {
        self.calls()
            .iter()
            .filter_map(|args| frame_index_of(args))
            .collect()
    }
}

fn frame_index_of(args: &[String]) -> Option<usize> {
    let target = Path::new(args.last()?);
    parse_frame_index(target.file_name()?.to_str()?)
}

impl CommandRunner for MockResizer {
    fn run(
        &self,
        _program: &Path,
        args: &[String],
        options: &RunOptions,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, RunError> {
        self.calls.lock().unwrap().push(args.to_vec());
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        let index = frame_index_of(args).expect("resizer called with a frame path");
        if let Some((at, token)) = &self.interrupt {
            if *at == index {
                token.cancel();
                return Err(RunError::Cancelled);
            }
        }

        match self.faults.iter().find(|(i, _)| *i == index).map(|(_, f)| *f) {
            Some(FrameFault::ExitCode(code)) => Err(RunError::Failed(FailureKind::Exit {
                code: Some(code),
                stderr: format!("cannot decode frame {index}"),
            })),
            Some(FrameFault::Timeout) => Err(RunError::Failed(FailureKind::Timeout(
                options.timeout.unwrap_or_default(),
            ))),
            Some(FrameFault::NoOutput) => Ok(CommandOutput::default()),
            None => {
                fs::write(args.last().unwrap(), b"upscaled png").unwrap();
                Ok(CommandOutput::default())
            }
        }
    }
}

// --- progress ---

#[derive(Default)]
pub struct RecordingProgress {
    pub started: Mutex<Vec<Stage>>,
    pub finished: Mutex<Vec<(Stage, bool)>>,
    pub advanced: Mutex<u64>,
}

impl ProgressReporter for RecordingProgress {
    fn stage_started(&self, stage: Stage, _total: Option<u64>) {
        self.started.lock().unwrap().push(stage);
    }

    fn stage_advance(&self, _stage: Stage, delta: u64) {
        *self.advanced.lock().unwrap() += delta;
    }

    fn stage_finished(&self, stage: Stage, success: bool) {
        self.finished.lock().unwrap().push((stage, success));
    }
}

// --- fixtures ---

/// Config TOML for tests; `extra_upscaler` lines are appended to `[upscaler]`.
pub fn config_toml(algorithm: &str, resizer: &Path, extra_upscaler: &str) -> String {
    format!(
        r#"
[upscaler]
magnification_factor = 2
algorithm = "{algorithm}"
workers = 4
{extra_upscaler}

[ffmpeg]
args = "-c:v libx264 -crf 15"

[output]
container = "mp4"
scale_factor = 200

[imageresizer]
path = '{}'
"#,
        resizer.display()
    )
}

pub fn test_config(extra_upscaler: &str) -> Config {
    Config::parse(
        &config_toml("XBR", Path::new("/opt/ImageResizer"), extra_upscaler),
        Path::new("config.toml"),
    )
    .unwrap()
}

pub fn dummy_video(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"not really a video").unwrap();
    path
}

/// Names of entries in `dir` that look like working directories.
pub fn leftover_work_dirs(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".framescale-"))
        .collect()
}
