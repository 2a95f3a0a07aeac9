// ============================================================================
// framescale-core/src/pipeline.rs
// ============================================================================
//
// PIPELINE: Orchestrating a single upscale run
//
// A run moves through a fixed sequence of states:
//
//   Init -> Configured -> Extracting -> Upscaling -> Encoding -> Done
//
// Any error moves it to Failed instead. Stages never overlap: upscaling
// starts only after extraction has produced a complete frame set, and
// encoding only after every frame has been upscaled. The working directory
// is owned by the run and is removed on every exit path.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegSpawner, FfprobeExecutor, VideoProperties};
use crate::processing::{self, StageContext};
use crate::progress::{NoopProgress, ProgressReporter};
use crate::temp_files::WorkDir;
use crate::util::cancel::CancellationToken;
use crate::util::command::CommandRunner;
use crate::utils::{default_output_path, format_bytes, format_duration, unique_output_path};

use log::{info, warn};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

static NOOP_PROGRESS: NoopProgress = NoopProgress;

/// Lifecycle state of a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Configured,
    Extracting,
    Upscaling,
    Encoding,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Init => "init",
            PipelineState::Configured => "configured",
            PipelineState::Extracting => "extracting",
            PipelineState::Upscaling => "upscaling",
            PipelineState::Encoding => "encoding",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub frame_count: usize,
    pub output_size: u64,
    pub elapsed: Duration,
    pub properties: VideoProperties,
}

/// One upscale run over one input video.
///
/// The external tools are injected so the same orchestration drives the real
/// binaries and the test doubles.
pub struct Pipeline<'a, S, P, R> {
    config: &'a Config,
    spawner: &'a S,
    prober: &'a P,
    runner: &'a R,
    progress: &'a dyn ProgressReporter,
    cancel: CancellationToken,
    verbose: bool,
    state: PipelineState,
    history: Vec<PipelineState>,
}

impl<'a, S, P, R> Pipeline<'a, S, P, R>
where
    S: FfmpegSpawner,
    P: FfprobeExecutor,
    R: CommandRunner,
{
    /// Creates a pipeline for an already validated configuration.
    pub fn new(config: &'a Config, spawner: &'a S, prober: &'a P, runner: &'a R) -> Self {
        let mut pipeline = Self {
            config,
            spawner,
            prober,
            runner,
            progress: &NOOP_PROGRESS,
            cancel: CancellationToken::new(),
            verbose: false,
            state: PipelineState::Init,
            history: vec![PipelineState::Init],
        };
        pipeline.transition(PipelineState::Configured);
        pipeline
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Uses `cancel` to interrupt the run, typically tripped from a signal handler.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Logs external command lines and their output at info level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state the pipeline has been in, oldest first.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Upscales `input` into `output` (or the default output path).
    ///
    /// An existing file at the output path is never overwritten; a numbered
    /// sibling name is chosen instead. A pipeline runs at most once.
    pub fn run(&mut self, input: &Path, output: Option<&Path>) -> CoreResult<RunReport> {
        if self.state != PipelineState::Configured {
            return Err(CoreError::OperationFailed(format!(
                "pipeline cannot run from state '{}'",
                self.state
            )));
        }

        let started = Instant::now();
        let result = self.execute(input, output, started);
        match &result {
            Ok(report) => {
                self.transition(PipelineState::Done);
                info!(
                    "Finished {} -> {} ({} frames, {}, took {})",
                    report.input.display(),
                    report.output.display(),
                    report.frame_count,
                    format_bytes(report.output_size),
                    format_duration(report.elapsed.as_secs_f64())
                );
            }
            Err(err) => {
                self.transition(PipelineState::Failed);
                log::error!("Run failed ({}): {err}", err.kind_name());
            }
        }
        result
    }

    fn execute(
        &mut self,
        input: &Path,
        output: Option<&Path>,
        started: Instant,
    ) -> CoreResult<RunReport> {
        if !input.is_file() {
            return Err(CoreError::Probe {
                path: input.to_path_buf(),
                message: "input video file not found".to_string(),
            });
        }

        let properties = self.prober.get_video_properties(input)?;
        info!(
            "Input {}: {}x{} @ {} fps, audio: {}",
            input.display(),
            properties.width,
            properties.height,
            properties.frame_rate,
            if properties.has_audio { "yes" } else { "no" }
        );

        let requested = match output {
            Some(path) => path.to_path_buf(),
            None => default_output_path(input, self.config)?,
        };
        let output = unique_output_path(&requested);
        if output != requested {
            warn!(
                "{} already exists, writing {} instead",
                requested.display(),
                output.display()
            );
        }
        let output_parent = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&output_parent)?;

        let work_base = self.config.temp_dir.clone().unwrap_or(output_parent);
        let work_dir = WorkDir::create(&work_base)?;

        let cancel = self.cancel.clone();
        let ctx = StageContext {
            cancel: &cancel,
            verbose: self.verbose,
            progress: self.progress,
        };

        self.enter_stage(PipelineState::Extracting)?;
        let frames = processing::extract_frames(
            self.spawner,
            input,
            &work_dir,
            properties.frame_count,
            ctx,
        )?;

        self.enter_stage(PipelineState::Upscaling)?;
        processing::upscale_frames(self.runner, self.config, &frames, ctx)?;

        self.enter_stage(PipelineState::Encoding)?;
        processing::reassemble(
            self.spawner,
            self.config,
            &properties,
            input,
            work_dir.upscaled_dir(),
            frames.len(),
            &output,
            ctx,
        )?;

        let output_size = fs::metadata(&output)?.len();
        if let Err(e) = work_dir.close() {
            warn!("Failed to remove working directory: {e}");
        }

        Ok(RunReport {
            input: input.to_path_buf(),
            output,
            frame_count: frames.len(),
            output_size,
            elapsed: started.elapsed(),
            properties,
        })
    }

    fn enter_stage(&mut self, next: PipelineState) -> CoreResult<()> {
        if self.cancel.is_cancelled() {
            return Err(CoreError::Interrupted);
        }
        self.transition(next);
        Ok(())
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("Pipeline state: {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }
}
