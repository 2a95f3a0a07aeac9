// ============================================================================
// framescale-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// This module provides abstractions for spawning and interacting with FFmpeg
// processes. Extraction and reassembly build plain argument vectors and hand
// them to an `FfmpegSpawner`; `run_ffmpeg` drives the spawned process, keeps
// the tail of its log output, forwards frame progress and honours
// cancellation.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar
// - run_ffmpeg: Shared event loop used by both ffmpeg stages

use crate::error::{CoreError, CoreResult, FailureKind};
use crate::util::cancel::CancellationToken;
use crate::util::command::{OUTPUT_TAIL_LINES, OutputTail, RunError};

use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use log::{debug, info};

use std::path::Path;
use std::process::ExitStatus;

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Processes events from the running command using a provided handler closure.
    /// Iteration stops at the first handler error, which is returned.
    fn handle_events<F>(&mut self, handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;

    /// Terminates the process.
    fn kill(&mut self) -> CoreResult<()>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;

    /// Spawns ffmpeg with the given arguments (program name excluded).
    fn spawn(&self, args: &[String]) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {e}");
            CoreError::OperationFailed(format!("failed to read ffmpeg output: {e}"))
        })?;
        for event in iterator {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.0.wait()?)
    }

    fn kill(&mut self) -> CoreResult<()> {
        Ok(self.0.kill()?)
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, args: &[String]) -> CoreResult<Self::Process> {
        let mut cmd = FfmpegCommand::new();
        cmd.args(args);
        cmd.spawn().map(SidecarProcess).map_err(CoreError::from)
    }
}

// --- Shared event loop ---

/// Runs ffmpeg to completion.
///
/// `on_frame` receives the encoder's frame counter from progress events.
/// On a non-zero exit the last [`OUTPUT_TAIL_LINES`] log lines are attached
/// to the failure. When `cancel` trips, ffmpeg is killed and
/// [`RunError::Cancelled`] is returned.
pub fn run_ffmpeg<S, F>(
    spawner: &S,
    args: &[String],
    cancel: &CancellationToken,
    verbose: bool,
    mut on_frame: F,
) -> Result<(), RunError>
where
    S: FfmpegSpawner,
    F: FnMut(u64),
{
    crate::util::command::log_command_line(Path::new("ffmpeg"), args, verbose);

    if cancel.is_cancelled() {
        return Err(RunError::Cancelled);
    }

    let mut process = spawner
        .spawn(args)
        .map_err(|e| RunError::Failed(FailureKind::Spawn(e.to_string())))?;

    let mut tail = OutputTail::new(OUTPUT_TAIL_LINES);
    let mut cancelled = false;

    let streamed = process.handle_events(|event| {
        if cancel.is_cancelled() {
            cancelled = true;
            return Err(CoreError::Interrupted);
        }
        match event {
            FfmpegEvent::Log(_level, line) => {
                log_ffmpeg_line(&line, verbose);
                tail.push(line);
            }
            FfmpegEvent::Error(line) => {
                log_ffmpeg_line(&line, verbose);
                tail.push(line);
            }
            FfmpegEvent::Progress(progress) => on_frame(u64::from(progress.frame)),
            _ => {}
        }
        Ok(())
    });

    if cancelled {
        debug!("Cancellation requested, killing ffmpeg");
        let _ = process.kill();
        let _ = process.wait();
        return Err(RunError::Cancelled);
    }

    if let Err(e) = streamed {
        let _ = process.kill();
        let _ = process.wait();
        return Err(RunError::Failed(FailureKind::Spawn(e.to_string())));
    }

    let status = process
        .wait()
        .map_err(|e| RunError::Failed(FailureKind::Spawn(format!("error waiting for ffmpeg: {e}"))))?;

    // A terminal Ctrl+C reaches ffmpeg too, which may exit before any
    // further event lets the loop above notice the token.
    if cancel.is_cancelled() {
        debug!("ffmpeg exited after cancellation was requested");
        return Err(RunError::Cancelled);
    }

    if status.success() {
        Ok(())
    } else {
        Err(RunError::Failed(FailureKind::Exit {
            code: status.code(),
            stderr: tail.contents(),
        }))
    }
}

fn log_ffmpeg_line(line: &str, verbose: bool) {
    if verbose {
        info!("[ffmpeg] {line}");
    } else {
        debug!("[ffmpeg] {line}");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    struct ScriptedProcess {
        events: Vec<FfmpegEvent>,
        exit_code: i32,
        cancel_on_last_event: Option<CancellationToken>,
    }

    impl FfmpegProcess for ScriptedProcess {
        fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
        where
            F: FnMut(FfmpegEvent) -> CoreResult<()>,
        {
            for event in self.events.drain(..) {
                handler(event)?;
            }
            // SIGINT landed after ffmpeg's final line.
            if let Some(token) = &self.cancel_on_last_event {
                token.cancel();
            }
            Ok(())
        }

        fn wait(&mut self) -> CoreResult<ExitStatus> {
            Ok(ExitStatus::from_raw(self.exit_code << 8))
        }

        fn kill(&mut self) -> CoreResult<()> {
            Ok(())
        }
    }

    struct ScriptedSpawner {
        exit_code: i32,
        cancel_on_last_event: Option<CancellationToken>,
    }

    impl FfmpegSpawner for ScriptedSpawner {
        type Process = ScriptedProcess;

        fn spawn(&self, _args: &[String]) -> CoreResult<Self::Process> {
            Ok(ScriptedProcess {
                events: vec![FfmpegEvent::Error("Exiting normally, received signal 2.".to_string())],
                exit_code: self.exit_code,
                cancel_on_last_event: self.cancel_on_last_event.clone(),
            })
        }
    }

    #[test]
    fn test_exit_after_interrupt_is_reported_as_cancelled() {
        let cancel = CancellationToken::new();
        let spawner = ScriptedSpawner {
            exit_code: 255,
            cancel_on_last_event: Some(cancel.clone()),
        };

        let result = run_ffmpeg(&spawner, &[], &cancel, false, |_| {});

        assert!(matches!(result, Err(RunError::Cancelled)), "{result:?}");
    }

    #[test]
    fn test_non_zero_exit_keeps_log_tail() {
        let cancel = CancellationToken::new();
        let spawner = ScriptedSpawner {
            exit_code: 1,
            cancel_on_last_event: None,
        };

        match run_ffmpeg(&spawner, &[], &cancel, false, |_| {}) {
            Err(RunError::Failed(FailureKind::Exit { code, stderr })) => {
                assert_eq!(code, Some(1));
                assert!(stderr.contains("received signal 2"));
            }
            other => panic!("expected exit failure, got {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_before_spawn_runs_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let spawner = ScriptedSpawner {
            exit_code: 0,
            cancel_on_last_event: None,
        };

        assert!(matches!(
            run_ffmpeg(&spawner, &[], &cancel, false, |_| {}),
            Err(RunError::Cancelled)
        ));
    }
}
