// ============================================================================
// framescale-cli/src/progress.rs
// ============================================================================
//
// PROGRESS REPORTING: indicatif rendering of pipeline progress
//
// The upscale stage knows its frame count up front and gets a bar. The two
// ffmpeg stages get a spinner with the current frame number. Nothing is drawn
// when stderr is not a terminal.
//
// All bars live in one `MultiProgress`. Log output goes through
// `ProgressLogWriter`, which hides the bars while a line is printed so log
// records never tear through a bar.

use framescale_core::{ProgressReporter, Stage};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%, eta {eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} ({pos} frames, {elapsed})";

/// Log sink that prints to stderr with the progress bars suspended.
pub struct ProgressLogWriter {
    multi: MultiProgress,
}

impl ProgressLogWriter {
    pub fn new(multi: MultiProgress) -> Self {
        Self { multi }
    }
}

impl Write for ProgressLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.multi.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// [`ProgressReporter`] drawing to stderr with indicatif.
pub struct TerminalProgress {
    enabled: bool,
    multi: MultiProgress,
    current: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    /// Draws into `multi`, which must be the one the log writer suspends.
    pub fn new(multi: MultiProgress) -> Self {
        Self {
            enabled: console::Term::stderr().is_term(),
            multi,
            current: Mutex::new(None),
        }
    }

    fn is_active(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn with_current(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bar) = guard.as_ref() {
            f(bar);
        }
    }
}

fn styled_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
        bar.set_style(style.progress_chars("█▓▒░ "));
    }
    bar
}

fn styled_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
        spinner.set_style(style);
    }
    spinner
}

impl ProgressReporter for TerminalProgress {
    fn stage_started(&self, stage: Stage, total: Option<u64>) {
        let bar = match (self.enabled, stage, total) {
            (false, _, _) => ProgressBar::hidden(),
            (true, Stage::Upscaling, Some(total)) => self.multi.add(styled_bar(total)),
            (true, _, _) => self.multi.add(styled_spinner()),
        };
        bar.set_message(stage.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        let mut guard = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = guard.replace(bar) {
            previous.finish_and_clear();
        }
    }

    fn stage_position(&self, _stage: Stage, position: u64) {
        self.with_current(|bar| bar.set_position(position));
    }

    fn stage_advance(&self, _stage: Stage, delta: u64) {
        self.with_current(|bar| bar.inc(delta));
    }

    fn stage_finished(&self, stage: Stage, success: bool) {
        let bar = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(bar) = bar {
            if success {
                bar.finish_with_message(format!("{stage}: done"));
            } else {
                bar.abandon_with_message(format!("{stage}: failed"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;

    fn hidden_multi() -> MultiProgress {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn test_log_writer_reports_whole_buffer_written() {
        let mut writer = ProgressLogWriter::new(hidden_multi());
        assert_eq!(writer.write(b"[INFO] frame 1\n").unwrap(), 15);
        writer.flush().unwrap();
    }

    #[test]
    fn test_stage_lifecycle_clears_current_bar() {
        let progress = TerminalProgress::new(hidden_multi());

        progress.stage_started(Stage::Upscaling, Some(4));
        assert!(progress.is_active());
        progress.stage_advance(Stage::Upscaling, 2);
        progress.stage_finished(Stage::Upscaling, true);
        assert!(!progress.is_active());

        // Position updates without an active stage are ignored.
        progress.stage_position(Stage::Encoding, 10);
    }
}
