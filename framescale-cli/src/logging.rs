// ============================================================================
// framescale-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and file logging for the CLI
//
// Without a log directory the CLI logs to stderr through `env_logger`. With
// `--log-dir` the core's log4rs setup writes the same records to stderr and
// to a timestamped log file.
//
// Console records are written through `ProgressLogWriter` so they are printed
// above the progress bars instead of through them.
//
// The default filter is `info` and can be overridden with RUST_LOG:
// - RUST_LOG=debug: external command lines and their output
// - RUST_LOG=trace: everything

use crate::error::{CliErrorContext, CliResult};
use crate::progress::ProgressLogWriter;

use framescale_core::setup_file_logging_with_console;
use indicatif::MultiProgress;
use log::LevelFilter;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let name = format!("framescale_run_{}.log", framescale_cli::logging::get_timestamp());
/// assert_eq!(name.len(), "framescale_run_20240601_123045.log".len());
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Path of the log file for a run started now.
pub fn run_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("framescale_run_{}.log", get_timestamp()))
}

/// Installs the global logger. Returns the log file path when one is written.
///
/// `multi` must be the `MultiProgress` the run's bars are drawn in.
pub fn init_logging(
    log_dir: Option<&Path>,
    multi: &MultiProgress,
) -> CliResult<Option<PathBuf>> {
    let console: Box<dyn Write + Send> = Box::new(ProgressLogWriter::new(multi.clone()));
    match log_dir {
        Some(dir) => {
            let path = run_log_path(dir);
            setup_file_logging_with_console(&path, level_from_env(), console)
                .cli_with_context(|| format!("cannot set up logging in {}", dir.display()))?;
            Ok(Some(path))
        }
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
                .target(env_logger::Target::Pipe(console))
                .try_init()
                .map_err(|e| {
                    framescale_core::CoreError::OperationFailed(format!(
                        "failed to install logger: {e}"
                    ))
                })?;
            Ok(None)
        }
    }
}

/// log4rs has no RUST_LOG support, so a plain level name is honoured here.
fn level_from_env() -> LevelFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}
