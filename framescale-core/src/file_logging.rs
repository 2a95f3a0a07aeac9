//! log4rs setup for runs that write a log file.
//!
//! The file gets every record at `log_level` with timestamps; the console
//! keeps the short `[LEVEL] message` form so the terminal output looks the
//! same whether or not a log file is in use.

use crate::error::{CoreError, CoreResult};

use log::{LevelFilter, Record};
use log4rs::{
    append::{Append, file::FileAppender},
    config::{Appender, Config, Root},
    encode::{Encode, pattern::PatternEncoder, writer::simple::SimpleWriter},
};
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";
const CONSOLE_PATTERN: &str = "[{l}] {m}{n}";

/// Console appender writing to an arbitrary sink, one `write_all` per record.
///
/// Lets the CLI route log lines around its progress bars.
struct WriterAppender {
    target: Mutex<Box<dyn Write + Send>>,
    encoder: PatternEncoder,
}

impl WriterAppender {
    fn new(target: Box<dyn Write + Send>) -> Self {
        Self {
            target: Mutex::new(target),
            encoder: PatternEncoder::new(CONSOLE_PATTERN),
        }
    }
}

impl fmt::Debug for WriterAppender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterAppender")
            .field("encoder", &self.encoder)
            .finish_non_exhaustive()
    }
}

impl Append for WriterAppender {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        let mut line = SimpleWriter(Vec::new());
        self.encoder.encode(&mut line, record)?;

        let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        target.write_all(&line.0)?;
        target.flush()?;
        Ok(())
    }

    fn flush(&self) {}
}

/// Installs the global logger, writing to stderr and to `log_file`.
///
/// Fails if a logger is already installed.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> CoreResult<()> {
    setup_file_logging_with_console(log_file, log_level, Box::new(io::stderr()))
}

/// Like [`setup_file_logging`], with console records written to `console`.
pub fn setup_file_logging_with_console(
    log_file: &Path,
    log_level: LevelFilter,
    console: Box<dyn Write + Send>,
) -> CoreResult<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(log_file)?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .appender(Appender::builder().build("console", Box::new(WriterAppender::new(console))))
        .build(
            Root::builder()
                .appender("file")
                .appender("console")
                .build(log_level),
        )
        .map_err(|e| CoreError::OperationFailed(format!("invalid logging configuration: {e}")))?;

    log4rs::init_config(config)
        .map_err(|e| CoreError::OperationFailed(format!("failed to install logger: {e}")))?;

    Ok(())
}
