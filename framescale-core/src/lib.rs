//! Core library for upscaling videos frame by frame.
//!
//! A run extracts every frame of the input with ffmpeg, enlarges each frame
//! with an external image resizer on a worker pool, and encodes the result
//! back into a video carrying the original audio.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use framescale_core::{
//!     Config, CrateFfprobeExecutor, Pipeline, SidecarSpawner, SystemCommandRunner,
//! };
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("config.toml")).unwrap();
//! framescale_core::external::check_dependencies(&config).unwrap();
//!
//! let spawner = SidecarSpawner;
//! let prober = CrateFfprobeExecutor::new();
//! let runner = SystemCommandRunner;
//!
//! let mut pipeline = Pipeline::new(&config, &spawner, &prober, &runner);
//! let report = pipeline.run(Path::new("clip.mp4"), None).unwrap();
//! println!("wrote {}", report.output.display());
//! ```

pub mod config;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod frames;
pub mod pipeline;
pub mod processing;
pub mod progress;
pub mod temp_files;
pub mod util;
pub mod utils;

// Re-exports for public API
pub use config::{Config, FailurePolicy, ScaleAlgorithm};
pub use error::{CoreError, CoreResult, FailureKind, ToolFailure};
pub use external::{
    CrateFfprobeExecutor, FfmpegSpawner, FfprobeExecutor, SidecarSpawner, VideoProperties,
};
pub use file_logging::{setup_file_logging, setup_file_logging_with_console};
pub use pipeline::{Pipeline, PipelineState, RunReport};
pub use progress::{NoopProgress, ProgressReporter, Stage};
pub use util::{CancellationToken, CommandRunner, SystemCommandRunner};
pub use utils::{format_bytes, format_duration};
