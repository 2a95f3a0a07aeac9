//! Configuration loading and validation.
//!
//! The configuration file is TOML with four sections:
//!
//! ```toml
//! [upscaler]
//! magnification_factor = 2
//! algorithm = "XBR"
//!
//! [ffmpeg]
//! args = "-c:v libx264 -crf 15"
//!
//! [output]
//! container = "mp4"
//! scale_factor = 200
//!
//! [imageresizer]
//! path = "/opt/ImageResizer/ImageResizer"
//! ```
//!
//! The file is deserialized into raw section structs first and then validated
//! into an immutable [`Config`]. A required key that is missing, mistyped or
//! out of range is a [`CoreError::Config`]; nothing is silently defaulted.

mod algorithm;

pub use algorithm::{FailurePolicy, ScaleAlgorithm};

use crate::error::{CoreError, CoreResult};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Encoder arguments used when `[ffmpeg] args` is empty.
pub const DEFAULT_ENCODER_ARGS: &[&str] = &[
    "-c:v", "libx264", "-preset", "medium", "-tune", "animation", "-crf", "15", "-pix_fmt",
    "yuv420p", "-c:a", "aac", "-b:a", "128k", "-shortest",
];

// ---- Raw file layout ----

#[derive(Debug, Deserialize)]
struct ConfigFile {
    upscaler: UpscalerSection,
    ffmpeg: FfmpegSection,
    output: OutputSection,
    imageresizer: ImageResizerSection,
}

#[derive(Debug, Deserialize)]
struct UpscalerSection {
    magnification_factor: i64,
    algorithm: ScaleAlgorithm,
    workers: Option<i64>,
    timeout_secs: Option<u64>,
    failure_policy: Option<FailurePolicy>,
}

#[derive(Debug, Deserialize)]
struct FfmpegSection {
    args: String,
}

#[derive(Debug, Deserialize)]
struct OutputSection {
    container: String,
    scale_factor: f64,
    temp_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ImageResizerSection {
    path: PathBuf,
}

// ---- Validated configuration ----

/// Validated, immutable run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Integer multiplier handed to the resizer (`"XBR 2x"`).
    pub magnification_factor: u32,

    pub algorithm: ScaleAlgorithm,

    /// Upscale worker count; `None` means one per logical CPU.
    pub workers: Option<usize>,

    /// Per-frame resizer timeout.
    pub timeout: Option<Duration>,

    pub failure_policy: FailurePolicy,

    /// Extra encoder arguments, passed to ffmpeg verbatim.
    pub encoder_args: String,

    /// Output container / file extension, e.g. `mp4`.
    pub container: String,

    /// Final output size as a percentage of the source size.
    pub scale_factor: f64,

    /// Parent directory for the per-run working directory.
    pub temp_dir: Option<PathBuf>,

    /// Path of the image resizer executable.
    pub resizer_path: PathBuf,
}

impl Config {
    /// Reads and validates the configuration file at `path`.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!(
                "cannot read configuration file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::parse(&contents, path)?;
        log::debug!("Loaded configuration from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Parses and validates configuration text. `origin` is only used in error messages.
    pub fn parse(contents: &str, origin: &Path) -> CoreResult<Self> {
        let raw: ConfigFile = toml::from_str(contents).map_err(|e| {
            CoreError::Config(format!("{}: {}", origin.display(), e.to_string().trim()))
        })?;
        Self::validate(raw).map_err(|msg| CoreError::Config(format!("{}: {msg}", origin.display())))
    }

    fn validate(raw: ConfigFile) -> Result<Self, String> {
        let magnification_factor = u32::try_from(raw.upscaler.magnification_factor)
            .ok()
            .filter(|&m| m >= 1)
            .ok_or_else(|| {
                format!(
                    "[upscaler] magnification_factor must be a positive integer, got {}",
                    raw.upscaler.magnification_factor
                )
            })?;

        let workers = match raw.upscaler.workers {
            None => None,
            Some(n) if n >= 1 => Some(n as usize),
            Some(n) => return Err(format!("[upscaler] workers must be at least 1, got {n}")),
        };

        let timeout = match raw.upscaler.timeout_secs {
            None => None,
            Some(0) => return Err("[upscaler] timeout_secs must be greater than 0".to_string()),
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        let container = raw.output.container.trim().to_string();
        if container.is_empty() {
            return Err("[output] container must not be empty".to_string());
        }
        if container.contains(['.', '/', '\\']) {
            return Err(format!(
                "[output] container must be a bare extension like 'mp4', got '{container}'"
            ));
        }

        let scale_factor = raw.output.scale_factor;
        if !scale_factor.is_finite() || scale_factor <= 0.0 {
            return Err(format!(
                "[output] scale_factor must be a positive number, got {scale_factor}"
            ));
        }

        if raw.imageresizer.path.as_os_str().is_empty() {
            return Err("[imageresizer] path must not be empty".to_string());
        }

        Ok(Config {
            magnification_factor,
            algorithm: raw.upscaler.algorithm,
            workers,
            timeout,
            failure_policy: raw.upscaler.failure_policy.unwrap_or_default(),
            encoder_args: raw.ffmpeg.args,
            container,
            scale_factor,
            temp_dir: raw.output.temp_dir,
            resizer_path: raw.imageresizer.path,
        })
    }

    /// Effective worker count for the upscale pool.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Output scale as a multiplier of the source dimensions.
    pub fn output_scale(&self) -> f64 {
        self.scale_factor / 100.0
    }

    /// True when the final output size differs from what the resizer produces,
    /// so the reassembler has to rescale.
    pub fn needs_rescale(&self) -> bool {
        (self.output_scale() - f64::from(self.magnification_factor)).abs() > f64::EPSILON
    }

    /// Encoder arguments as an argument vector. Falls back to
    /// [`DEFAULT_ENCODER_ARGS`] when the configured string is blank.
    pub fn encoder_arg_list(&self) -> Vec<String> {
        let args: Vec<String> = self
            .encoder_args
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if args.is_empty() {
            DEFAULT_ENCODER_ARGS.iter().map(|s| s.to_string()).collect()
        } else {
            args
        }
    }

    /// True when no encoder arguments were configured.
    pub fn uses_default_encoder_args(&self) -> bool {
        self.encoder_args.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
[upscaler]
magnification_factor = 2
algorithm = "XBR"

[ffmpeg]
args = "-c:v libx265 -crf 18"

[output]
container = "mkv"
scale_factor = 200

[imageresizer]
path = "/opt/resizer/ImageResizer"
"#;

    fn parse(text: &str) -> CoreResult<Config> {
        Config::parse(text, Path::new("config.toml"))
    }

    #[test]
    fn test_encoder_args_split_on_whitespace() {
        let config = parse(VALID).unwrap();
        assert_eq!(config.encoder_arg_list(), vec!["-c:v", "libx265", "-crf", "18"]);
        assert!(!config.uses_default_encoder_args());
    }

    #[test]
    fn test_blank_encoder_args_use_defaults() {
        let config = parse(&VALID.replace("-c:v libx265 -crf 18", "  ")).unwrap();
        assert!(config.uses_default_encoder_args());
        assert_eq!(config.encoder_arg_list()[..2], ["-c:v", "libx264"]);
    }

    #[test]
    fn test_needs_rescale_compares_against_magnification() {
        let config = parse(VALID).unwrap();
        assert!(!config.needs_rescale());

        let config = parse(&VALID.replace("scale_factor = 200", "scale_factor = 150")).unwrap();
        assert!(config.needs_rescale());
        assert!((config.output_scale() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_worker_count_prefers_configured_value() {
        let text = VALID.replace("algorithm = \"XBR\"", "algorithm = \"XBR\"\nworkers = 3");
        assert_eq!(parse(&text).unwrap().worker_count(), 3);
        assert!(parse(VALID).unwrap().worker_count() >= 1);
    }
}
