// ============================================================================
// framescale-cli/src/cli.rs
// ============================================================================
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use framescale_core::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "framescale: upscale videos frame by frame",
    long_about = "Extracts every frame of a video with ffmpeg, upscales each frame with an \
                  external image resizer and encodes the frames back into a video with the \
                  original audio."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upscales a single video file
    Run(RunArgs),
    /// Validates the configuration and checks that the external tools are available
    Check(CheckArgs),
}

/// Configuration file selection shared by all subcommands.
#[derive(Args, Debug, Clone)]
pub struct ConfigArg {
    /// Configuration file (TOML)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        env = "FRAMESCALE_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input video file
    #[arg(short = 'i', long = "input", required = true, value_name = "INPUT_PATH")]
    pub input: PathBuf,

    /// Output video file (defaults to <input>_upscaled_<ALG><MAG>x.<container>)
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Show external commands and their output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Optional: Directory for a timestamped log file of this run
    #[arg(long, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArg,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArg,
}
