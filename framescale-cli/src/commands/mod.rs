//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// `check`: validate the configuration and the external tools.
pub mod check;

/// `run`: upscale one video.
pub mod run;
