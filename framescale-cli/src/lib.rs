// framescale-cli/src/lib.rs
//
// Library portion of the framescale CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;

// Re-export items needed by the binary or integration tests
pub use cli::{CheckArgs, Cli, Commands, RunArgs};
pub use commands::check::run_check;
pub use commands::run::run_upscale;
