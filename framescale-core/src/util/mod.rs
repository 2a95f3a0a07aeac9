//! Process execution and cancellation helpers shared by the pipeline stages.

pub mod cancel;
pub mod command;

pub use cancel::CancellationToken;
pub use command::{
    CommandOutput, CommandRunner, OutputTail, RunError, RunOptions, SystemCommandRunner,
    format_command_line,
};
