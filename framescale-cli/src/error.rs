// ============================================================================
// framescale-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// The CLI reuses the core error type so that every failure keeps its stage
// kind all the way to the exit code. Context is added by wrapping messages,
// and `exit_code` maps an error to the process exit status.

// ---- Internal crate imports ----
use framescale_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Exit status for a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status for any configuration, dependency or pipeline failure.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status after Ctrl+C, following the shell convention of 128 + SIGINT.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Maps an error to the process exit status.
pub fn exit_code(error: &CoreError) -> i32 {
    match error {
        CoreError::Interrupted => EXIT_INTERRUPTED,
        _ => EXIT_FAILURE,
    }
}

// ============================================================================
// ERROR CONVERSION UTILITIES
// ============================================================================

/// Extension trait for adding context to errors in the CLI.
pub trait CliErrorContext<T> {
    /// Add context using a closure (for lazy evaluation).
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: Into<CoreError>,
{
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", f(), core_error))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&CoreError::Interrupted), EXIT_INTERRUPTED);
        assert_eq!(exit_code(&CoreError::Config("bad".into())), EXIT_FAILURE);
        assert_eq!(
            exit_code(&CoreError::UpscaleSummary { failed: vec![1], total: 2 }),
            EXIT_FAILURE
        );
    }

    #[test]
    fn test_context_wraps_message() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let err = result.cli_with_context(|| "creating log directory").unwrap_err();
        assert!(err.to_string().contains("creating log directory: IO error: disk full"));
    }
}
