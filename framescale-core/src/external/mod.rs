// ============================================================================
// framescale-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg, ffprobe and the image resizer
//
// This module encapsulates interactions with the external command-line tools
// the pipeline depends on. ffmpeg and ffprobe sit behind traits so the
// pipeline can be exercised without the real binaries; the image resizer is
// driven through the generic `CommandRunner` in `util::command`.
//
// KEY COMPONENTS:
// - Traits for external tool interactions (FfmpegSpawner, FfprobeExecutor)
// - Concrete implementations using ffmpeg-sidecar and ffprobe crates
// - Dependency checking functions

// ---- Internal crate imports ----
use crate::config::Config;
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Contains traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Contains traits and implementations for executing ffprobe commands
pub mod ffprobe_executor;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_executor::{FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner, run_ffmpeg};
pub use ffprobe_executor::{CrateFfprobeExecutor, FfprobeExecutor, VideoProperties, parse_frame_rate};

/// Event types emitted by ffmpeg processes, re-exported for custom spawners.
pub use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress, LogLevel};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that a command on `PATH` can be started by running it with `-version`.
///
/// # Returns
///
/// * `Ok(())` - The command started
/// * `Err(CoreError::DependencyNotFound)` - The command is not installed
/// * `Err(CoreError::OperationFailed)` - The command exists but could not be started
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {cmd_name}");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{cmd_name}' not found.");
            Err(CoreError::DependencyNotFound(format!(
                "{cmd_name} must be installed and on PATH"
            )))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{cmd_name}': {e}");
            Err(CoreError::OperationFailed(format!(
                "failed to start {cmd_name}: {e}"
            )))
        }
    }
}

/// Checks that `path` is an existing, executable file.
pub fn check_executable(path: &Path) -> CoreResult<()> {
    let metadata = std::fs::metadata(path).map_err(|_| {
        CoreError::DependencyNotFound(format!(
            "image resizer not found at '{}'",
            path.display()
        ))
    })?;

    if !metadata.is_file() {
        return Err(CoreError::DependencyNotFound(format!(
            "image resizer path '{}' is not a file",
            path.display()
        )));
    }

    if !is_executable(&metadata) {
        return Err(CoreError::DependencyNotFound(format!(
            "image resizer at '{}' is not executable",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

/// Verifies ffmpeg, ffprobe and the configured image resizer before any work starts.
pub fn check_dependencies(config: &Config) -> CoreResult<()> {
    check_executable(&config.resizer_path)?;
    check_dependency("ffmpeg")?;
    check_dependency("ffprobe")?;
    log::debug!("External dependency check passed.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_dependency_is_reported() {
        let err = check_dependency("framescale-no-such-tool").unwrap_err();
        assert!(matches!(err, CoreError::DependencyNotFound(_)));
    }

    #[test]
    fn test_check_executable_rejects_missing_file() {
        let err = check_executable(Path::new("/no/such/resizer")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_check_executable_rejects_directory() {
        let dir = tempdir().unwrap();
        let err = check_executable(dir.path()).unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }

    #[cfg(unix)]
    #[test]
    fn test_check_executable_requires_exec_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("resizer");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(check_executable(&path).is_err());

        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(check_executable(&path).is_ok());
    }
}
