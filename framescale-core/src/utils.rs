//! Output naming and formatting helpers.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};

use std::path::{Path, PathBuf};

/// Default output path: `<stem>_upscaled_<ALG><MAG>x.<container>` next to the input.
///
/// ```
/// # use std::path::Path;
/// # use framescale_core::{Config, utils::default_output_path};
/// # let config = Config::parse(r#"
/// # [upscaler]
/// # magnification_factor = 2
/// # algorithm = "XBR"
/// # [ffmpeg]
/// # args = ""
/// # [output]
/// # container = "mkv"
/// # scale_factor = 200
/// # [imageresizer]
/// # path = "ImageResizer"
/// # "#, Path::new("config.toml")).unwrap();
/// let out = default_output_path(Path::new("/videos/clip.mp4"), &config).unwrap();
/// assert_eq!(out, Path::new("/videos/clip_upscaled_XBR2x.mkv"));
/// ```
pub fn default_output_path(input: &Path, config: &Config) -> CoreResult<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| {
            CoreError::PathError(format!("input path '{}' has no file name", input.display()))
        })?
        .to_string_lossy();
    let file_name = format!(
        "{stem}_upscaled_{}{}x.{}",
        config.algorithm, config.magnification_factor, config.container
    );
    Ok(input.with_file_name(file_name))
}

/// Returns `path` unchanged if nothing exists there, otherwise the first free
/// `name(N).ext` sibling.
pub fn unique_output_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    (1u32..)
        .map(|n| {
            let name = match &extension {
                Some(ext) => format!("{stem}({n}).{ext}"),
                None => format!("{stem}({n})"),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats bytes with binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_unique_output_path_returns_free_path_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip_upscaled_XBR2x.mp4");
        assert_eq!(unique_output_path(&path), path);
    }

    #[test]
    fn test_unique_output_path_appends_counter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        fs::write(&path, b"taken").unwrap();
        fs::write(dir.path().join("clip(1).mp4"), b"taken").unwrap();

        assert_eq!(unique_output_path(&path), dir.path().join("clip(2).mp4"));
    }

    #[test]
    fn test_unique_output_path_without_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip");
        fs::write(&path, b"taken").unwrap();
        assert_eq!(unique_output_path(&path), dir.path().join("clip(1)"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(3661.0), "01:01:01");
        assert_eq!(format_duration(59.9), "00:00:59");
        assert_eq!(format_duration(90061.0), "25:01:01");
        assert_eq!(format_duration(-1.0), "??:??:??");
        assert_eq!(format_duration(f64::NAN), "??:??:??");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(1024 * 1024 * 2), "2.00 MiB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GiB");
    }
}
