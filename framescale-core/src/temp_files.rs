//! Temporary working directory management.
//!
//! Each run gets its own `.framescale-XXXXXX` directory holding the `raw/`
//! and `upscaled/` frame generations. It leverages the tempfile crate so the
//! directory is removed when the owner is dropped, which covers every exit
//! path including errors and interrupts.

use crate::error::CoreResult;
use crate::frames::{self, Frame};

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, TempDir};

const WORK_DIR_PREFIX: &str = ".framescale-";
const RAW_SUBDIR: &str = "raw";
const UPSCALED_SUBDIR: &str = "upscaled";

/// A per-run working directory. Auto-cleaned when dropped.
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
    raw: PathBuf,
    upscaled: PathBuf,
}

impl WorkDir {
    /// Creates a fresh working directory with empty frame subdirectories under `base`.
    pub fn create(base: &Path) -> CoreResult<Self> {
        fs::create_dir_all(base)?;
        let dir = TempFileBuilder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(base)?;

        let raw = dir.path().join(RAW_SUBDIR);
        let upscaled = dir.path().join(UPSCALED_SUBDIR);
        fs::create_dir(&raw)?;
        fs::create_dir(&upscaled)?;

        log::debug!("Created working directory {}", dir.path().display());
        Ok(Self { dir, raw, upscaled })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw
    }

    pub fn upscaled_dir(&self) -> &Path {
        &self.upscaled
    }

    /// Frames `0..count` with their raw and upscaled paths in this directory.
    pub fn frames(&self, count: usize) -> Vec<Frame> {
        frames::frames_for(&self.raw, &self.upscaled, count)
    }

    /// Removes the directory now, reporting failures instead of ignoring them.
    pub fn close(self) -> CoreResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        log::debug!("Removed working directory {}", path.display());
        Ok(())
    }
}
