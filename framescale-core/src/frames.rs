//! Frame naming and index bookkeeping.
//!
//! Frames are written as `frame_{index:06}.png` with indices starting at 0,
//! so lexicographic order equals temporal order for any realistic clip. The
//! raw and upscaled generations share names and live in sibling directories.

use crate::error::CoreResult;

use std::fs;
use std::path::{Path, PathBuf};

pub const FRAME_PREFIX: &str = "frame_";
pub const FRAME_EXTENSION: &str = "png";
pub const FRAME_INDEX_WIDTH: usize = 6;

/// printf-style pattern understood by ffmpeg's image2 muxer/demuxer.
pub const FRAME_PATTERN: &str = "frame_%06d.png";

/// A single frame and the two files it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub index: usize,
    pub raw: PathBuf,
    pub upscaled: PathBuf,
}

/// File name for the frame at `index`.
pub fn frame_file_name(index: usize) -> String {
    format!("{FRAME_PREFIX}{index:0width$}.{FRAME_EXTENSION}", width = FRAME_INDEX_WIDTH)
}

/// Parses the index out of a frame file name; `None` for anything else.
pub fn parse_frame_index(file_name: &str) -> Option<usize> {
    let digits = file_name
        .strip_prefix(FRAME_PREFIX)?
        .strip_suffix(FRAME_EXTENSION)?
        .strip_suffix('.')?;
    if digits.len() < FRAME_INDEX_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Lists the frame indices present in `dir`, sorted ascending. Other files are ignored.
pub fn scan_frame_indices(dir: &Path) -> CoreResult<Vec<usize>> {
    let mut indices = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(index) = entry.file_name().to_str().and_then(parse_frame_index) {
            indices.push(index);
        }
    }
    indices.sort_unstable();
    Ok(indices)
}

/// Checks that sorted `indices` are exactly `0..indices.len()`.
pub fn check_contiguous(indices: &[usize]) -> Result<(), String> {
    match indices.iter().enumerate().find(|&(pos, &index)| pos != index) {
        None => Ok(()),
        Some((pos, &index)) => Err(format!(
            "frame sequence is not contiguous: expected index {pos}, found {index}"
        )),
    }
}

/// Indices in `0..count` whose file is missing from `dir`.
pub fn missing_frames(dir: &Path, count: usize) -> Vec<usize> {
    (0..count)
        .filter(|&i| !dir.join(frame_file_name(i)).is_file())
        .collect()
}

/// Pairs every index with its raw and upscaled paths.
pub fn frames_for(raw_dir: &Path, upscaled_dir: &Path, count: usize) -> Vec<Frame> {
    (0..count)
        .map(|index| {
            let name = frame_file_name(index);
            Frame {
                index,
                raw: raw_dir.join(&name),
                upscaled: upscaled_dir.join(name),
            }
        })
        .collect()
}
