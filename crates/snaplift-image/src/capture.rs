// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture file creation: reserves a uniquely named, timestamped JPEG in the
// private pictures directory for the camera to write into.

use std::path::Path;

use chrono::{DateTime, Local};
use snaplift_core::error::{Result, SnapliftError};
use snaplift_core::types::CapturedFilePath;
use tracing::info;

/// Leading part of every capture file name.
pub const CAPTURE_PREFIX: &str = "JPEG_";

/// Extension of every capture file name.
pub const CAPTURE_SUFFIX: &str = ".jpg";

/// `yyyyMMdd_HHmmss`
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// File name prefix for a capture taken at `now`, e.g. `JPEG_20261016_142501_`.
pub fn capture_file_prefix(now: DateTime<Local>) -> String {
    format!("{CAPTURE_PREFIX}{}_", now.format(TIMESTAMP_FORMAT))
}

/// Create an empty capture file in `dir`, creating the directory if absent.
pub fn create_image_file(dir: &Path) -> Result<CapturedFilePath> {
    create_image_file_at(dir, Local::now())
}

/// Create an empty capture file in `dir` named for the instant `now`.
///
/// The random suffix keeps names unique when several captures share the same
/// second. The file is kept on disk; the camera overwrites it.
pub fn create_image_file_at(dir: &Path, now: DateTime<Local>) -> Result<CapturedFilePath> {
    std::fs::create_dir_all(dir).map_err(SnapliftError::CaptureFile)?;

    let prefix = capture_file_prefix(now);
    let (_file, path) = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(CAPTURE_SUFFIX)
        .tempfile_in(dir)
        .map_err(SnapliftError::CaptureFile)?
        .keep()
        .map_err(|err| SnapliftError::CaptureFile(err.error))?;

    info!(path = %path.display(), "capture file created");
    Ok(CapturedFilePath(path))
}
