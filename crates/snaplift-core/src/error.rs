// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Snaplift.

use thiserror::Error;

/// Top-level error type for all Snaplift operations.
#[derive(Debug, Error)]
pub enum SnapliftError {
    // -- Permission / acquisition errors --
    #[error("permission request failed: {0}")]
    Permission(String),

    #[error("no application available to handle {0}")]
    NoHandler(&'static str),

    #[error("could not create capture file: {0}")]
    CaptureFile(#[source] std::io::Error),

    #[error("unrecognized activity result (request code {0})")]
    UnrecognizedResult(i32),

    // -- Image errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("preview surface has no area ({width}x{height})")]
    InvalidPreviewSurface { width: u32, height: u32 },

    // -- Upload errors --
    #[error("no image selected")]
    NoImageSelected,

    #[error("upload failed: {0}")]
    Upload(String),

    // -- Storage / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SnapliftError>;
