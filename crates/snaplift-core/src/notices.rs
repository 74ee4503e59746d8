// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixed user-facing notifications.
//
// Every failure on the screen collapses to one short, opaque toast. Error
// detail goes to the log, never to the user.

use crate::error::SnapliftError;

/// A transient notification shown at the bottom of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Upload finished.
    FileUploaded,
    /// Upload failed for any reason.
    Failed,
    /// The capture file could not be created, so the camera was not launched.
    CouldNotCreateFile,
    /// An activity result arrived that no launch site claims.
    UnrecognizedRequestCode,
    /// The preview could not be decoded or scaled.
    CouldNotLoadImage,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::FileUploaded => "File Uploaded",
            Self::Failed => "Failed",
            Self::CouldNotCreateFile => "Could not create file",
            Self::UnrecognizedRequestCode => "Unrecognized request code",
            Self::CouldNotLoadImage => "Could not load image",
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Map an error to the toast the user sees, or `None` when the failure is
/// silent (missing handler, no image held, permission flow).
pub fn notice_for_error(err: &SnapliftError) -> Option<Notice> {
    match err {
        SnapliftError::NoHandler(_)
        | SnapliftError::NoImageSelected
        | SnapliftError::Permission(_) => None,

        SnapliftError::CaptureFile(_) => Some(Notice::CouldNotCreateFile),

        SnapliftError::UnrecognizedResult(_) => Some(Notice::UnrecognizedRequestCode),

        SnapliftError::ImageError(_) | SnapliftError::InvalidPreviewSurface { .. } => {
            Some(Notice::CouldNotLoadImage)
        }

        SnapliftError::Upload(_)
        | SnapliftError::Config(_)
        | SnapliftError::Io(_)
        | SnapliftError::Serialization(_)
        | SnapliftError::Bridge(_)
        | SnapliftError::PlatformUnavailable => Some(Notice::Failed),
    }
}
