// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Snaplift uploader.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Locator for the image currently held by the screen.
///
/// Either an OS-brokered content handle (e.g. a `content://` URI handed back by
/// the gallery picker) or a plain filesystem path (camera captures, desktop
/// file dialogs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageReference {
    /// Indirect handle that must be resolved through the platform.
    Content(String),
    /// Direct filesystem path.
    File(PathBuf),
}

impl ImageReference {
    /// Filesystem path, if this reference points at a local file.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Content(_) => None,
        }
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Content(uri) => write!(f, "{uri}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Absolute path of a JPEG the camera was asked to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedFilePath(pub PathBuf);

impl CapturedFilePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl From<CapturedFilePath> for ImageReference {
    fn from(captured: CapturedFilePath) -> Self {
        Self::File(captured.0)
    }
}

/// Unique object key for one upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadKey(pub Uuid);

impl UploadKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Remote object path under the given prefix, e.g. `images/<uuid>`.
    pub fn object_path(&self, prefix: &str) -> String {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            self.0.to_string()
        } else {
            format!("{prefix}/{}", self.0)
        }
    }
}

impl Default for UploadKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UploadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bytes transferred so far for an in-flight upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    pub fn new(bytes_transferred: u64, total_bytes: u64) -> Self {
        Self {
            bytes_transferred,
            total_bytes,
        }
    }

    /// Whole percent complete, `floor(100 * transferred / total)`, in 0..=100.
    ///
    /// An unknown (zero) total reports 0.
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 0;
        }
        let transferred = self.bytes_transferred.min(self.total_bytes) as u128;
        (transferred * 100 / self.total_bytes as u128) as u8
    }
}

/// Runtime permissions the screen needs before it can capture or pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Camera,
    ReadExternalStorage,
    WriteExternalStorage,
}

impl Permission {
    /// The full set requested on screen start.
    pub const REQUIRED: [Permission; 3] = [
        Permission::Camera,
        Permission::ReadExternalStorage,
        Permission::WriteExternalStorage,
    ];

    /// Android manifest permission name.
    pub fn android_name(&self) -> &'static str {
        match self {
            Self::Camera => "android.permission.CAMERA",
            Self::ReadExternalStorage => "android.permission.READ_EXTERNAL_STORAGE",
            Self::WriteExternalStorage => "android.permission.WRITE_EXTERNAL_STORAGE",
        }
    }
}

/// Current state of a single permission as reported by the OS broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    /// Not granted; the OS has never refused or will prompt again silently.
    Denied,
    /// Not granted and the OS asks us to explain why we need it.
    RationaleRequired,
}

/// Which acquisition path the user picked from the choice prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionSource {
    Gallery,
    Camera,
}

/// Outcome of an external activity, tagged at the site that launched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityResult {
    /// The gallery picker returned; `None` when it came back empty.
    Gallery(Option<ImageReference>),
    /// The camera returned; `success` is false when the user backed out.
    Camera { success: bool },
    /// A result arrived that no launch site claims.
    Unrecognized(i32),
}

/// Pixel dimensions of the on-screen preview surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSize {
    pub width: u32,
    pub height: u32,
}

impl PreviewSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether the surface has been laid out with a non-zero area.
    pub fn is_laid_out(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}
