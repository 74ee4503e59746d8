// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop bridge for builds where native mobile APIs are unavailable.
//
// There is no permission broker and no camera application to hand off to, so
// permissions are always granted and the camera reports `NoHandler`. The
// gallery is a native file dialog filtered to image extensions.

use std::path::PathBuf;

use snaplift_core::error::Result;
use snaplift_core::types::{
    ActivityResult, CapturedFilePath, ImageReference, Permission, PermissionStatus,
};
use tokio::sync::mpsc;

use crate::traits::*;

/// Extensions offered by the desktop image picker.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Bridge used on desktop and CI builds.
pub struct DesktopBridge {
    pictures_dir: PathBuf,
}

impl DesktopBridge {
    /// Captures (if any ever arrive) land in `pictures_dir`.
    pub fn new(pictures_dir: impl Into<PathBuf>) -> Self {
        Self {
            pictures_dir: pictures_dir.into(),
        }
    }
}

impl PlatformBridge for DesktopBridge {
    fn platform_name(&self) -> &str {
        "Desktop"
    }

    fn take_activity_results(&self) -> Option<mpsc::UnboundedReceiver<ActivityResult>> {
        None
    }
}

impl NativePermissions for DesktopBridge {
    fn check_permissions(
        &self,
        permissions: &[Permission],
    ) -> Result<Vec<(Permission, PermissionStatus)>> {
        Ok(permissions
            .iter()
            .map(|p| (*p, PermissionStatus::Granted))
            .collect())
    }

    fn request_permissions(&self, _permissions: &[Permission]) -> Result<()> {
        Ok(())
    }
}

impl NativeGallery for DesktopBridge {
    fn launch_gallery(&self, mime_type: &str) -> Result<Launch> {
        tracing::info!(mime = mime_type, "Desktop: opening image file dialog");
        let picked = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file();
        Ok(Launch::Completed(ActivityResult::Gallery(
            picked.map(ImageReference::File),
        )))
    }
}

impl NativeCamera for DesktopBridge {
    fn launch_camera(&self, output: &CapturedFilePath, _authority: &str) -> Result<Launch> {
        tracing::warn!(
            path = %output.as_path().display(),
            "NativeCamera::launch_camera: no camera application on desktop"
        );
        Ok(Launch::NoHandler)
    }
}

impl NativeContent for DesktopBridge {
    fn read_content(&self, uri: &str) -> Result<Vec<u8>> {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        Ok(std::fs::read(path)?)
    }
}

impl NativeStorageDirs for DesktopBridge {
    fn pictures_dir(&self) -> Result<PathBuf> {
        Ok(self.pictures_dir.clone())
    }
}
