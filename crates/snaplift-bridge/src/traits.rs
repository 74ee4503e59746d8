// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.
//
// The screen only ever talks to the platform through these traits: the OS
// permission broker, the external gallery and camera activities, the content
// resolver, and the app's private storage directories.

use std::path::PathBuf;

use snaplift_core::error::Result;
use snaplift_core::types::{ActivityResult, CapturedFilePath, Permission, PermissionStatus};
use tokio::sync::mpsc;

/// What happened when an external activity was asked to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    /// The activity is running; its result arrives on the bridge's
    /// activity-result channel.
    Started,
    /// The platform ran the flow inline and already has the result.
    Completed(ActivityResult),
    /// No application on the device can handle the request.
    NoHandler,
}

/// Unified bridge that groups all native capabilities.
pub trait PlatformBridge:
    NativePermissions + NativeGallery + NativeCamera + NativeContent + NativeStorageDirs + Send + Sync
{
    /// Human-readable platform name (e.g. "Android", "Desktop").
    fn platform_name(&self) -> &str;

    /// Channel of results for activities that reported [`Launch::Started`].
    ///
    /// Returns `None` on platforms that always complete inline, and on every
    /// call after the first.
    fn take_activity_results(&self) -> Option<mpsc::UnboundedReceiver<ActivityResult>>;
}

/// Runtime permission checks and requests.
pub trait NativePermissions {
    /// Current status of each permission in `permissions`.
    fn check_permissions(&self, permissions: &[Permission]) -> Result<Vec<(Permission, PermissionStatus)>>;

    /// Ask the OS to prompt for `permissions`. Returns once the prompt has
    /// been dispatched; the user answers asynchronously.
    fn request_permissions(&self, permissions: &[Permission]) -> Result<()>;
}

/// Pick an existing image from the device's media collection.
pub trait NativeGallery {
    /// Open the gallery picker filtered to `mime_type` (e.g. `image/*`).
    fn launch_gallery(&self, mime_type: &str) -> Result<Launch>;
}

/// Capture a new photo with the device camera.
pub trait NativeCamera {
    /// Launch the camera, instructing it to write its full-resolution JPEG to
    /// `output`, shared through the file-provider `authority`.
    fn launch_camera(&self, output: &CapturedFilePath, authority: &str) -> Result<Launch>;
}

/// Resolve indirect content handles.
pub trait NativeContent {
    /// Read all bytes behind a content handle (e.g. a `content://` URI).
    fn read_content(&self, uri: &str) -> Result<Vec<u8>>;
}

/// App-private storage locations.
pub trait NativeStorageDirs {
    /// Directory camera captures are written to.
    fn pictures_dir(&self) -> Result<PathBuf>;
}
