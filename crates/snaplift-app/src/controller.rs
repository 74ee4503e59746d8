// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Screen controller: the permission gate, image acquisition, preview, and
// upload flow of the single screen, independent of the UI toolkit.
//
// The Dioxus page owns one `ScreenController` and forwards user actions and
// activity results to it. Anything the user should see comes back as a
// `ScreenUpdate` or through the `UploadFeedback` sink.

use std::path::Path;
use std::sync::Arc;

use snaplift_bridge::{Launch, PlatformBridge};
use snaplift_core::AppConfig;
use snaplift_core::error::{Result, SnapliftError};
use snaplift_core::notices::{Notice, notice_for_error};
use snaplift_core::types::{
    AcquisitionSource, ActivityResult, ImageReference, Permission, PermissionStatus, PreviewSize,
    UploadKey,
};
use snaplift_image::preview::data_uri;
use snaplift_image::{PreviewScaler, create_image_file};
use snaplift_storage::store::sniff_content_type;
use snaplift_storage::{ObjectStore, UploadBody, UploadEvent, UploadReceipt, UploadTask};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::SessionState;

/// MIME filter for the gallery picker.
pub const IMAGE_MIME_FILTER: &str = "image/*";

/// Indicator text while the transfer is starting.
pub const UPLOADING_MESSAGE: &str = "Uploading...";

/// Indicator text for a progress report.
pub fn progress_message(percent: u8) -> String {
    format!("Uploaded {percent}%...")
}

/// Result of running the permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Everything is granted; acquisition may proceed.
    Granted,
    /// The OS wants the app to explain itself first.
    ShowRationale,
    /// The OS prompt has been dispatched.
    Requested,
}

/// Image shown in the preview area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// The picked image exactly as stored.
    Original { src: String },
    /// A camera capture decoded at reduced resolution.
    #[allow(dead_code)]
    Scaled {
        src: String,
        width: u32,
        height: u32,
        sample_size: u32,
    },
}

impl Preview {
    /// `src` attribute for an `img` element.
    pub fn src(&self) -> &str {
        match self {
            Self::Original { src } | Self::Scaled { src, .. } => src,
        }
    }
}

/// What the screen should change after handling an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenUpdate {
    pub preview: Option<Preview>,
    pub notice: Option<Notice>,
    pub show_rationale: bool,
}

impl ScreenUpdate {
    fn notice(notice: Notice) -> Self {
        Self {
            notice: Some(notice),
            ..Self::default()
        }
    }

    fn from_error(err: &SnapliftError) -> Self {
        Self {
            notice: notice_for_error(err),
            ..Self::default()
        }
    }
}

/// Where upload progress and verdicts are shown.
pub trait UploadFeedback {
    /// Put up the modal progress indicator.
    fn show_progress(&mut self, message: &str);
    /// Replace the indicator text.
    fn update_progress(&mut self, message: &str);
    fn dismiss_progress(&mut self);
    /// Transient notification.
    fn toast(&mut self, notice: Notice);
}

/// Drives the single screen.
pub struct ScreenController {
    bridge: Arc<dyn PlatformBridge>,
    store: Arc<dyn ObjectStore>,
    config: AppConfig,
    session: SessionState,
    permissions_granted: bool,
}

impl ScreenController {
    pub fn new(bridge: Arc<dyn PlatformBridge>, store: Arc<dyn ObjectStore>, config: AppConfig) -> Self {
        Self {
            bridge,
            store,
            config,
            session: SessionState::new(),
            permissions_granted: false,
        }
    }

    #[allow(dead_code)]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[allow(dead_code)]
    pub fn permissions_granted(&self) -> bool {
        self.permissions_granted
    }

    /// Channel for activity results that arrive after their launch call
    /// returned. Only the first call gets it.
    pub fn activity_results(&self) -> Option<mpsc::UnboundedReceiver<ActivityResult>> {
        self.bridge.take_activity_results()
    }

    // -- Permission gate -----------------------------------------------------

    /// Check the required permissions and, when needed, ask for them.
    pub fn run_permission_gate(&mut self) -> Result<GateOutcome> {
        let report = self.bridge.check_permissions(&Permission::REQUIRED)?;

        if report.iter().all(|(_, s)| *s == PermissionStatus::Granted) {
            self.permissions_granted = true;
            debug!("all permissions granted");
            return Ok(GateOutcome::Granted);
        }
        self.permissions_granted = false;

        if report
            .iter()
            .any(|(_, s)| *s == PermissionStatus::RationaleRequired)
        {
            info!(?report, "permission rationale required");
            return Ok(GateOutcome::ShowRationale);
        }

        self.bridge.request_permissions(&Permission::REQUIRED)?;
        info!("permission request dispatched");
        Ok(GateOutcome::Requested)
    }

    /// The user accepted the rationale dialog.
    pub fn accept_rationale(&self) -> Result<()> {
        self.bridge.request_permissions(&Permission::REQUIRED)
    }

    /// The user dismissed the rationale dialog; the pending request is dropped.
    pub fn cancel_rationale(&self) {
        info!("permission rationale cancelled");
    }

    // -- Acquisition ---------------------------------------------------------

    /// Start the chosen acquisition path. Blocked while permissions are
    /// missing, in which case the gate runs again instead.
    pub fn choose(&mut self, source: AcquisitionSource, preview: PreviewSize) -> ScreenUpdate {
        if !self.permissions_granted {
            match self.run_permission_gate() {
                Ok(GateOutcome::Granted) => {}
                Ok(GateOutcome::ShowRationale) => {
                    return ScreenUpdate {
                        show_rationale: true,
                        ..ScreenUpdate::default()
                    };
                }
                Ok(GateOutcome::Requested) => return ScreenUpdate::default(),
                Err(err) => {
                    warn!(error = %err, "permission check failed");
                    return ScreenUpdate::from_error(&err);
                }
            }
        }

        let launched = match source {
            AcquisitionSource::Gallery => self.bridge.launch_gallery(IMAGE_MIME_FILTER),
            AcquisitionSource::Camera => self.prepare_capture(),
        };

        match launched {
            Ok(Launch::Started) => ScreenUpdate::default(),
            Ok(Launch::NoHandler) => {
                debug!(?source, "no handler, skipping");
                ScreenUpdate::default()
            }
            Ok(Launch::Completed(result)) => self.on_activity_result(result, preview),
            Err(err) => {
                warn!(?source, error = %err, "launch failed");
                ScreenUpdate::from_error(&err)
            }
        }
    }

    /// Create the capture file and hand it to the camera.
    fn prepare_capture(&mut self) -> Result<Launch> {
        let dir = self
            .bridge
            .pictures_dir()
            .map_err(|e| SnapliftError::CaptureFile(std::io::Error::other(e.to_string())))?;
        let output = create_image_file(&dir)?;
        self.session.begin_capture(output.clone());
        let launched = self
            .bridge
            .launch_camera(&output, &self.config.file_provider_authority());
        if matches!(launched, Ok(Launch::NoHandler) | Err(_)) {
            self.discard_capture();
        }
        launched
    }

    /// Drop a capture file no camera will ever write to.
    fn discard_capture(&mut self) {
        let Some(unused) = self.session.take_capture() else {
            return;
        };
        if let Err(err) = std::fs::remove_file(unused.as_path()) {
            warn!(path = %unused.as_path().display(), error = %err, "could not remove unused capture file");
        }
    }

    /// Apply the result of a gallery or camera activity.
    pub fn on_activity_result(&mut self, result: ActivityResult, preview: PreviewSize) -> ScreenUpdate {
        match result {
            ActivityResult::Gallery(Some(reference)) => {
                info!(image = %reference, "image picked");
                self.session.set_image(reference.clone());
                match self.load_original(&reference) {
                    Ok(preview) => ScreenUpdate {
                        preview: Some(preview),
                        ..ScreenUpdate::default()
                    },
                    Err(err) => {
                        warn!(error = %err, "picked image could not be shown");
                        ScreenUpdate::notice(Notice::CouldNotLoadImage)
                    }
                }
            }
            ActivityResult::Gallery(None) => {
                debug!("gallery returned nothing");
                ScreenUpdate::default()
            }
            ActivityResult::Camera { success: true } => {
                let Some(captured) = self.session.take_capture() else {
                    warn!("camera result without a pending capture");
                    return ScreenUpdate::default();
                };
                let scaled = PreviewScaler::new(preview)
                    .scale(captured.as_path())
                    .and_then(|scaled| {
                        let src = scaled.to_data_uri()?;
                        Ok(Preview::Scaled {
                            src,
                            width: scaled.width(),
                            height: scaled.height(),
                            sample_size: scaled.sample_size,
                        })
                    });
                self.session.set_image(captured.into());
                match scaled {
                    Ok(preview) => ScreenUpdate {
                        preview: Some(preview),
                        ..ScreenUpdate::default()
                    },
                    Err(err) => {
                        warn!(error = %err, "capture preview failed");
                        ScreenUpdate::from_error(&err)
                    }
                }
            }
            ActivityResult::Camera { success: false } => {
                debug!("camera cancelled");
                ScreenUpdate::default()
            }
            ActivityResult::Unrecognized(code) => {
                warn!(request_code = code, "unrecognized activity result");
                ScreenUpdate::from_error(&SnapliftError::UnrecognizedResult(code))
            }
        }
    }

    fn load_original(&self, reference: &ImageReference) -> Result<Preview> {
        let bytes = match reference {
            ImageReference::File(path) => std::fs::read(path)?,
            ImageReference::Content(uri) => self.bridge.read_content(uri)?,
        };
        Ok(Preview::Original {
            src: data_uri(&bytes),
        })
    }

    // -- Upload --------------------------------------------------------------

    /// Start uploading the held image under a fresh key.
    ///
    /// Returns `None` without touching `feedback` when no image is held.
    pub fn begin_upload(&self, feedback: &mut impl UploadFeedback) -> Option<UploadTask> {
        let Some(image) = self.session.image().cloned() else {
            debug!("upload requested with no image held");
            return None;
        };

        let key = UploadKey::new();
        let object_path = key.object_path(&self.config.object_prefix);
        info!(key = %key, object = %object_path, image = %image, "upload requested");

        feedback.show_progress(UPLOADING_MESSAGE);
        let bridge = Arc::clone(&self.bridge);
        Some(UploadTask::spawn(
            Arc::clone(&self.store),
            key,
            object_path,
            open_body(bridge, image),
        ))
    }
}

/// Open the bytes behind `image` for streaming.
async fn open_body(bridge: Arc<dyn PlatformBridge>, image: ImageReference) -> Result<UploadBody> {
    match image {
        ImageReference::File(path) => UploadBody::from_file(Path::new(&path)).await,
        ImageReference::Content(uri) => {
            let bytes = tokio::task::spawn_blocking(move || bridge.read_content(&uri))
                .await
                .map_err(|e| SnapliftError::Bridge(format!("content read aborted: {e}")))??;
            let content_type = sniff_content_type(&bytes);
            Ok(UploadBody::from_bytes(bytes, content_type))
        }
    }
}

/// Follow `task` to its terminal event, mirroring it on `feedback`.
pub async fn drive_upload(
    mut task: UploadTask,
    feedback: &mut impl UploadFeedback,
) -> Option<UploadReceipt> {
    while let Some(event) = task.next_event().await {
        match event {
            UploadEvent::Progress(progress) => {
                feedback.update_progress(&progress_message(progress.percent()));
            }
            UploadEvent::Succeeded(receipt) => {
                feedback.dismiss_progress();
                feedback.toast(Notice::FileUploaded);
                return Some(receipt);
            }
            UploadEvent::Failed(detail) => {
                warn!(key = %task.key(), detail = %detail, "upload failed");
                feedback.dismiss_progress();
                feedback.toast(Notice::Failed);
                return None;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use snaplift_bridge::traits::*;
    use snaplift_core::types::CapturedFilePath;
    use snaplift_storage::MemoryObjectStore;

    /// Bridge whose answers are scripted per test and which records calls.
    struct ScriptedBridge {
        statuses: Mutex<Vec<PermissionStatus>>,
        gallery: Mutex<Launch>,
        camera: Launch,
        pictures_dir: PathBuf,
        content: HashMap<String, Vec<u8>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedBridge {
        fn new(pictures_dir: &Path) -> Self {
            Self {
                statuses: Mutex::new(vec![PermissionStatus::Granted; 3]),
                gallery: Mutex::new(Launch::NoHandler),
                camera: Launch::Started,
                pictures_dir: pictures_dir.to_path_buf(),
                content: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn statuses(self, statuses: Vec<PermissionStatus>) -> Self {
            *self.statuses.lock().unwrap() = statuses;
            self
        }

        fn gallery(self, launch: Launch) -> Self {
            *self.gallery.lock().unwrap() = launch;
            self
        }

        fn camera(mut self, launch: Launch) -> Self {
            self.camera = launch;
            self
        }

        fn content(mut self, uri: &str, bytes: &[u8]) -> Self {
            self.content.insert(uri.to_string(), bytes.to_vec());
            self
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PlatformBridge for ScriptedBridge {
        fn platform_name(&self) -> &str {
            "Scripted"
        }

        fn take_activity_results(&self) -> Option<mpsc::UnboundedReceiver<ActivityResult>> {
            None
        }
    }

    impl NativePermissions for ScriptedBridge {
        fn check_permissions(
            &self,
            permissions: &[Permission],
        ) -> Result<Vec<(Permission, PermissionStatus)>> {
            self.record("check");
            let statuses = self.statuses.lock().unwrap();
            Ok(permissions.iter().copied().zip(statuses.iter().copied()).collect())
        }

        fn request_permissions(&self, _permissions: &[Permission]) -> Result<()> {
            self.record("request");
            Ok(())
        }
    }

    impl NativeGallery for ScriptedBridge {
        fn launch_gallery(&self, mime_type: &str) -> Result<Launch> {
            self.record(&format!("gallery {mime_type}"));
            Ok(self.gallery.lock().unwrap().clone())
        }
    }

    impl NativeCamera for ScriptedBridge {
        fn launch_camera(&self, output: &CapturedFilePath, authority: &str) -> Result<Launch> {
            assert!(output.as_path().is_file());
            self.record(&format!("camera {authority}"));
            Ok(self.camera.clone())
        }
    }

    impl NativeContent for ScriptedBridge {
        fn read_content(&self, uri: &str) -> Result<Vec<u8>> {
            self.content
                .get(uri)
                .cloned()
                .ok_or_else(|| SnapliftError::Bridge(format!("no content for {uri}")))
        }
    }

    impl NativeStorageDirs for ScriptedBridge {
        fn pictures_dir(&self) -> Result<PathBuf> {
            Ok(self.pictures_dir.clone())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Shown {
        Show(String),
        Update(String),
        Dismiss,
        Toast(Notice),
    }

    #[derive(Default)]
    struct RecordingFeedback(Vec<Shown>);

    impl UploadFeedback for RecordingFeedback {
        fn show_progress(&mut self, message: &str) {
            self.0.push(Shown::Show(message.to_string()));
        }
        fn update_progress(&mut self, message: &str) {
            self.0.push(Shown::Update(message.to_string()));
        }
        fn dismiss_progress(&mut self) {
            self.0.push(Shown::Dismiss);
        }
        fn toast(&mut self, notice: Notice) {
            self.0.push(Shown::Toast(notice));
        }
    }

    fn controller(bridge: &Arc<ScriptedBridge>, store: &MemoryObjectStore) -> ScreenController {
        let bridge: Arc<dyn PlatformBridge> = bridge.clone();
        ScreenController::new(bridge, Arc::new(store.clone()), AppConfig::default())
    }

    fn write_png(path: &Path, width: u32, height: u32) -> Vec<u8> {
        image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]))
            .save_with_format(path, image::ImageFormat::Png)
            .unwrap();
        std::fs::read(path).unwrap()
    }

    const PREVIEW: PreviewSize = PreviewSize {
        width: 100,
        height: 60,
    };

    // -- Permission gate -------------------------------------------------------

    #[test]
    fn gate_proceeds_silently_when_granted() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(ScriptedBridge::new(dir.path()));
        let mut screen = controller(&bridge, &MemoryObjectStore::new());

        assert_eq!(screen.run_permission_gate().unwrap(), GateOutcome::Granted);
        assert!(screen.permissions_granted());
        assert_eq!(bridge.calls(), vec!["check"]);
    }

    #[test]
    fn gate_shows_rationale_then_requests_on_accept() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(ScriptedBridge::new(dir.path()).statuses(vec![
            PermissionStatus::Granted,
            PermissionStatus::RationaleRequired,
            PermissionStatus::Denied,
        ]));
        let mut screen = controller(&bridge, &MemoryObjectStore::new());

        assert_eq!(screen.run_permission_gate().unwrap(), GateOutcome::ShowRationale);
        assert_eq!(bridge.calls(), vec!["check"]);

        screen.accept_rationale().unwrap();
        assert_eq!(bridge.calls(), vec!["check", "request"]);
    }

    #[test]
    fn gate_requests_when_denied_without_rationale() {
        let dir = tempfile::tempdir().unwrap();
        let bridge =
            Arc::new(ScriptedBridge::new(dir.path()).statuses(vec![PermissionStatus::Denied; 3]));
        let mut screen = controller(&bridge, &MemoryObjectStore::new());

        assert_eq!(screen.run_permission_gate().unwrap(), GateOutcome::Requested);
        assert!(!screen.permissions_granted());
        assert_eq!(bridge.calls(), vec!["check", "request"]);
    }

    #[test]
    fn acquisition_is_blocked_until_granted() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(
            ScriptedBridge::new(dir.path())
                .statuses(vec![PermissionStatus::RationaleRequired; 3])
                .gallery(Launch::Started),
        );
        let mut screen = controller(&bridge, &MemoryObjectStore::new());

        let update = screen.choose(AcquisitionSource::Gallery, PREVIEW);
        assert!(update.show_rationale);
        assert!(!bridge.calls().iter().any(|c| c.starts_with("gallery")));
    }

    // -- Acquisition -----------------------------------------------------------

    #[test]
    fn missing_handler_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(ScriptedBridge::new(dir.path()).camera(Launch::NoHandler));
        let mut screen = controller(&bridge, &MemoryObjectStore::new());
        screen.run_permission_gate().unwrap();

        assert_eq!(
            screen.choose(AcquisitionSource::Gallery, PREVIEW),
            ScreenUpdate::default()
        );
        assert_eq!(
            screen.choose(AcquisitionSource::Camera, PREVIEW),
            ScreenUpdate::default()
        );
        assert!(!screen.session().has_image());
    }

    #[test]
    fn camera_without_handler_leaves_no_capture_file() {
        let dir = tempfile::tempdir().unwrap();
        let pictures = dir.path().join("Pictures");
        let bridge = Arc::new(ScriptedBridge::new(&pictures).camera(Launch::NoHandler));
        let mut screen = controller(&bridge, &MemoryObjectStore::new());
        screen.run_permission_gate().unwrap();

        for _ in 0..3 {
            assert_eq!(
                screen.choose(AcquisitionSource::Camera, PREVIEW),
                ScreenUpdate::default()
            );
        }
        assert_eq!(std::fs::read_dir(&pictures).unwrap().count(), 0);

        // A late camera result has no pending capture to claim.
        let update = screen.on_activity_result(ActivityResult::Camera { success: true }, PREVIEW);
        assert_eq!(update, ScreenUpdate::default());
        assert!(!screen.session().has_image());
    }

    #[test]
    fn capture_file_failure_aborts_camera() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let bridge = Arc::new(ScriptedBridge::new(&blocker.join("Pictures")));
        let mut screen = controller(&bridge, &MemoryObjectStore::new());
        screen.run_permission_gate().unwrap();

        let update = screen.choose(AcquisitionSource::Camera, PREVIEW);
        assert_eq!(update.notice, Some(Notice::CouldNotCreateFile));
        assert_eq!(update.notice.unwrap().message(), "Could not create file");
        assert!(!bridge.calls().iter().any(|c| c.starts_with("camera")));
    }

    #[test]
    fn camera_launch_uses_file_provider_authority() {
        let dir = tempfile::tempdir().unwrap();
        let pictures = dir.path().join("Pictures");
        let bridge = Arc::new(ScriptedBridge::new(&pictures));
        let mut screen = controller(&bridge, &MemoryObjectStore::new());
        screen.run_permission_gate().unwrap();

        assert_eq!(
            screen.choose(AcquisitionSource::Camera, PREVIEW),
            ScreenUpdate::default()
        );
        assert_eq!(
            bridge.calls().last().unwrap(),
            "camera dev.hyperpolymath.snaplift.fileprovider"
        );
        let created: Vec<_> = std::fs::read_dir(&pictures).unwrap().collect();
        assert_eq!(created.len(), 1);
    }

    #[test]
    fn unrecognized_result_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(ScriptedBridge::new(dir.path()));
        let mut screen = controller(&bridge, &MemoryObjectStore::new());

        let update = screen.on_activity_result(ActivityResult::Unrecognized(77), PREVIEW);
        assert_eq!(update.notice, Some(Notice::UnrecognizedRequestCode));
    }

    #[test]
    fn cancelled_camera_holds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(ScriptedBridge::new(dir.path()));
        let mut screen = controller(&bridge, &MemoryObjectStore::new());
        screen.run_permission_gate().unwrap();
        screen.choose(AcquisitionSource::Camera, PREVIEW);

        let update = screen.on_activity_result(ActivityResult::Camera { success: false }, PREVIEW);
        assert_eq!(update, ScreenUpdate::default());
        assert!(!screen.session().has_image());
    }

    // -- Scenarios -------------------------------------------------------------

    #[tokio::test]
    async fn gallery_pick_then_upload() {
        let dir = tempfile::tempdir().unwrap();
        let picked = dir.path().join("holiday.png");
        let bytes = write_png(&picked, 40, 30);
        let bridge = Arc::new(ScriptedBridge::new(dir.path()).gallery(Launch::Completed(
            ActivityResult::Gallery(Some(ImageReference::File(picked.clone()))),
        )));
        let store = MemoryObjectStore::new().with_chunk_size(64);
        let mut screen = controller(&bridge, &store);
        screen.run_permission_gate().unwrap();

        let update = screen.choose(AcquisitionSource::Gallery, PREVIEW);
        assert_eq!(
            update.preview,
            Some(Preview::Original {
                src: data_uri(&bytes)
            })
        );
        assert_eq!(bridge.calls().last().unwrap(), "gallery image/*");
        assert_eq!(screen.session().image(), Some(&ImageReference::File(picked)));

        let mut feedback = RecordingFeedback::default();
        let task = screen.begin_upload(&mut feedback).unwrap();
        let object_path = task.object_path().to_string();
        let receipt = drive_upload(task, &mut feedback).await.unwrap();

        assert_eq!(receipt.object_path, object_path);
        assert!(object_path.starts_with("images/"));
        assert_eq!(store.object(&object_path).unwrap(), bytes);

        let shown = &feedback.0;
        assert_eq!(shown.first(), Some(&Shown::Show("Uploading...".into())));
        assert_eq!(
            &shown[shown.len() - 2..],
            &[Shown::Dismiss, Shown::Toast(Notice::FileUploaded)]
        );
        assert!(shown.contains(&Shown::Update("Uploaded 100%...".into())));
    }

    #[tokio::test]
    async fn content_reference_uploads_through_bridge() {
        let dir = tempfile::tempdir().unwrap();
        let uri = "content://media/external/images/media/7";
        let jpeg = b"\xFF\xD8\xFF\xE0 not much of a jpeg".to_vec();
        let bridge = Arc::new(
            ScriptedBridge::new(dir.path())
                .content(uri, &jpeg)
                .gallery(Launch::Started),
        );
        let store = MemoryObjectStore::new();
        let mut screen = controller(&bridge, &store);
        screen.run_permission_gate().unwrap();
        assert_eq!(
            screen.choose(AcquisitionSource::Gallery, PREVIEW),
            ScreenUpdate::default()
        );

        let update = screen.on_activity_result(
            ActivityResult::Gallery(Some(ImageReference::Content(uri.into()))),
            PREVIEW,
        );
        assert!(update.preview.unwrap().src().starts_with("data:image/jpeg;base64,"));

        let mut feedback = RecordingFeedback::default();
        let task = screen.begin_upload(&mut feedback).unwrap();
        let path = task.object_path().to_string();
        drive_upload(task, &mut feedback).await.unwrap();
        assert_eq!(store.object(&path).unwrap(), jpeg);
    }

    #[tokio::test]
    async fn camera_capture_is_scaled_and_held() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(ScriptedBridge::new(dir.path()));
        let store = MemoryObjectStore::new();
        let mut screen = controller(&bridge, &store);
        screen.run_permission_gate().unwrap();
        screen.choose(AcquisitionSource::Camera, PREVIEW);

        // The camera app writes its photo into the file it was given.
        let captured = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        write_png(&captured, 400, 300);

        let update = screen.on_activity_result(ActivityResult::Camera { success: true }, PREVIEW);
        match update.preview {
            Some(Preview::Scaled {
                width,
                height,
                sample_size,
                ..
            }) => {
                assert_eq!(sample_size, 4);
                assert_eq!((width, height), (100, 75));
            }
            other => panic!("expected scaled preview, got {other:?}"),
        }
        assert_eq!(screen.session().image(), Some(&ImageReference::File(captured)));

        let mut feedback = RecordingFeedback::default();
        let task = screen.begin_upload(&mut feedback).unwrap();
        assert!(drive_upload(task, &mut feedback).await.is_some());
        assert_eq!(store.put_count(), 1);
    }

    #[test]
    fn unlaid_preview_surface_still_holds_capture() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(ScriptedBridge::new(dir.path()));
        let mut screen = controller(&bridge, &MemoryObjectStore::new());
        screen.run_permission_gate().unwrap();
        screen.choose(AcquisitionSource::Camera, PREVIEW);

        let captured = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        write_png(&captured, 400, 300);

        let update = screen.on_activity_result(
            ActivityResult::Camera { success: true },
            PreviewSize::new(0, 0),
        );
        assert_eq!(update.preview, None);
        assert_eq!(update.notice, Some(Notice::CouldNotLoadImage));
        assert_eq!(update.notice.unwrap().message(), "Could not load image");
        assert_eq!(screen.session().image(), Some(&ImageReference::File(captured)));
    }

    #[tokio::test]
    async fn upload_without_image_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(ScriptedBridge::new(dir.path()));
        let store = MemoryObjectStore::new();
        let screen = controller(&bridge, &store);

        let mut feedback = RecordingFeedback::default();
        assert!(screen.begin_upload(&mut feedback).is_none());
        assert!(feedback.0.is_empty());
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn remote_failure_dismisses_and_reports_once() {
        let dir = tempfile::tempdir().unwrap();
        let picked = dir.path().join("big.png");
        write_png(&picked, 200, 200);
        let bridge = Arc::new(ScriptedBridge::new(dir.path()).gallery(Launch::Completed(
            ActivityResult::Gallery(Some(ImageReference::File(picked))),
        )));
        let store = MemoryObjectStore::new().with_chunk_size(16).fail_after(32);
        let mut screen = controller(&bridge, &store);
        screen.run_permission_gate().unwrap();
        screen.choose(AcquisitionSource::Gallery, PREVIEW);

        let mut feedback = RecordingFeedback::default();
        let task = screen.begin_upload(&mut feedback).unwrap();
        assert!(drive_upload(task, &mut feedback).await.is_none());

        let shown = &feedback.0;
        assert_eq!(
            &shown[shown.len() - 2..],
            &[Shown::Dismiss, Shown::Toast(Notice::Failed)]
        );
        assert_eq!(
            shown.iter().filter(|s| matches!(s, Shown::Toast(_))).count(),
            1
        );
        assert_eq!(store.put_count(), 1);
        assert!(store.object_paths().is_empty());
    }

    #[tokio::test]
    async fn each_attempt_gets_a_fresh_key() {
        let dir = tempfile::tempdir().unwrap();
        let picked = dir.path().join("a.png");
        write_png(&picked, 8, 8);
        let bridge = Arc::new(ScriptedBridge::new(dir.path()).gallery(Launch::Completed(
            ActivityResult::Gallery(Some(ImageReference::File(picked))),
        )));
        let store = MemoryObjectStore::new();
        let mut screen = controller(&bridge, &store);
        screen.run_permission_gate().unwrap();
        screen.choose(AcquisitionSource::Gallery, PREVIEW);

        let mut feedback = RecordingFeedback::default();
        let first = screen.begin_upload(&mut feedback).unwrap();
        let second = screen.begin_upload(&mut feedback).unwrap();
        assert_ne!(first.key(), second.key());
        assert_ne!(first.object_path(), second.object_path());
        drive_upload(first, &mut feedback).await.unwrap();
        drive_upload(second, &mut feedback).await.unwrap();
        assert_eq!(store.object_paths().len(), 2);
    }

    #[test]
    fn progress_message_format() {
        assert_eq!(progress_message(0), "Uploaded 0%...");
        assert_eq!(progress_message(42), "Uploaded 42%...");
    }
}
