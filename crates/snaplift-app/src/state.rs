// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session state owned by the screen controller.

use snaplift_core::types::{CapturedFilePath, ImageReference};

/// What the screen is holding between user actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// The image an upload would send. A new acquisition replaces it.
    image: Option<ImageReference>,
    /// Destination handed to the camera, waiting for its result.
    pending_capture: Option<CapturedFilePath>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&ImageReference> {
        self.image.as_ref()
    }

    /// Hold `image`, returning the reference it displaced.
    pub fn set_image(&mut self, image: ImageReference) -> Option<ImageReference> {
        self.image.replace(image)
    }

    #[allow(dead_code)]
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Remember where the camera was told to write.
    pub fn begin_capture(&mut self, path: CapturedFilePath) {
        self.pending_capture = Some(path);
    }

    /// The pending capture destination. Each one is consumed once.
    pub fn take_capture(&mut self) -> Option<CapturedFilePath> {
        self.pending_capture.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn new_image_overwrites_previous() {
        let mut session = SessionState::new();
        assert!(session.set_image(ImageReference::Content("content://a".into())).is_none());

        let previous = session.set_image(ImageReference::File(PathBuf::from("/p/JPEG_1.jpg")));
        assert_eq!(previous, Some(ImageReference::Content("content://a".into())));
        assert_eq!(
            session.image(),
            Some(&ImageReference::File(PathBuf::from("/p/JPEG_1.jpg")))
        );
    }

    #[test]
    fn capture_is_consumed_once() {
        let mut session = SessionState::new();
        session.begin_capture(CapturedFilePath(PathBuf::from("/p/JPEG_2.jpg")));
        assert!(session.take_capture().is_some());
        assert!(session.take_capture().is_none());
        assert!(!session.has_image());
    }
}
