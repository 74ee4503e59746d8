// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Object-store abstraction.
//
// A backend receives an object path (e.g. `images/<uuid>`), a body to stream,
// and a progress reporter. How the bytes travel is the backend's business.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snaplift_core::error::Result;
use tokio::io::AsyncRead;

use crate::progress::ProgressReporter;

/// Boxed async byte source for an upload.
pub type BodyReader = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// The bytes of one upload plus the metadata backends need up front.
pub struct UploadBody {
    reader: BodyReader,
    total_bytes: u64,
    content_type: String,
}

impl UploadBody {
    pub fn new(reader: BodyReader, total_bytes: u64, content_type: impl Into<String>) -> Self {
        Self {
            reader,
            total_bytes,
            content_type: content_type.into(),
        }
    }

    /// Body backed by an in-memory buffer (e.g. bytes read from a content URI).
    pub fn from_bytes(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        let total_bytes = bytes.len() as u64;
        Self::new(
            Box::new(std::io::Cursor::new(bytes)),
            total_bytes,
            content_type,
        )
    }

    /// Body streamed from a local file.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        let total_bytes = file.metadata().await?.len();
        Ok(Self::new(
            Box::new(file),
            total_bytes,
            content_type_for_path(path),
        ))
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub(crate) fn reader_mut(&mut self) -> &mut BodyReader {
        &mut self.reader
    }
}

impl std::fmt::Debug for UploadBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadBody")
            .field("total_bytes", &self.total_bytes)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// MIME type inferred from a file extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// MIME type sniffed from leading magic bytes.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

/// What a backend reports once an object is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Full object path inside the bucket.
    pub object_path: String,
    /// Bytes streamed from the local source.
    pub bytes: u64,
    /// Hex SHA-256 of the bytes streamed.
    pub sha256: String,
}

/// A key-addressed binary store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Store `body` at `object_path`, reporting bytes as they are sent.
    async fn put(
        &self,
        object_path: &str,
        body: UploadBody,
        progress: ProgressReporter,
    ) -> Result<UploadReceipt>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for_path(Path::new("a/JPEG_1_x.jpg")), "image/jpeg");
        assert_eq!(content_type_for_path(Path::new("b.PNG")), "image/png");
        assert_eq!(content_type_for_path(Path::new("c")), "application/octet-stream");
    }

    #[test]
    fn content_type_from_magic() {
        assert_eq!(sniff_content_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0]), "image/jpeg");
        assert_eq!(sniff_content_type(b"\x89PNG\r\n\x1a\n"), "image/png");
        assert_eq!(sniff_content_type(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_content_type(b"hello"), "application/octet-stream");
    }

    #[tokio::test]
    async fn file_body_knows_its_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, vec![7u8; 4096]).unwrap();

        let body = UploadBody::from_file(&path).await.unwrap();
        assert_eq!(body.total_bytes(), 4096);
        assert_eq!(body.content_type(), "image/jpeg");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = UploadBody::from_file(&dir.path().join("gone.jpg")).await.unwrap_err();
        assert!(matches!(err, snaplift_core::SnapliftError::Io(_)));
    }
}
