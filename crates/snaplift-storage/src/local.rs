// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Directory-backed bucket.
//
// Objects are written to `<root>/<object path>` through a `.part` file that is
// renamed into place once the body has been fully streamed, so a failed upload
// never leaves a truncated object behind.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use snaplift_core::error::{Result, SnapliftError};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::progress::{BodyChunks, DEFAULT_CHUNK_SIZE, ProgressReporter};
use crate::store::{ObjectStore, UploadBody, UploadReceipt};

/// Bucket rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem location of `object_path`. Rejects absolute paths and any
    /// `..` segment so objects stay inside the root.
    pub fn object_file(&self, object_path: &str) -> Result<PathBuf> {
        let relative = Path::new(object_path);
        let clean = !object_path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !clean {
            return Err(SnapliftError::Upload(format!(
                "invalid object path '{object_path}'"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn name(&self) -> &str {
        "local"
    }

    #[instrument(skip(self, body, progress), fields(root = %self.root.display()))]
    async fn put(
        &self,
        object_path: &str,
        body: UploadBody,
        progress: ProgressReporter,
    ) -> Result<UploadReceipt> {
        let target = self.object_file(object_path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut partial_name = target.as_os_str().to_owned();
        partial_name.push(".part");
        let partial = PathBuf::from(partial_name);

        let written = write_body(&partial, body, progress).await;
        let (bytes, sha256) = match written {
            Ok(done) => done,
            Err(err) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(err);
            }
        };

        tokio::fs::rename(&partial, &target).await?;
        info!(path = %target.display(), bytes, "object written");

        Ok(UploadReceipt {
            object_path: object_path.to_string(),
            bytes,
            sha256,
        })
    }
}

async fn write_body(
    path: &Path,
    body: UploadBody,
    progress: ProgressReporter,
) -> Result<(u64, String)> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut chunks = BodyChunks::new(body, progress, DEFAULT_CHUNK_SIZE);
    while let Some(chunk) = chunks.next_chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    file.sync_all().await?;
    debug!(bytes = chunks.sent(), "body flushed");
    Ok(chunks.finish())
}
