// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process bucket. Useful for dry runs and for exercising the upload flow
// without touching disk or network; can be told to fail part-way through.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use snaplift_core::error::{Result, SnapliftError};
use tracing::debug;

use crate::progress::{BodyChunks, DEFAULT_CHUNK_SIZE, ProgressReporter};
use crate::store::{ObjectStore, UploadBody, UploadReceipt};

/// Objects held in a shared map, keyed by object path.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    puts: Arc<AtomicUsize>,
    fail_after: Option<u64>,
    chunk_size: Option<usize>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every put once more than `bytes` bytes have been streamed.
    pub fn fail_after(mut self, bytes: u64) -> Self {
        self.fail_after = Some(bytes);
        self
    }

    /// Read bodies in chunks of `chunk_size` bytes.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Copy of a stored object.
    pub fn object(&self, object_path: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(object_path).cloned())
    }

    /// Paths of all stored objects.
    pub fn object_paths(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// How many times `put` has been called.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(
        &self,
        object_path: &str,
        body: UploadBody,
        progress: ProgressReporter,
    ) -> Result<UploadReceipt> {
        self.puts.fetch_add(1, Ordering::SeqCst);

        let mut chunks = BodyChunks::new(
            body,
            progress,
            self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
        );
        let mut data = Vec::new();
        while let Some(chunk) = chunks.next_chunk().await? {
            data.extend_from_slice(&chunk);
            if self.fail_after.is_some_and(|limit| chunks.sent() > limit) {
                return Err(SnapliftError::Upload(format!(
                    "connection reset after {} bytes",
                    chunks.sent()
                )));
            }
        }
        let (bytes, sha256) = chunks.finish();

        self.objects
            .lock()
            .map_err(|_| SnapliftError::Upload("memory bucket lock poisoned".into()))?
            .insert(object_path.to_string(), data);
        debug!(object = object_path, bytes, "object stored in memory");

        Ok(UploadReceipt {
            object_path: object_path.to_string(),
            bytes,
            sha256,
        })
    }
}
