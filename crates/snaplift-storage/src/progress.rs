// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting and chunked body reading shared by every backend.

use sha2::{Digest, Sha256};
use snaplift_core::error::Result;
use snaplift_core::types::UploadProgress;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::debug;

use crate::store::UploadBody;
use crate::task::UploadEvent;

/// Default read size when streaming a body to a backend.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Forwards byte counts from a backend to the upload task's event channel.
///
/// Reports never go backwards: a count lower than one already reported is
/// dropped, so listeners always see a non-decreasing sequence.
pub struct ProgressReporter {
    tx: Option<mpsc::UnboundedSender<UploadEvent>>,
    total_bytes: u64,
    last: Option<u64>,
}

impl ProgressReporter {
    pub fn new(tx: mpsc::UnboundedSender<UploadEvent>, total_bytes: u64) -> Self {
        Self {
            tx: Some(tx),
            total_bytes,
            last: None,
        }
    }

    /// A reporter nobody listens to.
    pub fn silent(total_bytes: u64) -> Self {
        Self {
            tx: None,
            total_bytes,
            last: None,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Report that `bytes_transferred` bytes have been handed to the transport.
    pub fn report(&mut self, bytes_transferred: u64) {
        if self.last.is_some_and(|last| bytes_transferred <= last) {
            return;
        }
        self.last = Some(bytes_transferred);
        if let Some(tx) = &self.tx {
            // A closed receiver only means nobody is watching any more.
            let _ = tx.send(UploadEvent::Progress(UploadProgress::new(
                bytes_transferred,
                self.total_bytes,
            )));
        }
    }
}

/// Reads an [`UploadBody`] in fixed-size chunks, hashing and reporting
/// progress as each chunk is pulled.
pub struct BodyChunks {
    body: UploadBody,
    progress: ProgressReporter,
    hasher: Sha256,
    sent: u64,
    chunk_size: usize,
}

impl BodyChunks {
    pub fn new(body: UploadBody, progress: ProgressReporter, chunk_size: usize) -> Self {
        Self {
            body,
            progress,
            hasher: Sha256::new(),
            sent: 0,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Next chunk of the body, or `None` at end of stream.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_size];
        let read = self.body.reader_mut().read(&mut buf).await?;
        if read == 0 {
            return Ok(None);
        }
        buf.truncate(read);
        self.hasher.update(&buf);
        self.sent += read as u64;
        self.progress.report(self.sent);
        Ok(Some(buf))
    }

    /// Bytes pulled so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Total bytes the body announced.
    pub fn total_bytes(&self) -> u64 {
        self.body.total_bytes()
    }

    /// Finish reading: returns the byte count and hex SHA-256 of everything
    /// pulled.
    pub fn finish(self) -> (u64, String) {
        let digest = hex::encode(self.hasher.finalize());
        debug!(bytes = self.sent, sha256 = %digest, "body fully read");
        (self.sent, digest)
    }
}
