// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload task: runs one put on the tokio runtime and hands its progress and
// outcome back to the caller as an ordered event stream.
//
// Progress events and the terminal event share one FIFO channel, and the
// terminal event is only sent after the backend's `put` has returned, so every
// progress event is observed before success or failure.

use std::future::Future;
use std::sync::Arc;

use snaplift_core::error::{Result, SnapliftError};
use snaplift_core::types::{UploadKey, UploadProgress};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::progress::ProgressReporter;
use crate::store::{ObjectStore, UploadBody, UploadReceipt};

/// One step of an upload as seen by the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Progress(UploadProgress),
    Succeeded(UploadReceipt),
    /// Failure detail for the log. Users only ever see a fixed string.
    Failed(String),
}

impl UploadEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// Handle to a single in-flight upload.
///
/// Dropping the handle does not cancel the transfer; the spawned put runs to
/// completion regardless.
pub struct UploadTask {
    key: UploadKey,
    object_path: String,
    events: mpsc::UnboundedReceiver<UploadEvent>,
    finished: bool,
}

impl UploadTask {
    /// Spawn a put of the body produced by `open_body` to `object_path`.
    ///
    /// Opening the body happens on the spawned task, so a source that cannot
    /// be read surfaces as a `Failed` event like any transport error.
    pub fn spawn<F>(
        store: Arc<dyn ObjectStore>,
        key: UploadKey,
        object_path: String,
        open_body: F,
    ) -> Self
    where
        F: Future<Output = Result<UploadBody>> + Send + 'static,
    {
        let (tx, events) = mpsc::unbounded_channel();
        let path = object_path.clone();

        tokio::spawn(async move {
            let outcome = async {
                let body = open_body.await?;
                info!(
                    backend = store.name(),
                    object = %path,
                    bytes = body.total_bytes(),
                    "upload started"
                );
                let progress = ProgressReporter::new(tx.clone(), body.total_bytes());
                store.put(&path, body, progress).await
            }
            .await;

            let event = match outcome {
                Ok(receipt) => {
                    info!(object = %receipt.object_path, bytes = receipt.bytes, "upload finished");
                    UploadEvent::Succeeded(receipt)
                }
                Err(err) => {
                    warn!(object = %path, error = %err, "upload failed");
                    UploadEvent::Failed(err.to_string())
                }
            };
            let _ = tx.send(event);
        });

        Self {
            key,
            object_path,
            events,
            finished: false,
        }
    }

    pub fn key(&self) -> UploadKey {
        self.key
    }

    pub fn object_path(&self) -> &str {
        &self.object_path
    }

    /// Next event, or `None` once the terminal event has been delivered.
    pub async fn next_event(&mut self) -> Option<UploadEvent> {
        if self.finished {
            return None;
        }
        let event = match self.events.recv().await {
            Some(event) => event,
            // The worker went away without a verdict (runtime shutdown or panic).
            None => UploadEvent::Failed("upload task ended without a result".into()),
        };
        if event.is_terminal() {
            self.finished = true;
        }
        Some(event)
    }

    /// Drive the upload to completion, passing each progress report to
    /// `on_progress`.
    pub async fn finish(
        mut self,
        mut on_progress: impl FnMut(UploadProgress),
    ) -> Result<UploadReceipt> {
        while let Some(event) = self.next_event().await {
            match event {
                UploadEvent::Progress(progress) => on_progress(progress),
                UploadEvent::Succeeded(receipt) => return Ok(receipt),
                UploadEvent::Failed(detail) => return Err(SnapliftError::Upload(detail)),
            }
        }
        Err(SnapliftError::Upload("upload already finished".into()))
    }
}
