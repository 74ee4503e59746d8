// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Firebase Storage backend over the REST endpoint:
//
//   POST {api_base}/v0/b/{bucket}/o?uploadType=media&name={object path}
//
// The body is streamed chunk by chunk so progress tracks what has actually
// been handed to the HTTP client.

use async_trait::async_trait;
use futures::stream;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use serde::Deserialize;
use snaplift_core::error::{Result, SnapliftError};
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument};

use crate::progress::{BodyChunks, DEFAULT_CHUNK_SIZE, ProgressReporter};
use crate::store::{ObjectStore, UploadBody, UploadReceipt};

/// Object metadata returned by Firebase after a successful upload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseObject {
    pub name: String,
    #[serde(default)]
    pub bucket: Option<String>,
    /// Size in bytes, serialised by Firebase as a decimal string.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub md5_hash: Option<String>,
}

/// Client bound to one Firebase Storage bucket.
pub struct FirebaseStorage {
    client: reqwest::Client,
    api_base: String,
    bucket: String,
    auth_token: Option<String>,
}

impl FirebaseStorage {
    pub fn new(api_base: &str, bucket: &str, auth_token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("snaplift/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SnapliftError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            auth_token,
        })
    }

    /// Upload endpoint for the bucket (the object name goes in the query).
    pub fn upload_url(&self) -> String {
        format!("{}/v0/b/{}/o", self.api_base, self.bucket)
    }
}

#[async_trait]
impl ObjectStore for FirebaseStorage {
    fn name(&self) -> &str {
        "firebase"
    }

    #[instrument(skip(self, body, progress), fields(bucket = %self.bucket))]
    async fn put(
        &self,
        object_path: &str,
        body: UploadBody,
        progress: ProgressReporter,
    ) -> Result<UploadReceipt> {
        let total_bytes = body.total_bytes();
        let content_type = body.content_type().to_string();
        let chunks = BodyChunks::new(body, progress, DEFAULT_CHUNK_SIZE);

        // The stream hands its byte count and digest back as soon as the last
        // announced byte has been pulled; the HTTP client may never poll past
        // a body whose content length is already satisfied.
        let (digest_tx, digest_rx) = oneshot::channel();
        let initial = if total_bytes == 0 {
            let _ = digest_tx.send(chunks.finish());
            None
        } else {
            Some((chunks, digest_tx))
        };
        let body_stream = stream::unfold(initial, |state| async move {
            let (mut chunks, digest_tx) = state?;
            match chunks.next_chunk().await {
                Ok(Some(chunk)) if chunks.sent() >= chunks.total_bytes() => {
                    let _ = digest_tx.send(chunks.finish());
                    Some((Ok(chunk), None))
                }
                Ok(Some(chunk)) => Some((Ok(chunk), Some((chunks, digest_tx)))),
                Ok(None) => {
                    let _ = digest_tx.send(chunks.finish());
                    None
                }
                Err(err) => Some((Err(std::io::Error::other(err.to_string())), None)),
            }
        });

        let mut request = self
            .client
            .post(self.upload_url())
            .query(&[("uploadType", "media"), ("name", object_path)])
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total_bytes)
            .body(reqwest::Body::wrap_stream(body_stream));
        if let Some(token) = &self.auth_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        debug!(object = object_path, total_bytes, "sending upload request");
        let response = request
            .send()
            .await
            .map_err(|e| SnapliftError::Upload(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(%status, object = object_path, "upload rejected");
            return Err(SnapliftError::Upload(format!("HTTP {status}: {detail}")));
        }

        let object: FirebaseObject = response
            .json()
            .await
            .map_err(|e| SnapliftError::Upload(format!("unreadable upload response: {e}")))?;
        let (bytes, sha256) = digest_rx
            .await
            .map_err(|_| SnapliftError::Upload("request body was not fully sent".into()))?;

        info!(
            object = %object.name,
            bytes,
            md5 = object.md5_hash.as_deref().unwrap_or("-"),
            "object stored in firebase"
        );

        Ok(UploadReceipt {
            object_path: object.name,
            bytes,
            sha256,
        })
    }
}
