// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Snaplift Storage: object-store backends and the upload task that drives
// them.  This crate bridges between the core domain types defined in
// `snaplift-core` and the remote (or local) bucket the photos end up in.

use std::path::Path;
use std::sync::Arc;

use snaplift_core::StorageConfig;
use snaplift_core::error::Result;

pub mod firebase;
pub mod local;
pub mod memory;
pub mod progress;
pub mod store;
pub mod task;

pub use firebase::FirebaseStorage;
pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
pub use progress::ProgressReporter;
pub use store::{ObjectStore, UploadBody, UploadReceipt};
pub use task::{UploadEvent, UploadTask};

/// Build the configured backend. Relative local roots resolve against
/// `data_dir`.
pub fn open_store(config: &StorageConfig, data_dir: &Path) -> Result<Arc<dyn ObjectStore>> {
    match config {
        StorageConfig::Local { root } => {
            let root = if root.is_absolute() {
                root.clone()
            } else {
                data_dir.join(root)
            };
            Ok(Arc::new(LocalObjectStore::new(root)))
        }
        StorageConfig::Firebase {
            bucket,
            api_base,
            auth_token,
        } => Ok(Arc::new(FirebaseStorage::new(
            api_base,
            bucket,
            auth_token.clone(),
        )?)),
    }
}
