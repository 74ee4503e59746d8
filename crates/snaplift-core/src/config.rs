// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnapliftError};

/// Default Firebase Storage REST endpoint.
pub const FIREBASE_API_BASE: &str = "https://firebasestorage.googleapis.com";

/// Where uploaded objects end up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Directory-backed bucket. Relative roots resolve against the data dir.
    Local { root: PathBuf },
    /// Firebase Storage bucket via the REST media-upload endpoint.
    Firebase {
        bucket: String,
        #[serde(default = "default_api_base")]
        api_base: String,
        /// Firebase auth ID token, sent as a bearer token when present.
        #[serde(default)]
        auth_token: Option<String>,
    },
}

fn default_api_base() -> String {
    FIREBASE_API_BASE.to_string()
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application package name; the file-provider authority derives from it.
    pub package_name: String,
    /// Object path prefix for uploads (objects land at `<prefix>/<uuid>`).
    pub object_prefix: String,
    /// Subdirectory of the data dir holding camera captures on desktop.
    pub pictures_dir_name: String,
    /// Upload destination.
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            package_name: "dev.hyperpolymath.snaplift".into(),
            object_prefix: "images".into(),
            pictures_dir_name: "Pictures".into(),
            storage: StorageConfig::Local {
                root: PathBuf::from("bucket"),
            },
        }
    }
}

impl AppConfig {
    /// File-provider authority used to share capture files with the camera.
    pub fn file_provider_authority(&self) -> String {
        format!("{}.fileprovider", self.package_name)
    }

    /// Reject settings that would make every upload or capture fail.
    pub fn validate(&self) -> Result<()> {
        if self.package_name.trim().is_empty() {
            return Err(SnapliftError::Config("package_name is empty".into()));
        }
        if self.object_prefix.trim_matches('/').is_empty() {
            return Err(SnapliftError::Config("object_prefix is empty".into()));
        }
        match &self.storage {
            StorageConfig::Local { root } if root.as_os_str().is_empty() => {
                Err(SnapliftError::Config("local storage root is empty".into()))
            }
            StorageConfig::Firebase { bucket, .. } if bucket.trim().is_empty() => {
                Err(SnapliftError::Config("firebase bucket is empty".into()))
            }
            StorageConfig::Firebase { api_base, .. } if !api_base.starts_with("http") => {
                Err(SnapliftError::Config(format!(
                    "firebase api_base is not an http(s) URL: {api_base}"
                )))
            }
            _ => Ok(()),
        }
    }
}
