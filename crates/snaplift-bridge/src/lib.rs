// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Native platform bridge abstractions.
//!
//! The traits in [`traits`] are the only way the screen reaches the OS:
//! runtime permissions, the gallery and camera activities, content
//! resolution, and the app's pictures directory. [`platform_bridge`] picks
//! the implementation for the build target.

pub mod traits;

pub(crate) mod results;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod desktop;

use snaplift_core::config::AppConfig;

pub use traits::{Launch, PlatformBridge};

/// Bridge implementation for the target operating system.
///
/// `data_dir` hosts desktop captures under `config.pictures_dir_name`; on
/// Android the directory comes from `Context.getExternalFilesDir`.
#[cfg_attr(target_os = "android", allow(unused_variables))]
pub fn platform_bridge(config: &AppConfig, data_dir: &std::path::Path) -> Box<dyn PlatformBridge> {
    #[cfg(target_os = "android")]
    {
        Box::new(android::AndroidBridge::new(config.pictures_dir_name.clone()))
    }
    #[cfg(not(target_os = "android"))]
    {
        Box::new(desktop::DesktopBridge::new(
            data_dir.join(&config.pictures_dir_name),
        ))
    }
}
