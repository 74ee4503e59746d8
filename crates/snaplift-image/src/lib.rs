// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// snaplift-image: Image handling for the Snaplift uploader.
//
// Provides camera capture file creation (timestamped temp JPEGs in the private
// pictures directory) and the preview scaler that subsamples a captured photo
// down to the size of the on-screen preview surface.

pub mod capture;
pub mod preview;

// Re-export the primary items so callers can use `snaplift_image::PreviewScaler` etc.
pub use capture::create_image_file;
pub use preview::scaler::{PreviewScaler, ScaledPreview};
