// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview module: downsample factor computation, subsampled decode, and
// data-URI encoding for rendering.

pub mod scaler;

pub use scaler::{PreviewScaler, ScaledPreview, data_uri, downsample_factor, sample_size};
