// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Snaplift: Core types, error definitions, and configuration shared across
// all crates.

pub mod config;
pub mod error;
pub mod notices;
pub mod types;

pub use config::{AppConfig, StorageConfig};
pub use error::SnapliftError;
pub use notices::Notice;
pub use types::*;
